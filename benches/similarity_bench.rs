use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use strand::simd::bind;
use strand::{
    argsort, detect_capabilities, hamming_distance, ArenaAllocator, CostMatrix, SortConfig, SystemAllocator,
};

fn dna(len: usize, rng: &mut fastrand::Rng) -> Vec<u8> {
    (0..len).map(|_| b"ACGT"[rng.usize(..4)]).collect()
}

/// `base` with roughly one edit in ten
fn mutate(base: &[u8], rng: &mut fastrand::Rng) -> Vec<u8> {
    let mut out = Vec::with_capacity(base.len() + 8);
    for &b in base {
        match rng.u8(..20) {
            0 => {}
            1 => {
                out.push(b);
                out.push(b"ACGT"[rng.usize(..4)]);
            }
            2 => out.push(b"ACGT"[rng.usize(..4)]),
            _ => out.push(b),
        }
    }
    out
}

fn benchmark_edit_distance(c: &mut Criterion) {
    let mut rng = fastrand::Rng::with_seed(42);
    let mut group = c.benchmark_group("edit_distance");
    for len in [64usize, 256, 1024] {
        let a = dna(len, &mut rng);
        let b = mutate(&a, &mut rng);
        for mask in detect_capabilities().ladder() {
            let table = bind(mask);
            group.bench_with_input(BenchmarkId::new(mask.tier_name(), len), &len, |bench, _| {
                bench.iter(|| black_box(table.edit_distance(black_box(&a), black_box(&b), 0, &SystemAllocator)))
            });
        }

        let arena = ArenaAllocator::new(64 * 1024).unwrap();
        let table = bind(detect_capabilities());
        group.bench_with_input(BenchmarkId::new("arena", len), &len, |bench, _| {
            bench.iter(|| black_box(table.edit_distance(black_box(&a), black_box(&b), 0, &arena)))
        });
        group.bench_with_input(BenchmarkId::new("bounded/16", len), &len, |bench, _| {
            bench.iter(|| black_box(table.edit_distance(black_box(&a), black_box(&b), 16, &SystemAllocator)))
        });
    }
    group.finish();
}

fn benchmark_alignment(c: &mut Criterion) {
    let mut rng = fastrand::Rng::with_seed(9);
    let costs = CostMatrix::unit(2, -1);
    let mut group = c.benchmark_group("alignment_score");
    for len in [64usize, 512] {
        let a = dna(len, &mut rng);
        let b = mutate(&a, &mut rng);
        for mask in detect_capabilities().ladder() {
            let table = bind(mask);
            group.bench_with_input(BenchmarkId::new(mask.tier_name(), len), &len, |bench, _| {
                bench.iter(|| black_box(table.alignment_score(&a, &b, &costs, -2, &SystemAllocator)))
            });
        }
    }
    group.finish();
}

fn benchmark_hamming(c: &mut Criterion) {
    let mut rng = fastrand::Rng::with_seed(1);
    let a = dna(4096, &mut rng);
    let mut b = a.clone();
    for _ in 0..64 {
        let i = rng.usize(..b.len());
        b[i] = b'N';
    }
    c.bench_function("hamming_distance/4096", |bench| {
        bench.iter(|| black_box(hamming_distance(black_box(&a), black_box(&b), 0)))
    });
}

fn benchmark_argsort(c: &mut Criterion) {
    let mut rng = fastrand::Rng::with_seed(17);
    let words: Vec<Vec<u8>> = (0..50_000)
        .map(|_| {
            let len = rng.usize(1..24);
            (0..len).map(|_| rng.u8(b'a'..=b'z')).collect()
        })
        .collect();

    let mut group = c.benchmark_group("argsort");
    for rounds in [0usize, 2, 4] {
        let config = SortConfig {
            radix_rounds: rounds,
            ..SortConfig::default()
        };
        group.bench_with_input(BenchmarkId::new("radix_rounds", rounds), &config, |bench, config| {
            bench.iter(|| {
                let mut order: Vec<u64> = (0..words.len() as u64).collect();
                argsort(&words, &mut order, config).unwrap();
                black_box(order)
            })
        });
    }
    group.bench_function("partial/100", |bench| {
        let config = SortConfig::partial(100);
        bench.iter(|| {
            let mut order: Vec<u64> = (0..words.len() as u64).collect();
            argsort(&words, &mut order, &config).unwrap();
            black_box(order)
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_edit_distance,
    benchmark_alignment,
    benchmark_hamming,
    benchmark_argsort
);
criterion_main!(benches);
