//! Integration tests for edit distance, alignment and Hamming distance

use proptest::prelude::*;
use strand::{
    alignment_score, edit_distance, edit_distance_or_sentinel, edit_distances, hamming_distance, ArenaAllocator,
    CostMatrix, FixedBufferAllocator, StrandError, SystemAllocator, ALLOCATION_FAILURE,
};

/// Textbook Wagner–Fischer, used as the oracle
fn reference_distance(a: &[u8], b: &[u8]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, &x) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, &y) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(x != y);
            cur[j + 1] = substitution.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

fn reference_alignment(a: &[u8], b: &[u8], costs: &CostMatrix, gap: i8) -> i64 {
    let gap = gap as i64;
    let mut prev: Vec<i64> = (0..=b.len() as i64).map(|j| j * gap).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, &x) in a.iter().enumerate() {
        cur[0] = (i as i64 + 1) * gap;
        for (j, &y) in b.iter().enumerate() {
            let diagonal = prev[j] + costs.get(x, y) as i64;
            cur[j + 1] = diagonal.max(prev[j + 1] + gap).max(cur[j] + gap);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

fn dna() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(b"ACGT".to_vec()), 0..120)
}

#[test]
fn test_known_distances() {
    let alloc = SystemAllocator;
    assert_eq!(edit_distance(b"kitten", b"sitting", 0, &alloc).unwrap(), 3);
    assert_eq!(edit_distance(b"", b"abc", 0, &alloc).unwrap(), 3);
    assert_eq!(edit_distance(b"abc", b"", 0, &alloc).unwrap(), 3);
    assert_eq!(edit_distance(b"", b"", 0, &alloc).unwrap(), 0);
    assert_eq!(edit_distance(b"same", b"same", 0, &alloc).unwrap(), 0);
    assert_eq!(edit_distance(b"flaw", b"lawn", 0, &alloc).unwrap(), 2);
    assert_eq!(edit_distance(b"kitten", b"sitting", 1, &alloc).unwrap(), 1);
    assert_eq!(edit_distance(b"a", b"abcdefgh", 3, &alloc).unwrap(), 3);
}

#[test]
fn test_long_inputs_need_wide_lanes() {
    // Distances past 255 cannot be held in byte lanes
    let alloc = SystemAllocator;
    let a = vec![b'a'; 700];
    let b = vec![b'b'; 650];
    assert_eq!(edit_distance(&a, &b, 0, &alloc).unwrap(), 700);
    assert_eq!(edit_distance(&a, &b, 300, &alloc).unwrap(), 300);
}

#[test]
fn test_alignment_known_scores() {
    let alloc = SystemAllocator;
    let costs = CostMatrix::unit(1, -1);
    assert_eq!(alignment_score(b"GATTACA", b"GCATGCU", &costs, -1, &alloc).unwrap(), 0);
    assert_eq!(alignment_score(b"", b"ACGT", &costs, -2, &alloc).unwrap(), -8);
    assert_eq!(alignment_score(b"ACGT", b"ACGT", &costs, -1, &alloc).unwrap(), 4);
}

#[test]
fn test_hamming() {
    assert_eq!(hamming_distance(b"karolin", b"kathrin", 0), 3);
    assert_eq!(hamming_distance(b"", b"", 0), 0);
    assert_eq!(hamming_distance(b"0123456789abcdef", b"0123456789abcdeX", 0), 1);
    assert_eq!(hamming_distance(b"abc", b"abcdef", 2), 2);
}

#[test]
fn test_scratch_exhaustion_is_reported() {
    let a = b"the quick brown fox jumps over the lazy dog";
    let b = b"a quick brown dog vaults over the sleepy fox";

    let mut tiny = [0u8; 8];
    let alloc = FixedBufferAllocator::new(&mut tiny);
    let err = edit_distance(a, b, 0, &alloc).unwrap_err();
    assert!(matches!(err, StrandError::OutOfMemory { .. }));
    assert!(err.is_recoverable());
    assert_eq!(edit_distance_or_sentinel(a, b, 0, &alloc), ALLOCATION_FAILURE);

    // Trivial cases never touch the allocator
    assert_eq!(edit_distance(b"", b"abc", 0, &alloc).unwrap(), 3);
    assert_eq!(edit_distance(a, a, 0, &alloc).unwrap(), 0);
}

#[test]
fn test_arena_reuse_across_batch() {
    let mut arena = ArenaAllocator::new(64 * 1024).unwrap();
    let words = ["kitten", "sitting", "mitten", "fitting", "written"];
    for _ in 0..3 {
        for x in words {
            for y in words {
                let expected = reference_distance(x.as_bytes(), y.as_bytes());
                assert_eq!(edit_distance(x.as_bytes(), y.as_bytes(), 0, &arena).unwrap(), expected);
            }
        }
        assert!(arena.stats().allocations > 0);
        arena.reset();
        assert_eq!(arena.stats().used_bytes, 0);
    }
}

#[test]
fn test_batch_distances() {
    let alloc = SystemAllocator;
    let a = ["kitten", "flaw", ""];
    let b = ["sitting", "lawn", "abc"];
    let mut out = [0usize; 3];
    edit_distances(&a[..], &b[..], 0, &alloc, &mut out).unwrap();
    assert_eq!(out, [3, 2, 3]);

    let mut short = [0usize; 2];
    assert!(edit_distances(&a[..], &b[..], 0, &alloc, &mut short).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_matches_reference(a in dna(), b in dna()) {
        let alloc = SystemAllocator;
        prop_assert_eq!(edit_distance(&a, &b, 0, &alloc).unwrap(), reference_distance(&a, &b));
    }

    #[test]
    fn prop_bound_consistency(a in dna(), b in dna(), bound in 1usize..60) {
        let alloc = SystemAllocator;
        let full = edit_distance(&a, &b, 0, &alloc).unwrap();
        prop_assert_eq!(edit_distance(&a, &b, bound, &alloc).unwrap(), full.min(bound));
    }

    #[test]
    fn prop_metric_properties(a in dna(), b in dna(), c in dna()) {
        let alloc = SystemAllocator;
        let ab = edit_distance(&a, &b, 0, &alloc).unwrap();
        prop_assert_eq!(ab, edit_distance(&b, &a, 0, &alloc).unwrap());
        prop_assert!(ab >= a.len().abs_diff(b.len()));
        prop_assert!(ab <= a.len().max(b.len()));
        let ac = edit_distance(&a, &c, 0, &alloc).unwrap();
        let cb = edit_distance(&c, &b, 0, &alloc).unwrap();
        prop_assert!(ab <= ac + cb);
    }

    #[test]
    fn prop_alignment_matches_reference(a in dna(), b in dna(), gap in -3i8..=0) {
        let alloc = SystemAllocator;
        let costs = CostMatrix::from_fn(|x, y| if x == y { 2 } else { -1 });
        prop_assert_eq!(
            alignment_score(&a, &b, &costs, gap, &alloc).unwrap(),
            reference_alignment(&a, &b, &costs, gap)
        );
    }

    #[test]
    fn prop_hamming_bounds_edit_distance(a in dna(), b in dna()) {
        let alloc = SystemAllocator;
        prop_assert!(hamming_distance(&a, &b, 0) >= edit_distance(&a, &b, 0, &alloc).unwrap());
    }
}
