//! Scratch allocators threaded through the allocating operations

use strand::algorithms::{argsort_in, stable_partition};
use strand::memory::ScratchBuffer;
use strand::{
    alignment_score, edit_distance, Allocator, ArenaAllocator, ArenaConfig, CostMatrix, FixedBufferAllocator,
    SortConfig, StrandError, SystemAllocator,
};
use std::cell::Cell;
use std::ptr::NonNull;

/// Delegates to the heap and counts live blocks
#[derive(Default)]
struct CountingAllocator {
    live: Cell<isize>,
}

// SAFETY: every block comes from `SystemAllocator` with the requested layout
unsafe impl Allocator for CountingAllocator {
    fn allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        let ptr = SystemAllocator.allocate(size, align)?;
        self.live.set(self.live.get() + 1);
        Some(ptr)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, size: usize, align: usize) {
        self.live.set(self.live.get() - 1);
        unsafe { SystemAllocator.free(ptr, size, align) }
    }
}

fn distances_with(alloc: &dyn Allocator) -> Vec<usize> {
    let pairs: [(&[u8], &[u8]); 4] = [
        (b"kitten", b"sitting"),
        (b"saturday", b"sunday"),
        (b"abcdefghij", b"jihgfedcba"),
        (b"", b"empty"),
    ];
    pairs
        .iter()
        .map(|(a, b)| edit_distance(a, b, 0, alloc).unwrap())
        .collect()
}

#[test]
fn test_every_allocator_gives_same_answers() {
    let expected = vec![3, 3, 10, 5];
    assert_eq!(distances_with(&SystemAllocator), expected);

    let arena = ArenaAllocator::new(16 * 1024).unwrap();
    assert_eq!(distances_with(&arena), expected);

    let mut region = vec![0u8; 16 * 1024];
    let fixed = FixedBufferAllocator::new(&mut region);
    assert_eq!(distances_with(&fixed), expected);
}

#[test]
fn test_arena_from_config() {
    let config = ArenaConfig {
        capacity: 4096,
        ..ArenaConfig::default()
    };
    let mut arena = ArenaAllocator::with_config(&config).unwrap();
    assert_eq!(arena.capacity(), 4096);

    let costs = CostMatrix::unit(1, -1);
    let score = alignment_score(b"GATTACA", b"GCATGCU", &costs, -1, &arena).unwrap();
    assert_eq!(score, 0);
    let stats = arena.stats();
    assert!(stats.peak_bytes > 0);
    assert!(stats.allocations >= 1);

    arena.reset();
    assert_eq!(arena.remaining_bytes(), 4096);
    assert_eq!(arena.stats().peak_bytes, 0);
}

#[test]
fn test_arena_rewinds_nested_scratch() {
    let arena = ArenaAllocator::new(1024).unwrap();
    {
        let _outer = ScratchBuffer::new(&arena, 96).unwrap();
        let used = arena.stats().used_bytes;
        {
            let _inner = ScratchBuffer::new(&arena, 200).unwrap();
            assert!(arena.stats().used_bytes >= used + 200);
        }
        assert_eq!(arena.stats().used_bytes, used);
    }
    assert_eq!(arena.stats().used_bytes, 0);
}

#[test]
fn test_exhausted_arena_reports_out_of_memory() {
    let arena = ArenaAllocator::new(64).unwrap();
    let a = vec![b'x'; 500];
    let b = vec![b'y'; 400];
    let err = edit_distance(&a, &b, 0, &arena).unwrap_err();
    assert!(matches!(err, StrandError::OutOfMemory { .. }));
    assert_eq!(err.category(), "memory");
}

#[test]
fn test_refused_sort_scratch_keeps_indices() {
    let words: Vec<String> = (0..100).rev().map(|i| format!("word{:03}", i)).collect();
    let mut order: Vec<u64> = (0..100).collect();

    let mut tiny = [0u8; 16];
    let fixed = FixedBufferAllocator::new(&mut tiny);
    let err = argsort_in(&words, &mut order, &SortConfig::default(), &fixed).unwrap_err();
    assert!(err.is_recoverable());
    let mut seen = order.clone();
    seen.sort_unstable();
    assert_eq!(seen, (0..100).collect::<Vec<u64>>());

    argsort_in(&words, &mut order, &SortConfig::default(), &SystemAllocator).unwrap();
    assert_eq!(order, (0..100).rev().collect::<Vec<u64>>());
}

#[test]
fn test_partition_needs_scratch() {
    let mut order = [1u64, 2, 3, 4, 5, 6];
    let mut tiny = [0u8; 8];
    let fixed = FixedBufferAllocator::new(&mut tiny);
    assert!(stable_partition(&mut order, |slot| slot > 3, &fixed).is_err());
    assert_eq!(order, [1, 2, 3, 4, 5, 6]);

    let kept = stable_partition(&mut order, |slot| slot > 3, &SystemAllocator).unwrap();
    assert_eq!(kept, 3);
    assert_eq!(order, [4, 5, 6, 1, 2, 3]);
}

#[test]
fn test_custom_allocator_blocks_are_returned() {
    let counting = CountingAllocator::default();
    assert_eq!(edit_distance(b"kitten", b"sitting", 0, &counting).unwrap(), 3);
    let costs = CostMatrix::unit(1, -1);
    alignment_score(b"GATTACA", b"GCATGCU", &costs, -1, &counting).unwrap();
    assert_eq!(counting.live.get(), 0);
}

fn fill_blocks(alloc: &dyn Allocator) {
    let sizes = [1usize, 7, 64, 13, 256];
    let aligns = [1usize, 8, 16, 2, 64];
    let mut blocks = Vec::new();
    for (i, (&size, &align)) in sizes.iter().zip(&aligns).enumerate() {
        let ptr = alloc.allocate(size, align).unwrap();
        assert_eq!(ptr.as_ptr() as usize % align, 0);
        // every byte of the block is writable
        unsafe { std::ptr::write_bytes(ptr.as_ptr(), i as u8 + 1, size) };
        blocks.push((ptr, size, i as u8 + 1));
    }
    for &(ptr, size, tag) in &blocks {
        let bytes = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), size) };
        assert!(bytes.iter().all(|&b| b == tag), "block {} was overwritten", tag);
    }
    for &(ptr, size, tag) in blocks.iter().rev() {
        unsafe { alloc.free(ptr, size, aligns[tag as usize - 1]) };
    }
}

#[test]
fn test_allocations_are_writable_and_disjoint() {
    fill_blocks(&SystemAllocator);
    let arena = ArenaAllocator::new(4096).unwrap();
    fill_blocks(&arena);
    let mut region = vec![0u8; 4096];
    let fixed = FixedBufferAllocator::new(&mut region);
    fill_blocks(&fixed);
    fill_blocks(&&fixed);
}
