//! Set operations over sorted string orders
//!
//! Everything here works on `order` arrays produced by
//! [`argsort`](crate::argsort): a sorted sequence of indices, walked with a
//! linear merge scan.
//!
//! - `intersect`: O(n log n + m log m) sort, then O(n + m) merge walk
//! - `unique`: O(n) stable partition of the sorted order
//! - `stable_partition`: single pass, scratch for the rejected slots
//!
//! # Examples
//!
//! ```
//! use strand::algorithms::{intersect, unique};
//! use strand::{argsort, SortConfig};
//!
//! let left = ["fig", "pear", "apple", "kiwi"];
//! let right = ["kiwi", "plum", "fig"];
//! assert_eq!(intersect(&left[..], &right[..]).unwrap(), vec![(0, 2), (3, 0)]);
//!
//! let words = ["b", "a", "b", "c", "a"];
//! let mut order = [0u64, 1, 2, 3, 4];
//! argsort(&words[..], &mut order, &SortConfig::default()).unwrap();
//! let distinct = unique(&words[..], &mut order).unwrap();
//! assert_eq!(distinct, 3);
//! ```

use crate::algorithms::{sort::check_order, sorted_order, Sequence};
use crate::config::SortConfig;
use crate::error::Result;
use crate::memory::{Allocator, LaneWidth, ScratchBuffer, SystemAllocator};
use std::cmp::Ordering;

/// Index pairs `(i, j)` with `a_seq[i] == b_seq[j]`
///
/// Both sides are sorted internally, then walked together. Duplicates pair up
/// one to one in sorted order, so each index appears in at most one pair.
/// Pairs come out ordered by the shared string.
pub fn intersect<A, B>(a_seq: &A, b_seq: &B) -> Result<Vec<(usize, usize)>>
where
    A: Sequence + ?Sized,
    B: Sequence + ?Sized,
{
    let config = SortConfig::default();
    let a_order = sorted_order(a_seq, &config)?;
    let b_order = sorted_order(b_seq, &config)?;

    let mut result = Vec::new();
    let mut i1 = 0;
    let mut i2 = 0;

    while i1 < a_order.len() && i2 < b_order.len() {
        let x = a_order[i1] as usize;
        let y = b_order[i2] as usize;
        match a_seq.get(x).cmp(b_seq.get(y)) {
            Ordering::Less => i1 += 1,
            Ordering::Greater => i2 += 1,
            Ordering::Equal => {
                result.push((x, y));
                i1 += 1;
                i2 += 1;
            }
        }
    }
    log::trace!(
        "intersect: {} x {} strings share {} pairs",
        a_order.len(),
        b_order.len(),
        result.len()
    );
    Ok(result)
}

/// Collapse runs of equal strings in a sorted `order`.
///
/// The first index of every run moves to the front, keeping its relative
/// position; the rest follow. Returns the number of distinct strings, so
/// `order[..n]` lists each of them once.
pub fn unique<S>(seq: &S, order: &mut [u64]) -> Result<usize>
where
    S: Sequence + ?Sized,
{
    check_order(seq, order)?;
    let mut previous: Option<&[u8]> = None;
    stable_partition(
        order,
        |slot| {
            let current = seq.get(slot as usize);
            let fresh = previous != Some(current);
            previous = Some(current);
            fresh
        },
        &SystemAllocator,
    )
}

/// Move slots accepted by `pred` to the front, both groups keeping their order.
///
/// `pred` sees every slot exactly once, front to back, so it may carry state
/// between calls. Rejected slots are buffered in scratch from `alloc`.
/// Returns the number of accepted slots.
///
/// ```
/// use strand::algorithms::stable_partition;
/// use strand::SystemAllocator;
///
/// let mut order = [5u64, 2, 8, 1, 4];
/// let evens = stable_partition(&mut order, |slot| slot % 2 == 0, &SystemAllocator).unwrap();
/// assert_eq!(evens, 3);
/// assert_eq!(order, [2, 8, 4, 5, 1]);
/// ```
pub fn stable_partition<F>(order: &mut [u64], mut pred: F, alloc: &dyn Allocator) -> Result<usize>
where
    F: FnMut(u64) -> bool,
{
    let mut scratch = ScratchBuffer::for_lanes(alloc, LaneWidth::U64, order.len())?;
    let rejected = scratch.as_lanes::<u64>()?;

    let mut write_pos = 0;
    let mut rejected_len = 0;
    for read_pos in 0..order.len() {
        let slot = order[read_pos];
        if pred(slot) {
            order[write_pos] = slot;
            write_pos += 1;
        } else {
            rejected[rejected_len] = slot;
            rejected_len += 1;
        }
    }
    order[write_pos..].copy_from_slice(&rejected[..rejected_len]);
    Ok(write_pos)
}
