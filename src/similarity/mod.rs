//! Edit distance and alignment scoring
//!
//! All entry points take the scratch [`Allocator`] explicitly. The dispatched
//! kernel only sees the hard part of the problem: the wrappers here order the
//! inputs, trim the shared prefix and suffix, and answer the trivial cases
//! (an empty side, a length gap that already reaches the bound) directly.
//!
//! # Examples
//!
//! ```rust
//! use strand::{edit_distance, alignment_score, CostMatrix, SystemAllocator};
//!
//! let alloc = SystemAllocator;
//! assert_eq!(edit_distance(b"kitten", b"sitting", 0, &alloc).unwrap(), 3);
//! assert_eq!(edit_distance(b"kitten", b"sitting", 2, &alloc).unwrap(), 2);
//!
//! let costs = CostMatrix::unit(1, -1);
//! assert_eq!(alignment_score(b"GATTACA", b"GCATGCU", &costs, -1, &alloc).unwrap(), 0);
//! ```

pub(crate) mod accel;
pub mod cost;
pub(crate) mod serial;

pub use cost::CostMatrix;

use crate::algorithms::Sequence;
use crate::error::{Result, StrandError};
use crate::memory::{Allocator, ALLOCATION_FAILURE};
use crate::simd::backends;
use crate::simd::dispatch::{AlignmentScoreFn, EditDistanceFn};

/// Run `$body` with `$T` aliased to the lane type matching `$width`
macro_rules! with_lanes {
    ($width:expr, $T:ident => $body:expr) => {
        match $width {
            $crate::memory::LaneWidth::U8 => {
                type $T = u8;
                $body
            }
            $crate::memory::LaneWidth::U16 => {
                type $T = u16;
                $body
            }
            $crate::memory::LaneWidth::U32 => {
                type $T = u32;
                $body
            }
            $crate::memory::LaneWidth::U64 => {
                type $T = u64;
                $body
            }
        }
    };
}
pub(crate) use with_lanes;

/// Levenshtein distance between `a` and `b`.
///
/// `bound == 0` means unbounded; otherwise the result is `min(distance, bound)`
/// and the computation stops as soon as the bound is certain.
#[inline]
pub fn edit_distance(a: &[u8], b: &[u8], bound: usize, alloc: &dyn Allocator) -> Result<usize> {
    backends().edit_distance(a, b, bound, alloc)
}

/// [`edit_distance`] for callers that cannot take a `Result`.
///
/// Returns [`ALLOCATION_FAILURE`] when scratch memory could not be obtained.
pub fn edit_distance_or_sentinel(a: &[u8], b: &[u8], bound: usize, alloc: &dyn Allocator) -> usize {
    match edit_distance(a, b, bound, alloc) {
        Ok(distance) => distance,
        Err(err) => {
            log::debug!("edit distance failed: {}", err);
            ALLOCATION_FAILURE
        }
    }
}

/// Needleman–Wunsch global alignment score, maximized.
///
/// Each cell takes `max(up + gap, left + gap, diagonal + costs[a_i][b_j])`.
/// Aligning against an empty side scores `len * gap`.
#[inline]
pub fn alignment_score(a: &[u8], b: &[u8], costs: &CostMatrix, gap: i8, alloc: &dyn Allocator) -> Result<i64> {
    backends().alignment_score(a, b, costs, gap, alloc)
}

/// Hamming-style distance: mismatches over the common length plus the length difference.
///
/// `bound == 0` means unbounded; otherwise the result is `min(distance, bound)`.
///
/// ```rust
/// assert_eq!(strand::hamming_distance(b"karolin", b"kathrin", 0), 3);
/// assert_eq!(strand::hamming_distance(b"abc", b"abcde", 0), 2);
/// assert_eq!(strand::hamming_distance(b"karolin", b"kathrin", 2), 2);
/// ```
pub fn hamming_distance(a: &[u8], b: &[u8], bound: usize) -> usize {
    let limit = if bound == 0 { usize::MAX } else { bound };
    let mut distance = a.len().abs_diff(b.len());
    if distance >= limit {
        return limit;
    }
    let common = a.len().min(b.len());
    let mut ca = a[..common].chunks_exact(8);
    let mut cb = b[..common].chunks_exact(8);
    for (x, y) in (&mut ca).zip(&mut cb) {
        let mut wx = [0u8; 8];
        let mut wy = [0u8; 8];
        wx.copy_from_slice(x);
        wy.copy_from_slice(y);
        let diff = u64::from_le_bytes(wx) ^ u64::from_le_bytes(wy);
        // one bit per differing byte
        let folded = diff | (diff >> 4);
        let folded = folded | (folded >> 2);
        let folded = folded | (folded >> 1);
        distance += (folded & 0x0101_0101_0101_0101).count_ones() as usize;
        if distance >= limit {
            return limit;
        }
    }
    distance += ca
        .remainder()
        .iter()
        .zip(cb.remainder())
        .filter(|(x, y)| x != y)
        .count();
    distance.min(limit)
}

/// Pairwise [`edit_distance`] of `a_seq[i]` and `b_seq[i]` into `out[i]`
///
/// Both sequences and `out` must have the same length.
pub fn edit_distances<A, B>(a_seq: &A, b_seq: &B, bound: usize, alloc: &dyn Allocator, out: &mut [usize]) -> Result<()>
where
    A: Sequence + ?Sized,
    B: Sequence + ?Sized,
{
    if a_seq.len() != b_seq.len() || out.len() != a_seq.len() {
        return Err(StrandError::invalid_input(format!(
            "batch length mismatch: {} vs {} strings, {} outputs",
            a_seq.len(),
            b_seq.len(),
            out.len()
        )));
    }
    let table = backends();
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = table.edit_distance(a_seq.get(i), b_seq.get(i), bound, alloc)?;
    }
    Ok(())
}

/// Shared pre-processing around a distance kernel
pub(crate) fn run_edit_distance(
    kernel: EditDistanceFn,
    a: &[u8],
    b: &[u8],
    bound: usize,
    alloc: &dyn Allocator,
) -> Result<usize> {
    let (a, b) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let prefix = common_prefix(a, b);
    let (a, b) = (&a[prefix..], &b[prefix..]);
    let suffix = common_suffix(a, b);
    let (a, b) = (&a[..a.len() - suffix], &b[..b.len() - suffix]);

    let clamp = |distance: usize| if bound == 0 { distance } else { distance.min(bound) };
    if a.is_empty() {
        return Ok(clamp(b.len()));
    }
    if bound != 0 && b.len() - a.len() >= bound {
        return Ok(bound);
    }
    kernel(a, b, bound, alloc).map(clamp)
}

/// Shared pre-processing around an alignment kernel
pub(crate) fn run_alignment_score(
    kernel: AlignmentScoreFn,
    a: &[u8],
    b: &[u8],
    costs: &CostMatrix,
    gap: i8,
    alloc: &dyn Allocator,
) -> Result<i64> {
    if a.is_empty() || b.is_empty() {
        return Ok((a.len() + b.len()) as i64 * gap as i64);
    }
    kernel(a, b, costs, gap, alloc)
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[u8], b: &[u8]) -> usize {
    a.iter().rev().zip(b.iter().rev()).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FixedBufferAllocator, SystemAllocator};

    #[test]
    fn test_known_distances() {
        let alloc = SystemAllocator;
        assert_eq!(edit_distance(b"kitten", b"sitting", 0, &alloc).unwrap(), 3);
        assert_eq!(edit_distance(b"sitting", b"kitten", 0, &alloc).unwrap(), 3);
        assert_eq!(edit_distance(b"", b"", 0, &alloc).unwrap(), 0);
        assert_eq!(edit_distance(b"", b"abc", 0, &alloc).unwrap(), 3);
        assert_eq!(edit_distance(b"abc", b"", 2, &alloc).unwrap(), 2);
        assert_eq!(edit_distance(b"same", b"same", 0, &alloc).unwrap(), 0);
        assert_eq!(edit_distance(b"prefix-a-suffix", b"prefix-bb-suffix", 0, &alloc).unwrap(), 2);
    }

    #[test]
    fn test_length_gap_short_circuit() {
        // needs no scratch at all, so an empty fixed buffer is enough
        let mut storage = [0u8; 0];
        let fixed = FixedBufferAllocator::new(&mut storage);
        assert_eq!(edit_distance(b"ab", b"abcdefgh", 3, &fixed).unwrap(), 3);
    }

    #[test]
    fn test_allocation_failure_sentinel() {
        let mut storage = [0u8; 4];
        let fixed = FixedBufferAllocator::new(&mut storage);
        let a = vec![b'x'; 100];
        let b = vec![b'y'; 100];
        let err = edit_distance(&a, &b, 0, &fixed).unwrap_err();
        assert_eq!(err.category(), "memory");
        assert_eq!(edit_distance_or_sentinel(&a, &b, 0, &fixed), ALLOCATION_FAILURE);
    }

    #[test]
    fn test_alignment_empty_sides() {
        let costs = CostMatrix::unit(1, -1);
        let alloc = SystemAllocator;
        assert_eq!(alignment_score(b"", b"abcd", &costs, -2, &alloc).unwrap(), -8);
        assert_eq!(alignment_score(b"abc", b"", &costs, -2, &alloc).unwrap(), -6);
        assert_eq!(alignment_score(b"", b"", &costs, -2, &alloc).unwrap(), 0);
    }

    #[test]
    fn test_alignment_relates_to_levenshtein() {
        let costs = CostMatrix::default();
        let alloc = SystemAllocator;
        for (a, b) in [(&b"kitten"[..], &b"sitting"[..]), (b"flaw", b"lawn"), (b"abc", b"abc")] {
            let distance = edit_distance(a, b, 0, &alloc).unwrap() as i64;
            assert_eq!(alignment_score(a, b, &costs, -1, &alloc).unwrap(), -distance);
        }
    }

    #[test]
    fn test_hamming() {
        assert_eq!(hamming_distance(b"", b"", 0), 0);
        assert_eq!(hamming_distance(b"0123456789abcdef", b"0123456789abcdeX", 0), 1);
        assert_eq!(hamming_distance(b"\x00\x80\x01\xFF", b"\x80\x00\xFF\x01", 0), 4);
        assert_eq!(hamming_distance(b"aaaaaaaaaaaaaaaaaaaa", b"bbbbbbbbbbbbbbbbbbbb", 5), 5);
        assert_eq!(hamming_distance(b"a", b"abcdefg", 3), 3);
    }

    #[test]
    fn test_batch_distances() {
        let left = ["kitten", "flaw", ""];
        let right = ["sitting", "lawn", "abc"];
        let mut out = [0usize; 3];
        edit_distances(&left[..], &right[..], 0, &SystemAllocator, &mut out).unwrap();
        assert_eq!(out, [3, 2, 3]);

        let mut short = [0usize; 2];
        assert!(edit_distances(&left[..], &right[..], 0, &SystemAllocator, &mut short).is_err());
    }
}
