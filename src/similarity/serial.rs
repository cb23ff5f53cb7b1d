//! Serial dynamic-programming kernels
//!
//! Inputs arrive pre-processed by the public wrappers: for distances, `a` is
//! the shorter side, shared prefix and suffix are trimmed, neither side is
//! empty. Every intermediate value is clamped to the cap (the bound, or the
//! longer length when unbounded), so lanes never need more than `cap + 1`.

use super::{with_lanes, CostMatrix};
use crate::error::Result;
use crate::memory::{Allocator, Lane, LaneWidth, ScratchBuffer};

/// Wagner–Fischer over two rows, or the skewed diagonal walk for unbounded
/// equal-length inputs
pub(crate) fn edit_distance(a: &[u8], b: &[u8], bound: usize, alloc: &dyn Allocator) -> Result<usize> {
    let cap = distance_cap(b.len(), bound);
    let width = LaneWidth::for_max_value(cap + 1);
    let n = a.len();

    if bound == 0 && a.len() == b.len() {
        let mut scratch = ScratchBuffer::for_lanes(alloc, width, 3 * (n + 1))?;
        return with_lanes!(width, T => {
            let lanes = scratch.as_lanes::<T>()?;
            Ok(diagonal::<T>(a, b, lanes))
        });
    }

    let mut scratch = ScratchBuffer::for_lanes(alloc, width, 2 * (n + 1))?;
    with_lanes!(width, T => {
        let lanes = scratch.as_lanes::<T>()?;
        Ok(two_rows::<T>(a, b, cap, bound != 0, lanes))
    })
}

/// Largest value any cell has to represent
#[inline]
pub(crate) fn distance_cap(longer: usize, bound: usize) -> usize {
    if bound == 0 {
        longer
    } else {
        bound.min(longer)
    }
}

fn two_rows<T: Lane>(a: &[u8], b: &[u8], cap: usize, bounded: bool, lanes: &mut [T]) -> usize {
    let n = a.len();
    let cap_lane = T::from_usize(cap);
    let (mut prev, mut curr) = lanes.split_at_mut(n + 1);

    for (i, cell) in prev.iter_mut().enumerate() {
        *cell = T::from_usize(i.min(cap));
    }

    for (j, &bc) in b.iter().enumerate() {
        curr[0] = T::from_usize((j + 1).min(cap));
        let mut row_min = curr[0];
        for i in 0..n {
            let diagonal = if a[i] == bc { prev[i] } else { prev[i].inc() };
            let value = diagonal.min(prev[i + 1].inc()).min(curr[i].inc()).min(cap_lane);
            curr[i + 1] = value;
            row_min = row_min.min(value);
        }
        if bounded && row_min >= cap_lane {
            return cap;
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n].to_usize()
}

fn diagonal<T: Lane>(a: &[u8], b: &[u8], lanes: &mut [T]) -> usize {
    let n = a.len();
    debug_assert_eq!(n, b.len());
    let (older, rest) = lanes.split_at_mut(n + 1);
    let (newer, current) = rest.split_at_mut(n + 1);
    let (mut older, mut newer, mut current) = (older, newer, current);

    // cells on anti-diagonal k are (i, k - i), stored at index i
    for k in 0..=2 * n {
        let lo = k.saturating_sub(n);
        let hi = k.min(n);
        for i in lo..=hi {
            let j = k - i;
            current[i] = if i == 0 {
                T::from_usize(j)
            } else if j == 0 {
                T::from_usize(i)
            } else {
                let substitute = if a[i - 1] == b[j - 1] {
                    older[i - 1]
                } else {
                    older[i - 1].inc()
                };
                substitute.min(newer[i - 1].inc()).min(newer[i].inc())
            };
        }
        std::mem::swap(&mut older, &mut newer);
        std::mem::swap(&mut newer, &mut current);
    }
    newer[n].to_usize()
}

/// Needleman–Wunsch over two rows of `i64` scores
pub(crate) fn alignment_score(
    a: &[u8],
    b: &[u8],
    costs: &CostMatrix,
    gap: i8,
    alloc: &dyn Allocator,
) -> Result<i64> {
    let n = a.len();
    let gap = gap as i64;
    let mut scratch = ScratchBuffer::for_lanes(alloc, LaneWidth::U64, 2 * (n + 1))?;
    let lanes = scratch.as_lanes::<u64>()?;
    let (prev, curr) = lanes.split_at_mut(n + 1);
    // scores are stored as two's complement bit patterns
    let (mut prev, mut curr) = (as_scores(prev), as_scores(curr));

    for (i, cell) in prev.iter_mut().enumerate() {
        *cell = i as i64 * gap;
    }
    for (j, &bc) in b.iter().enumerate() {
        curr[0] = (j as i64 + 1) * gap;
        for i in 0..n {
            let diagonal = prev[i] + costs.get(a[i], bc) as i64;
            let up = prev[i + 1] + gap;
            let left = curr[i] + gap;
            curr[i + 1] = diagonal.max(up).max(left);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    Ok(prev[n])
}

/// Reinterpret zeroed `u64` lanes as signed scores
#[inline]
pub(crate) fn as_scores(lanes: &mut [u64]) -> &mut [i64] {
    // SAFETY: u64 and i64 share size, alignment and validity
    unsafe { std::slice::from_raw_parts_mut(lanes.as_mut_ptr().cast::<i64>(), lanes.len()) }
}
