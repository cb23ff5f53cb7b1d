//! Row-parallel kernels for the vector backends
//!
//! Each DP row is computed in two passes. The first takes the diagonal and
//! vertical candidates, which only depend on the previous row, across the
//! whole row at once. The second resolves the horizontal (insertion) chain
//! with a blocked prefix scan: for distances the running minimum of
//! `cell + (n - i)`, for alignment the running maximum of `cell - i * gap`.
//!
//! The passes are written over fixed-size blocks so the compiler can keep them
//! in vector registers; the entry points compile them under the backend's
//! target features.

use super::{serial::as_scores, serial::distance_cap, with_lanes, CostMatrix};
use crate::error::Result;
use crate::memory::{Allocator, Lane, LaneWidth, ScratchBuffer};

const BLOCK: usize = 16;

#[inline(always)]
pub(crate) fn edit_distance_rows(a: &[u8], b: &[u8], bound: usize, alloc: &dyn Allocator) -> Result<usize> {
    let n = a.len();
    let cap = distance_cap(b.len(), bound);
    // the scan key `cell + (n - i)` peaks at `cap + 1 + n`
    let width = LaneWidth::for_max_value(cap + n + 2);
    let mut scratch = ScratchBuffer::for_lanes(alloc, width, 2 * (n + 1))?;
    with_lanes!(width, T => {
        let lanes = scratch.as_lanes::<T>()?;
        Ok(distance_rows::<T>(a, b, cap, bound != 0, lanes))
    })
}

#[inline(always)]
fn distance_rows<T: Lane>(a: &[u8], b: &[u8], cap: usize, bounded: bool, lanes: &mut [T]) -> usize {
    let n = a.len();
    let cap_lane = T::from_usize(cap);
    let one = T::from_usize(1);
    let zero = T::from_usize(0);
    let (mut prev, mut curr) = lanes.split_at_mut(n + 1);

    for (i, cell) in prev.iter_mut().enumerate() {
        *cell = T::from_usize(i.min(cap));
    }

    for (j, &bc) in b.iter().enumerate() {
        curr[0] = T::from_usize((j + 1).min(cap));

        // pass 1: substitution and deletion, independent across the row
        for ((cell, &ac), pair) in curr[1..].iter_mut().zip(a).zip(prev.windows(2)) {
            let substitute = pair[0].add_lane(if ac == bc { zero } else { one });
            *cell = substitute.min(pair[1].add_lane(one));
        }

        // pass 2: insertion chain as a prefix minimum of `cell + (n - i)`
        let mut carry = T::MAX;
        let mut row_min = T::MAX;
        for (block_index, chunk) in curr.chunks_mut(BLOCK).enumerate() {
            let base = block_index * BLOCK;
            let mut keys = [T::MAX; BLOCK];
            for (k, cell) in chunk.iter().enumerate() {
                keys[k] = cell.add_lane(T::from_usize(n - (base + k)));
            }
            let mut step = 1;
            while step < BLOCK {
                let shifted = keys;
                for k in step..BLOCK {
                    keys[k] = keys[k].min(shifted[k - step]);
                }
                step <<= 1;
            }
            for (k, cell) in chunk.iter_mut().enumerate() {
                let key = keys[k].min(carry);
                let value = key.sub_lane(T::from_usize(n - (base + k))).min(cap_lane);
                *cell = value;
                row_min = row_min.min(value);
            }
            carry = carry.min(keys[chunk.len() - 1]);
        }

        if bounded && row_min >= cap_lane {
            return cap;
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[n].to_usize()
}

#[inline(always)]
pub(crate) fn alignment_rows(
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
    let (mut prev, mut curr) = (as_scores(prev), as_scores(curr));

    for (i, cell) in prev.iter_mut().enumerate() {
        *cell = i as i64 * gap;
    }

    for (j, &bc) in b.iter().enumerate() {
        curr[0] = (j as i64 + 1) * gap;

        // pass 1: substitution and deletion
        for ((cell, &ac), pair) in curr[1..].iter_mut().zip(a).zip(prev.windows(2)) {
            let substitute = pair[0] + costs.get(ac, bc) as i64;
            *cell = substitute.max(pair[1] + gap);
        }

        // pass 2: insertion chain as a prefix maximum of `cell - i * gap`
        let mut carry = i64::MIN;
        for (block_index, chunk) in curr.chunks_mut(BLOCK).enumerate() {
            let base = block_index * BLOCK;
            let mut keys = [i64::MIN; BLOCK];
            for (k, cell) in chunk.iter().enumerate() {
                keys[k] = *cell - (base + k) as i64 * gap;
            }
            let mut step = 1;
            while step < BLOCK {
                let shifted = keys;
                for k in step..BLOCK {
                    keys[k] = keys[k].max(shifted[k - step]);
                }
                step <<= 1;
            }
            for (k, cell) in chunk.iter_mut().enumerate() {
                *cell = keys[k].max(carry) + (base + k) as i64 * gap;
            }
            carry = carry.max(keys[chunk.len() - 1]);
        }

        std::mem::swap(&mut prev, &mut curr);
    }
    Ok(prev[n])
}

// =============================================================================
// BACKEND ENTRY POINTS
// =============================================================================

#[cfg(all(target_arch = "x86_64", feature = "simd"))]
mod x86 {
    use super::*;

    #[target_feature(enable = "avx2")]
    unsafe fn edit_distance_avx2_impl(a: &[u8], b: &[u8], bound: usize, alloc: &dyn Allocator) -> Result<usize> {
        edit_distance_rows(a, b, bound, alloc)
    }

    #[target_feature(enable = "avx2")]
    unsafe fn alignment_avx2_impl(
        a: &[u8],
        b: &[u8],
        costs: &CostMatrix,
        gap: i8,
        alloc: &dyn Allocator,
    ) -> Result<i64> {
        alignment_rows(a, b, costs, gap, alloc)
    }

    pub(crate) fn edit_distance_avx2(a: &[u8], b: &[u8], bound: usize, alloc: &dyn Allocator) -> Result<usize> {
        // SAFETY: bound only when AVX2 was detected
        unsafe { edit_distance_avx2_impl(a, b, bound, alloc) }
    }

    pub(crate) fn alignment_avx2(
        a: &[u8],
        b: &[u8],
        costs: &CostMatrix,
        gap: i8,
        alloc: &dyn Allocator,
    ) -> Result<i64> {
        // SAFETY: bound only when AVX2 was detected
        unsafe { alignment_avx2_impl(a, b, costs, gap, alloc) }
    }

    #[cfg(feature = "avx512")]
    #[target_feature(enable = "avx512f,avx512bw")]
    unsafe fn edit_distance_avx512_impl(a: &[u8], b: &[u8], bound: usize, alloc: &dyn Allocator) -> Result<usize> {
        edit_distance_rows(a, b, bound, alloc)
    }

    #[cfg(feature = "avx512")]
    #[target_feature(enable = "avx512f,avx512bw")]
    unsafe fn alignment_avx512_impl(
        a: &[u8],
        b: &[u8],
        costs: &CostMatrix,
        gap: i8,
        alloc: &dyn Allocator,
    ) -> Result<i64> {
        alignment_rows(a, b, costs, gap, alloc)
    }

    #[cfg(feature = "avx512")]
    pub(crate) fn edit_distance_avx512(a: &[u8], b: &[u8], bound: usize, alloc: &dyn Allocator) -> Result<usize> {
        // SAFETY: bound only when AVX-512BW was detected
        unsafe { edit_distance_avx512_impl(a, b, bound, alloc) }
    }

    #[cfg(feature = "avx512")]
    pub(crate) fn alignment_avx512(
        a: &[u8],
        b: &[u8],
        costs: &CostMatrix,
        gap: i8,
        alloc: &dyn Allocator,
    ) -> Result<i64> {
        // SAFETY: bound only when AVX-512BW was detected
        unsafe { alignment_avx512_impl(a, b, costs, gap, alloc) }
    }
}

#[cfg(all(target_arch = "x86_64", feature = "simd"))]
pub(crate) use x86::*;

#[cfg(all(target_arch = "aarch64", feature = "simd"))]
mod neon {
    use super::*;

    #[target_feature(enable = "neon")]
    unsafe fn edit_distance_neon_impl(a: &[u8], b: &[u8], bound: usize, alloc: &dyn Allocator) -> Result<usize> {
        edit_distance_rows(a, b, bound, alloc)
    }

    #[target_feature(enable = "neon")]
    unsafe fn alignment_neon_impl(
        a: &[u8],
        b: &[u8],
        costs: &CostMatrix,
        gap: i8,
        alloc: &dyn Allocator,
    ) -> Result<i64> {
        alignment_rows(a, b, costs, gap, alloc)
    }

    pub(crate) fn edit_distance_neon(a: &[u8], b: &[u8], bound: usize, alloc: &dyn Allocator) -> Result<usize> {
        // SAFETY: bound only when NEON was detected
        unsafe { edit_distance_neon_impl(a, b, bound, alloc) }
    }

    pub(crate) fn alignment_neon(
        a: &[u8],
        b: &[u8],
        costs: &CostMatrix,
        gap: i8,
        alloc: &dyn Allocator,
    ) -> Result<i64> {
        // SAFETY: bound only when NEON was detected
        unsafe { alignment_neon_impl(a, b, costs, gap, alloc) }
    }
}

#[cfg(all(target_arch = "aarch64", feature = "simd"))]
pub(crate) use neon::*;
