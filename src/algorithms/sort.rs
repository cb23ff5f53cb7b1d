//! Argsort over byte-string sequences
//!
//! The sort permutes a caller-owned `order` array of `u64` slots. While it
//! runs, each slot carries the string index in its low 32 bits and the first
//! four bytes of that string, big-endian and zero-padded, in its high 32 bits.
//! Most comparisons are then settled by a single integer compare.
//!
//! The packed prefix is split by a few most-significant-byte radix rounds;
//! every resulting bucket is finished by an introsort that falls back to a
//! full string comparison only when prefixes tie. Slots are restored to bare
//! indices before returning.
//!
//! # Examples
//!
//! ```rust
//! use strand::{argsort, SortConfig};
//!
//! let words = ["pear", "apple", "fig", "apricot"];
//! let mut order = [0u64, 1, 2, 3];
//! argsort(&words[..], &mut order, &SortConfig::default()).unwrap();
//! assert_eq!(order, [1, 3, 2, 0]);
//! ```

use crate::algorithms::Sequence;
use crate::config::{Config, SortConfig};
use crate::error::{Result, StrandError};
use crate::memory::{Allocator, LaneWidth, ScratchBuffer, SystemAllocator};
use std::cmp::Ordering;

/// Largest number of strings a single sort can order
pub const MAX_SORT_LEN: usize = 1 << 32;

const INDEX_MASK: u64 = 0xFFFF_FFFF;

/// Sort `order` so the referenced strings are byte-wise non-decreasing.
///
/// `order` must hold `seq.len()` indices into `seq`, usually a permutation of
/// `0..seq.len()`. Scratch for the radix rounds comes from the system heap.
pub fn argsort<S>(seq: &S, order: &mut [u64], config: &SortConfig) -> Result<()>
where
    S: Sequence + ?Sized,
{
    argsort_in(seq, order, config, &SystemAllocator)
}

/// [`argsort`] drawing its radix scratch from `alloc`
pub fn argsort_in<S>(seq: &S, order: &mut [u64], config: &SortConfig, alloc: &dyn Allocator) -> Result<()>
where
    S: Sequence + ?Sized,
{
    config.validate()?;
    check_order(seq, order)?;
    if order.len() < 2 {
        return Ok(());
    }

    let fold = config.case_insensitive;
    for slot in order.iter_mut() {
        let index = *slot;
        *slot = (pack_prefix(seq.get(index as usize), fold) << 32) | index;
    }

    let sorter = Sorter {
        seq,
        fold,
        threshold: config.insertion_threshold,
        rounds: config.radix_rounds,
        limit: config.partial_order_length.unwrap_or(order.len()),
    };

    let result = if sorter.rounds == 0 || order.len() <= sorter.threshold {
        sorter.introsort(order);
        Ok(())
    } else {
        ScratchBuffer::for_lanes(alloc, LaneWidth::U64, order.len()).and_then(|mut scratch| {
            let lanes = scratch.as_lanes::<u64>()?;
            sorter.radix(order, lanes, 0, 0);
            Ok(())
        })
    };

    // the index bits are untouched even when scratch was refused
    for slot in order.iter_mut() {
        *slot &= INDEX_MASK;
    }
    result
}

/// Fresh `0..seq.len()` order sorted with `config`
pub fn sorted_order<S>(seq: &S, config: &SortConfig) -> Result<Vec<u64>>
where
    S: Sequence + ?Sized,
{
    if seq.len() > MAX_SORT_LEN {
        return Err(too_many(seq.len()));
    }
    let mut order: Vec<u64> = (0..seq.len() as u64).collect();
    argsort(seq, &mut order, config)?;
    Ok(order)
}

/// Merge the sorted runs `order[..mid]` and `order[mid..]` in place.
///
/// Both runs must already be ordered under `config`'s comparison. The merge is
/// stable and needs no scratch: it rotates blocks instead of buffering them.
///
/// ```rust
/// use strand::{algorithms::merge_sorted_runs, SortConfig};
///
/// let words = ["b", "d", "a", "c", "e"];
/// let mut order = [0u64, 1, 2, 3, 4];
/// merge_sorted_runs(&words[..], &mut order, 2, &SortConfig::default()).unwrap();
/// assert_eq!(order, [2, 0, 3, 1, 4]);
/// ```
pub fn merge_sorted_runs<S>(seq: &S, order: &mut [u64], mid: usize, config: &SortConfig) -> Result<()>
where
    S: Sequence + ?Sized,
{
    check_order(seq, order)?;
    if mid > order.len() {
        return Err(StrandError::out_of_bounds(mid, order.len()));
    }
    let fold = config.case_insensitive;
    let mut less = |x: &u64, y: &u64| {
        compare_bytes(seq.get(*x as usize), seq.get(*y as usize), fold) == Ordering::Less
    };
    merge_in_place(order, mid, &mut less);
    Ok(())
}

/// Compare two strings byte-wise, optionally folding ASCII case
#[inline]
pub fn compare_bytes(a: &[u8], b: &[u8], fold: bool) -> Ordering {
    if !fold {
        return a.cmp(b);
    }
    a.iter()
        .map(u8::to_ascii_lowercase)
        .cmp(b.iter().map(u8::to_ascii_lowercase))
}

pub(crate) fn check_order<S>(seq: &S, order: &[u64]) -> Result<()>
where
    S: Sequence + ?Sized,
{
    let count = seq.len();
    if count > MAX_SORT_LEN {
        return Err(too_many(count));
    }
    if order.len() != count {
        return Err(StrandError::invalid_input(format!(
            "order has {} slots for {} strings",
            order.len(),
            count
        )));
    }
    if let Some(position) = order.iter().position(|&index| index >= count as u64) {
        return Err(StrandError::invalid_input(format!(
            "order[{}] = {} is not an index below {}",
            position, order[position], count
        )));
    }
    Ok(())
}

fn too_many(count: usize) -> StrandError {
    StrandError::invalid_input(format!(
        "{} strings exceed the sortable maximum of {}",
        count, MAX_SORT_LEN
    ))
}

/// First four bytes, big-endian, zero-padded
#[inline]
fn pack_prefix(bytes: &[u8], fold: bool) -> u64 {
    let mut key = [0u8; 4];
    for (dst, &src) in key.iter_mut().zip(bytes) {
        *dst = if fold { src.to_ascii_lowercase() } else { src };
    }
    u32::from_be_bytes(key) as u64
}

struct Sorter<'s, S: ?Sized> {
    seq: &'s S,
    fold: bool,
    threshold: usize,
    rounds: usize,
    /// Buckets starting at or past this position are left unsorted
    limit: usize,
}

impl<S: Sequence + ?Sized> Sorter<'_, S> {
    #[inline]
    fn less(&self, x: &u64, y: &u64) -> bool {
        match (x >> 32).cmp(&(y >> 32)) {
            Ordering::Equal => {
                let a = self.seq.get((x & INDEX_MASK) as usize);
                let b = self.seq.get((y & INDEX_MASK) as usize);
                compare_bytes(a, b, self.fold) == Ordering::Less
            }
            other => other == Ordering::Less,
        }
    }

    /// One MSB counting pass over prefix byte `depth`, then recurse per bucket
    fn radix(&self, v: &mut [u64], scratch: &mut [u64], offset: usize, depth: usize) {
        if offset >= self.limit {
            return;
        }
        if depth == self.rounds || v.len() <= self.threshold {
            self.introsort(v);
            return;
        }

        let shift = 56 - 8 * depth;
        let mut counts = [0usize; 256];
        for &slot in v.iter() {
            counts[((slot >> shift) & 0xFF) as usize] += 1;
        }

        let mut starts = [0usize; 256];
        let mut sum = 0;
        for (start, &count) in starts.iter_mut().zip(counts.iter()) {
            *start = sum;
            sum += count;
        }

        let mut positions = starts;
        let tmp = &mut scratch[..v.len()];
        for &slot in v.iter() {
            let bucket = ((slot >> shift) & 0xFF) as usize;
            tmp[positions[bucket]] = slot;
            positions[bucket] += 1;
        }
        v.copy_from_slice(tmp);

        for (&start, &count) in starts.iter().zip(counts.iter()) {
            if count > 1 {
                self.radix(&mut v[start..start + count], scratch, offset + start, depth + 1);
            }
        }
    }

    fn introsort(&self, v: &mut [u64]) {
        let depth_limit = 2 * v.len().max(1).ilog2() as usize;
        self.introsort_loop(v, depth_limit);
    }

    fn introsort_loop(&self, mut v: &mut [u64], mut depth_limit: usize) {
        loop {
            let len = v.len();
            if len <= self.threshold {
                insertion_sort(v, &mut |x, y| self.less(x, y));
                return;
            }
            if depth_limit == 0 {
                heapsort(v, &mut |x, y| self.less(x, y));
                return;
            }
            depth_limit -= 1;

            let pivot = partition(v, &mut |x, y| self.less(x, y));
            let (left, right) = v.split_at_mut(pivot);
            let right = &mut right[1..];
            // recurse into the smaller side, loop on the larger
            if left.len() < right.len() {
                self.introsort_loop(left, depth_limit);
                v = right;
            } else {
                self.introsort_loop(right, depth_limit);
                v = left;
            }
        }
    }
}

pub(crate) fn insertion_sort<F>(v: &mut [u64], less: &mut F)
where
    F: FnMut(&u64, &u64) -> bool,
{
    for i in 1..v.len() {
        let item = v[i];
        let mut j = i;
        while j > 0 && less(&item, &v[j - 1]) {
            v[j] = v[j - 1];
            j -= 1;
        }
        v[j] = item;
    }
}

pub(crate) fn heapsort<F>(v: &mut [u64], less: &mut F)
where
    F: FnMut(&u64, &u64) -> bool,
{
    fn sift_down<F: FnMut(&u64, &u64) -> bool>(v: &mut [u64], mut node: usize, less: &mut F) {
        loop {
            let mut child = 2 * node + 1;
            if child >= v.len() {
                break;
            }
            if child + 1 < v.len() && less(&v[child], &v[child + 1]) {
                child += 1;
            }
            if !less(&v[node], &v[child]) {
                break;
            }
            v.swap(node, child);
            node = child;
        }
    }

    for i in (0..v.len() / 2).rev() {
        sift_down(v, i, less);
    }
    for end in (1..v.len()).rev() {
        v.swap(0, end);
        sift_down(&mut v[..end], 0, less);
    }
}

/// Hoare partition around the median of the first, middle and last slot.
///
/// Returns the pivot's final position; everything left of it is not greater,
/// everything right of it is not less. Requires `v.len() >= 3`.
fn partition<F>(v: &mut [u64], less: &mut F) -> usize
where
    F: FnMut(&u64, &u64) -> bool,
{
    let len = v.len();
    let (a, b, c) = (0, len / 2, len - 1);
    let median = if less(&v[a], &v[b]) {
        if less(&v[b], &v[c]) {
            b
        } else if less(&v[a], &v[c]) {
            c
        } else {
            a
        }
    } else if less(&v[a], &v[c]) {
        a
    } else if less(&v[b], &v[c]) {
        c
    } else {
        b
    };
    v.swap(0, median);

    let pivot = v[0];
    let mut i = 1;
    let mut j = len - 1;
    loop {
        while i <= j && less(&v[i], &pivot) {
            i += 1;
        }
        while i <= j && less(&pivot, &v[j]) {
            j -= 1;
        }
        if i >= j {
            break;
        }
        v.swap(i, j);
        i += 1;
        j -= 1;
    }
    v.swap(0, j);
    j
}

/// Stable in-place merge of `v[..mid]` and `v[mid..]` by block rotation
pub(crate) fn merge_in_place<F>(v: &mut [u64], mid: usize, less: &mut F)
where
    F: FnMut(&u64, &u64) -> bool,
{
    let len = v.len();
    if mid == 0 || mid >= len || !less(&v[mid], &v[mid - 1]) {
        return;
    }
    if len == 2 {
        v.swap(0, 1);
        return;
    }

    // split the longer run at its middle, find the matching cut in the other
    let (cut_left, cut_right) = if mid >= len - mid {
        let cut_left = mid / 2;
        let pivot = v[cut_left];
        let cut_right = mid + v[mid..].partition_point(|x| less(x, &pivot));
        (cut_left, cut_right)
    } else {
        let cut_right = mid + (len - mid) / 2;
        let pivot = v[cut_right];
        let cut_left = v[..mid].partition_point(|x| !less(&pivot, x));
        (cut_left, cut_right)
    };

    v[cut_left..cut_right].rotate_left(mid - cut_left);
    let new_mid = cut_left + (cut_right - mid);
    merge_in_place(&mut v[..new_mid], cut_left, less);
    merge_in_place(&mut v[new_mid..], cut_right - new_mid, less);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FixedBufferAllocator;

    fn strings(order: &[u64], words: &[&str]) -> Vec<String> {
        order.iter().map(|&i| words[i as usize].to_string()).collect()
    }

    fn identity(n: usize) -> Vec<u64> {
        (0..n as u64).collect()
    }

    fn pseudo_words(count: usize, seed: u64) -> Vec<Vec<u8>> {
        let mut state = seed;
        (0..count)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let len = (state >> 60) as usize;
                (0..len)
                    .map(|k| b"abAB\x00z"[((state >> (4 * k)) % 6) as usize])
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_basic_order() {
        let words = ["delta", "alpha", "charlie", "bravo", "alp", "", "alpha"];
        let mut order = identity(words.len());
        argsort(&words[..], &mut order, &SortConfig::default()).unwrap();
        let mut expected: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        expected.sort();
        assert_eq!(strings(&order, &words), expected);
    }

    #[test]
    fn test_prefix_ties_use_full_compare() {
        // identical packed prefixes, zero padding included
        let words: Vec<&[u8]> = vec![&b"abcdz"[..], &b"abcda"[..], &b"ab"[..], &b"ab\x00"[..], &b"abcd"[..]];
        let mut order = identity(words.len());
        argsort(&words, &mut order, &SortConfig::default()).unwrap();
        assert_eq!(order, [2, 3, 4, 1, 0]);
    }

    #[test]
    fn test_every_radix_depth_agrees() {
        let words = pseudo_words(500, 7);
        let mut expected = words.clone();
        expected.sort();
        for rounds in 0..=4 {
            for threshold in [2, 16, 64] {
                let config = SortConfig {
                    radix_rounds: rounds,
                    insertion_threshold: threshold,
                    ..SortConfig::default()
                };
                let mut order = identity(words.len());
                argsort(&words, &mut order, &config).unwrap();
                let sorted: Vec<Vec<u8>> = order.iter().map(|&i| words[i as usize].clone()).collect();
                assert_eq!(sorted, expected, "rounds {} threshold {}", rounds, threshold);
            }
        }
    }

    #[test]
    fn test_starting_permutation_does_not_matter() {
        let words = pseudo_words(200, 11);
        let mut forward = identity(words.len());
        let mut backward: Vec<u64> = (0..words.len() as u64).rev().collect();
        argsort(&words, &mut forward, &SortConfig::default()).unwrap();
        argsort(&words, &mut backward, &SortConfig::default()).unwrap();
        let a: Vec<&Vec<u8>> = forward.iter().map(|&i| &words[i as usize]).collect();
        let b: Vec<&Vec<u8>> = backward.iter().map(|&i| &words[i as usize]).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_many_duplicates_hit_heapsort_safely() {
        let words = vec!["same"; 3000];
        let mut order = identity(words.len());
        argsort(&words, &mut order, &SortConfig::default()).unwrap();
        let mut seen = order.clone();
        seen.sort_unstable();
        assert_eq!(seen, identity(words.len()));
    }

    #[test]
    fn test_case_insensitive() {
        let words = ["banana", "Apple", "cherry", "apricot", "BANANA"];
        let mut order = identity(words.len());
        argsort(&words[..], &mut order, &SortConfig::case_insensitive()).unwrap();
        let sorted = strings(&order, &words);
        assert_eq!(sorted[0], "Apple");
        assert_eq!(sorted[1], "apricot");
        assert_eq!(sorted[4], "cherry");
    }

    #[test]
    fn test_partial_order() {
        let words = pseudo_words(400, 3);
        let mut expected = words.clone();
        expected.sort();
        let mut order = identity(words.len());
        argsort(&words, &mut order, &SortConfig::partial(10)).unwrap();
        for k in 0..10 {
            assert_eq!(words[order[k] as usize], expected[k]);
        }
        let mut seen = order.clone();
        seen.sort_unstable();
        assert_eq!(seen, identity(words.len()));
    }

    #[test]
    fn test_inconsistent_input() {
        let words = ["a", "b", "c"];
        let mut short = [0u64, 1];
        assert!(argsort(&words[..], &mut short, &SortConfig::default()).is_err());
        let mut out_of_range = [0u64, 1, 3];
        let err = argsort(&words[..], &mut out_of_range, &SortConfig::default()).unwrap_err();
        assert_eq!(err.category(), "input");
        let bad_config = SortConfig {
            radix_rounds: 5,
            ..SortConfig::default()
        };
        let mut order = [0u64, 1, 2];
        assert!(argsort(&words[..], &mut order, &bad_config).is_err());
    }

    #[test]
    fn test_scratch_refusal_keeps_indices() {
        let words = pseudo_words(100, 5);
        let mut storage = [0u8; 16];
        let fixed = FixedBufferAllocator::new(&mut storage);
        let mut order = identity(words.len());
        assert!(argsort_in(&words, &mut order, &SortConfig::default(), &fixed).is_err());
        let mut seen = order.clone();
        seen.sort_unstable();
        assert_eq!(seen, identity(words.len()));
    }

    #[test]
    fn test_merge_in_place_is_stable() {
        // pairs of (key, tag); compare by key only
        let mut v: Vec<u64> = vec![10, 21, 30, 41, 11, 20, 31, 40, 50];
        let mut less = |x: &u64, y: &u64| x / 10 < y / 10;
        merge_in_place(&mut v, 4, &mut less);
        assert_eq!(v, [10, 11, 21, 20, 30, 31, 41, 40, 50]);
    }

    #[test]
    fn test_merge_sorted_runs() {
        let words = ["fig", "kiwi", "pear", "apple", "grape", "plum"];
        let mut order = identity(words.len());
        merge_sorted_runs(&words[..], &mut order, 3, &SortConfig::default()).unwrap();
        assert_eq!(strings(&order, &words), ["apple", "fig", "grape", "kiwi", "pear", "plum"]);
        assert!(merge_sorted_runs(&words[..], &mut order, 7, &SortConfig::default()).is_err());
    }

    #[test]
    fn test_heapsort_and_insertion() {
        let mut v: Vec<u64> = vec![9, 3, 7, 1, 8, 2, 2, 0];
        heapsort(&mut v, &mut |x, y| x < y);
        assert_eq!(v, [0, 1, 2, 2, 3, 7, 8, 9]);
        let mut w: Vec<u64> = vec![4, 4, 1, 3];
        insertion_sort(&mut w, &mut |x, y| x < y);
        assert_eq!(w, [1, 3, 4, 4]);
    }
}
