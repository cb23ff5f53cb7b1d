//! Bulk byte operations: copy, overlapping move, fill, table lookup
//!
//! `copy`, `move_within` and `fill` route through the installed dispatch
//! table. The kernels below take raw pointers because overlapping moves cannot
//! be expressed with two live slices; the safe wrappers in
//! [`Backends`](crate::simd::Backends) validate lengths and ranges first.

use crate::error::{check_range, Result, StrandError};
use crate::simd::backends;
use std::fmt;
use std::ops::Range;

/// Copy `src` into `dst`; both must have the same length
///
/// # Examples
///
/// ```rust
/// let mut dst = [0u8; 5];
/// strand::copy(&mut dst, b"hello").unwrap();
/// assert_eq!(&dst, b"hello");
/// assert!(strand::copy(&mut dst, b"hi").is_err());
/// ```
#[inline]
pub fn copy(dst: &mut [u8], src: &[u8]) -> Result<()> {
    backends().copy(dst, src)
}

/// Move `buf[src]` to `buf[dest..]`, ranges may overlap
///
/// ```rust
/// let mut buf = *b"abcdef";
/// strand::move_within(&mut buf, 0..4, 2).unwrap();
/// assert_eq!(&buf, b"ababcd");
/// ```
#[inline]
pub fn move_within(buf: &mut [u8], src: Range<usize>, dest: usize) -> Result<()> {
    backends().move_within(buf, src, dest)
}

/// Set every byte of `buf` to `value`
#[inline]
pub fn fill(buf: &mut [u8], value: u8) {
    backends().fill(buf, value)
}

/// 256-entry byte translation table
#[derive(Clone, PartialEq, Eq)]
pub struct LookupTable {
    map: [u8; 256],
}

impl LookupTable {
    /// Table mapping every byte to itself
    pub fn identity() -> Self {
        let mut map = [0u8; 256];
        for (i, slot) in map.iter_mut().enumerate() {
            *slot = i as u8;
        }
        Self { map }
    }

    /// Table built from a byte mapping function
    pub fn from_fn<F: FnMut(u8) -> u8>(mut f: F) -> Self {
        let mut map = [0u8; 256];
        for (i, slot) in map.iter_mut().enumerate() {
            *slot = f(i as u8);
        }
        Self { map }
    }

    /// ASCII upper case letters mapped to lower case
    pub fn ascii_lowercase() -> Self {
        Self::from_fn(|b| b.to_ascii_lowercase())
    }

    /// ASCII lower case letters mapped to upper case
    pub fn ascii_uppercase() -> Self {
        Self::from_fn(|b| b.to_ascii_uppercase())
    }

    /// Translation of one byte
    #[inline(always)]
    pub fn get(&self, byte: u8) -> u8 {
        self.map[byte as usize]
    }

    /// Override the translation of one byte
    pub fn set(&mut self, byte: u8, value: u8) {
        self.map[byte as usize] = value;
    }

    /// The raw table
    pub fn as_bytes(&self) -> &[u8; 256] {
        &self.map
    }
}

impl Default for LookupTable {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for LookupTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let changed = self.map.iter().enumerate().filter(|&(i, &v)| i as u8 != v).count();
        f.debug_struct("LookupTable").field("remapped", &changed).finish()
    }
}

/// Translate `src` through `table` into `dst`; both must have the same length
///
/// ```rust
/// use strand::LookupTable;
/// let mut out = [0u8; 5];
/// strand::lookup(&mut out, b"HeLLo", &LookupTable::ascii_lowercase()).unwrap();
/// assert_eq!(&out, b"hello");
/// ```
pub fn lookup(dst: &mut [u8], src: &[u8], table: &LookupTable) -> Result<()> {
    if dst.len() != src.len() {
        return Err(StrandError::invalid_input(format!(
            "lookup length mismatch: dst {} src {}",
            dst.len(),
            src.len()
        )));
    }
    let mut dst_chunks = dst.chunks_exact_mut(8);
    let mut src_chunks = src.chunks_exact(8);
    for (d, s) in (&mut dst_chunks).zip(&mut src_chunks) {
        for i in 0..8 {
            d[i] = table.get(s[i]);
        }
    }
    for (d, &s) in dst_chunks.into_remainder().iter_mut().zip(src_chunks.remainder()) {
        *d = table.get(s);
    }
    Ok(())
}

/// Translate `buf` through `table` in place
pub fn lookup_in_place(buf: &mut [u8], table: &LookupTable) {
    for b in buf.iter_mut() {
        *b = table.get(*b);
    }
}

/// Sum of all bytes of `text`
pub fn checksum(text: &[u8]) -> u64 {
    let mut chunks = text.chunks_exact(8);
    let mut lanes = [0u64; 8];
    for chunk in &mut chunks {
        for (lane, &b) in lanes.iter_mut().zip(chunk) {
            *lane += b as u64;
        }
    }
    let tail: u64 = chunks.remainder().iter().map(|&b| b as u64).sum();
    lanes.iter().sum::<u64>() + tail
}

/// Validate a `move_within` request, returning `(src_start, len, dest)`
pub(crate) fn check_move(buf_len: usize, src: &Range<usize>, dest: usize) -> Result<(usize, usize, usize)> {
    check_range(src.start, src.end, buf_len)?;
    let len = src.end - src.start;
    let dest_end = dest
        .checked_add(len)
        .ok_or_else(|| StrandError::out_of_bounds(dest, buf_len))?;
    if dest_end > buf_len {
        return Err(StrandError::out_of_bounds(dest_end, buf_len));
    }
    Ok((src.start, len, dest))
}

// =============================================================================
// SERIAL IMPLEMENTATIONS
// =============================================================================

pub(crate) mod serial {
    use std::ptr;

    const WORD: usize = 8;

    /// Word-at-a-time copy of non-overlapping regions
    ///
    /// # Safety
    ///
    /// `src` readable and `dst` writable for `len` bytes, regions disjoint.
    pub(crate) unsafe fn copy(dst: *mut u8, src: *const u8, len: usize) {
        let mut i = 0;
        unsafe {
            while i + WORD <= len {
                let word = ptr::read_unaligned(src.add(i) as *const u64);
                ptr::write_unaligned(dst.add(i) as *mut u64, word);
                i += WORD;
            }
            while i < len {
                *dst.add(i) = *src.add(i);
                i += 1;
            }
        }
    }

    /// Overlap-safe copy: forward when `dst < src`, backward otherwise
    ///
    /// # Safety
    ///
    /// `src` readable and `dst` writable for `len` bytes.
    pub(crate) unsafe fn copy_overlapping(dst: *mut u8, src: *const u8, len: usize) {
        if (dst as usize) < (src as usize) {
            // every word is read before any byte at or above it is written
            unsafe { copy(dst, src, len) }
            return;
        }
        let mut end = len;
        unsafe {
            while end >= WORD {
                let word = ptr::read_unaligned(src.add(end - WORD) as *const u64);
                ptr::write_unaligned(dst.add(end - WORD) as *mut u64, word);
                end -= WORD;
            }
            while end > 0 {
                end -= 1;
                *dst.add(end) = *src.add(end);
            }
        }
    }

    pub(crate) fn fill(buf: &mut [u8], value: u8) {
        let word = u64::from_ne_bytes([value; 8]);
        let mut chunks = buf.chunks_exact_mut(WORD);
        for chunk in &mut chunks {
            chunk.copy_from_slice(&word.to_ne_bytes());
        }
        for b in chunks.into_remainder() {
            *b = value;
        }
    }
}

// =============================================================================
// AVX2 / AVX-512 IMPLEMENTATIONS
// =============================================================================

#[cfg(all(target_arch = "x86_64", feature = "simd"))]
pub(crate) mod x86 {
    use super::serial;
    use std::arch::x86_64::*;

    /// # Safety
    ///
    /// AVX2 available; `src` readable and `dst` writable for `len` bytes, disjoint.
    #[target_feature(enable = "avx2")]
    pub(crate) unsafe fn copy_avx2(dst: *mut u8, src: *const u8, len: usize) {
        let mut i = 0;
        unsafe {
            while i + 32 <= len {
                let data = _mm256_loadu_si256(src.add(i) as *const __m256i);
                _mm256_storeu_si256(dst.add(i) as *mut __m256i, data);
                i += 32;
            }
            serial::copy(dst.add(i), src.add(i), len - i);
        }
    }

    /// # Safety
    ///
    /// AVX2 available; `src` readable and `dst` writable for `len` bytes.
    #[target_feature(enable = "avx2")]
    pub(crate) unsafe fn copy_overlapping_avx2(dst: *mut u8, src: *const u8, len: usize) {
        unsafe {
            if (dst as usize) < (src as usize) {
                copy_avx2(dst, src, len);
                return;
            }
            let mut end = len;
            while end >= 32 {
                let data = _mm256_loadu_si256(src.add(end - 32) as *const __m256i);
                _mm256_storeu_si256(dst.add(end - 32) as *mut __m256i, data);
                end -= 32;
            }
            serial::copy_overlapping(dst, src, end);
        }
    }

    #[target_feature(enable = "avx2")]
    unsafe fn fill_avx2_impl(buf: &mut [u8], value: u8) {
        let len = buf.len();
        let ptr = buf.as_mut_ptr();
        let mut i = 0;
        unsafe {
            let pattern = _mm256_set1_epi8(value as i8);
            while i + 32 <= len {
                _mm256_storeu_si256(ptr.add(i) as *mut __m256i, pattern);
                i += 32;
            }
        }
        serial::fill(&mut buf[i..], value);
    }

    pub(crate) fn fill_avx2(buf: &mut [u8], value: u8) {
        // SAFETY: bound only when AVX2 was detected
        unsafe { fill_avx2_impl(buf, value) }
    }

    /// # Safety
    ///
    /// AVX-512F available; `src` readable and `dst` writable for `len` bytes, disjoint.
    #[cfg(feature = "avx512")]
    #[target_feature(enable = "avx512f,avx512bw")]
    pub(crate) unsafe fn copy_avx512(dst: *mut u8, src: *const u8, len: usize) {
        let mut i = 0;
        unsafe {
            while i + 64 <= len {
                let data = _mm512_loadu_epi8(src.add(i) as *const i8);
                _mm512_storeu_epi8(dst.add(i) as *mut i8, data);
                i += 64;
            }
            // masked store for the tail
            let rest = len - i;
            if rest > 0 {
                let mask: __mmask64 = (1u64 << rest) - 1;
                let data = _mm512_maskz_loadu_epi8(mask, src.add(i) as *const i8);
                _mm512_mask_storeu_epi8(dst.add(i) as *mut i8, mask, data);
            }
        }
    }

    /// # Safety
    ///
    /// AVX-512F available; `src` readable and `dst` writable for `len` bytes.
    #[cfg(feature = "avx512")]
    #[target_feature(enable = "avx512f,avx512bw")]
    pub(crate) unsafe fn copy_overlapping_avx512(dst: *mut u8, src: *const u8, len: usize) {
        unsafe {
            if (dst as usize) < (src as usize) {
                copy_avx512(dst, src, len);
                return;
            }
            let mut end = len;
            while end >= 64 {
                let data = _mm512_loadu_epi8(src.add(end - 64) as *const i8);
                _mm512_storeu_epi8(dst.add(end - 64) as *mut i8, data);
                end -= 64;
            }
            if end > 0 {
                let mask: __mmask64 = (1u64 << end) - 1;
                let data = _mm512_maskz_loadu_epi8(mask, src as *const i8);
                _mm512_mask_storeu_epi8(dst as *mut i8, mask, data);
            }
        }
    }

    #[cfg(feature = "avx512")]
    #[target_feature(enable = "avx512f,avx512bw")]
    unsafe fn fill_avx512_impl(buf: &mut [u8], value: u8) {
        let len = buf.len();
        let ptr = buf.as_mut_ptr();
        let mut i = 0;
        unsafe {
            let pattern = _mm512_set1_epi8(value as i8);
            while i + 64 <= len {
                _mm512_storeu_epi8(ptr.add(i) as *mut i8, pattern);
                i += 64;
            }
            let rest = len - i;
            if rest > 0 {
                _mm512_mask_storeu_epi8(ptr.add(i) as *mut i8, (1u64 << rest) - 1, pattern);
            }
        }
    }

    #[cfg(feature = "avx512")]
    pub(crate) fn fill_avx512(buf: &mut [u8], value: u8) {
        // SAFETY: bound only when AVX-512BW was detected
        unsafe { fill_avx512_impl(buf, value) }
    }
}

// =============================================================================
// NEON IMPLEMENTATIONS
// =============================================================================

#[cfg(all(target_arch = "aarch64", feature = "simd"))]
pub(crate) mod neon {
    use super::serial;
    use std::arch::aarch64::*;

    /// # Safety
    ///
    /// NEON available; `src` readable and `dst` writable for `len` bytes, disjoint.
    #[target_feature(enable = "neon")]
    pub(crate) unsafe fn copy_neon(dst: *mut u8, src: *const u8, len: usize) {
        let mut i = 0;
        unsafe {
            while i + 16 <= len {
                vst1q_u8(dst.add(i), vld1q_u8(src.add(i)));
                i += 16;
            }
            serial::copy(dst.add(i), src.add(i), len - i);
        }
    }

    /// # Safety
    ///
    /// NEON available; `src` readable and `dst` writable for `len` bytes.
    #[target_feature(enable = "neon")]
    pub(crate) unsafe fn copy_overlapping_neon(dst: *mut u8, src: *const u8, len: usize) {
        unsafe {
            if (dst as usize) < (src as usize) {
                copy_neon(dst, src, len);
                return;
            }
            let mut end = len;
            while end >= 16 {
                let data = vld1q_u8(src.add(end - 16));
                vst1q_u8(dst.add(end - 16), data);
                end -= 16;
            }
            serial::copy_overlapping(dst, src, end);
        }
    }

    #[target_feature(enable = "neon")]
    unsafe fn fill_neon_impl(buf: &mut [u8], value: u8) {
        let len = buf.len();
        let ptr = buf.as_mut_ptr();
        let mut i = 0;
        unsafe {
            let pattern = vdupq_n_u8(value);
            while i + 16 <= len {
                vst1q_u8(ptr.add(i), pattern);
                i += 16;
            }
        }
        serial::fill(&mut buf[i..], value);
    }

    pub(crate) fn fill_neon(buf: &mut [u8], value: u8) {
        // SAFETY: bound only when NEON was detected
        unsafe { fill_neon_impl(buf, value) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_copy_overlapping_both_directions() {
        for shift in [1usize, 3, 8, 13] {
            let original: Vec<u8> = (0..100u8).collect();

            let mut forward = original.clone();
            let ptr = forward.as_mut_ptr();
            unsafe { serial::copy_overlapping(ptr, ptr.add(shift), 100 - shift) };
            assert_eq!(&forward[..100 - shift], &original[shift..]);

            let mut backward = original.clone();
            let ptr = backward.as_mut_ptr();
            unsafe { serial::copy_overlapping(ptr.add(shift), ptr, 100 - shift) };
            assert_eq!(&backward[shift..], &original[..100 - shift]);
        }
    }

    #[test]
    fn test_serial_fill() {
        let mut buf = vec![0u8; 37];
        serial::fill(&mut buf, 0xAB);
        assert!(buf.iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_move_validation() {
        assert!(check_move(10, &(0..4), 6).is_ok());
        assert!(check_move(10, &(0..4), 7).is_err());
        assert!(check_move(10, &(4..11), 0).is_err());
        assert!(check_move(10, &(3..3), 10).is_ok());
        assert!(check_move(10, &(0..1), usize::MAX).is_err());
    }

    #[test]
    fn test_lookup_tables() {
        let mut out = vec![0u8; 20];
        lookup(&mut out, b"Hello, World! 123 XY", &LookupTable::ascii_uppercase()).unwrap();
        assert_eq!(&out, b"HELLO, WORLD! 123 XY");

        let mut table = LookupTable::identity();
        table.set(b'a', b'@');
        let mut buf = *b"banana";
        lookup_in_place(&mut buf, &table);
        assert_eq!(&buf, b"b@n@n@");
        assert!(lookup(&mut out, b"short", &table).is_err());
    }

    #[test]
    fn test_checksum() {
        assert_eq!(checksum(b""), 0);
        assert_eq!(checksum(&[255u8; 1000]), 255_000);
        let data: Vec<u8> = (0..=255u8).collect();
        assert_eq!(checksum(&data), (0..=255u64).sum::<u64>());
    }
}
