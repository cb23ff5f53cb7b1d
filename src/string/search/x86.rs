//! x86-64 vector search kernels (SSE4.2, AVX2, AVX-512BW)
//!
//! The crate-visible wrappers are safe functions so they fit the dispatch
//! table's function-pointer types. They are only ever reached through table
//! entries whose capability requirement was checked against the detected CPU
//! at bind time.

use super::{horspool_find, horspool_rfind, serial};
use crate::string::Charset;
use std::arch::x86_64::*;

// =============================================================================
// DISPATCH ENTRY POINTS
// =============================================================================

macro_rules! entry {
    ($name:ident, $module:ident :: $kernel:ident, ($($arg:ident : $ty:ty),*)) => {
        pub(crate) fn $name($($arg: $ty),*) -> Option<usize> {
            // SAFETY: bound only when the required capability was detected
            unsafe { $module::$kernel($($arg),*) }
        }
    };
}

entry!(find_byte_sse42, sse42::find_byte, (haystack: &[u8], byte: u8));
entry!(rfind_byte_sse42, sse42::rfind_byte, (haystack: &[u8], byte: u8));
entry!(find_sse42, sse42::find, (haystack: &[u8], needle: &[u8]));
entry!(rfind_sse42, sse42::rfind, (haystack: &[u8], needle: &[u8]));
entry!(find_charset_sse42, sse42::find_charset, (haystack: &[u8], set: &Charset));
entry!(rfind_charset_sse42, sse42::rfind_charset, (haystack: &[u8], set: &Charset));

entry!(find_byte_avx2, avx2::find_byte, (haystack: &[u8], byte: u8));
entry!(rfind_byte_avx2, avx2::rfind_byte, (haystack: &[u8], byte: u8));
entry!(find_avx2, avx2::find, (haystack: &[u8], needle: &[u8]));
entry!(rfind_avx2, avx2::rfind, (haystack: &[u8], needle: &[u8]));
entry!(find_charset_avx2, avx2::find_charset, (haystack: &[u8], set: &Charset));
entry!(rfind_charset_avx2, avx2::rfind_charset, (haystack: &[u8], set: &Charset));

#[cfg(feature = "avx512")]
entry!(find_byte_avx512, avx512::find_byte, (haystack: &[u8], byte: u8));
#[cfg(feature = "avx512")]
entry!(rfind_byte_avx512, avx512::rfind_byte, (haystack: &[u8], byte: u8));
#[cfg(feature = "avx512")]
entry!(find_avx512, avx512::find, (haystack: &[u8], needle: &[u8]));
#[cfg(feature = "avx512")]
entry!(rfind_avx512, avx512::rfind, (haystack: &[u8], needle: &[u8]));
#[cfg(feature = "avx512")]
entry!(find_charset_avx512, avx512::find_charset, (haystack: &[u8], set: &Charset));
#[cfg(feature = "avx512")]
entry!(rfind_charset_avx512, avx512::rfind_charset, (haystack: &[u8], set: &Charset));

/// `1 << (i & 7)` for every low nibble `i`
const NIBBLE_BITS: [u8; 16] = [1, 2, 4, 8, 16, 32, 64, 128, 1, 2, 4, 8, 16, 32, 64, 128];

// =============================================================================
// SSE4.2 IMPLEMENTATIONS
// =============================================================================

mod sse42 {
    use super::*;
    use crate::string::search::Anomalies;

    const WIDTH: usize = 16;

    #[target_feature(enable = "sse4.2")]
    pub(super) unsafe fn find_byte(haystack: &[u8], byte: u8) -> Option<usize> {
        unsafe {
            let pattern = _mm_set1_epi8(byte as i8);
            let ptr = haystack.as_ptr();
            let mut offset = 0;
            while offset + WIDTH <= haystack.len() {
                let chunk = _mm_loadu_si128(ptr.add(offset) as *const __m128i);
                let mask = _mm_movemask_epi8(_mm_cmpeq_epi8(chunk, pattern)) as u32;
                if mask != 0 {
                    return Some(offset + mask.trailing_zeros() as usize);
                }
                offset += WIDTH;
            }
            serial::find_byte(&haystack[offset..], byte).map(|p| offset + p)
        }
    }

    #[target_feature(enable = "sse4.2")]
    pub(super) unsafe fn rfind_byte(haystack: &[u8], byte: u8) -> Option<usize> {
        unsafe {
            let pattern = _mm_set1_epi8(byte as i8);
            let ptr = haystack.as_ptr();
            let mut end = haystack.len();
            while end >= WIDTH {
                let chunk = _mm_loadu_si128(ptr.add(end - WIDTH) as *const __m128i);
                let mask = _mm_movemask_epi8(_mm_cmpeq_epi8(chunk, pattern)) as u32;
                if mask != 0 {
                    return Some(end - WIDTH + 31 - mask.leading_zeros() as usize);
                }
                end -= WIDTH;
            }
            serial::rfind_byte(&haystack[..end], byte)
        }
    }

    #[inline]
    #[target_feature(enable = "sse4.2")]
    unsafe fn anomaly_mask(ptr: *const u8, at: usize, a: &Anomalies, probes: &[__m128i; 3]) -> u32 {
        unsafe {
            let m0 = _mm_cmpeq_epi8(_mm_loadu_si128(ptr.add(at + a.first) as *const __m128i), probes[0]);
            let m1 = _mm_cmpeq_epi8(_mm_loadu_si128(ptr.add(at + a.second) as *const __m128i), probes[1]);
            let m2 = _mm_cmpeq_epi8(_mm_loadu_si128(ptr.add(at + a.third) as *const __m128i), probes[2]);
            _mm_movemask_epi8(_mm_and_si128(_mm_and_si128(m0, m1), m2)) as u32
        }
    }

    #[target_feature(enable = "sse4.2")]
    unsafe fn probes(needle: &[u8], a: &Anomalies) -> [__m128i; 3] {
        [
            _mm_set1_epi8(needle[a.first] as i8),
            _mm_set1_epi8(needle[a.second] as i8),
            _mm_set1_epi8(needle[a.third] as i8),
        ]
    }

    #[target_feature(enable = "sse4.2")]
    pub(super) unsafe fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        let n = needle.len();
        if n == 0 || n > haystack.len() {
            return None;
        }
        if n == 1 {
            return unsafe { find_byte(haystack, needle[0]) };
        }
        if n > WIDTH {
            return horspool_find(haystack, needle);
        }
        unsafe {
            let a = Anomalies::locate(needle);
            let probes = probes(needle, &a);
            let ptr = haystack.as_ptr();
            let starts = haystack.len() - n + 1;
            let mut at = 0;
            while at + WIDTH <= starts {
                let mut mask = anomaly_mask(ptr, at, &a, &probes);
                while mask != 0 {
                    let pos = at + mask.trailing_zeros() as usize;
                    if &haystack[pos..pos + n] == needle {
                        return Some(pos);
                    }
                    mask &= mask - 1;
                }
                at += WIDTH;
            }
            serial::tail_find(haystack, needle, at)
        }
    }

    #[target_feature(enable = "sse4.2")]
    pub(super) unsafe fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        let n = needle.len();
        if n == 0 || n > haystack.len() {
            return None;
        }
        if n == 1 {
            return unsafe { rfind_byte(haystack, needle[0]) };
        }
        if n > WIDTH {
            return horspool_rfind(haystack, needle);
        }
        unsafe {
            let a = Anomalies::locate(needle);
            let probes = probes(needle, &a);
            let ptr = haystack.as_ptr();
            let mut end = haystack.len() - n + 1;
            while end >= WIDTH {
                let block = end - WIDTH;
                let mut mask = anomaly_mask(ptr, block, &a, &probes);
                while mask != 0 {
                    let lane = 31 - mask.leading_zeros() as usize;
                    let pos = block + lane;
                    if &haystack[pos..pos + n] == needle {
                        return Some(pos);
                    }
                    mask &= !(1u32 << lane);
                }
                end = block;
            }
            serial::head_rfind(haystack, needle, end)
        }
    }

    struct Tables {
        even: __m128i,
        odd: __m128i,
        bits: __m128i,
        low_nibble: __m128i,
        eight: __m128i,
    }

    #[target_feature(enable = "sse4.2")]
    unsafe fn tables(set: &Charset) -> Tables {
        let (even, odd) = set.nibble_tables();
        unsafe {
            Tables {
                even: _mm_loadu_si128(even.as_ptr() as *const __m128i),
                odd: _mm_loadu_si128(odd.as_ptr() as *const __m128i),
                bits: _mm_loadu_si128(NIBBLE_BITS.as_ptr() as *const __m128i),
                low_nibble: _mm_set1_epi8(0x0F),
                eight: _mm_set1_epi8(8),
            }
        }
    }

    #[inline]
    #[target_feature(enable = "sse4.2")]
    unsafe fn classify(chunk: __m128i, t: &Tables) -> u32 {
        let lo = _mm_and_si128(chunk, t.low_nibble);
        let hi = _mm_and_si128(_mm_srli_epi16::<4>(chunk), t.low_nibble);
        let rows_even = _mm_shuffle_epi8(t.even, hi);
        let rows_odd = _mm_shuffle_epi8(t.odd, hi);
        let use_even = _mm_cmpgt_epi8(t.eight, lo);
        let rows = _mm_blendv_epi8(rows_odd, rows_even, use_even);
        let bits = _mm_shuffle_epi8(t.bits, lo);
        let hits = _mm_cmpeq_epi8(_mm_and_si128(rows, bits), bits);
        _mm_movemask_epi8(hits) as u32
    }

    #[target_feature(enable = "sse4.2")]
    pub(super) unsafe fn find_charset(haystack: &[u8], set: &Charset) -> Option<usize> {
        unsafe {
            let t = tables(set);
            let ptr = haystack.as_ptr();
            let mut offset = 0;
            while offset + WIDTH <= haystack.len() {
                let mask = classify(_mm_loadu_si128(ptr.add(offset) as *const __m128i), &t);
                if mask != 0 {
                    return Some(offset + mask.trailing_zeros() as usize);
                }
                offset += WIDTH;
            }
            serial::find_charset(&haystack[offset..], set).map(|p| offset + p)
        }
    }

    #[target_feature(enable = "sse4.2")]
    pub(super) unsafe fn rfind_charset(haystack: &[u8], set: &Charset) -> Option<usize> {
        unsafe {
            let t = tables(set);
            let ptr = haystack.as_ptr();
            let mut end = haystack.len();
            while end >= WIDTH {
                let mask = classify(_mm_loadu_si128(ptr.add(end - WIDTH) as *const __m128i), &t);
                if mask != 0 {
                    return Some(end - WIDTH + 31 - mask.leading_zeros() as usize);
                }
                end -= WIDTH;
            }
            serial::rfind_charset(&haystack[..end], set)
        }
    }
}

// =============================================================================
// AVX2 IMPLEMENTATIONS
// =============================================================================

mod avx2 {
    use super::*;
    use crate::string::search::Anomalies;

    const WIDTH: usize = 32;

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn find_byte(haystack: &[u8], byte: u8) -> Option<usize> {
        unsafe {
            let pattern = _mm256_set1_epi8(byte as i8);
            let ptr = haystack.as_ptr();
            let mut offset = 0;
            while offset + WIDTH <= haystack.len() {
                let chunk = _mm256_loadu_si256(ptr.add(offset) as *const __m256i);
                let mask = _mm256_movemask_epi8(_mm256_cmpeq_epi8(chunk, pattern)) as u32;
                if mask != 0 {
                    return Some(offset + mask.trailing_zeros() as usize);
                }
                offset += WIDTH;
            }
            serial::find_byte(&haystack[offset..], byte).map(|p| offset + p)
        }
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn rfind_byte(haystack: &[u8], byte: u8) -> Option<usize> {
        unsafe {
            let pattern = _mm256_set1_epi8(byte as i8);
            let ptr = haystack.as_ptr();
            let mut end = haystack.len();
            while end >= WIDTH {
                let chunk = _mm256_loadu_si256(ptr.add(end - WIDTH) as *const __m256i);
                let mask = _mm256_movemask_epi8(_mm256_cmpeq_epi8(chunk, pattern)) as u32;
                if mask != 0 {
                    return Some(end - WIDTH + 31 - mask.leading_zeros() as usize);
                }
                end -= WIDTH;
            }
            serial::rfind_byte(&haystack[..end], byte)
        }
    }

    #[inline]
    #[target_feature(enable = "avx2")]
    unsafe fn anomaly_mask(ptr: *const u8, at: usize, a: &Anomalies, probes: &[__m256i; 3]) -> u32 {
        unsafe {
            let m0 = _mm256_cmpeq_epi8(_mm256_loadu_si256(ptr.add(at + a.first) as *const __m256i), probes[0]);
            let m1 = _mm256_cmpeq_epi8(_mm256_loadu_si256(ptr.add(at + a.second) as *const __m256i), probes[1]);
            let m2 = _mm256_cmpeq_epi8(_mm256_loadu_si256(ptr.add(at + a.third) as *const __m256i), probes[2]);
            _mm256_movemask_epi8(_mm256_and_si256(_mm256_and_si256(m0, m1), m2)) as u32
        }
    }

    #[target_feature(enable = "avx2")]
    unsafe fn probes(needle: &[u8], a: &Anomalies) -> [__m256i; 3] {
        [
            _mm256_set1_epi8(needle[a.first] as i8),
            _mm256_set1_epi8(needle[a.second] as i8),
            _mm256_set1_epi8(needle[a.third] as i8),
        ]
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        let n = needle.len();
        if n == 0 || n > haystack.len() {
            return None;
        }
        if n == 1 {
            return unsafe { find_byte(haystack, needle[0]) };
        }
        if n > WIDTH {
            return horspool_find(haystack, needle);
        }
        unsafe {
            let a = Anomalies::locate(needle);
            let probes = probes(needle, &a);
            let ptr = haystack.as_ptr();
            let starts = haystack.len() - n + 1;
            let mut at = 0;
            while at + WIDTH <= starts {
                let mut mask = anomaly_mask(ptr, at, &a, &probes);
                while mask != 0 {
                    let pos = at + mask.trailing_zeros() as usize;
                    if &haystack[pos..pos + n] == needle {
                        return Some(pos);
                    }
                    mask &= mask - 1;
                }
                at += WIDTH;
            }
            serial::tail_find(haystack, needle, at)
        }
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        let n = needle.len();
        if n == 0 || n > haystack.len() {
            return None;
        }
        if n == 1 {
            return unsafe { rfind_byte(haystack, needle[0]) };
        }
        if n > WIDTH {
            return horspool_rfind(haystack, needle);
        }
        unsafe {
            let a = Anomalies::locate(needle);
            let probes = probes(needle, &a);
            let ptr = haystack.as_ptr();
            let mut end = haystack.len() - n + 1;
            while end >= WIDTH {
                let block = end - WIDTH;
                let mut mask = anomaly_mask(ptr, block, &a, &probes);
                while mask != 0 {
                    let lane = 31 - mask.leading_zeros() as usize;
                    let pos = block + lane;
                    if &haystack[pos..pos + n] == needle {
                        return Some(pos);
                    }
                    mask &= !(1u32 << lane);
                }
                end = block;
            }
            serial::head_rfind(haystack, needle, end)
        }
    }

    struct Tables {
        even: __m256i,
        odd: __m256i,
        bits: __m256i,
        low_nibble: __m256i,
        eight: __m256i,
    }

    #[target_feature(enable = "avx2")]
    unsafe fn tables(set: &Charset) -> Tables {
        let (even, odd) = set.nibble_tables();
        unsafe {
            // pshufb works per 128-bit lane, so each table is mirrored into both halves
            Tables {
                even: _mm256_broadcastsi128_si256(_mm_loadu_si128(even.as_ptr() as *const __m128i)),
                odd: _mm256_broadcastsi128_si256(_mm_loadu_si128(odd.as_ptr() as *const __m128i)),
                bits: _mm256_broadcastsi128_si256(_mm_loadu_si128(NIBBLE_BITS.as_ptr() as *const __m128i)),
                low_nibble: _mm256_set1_epi8(0x0F),
                eight: _mm256_set1_epi8(8),
            }
        }
    }

    #[inline]
    #[target_feature(enable = "avx2")]
    unsafe fn classify(chunk: __m256i, t: &Tables) -> u32 {
        let lo = _mm256_and_si256(chunk, t.low_nibble);
        let hi = _mm256_and_si256(_mm256_srli_epi16::<4>(chunk), t.low_nibble);
        let rows_even = _mm256_shuffle_epi8(t.even, hi);
        let rows_odd = _mm256_shuffle_epi8(t.odd, hi);
        let use_even = _mm256_cmpgt_epi8(t.eight, lo);
        let rows = _mm256_blendv_epi8(rows_odd, rows_even, use_even);
        let bits = _mm256_shuffle_epi8(t.bits, lo);
        let hits = _mm256_cmpeq_epi8(_mm256_and_si256(rows, bits), bits);
        _mm256_movemask_epi8(hits) as u32
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn find_charset(haystack: &[u8], set: &Charset) -> Option<usize> {
        unsafe {
            let t = tables(set);
            let ptr = haystack.as_ptr();
            let mut offset = 0;
            while offset + WIDTH <= haystack.len() {
                let mask = classify(_mm256_loadu_si256(ptr.add(offset) as *const __m256i), &t);
                if mask != 0 {
                    return Some(offset + mask.trailing_zeros() as usize);
                }
                offset += WIDTH;
            }
            serial::find_charset(&haystack[offset..], set).map(|p| offset + p)
        }
    }

    #[target_feature(enable = "avx2")]
    pub(super) unsafe fn rfind_charset(haystack: &[u8], set: &Charset) -> Option<usize> {
        unsafe {
            let t = tables(set);
            let ptr = haystack.as_ptr();
            let mut end = haystack.len();
            while end >= WIDTH {
                let mask = classify(_mm256_loadu_si256(ptr.add(end - WIDTH) as *const __m256i), &t);
                if mask != 0 {
                    return Some(end - WIDTH + 31 - mask.leading_zeros() as usize);
                }
                end -= WIDTH;
            }
            serial::rfind_charset(&haystack[..end], set)
        }
    }
}

// =============================================================================
// AVX-512 IMPLEMENTATIONS
// =============================================================================

#[cfg(feature = "avx512")]
mod avx512 {
    use super::*;
    use crate::string::search::Anomalies;

    const WIDTH: usize = 64;

    #[inline]
    #[target_feature(enable = "avx512f,avx512bw")]
    unsafe fn load(ptr: *const u8) -> __m512i {
        unsafe { _mm512_loadu_epi8(ptr as *const i8) }
    }

    #[target_feature(enable = "avx512f,avx512bw")]
    pub(super) unsafe fn find_byte(haystack: &[u8], byte: u8) -> Option<usize> {
        unsafe {
            let pattern = _mm512_set1_epi8(byte as i8);
            let ptr = haystack.as_ptr();
            let mut offset = 0;
            while offset + WIDTH <= haystack.len() {
                let mask = _mm512_cmpeq_epi8_mask(load(ptr.add(offset)), pattern);
                if mask != 0 {
                    return Some(offset + mask.trailing_zeros() as usize);
                }
                offset += WIDTH;
            }
            serial::find_byte(&haystack[offset..], byte).map(|p| offset + p)
        }
    }

    #[target_feature(enable = "avx512f,avx512bw")]
    pub(super) unsafe fn rfind_byte(haystack: &[u8], byte: u8) -> Option<usize> {
        unsafe {
            let pattern = _mm512_set1_epi8(byte as i8);
            let ptr = haystack.as_ptr();
            let mut end = haystack.len();
            while end >= WIDTH {
                let mask = _mm512_cmpeq_epi8_mask(load(ptr.add(end - WIDTH)), pattern);
                if mask != 0 {
                    return Some(end - WIDTH + 63 - mask.leading_zeros() as usize);
                }
                end -= WIDTH;
            }
            serial::rfind_byte(&haystack[..end], byte)
        }
    }

    #[inline]
    #[target_feature(enable = "avx512f,avx512bw")]
    unsafe fn anomaly_mask(ptr: *const u8, at: usize, a: &Anomalies, probes: &[__m512i; 3]) -> u64 {
        unsafe {
            _mm512_cmpeq_epi8_mask(load(ptr.add(at + a.first)), probes[0])
                & _mm512_cmpeq_epi8_mask(load(ptr.add(at + a.second)), probes[1])
                & _mm512_cmpeq_epi8_mask(load(ptr.add(at + a.third)), probes[2])
        }
    }

    #[target_feature(enable = "avx512f,avx512bw")]
    unsafe fn probes(needle: &[u8], a: &Anomalies) -> [__m512i; 3] {
        [
            _mm512_set1_epi8(needle[a.first] as i8),
            _mm512_set1_epi8(needle[a.second] as i8),
            _mm512_set1_epi8(needle[a.third] as i8),
        ]
    }

    #[target_feature(enable = "avx512f,avx512bw")]
    pub(super) unsafe fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        let n = needle.len();
        if n == 0 || n > haystack.len() {
            return None;
        }
        if n == 1 {
            return unsafe { find_byte(haystack, needle[0]) };
        }
        if n > WIDTH {
            return horspool_find(haystack, needle);
        }
        unsafe {
            let a = Anomalies::locate(needle);
            let probes = probes(needle, &a);
            let ptr = haystack.as_ptr();
            let starts = haystack.len() - n + 1;
            let mut at = 0;
            while at + WIDTH <= starts {
                let mut mask = anomaly_mask(ptr, at, &a, &probes);
                while mask != 0 {
                    let pos = at + mask.trailing_zeros() as usize;
                    if &haystack[pos..pos + n] == needle {
                        return Some(pos);
                    }
                    mask &= mask - 1;
                }
                at += WIDTH;
            }
            serial::tail_find(haystack, needle, at)
        }
    }

    #[target_feature(enable = "avx512f,avx512bw")]
    pub(super) unsafe fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        let n = needle.len();
        if n == 0 || n > haystack.len() {
            return None;
        }
        if n == 1 {
            return unsafe { rfind_byte(haystack, needle[0]) };
        }
        if n > WIDTH {
            return horspool_rfind(haystack, needle);
        }
        unsafe {
            let a = Anomalies::locate(needle);
            let probes = probes(needle, &a);
            let ptr = haystack.as_ptr();
            let mut end = haystack.len() - n + 1;
            while end >= WIDTH {
                let block = end - WIDTH;
                let mut mask = anomaly_mask(ptr, block, &a, &probes);
                while mask != 0 {
                    let lane = 63 - mask.leading_zeros() as usize;
                    let pos = block + lane;
                    if &haystack[pos..pos + n] == needle {
                        return Some(pos);
                    }
                    mask &= !(1u64 << lane);
                }
                end = block;
            }
            serial::head_rfind(haystack, needle, end)
        }
    }

    struct Tables {
        even: __m512i,
        odd: __m512i,
        bits: __m512i,
        low_nibble: __m512i,
        eight: __m512i,
    }

    #[target_feature(enable = "avx512f,avx512bw")]
    unsafe fn tables(set: &Charset) -> Tables {
        let (even, odd) = set.nibble_tables();
        unsafe {
            Tables {
                even: _mm512_broadcast_i32x4(_mm_loadu_si128(even.as_ptr() as *const __m128i)),
                odd: _mm512_broadcast_i32x4(_mm_loadu_si128(odd.as_ptr() as *const __m128i)),
                bits: _mm512_broadcast_i32x4(_mm_loadu_si128(NIBBLE_BITS.as_ptr() as *const __m128i)),
                low_nibble: _mm512_set1_epi8(0x0F),
                eight: _mm512_set1_epi8(8),
            }
        }
    }

    #[inline]
    #[target_feature(enable = "avx512f,avx512bw")]
    unsafe fn classify(chunk: __m512i, t: &Tables) -> u64 {
        let lo = _mm512_and_si512(chunk, t.low_nibble);
        let hi = _mm512_and_si512(_mm512_srli_epi16::<4>(chunk), t.low_nibble);
        let rows_even = _mm512_shuffle_epi8(t.even, hi);
        let rows_odd = _mm512_shuffle_epi8(t.odd, hi);
        let use_even = _mm512_cmplt_epu8_mask(lo, t.eight);
        let rows = _mm512_mask_blend_epi8(use_even, rows_odd, rows_even);
        let bits = _mm512_shuffle_epi8(t.bits, lo);
        _mm512_test_epi8_mask(rows, bits)
    }

    #[target_feature(enable = "avx512f,avx512bw")]
    pub(super) unsafe fn find_charset(haystack: &[u8], set: &Charset) -> Option<usize> {
        unsafe {
            let t = tables(set);
            let ptr = haystack.as_ptr();
            let mut offset = 0;
            while offset + WIDTH <= haystack.len() {
                let mask = classify(load(ptr.add(offset)), &t);
                if mask != 0 {
                    return Some(offset + mask.trailing_zeros() as usize);
                }
                offset += WIDTH;
            }
            serial::find_charset(&haystack[offset..], set).map(|p| offset + p)
        }
    }

    #[target_feature(enable = "avx512f,avx512bw")]
    pub(super) unsafe fn rfind_charset(haystack: &[u8], set: &Charset) -> Option<usize> {
        unsafe {
            let t = tables(set);
            let ptr = haystack.as_ptr();
            let mut end = haystack.len();
            while end >= WIDTH {
                let mask = classify(load(ptr.add(end - WIDTH)), &t);
                if mask != 0 {
                    return Some(end - WIDTH + 63 - mask.leading_zeros() as usize);
                }
                end -= WIDTH;
            }
            serial::rfind_charset(&haystack[..end], set)
        }
    }
}
