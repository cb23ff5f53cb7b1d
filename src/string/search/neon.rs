//! AArch64 NEON search kernels
//!
//! NEON has no movemask, so comparison results are narrowed with `shrn #4`
//! into a 64-bit word carrying four bits per byte lane.

use super::{horspool_find, horspool_rfind, serial, Anomalies};
use crate::string::Charset;
use std::arch::aarch64::*;

const WIDTH: usize = 16;

const NIBBLE_BITS: [u8; 16] = [1, 2, 4, 8, 16, 32, 64, 128, 1, 2, 4, 8, 16, 32, 64, 128];

macro_rules! entry {
    ($name:ident, $kernel:ident, ($($arg:ident : $ty:ty),*)) => {
        pub(crate) fn $name($($arg: $ty),*) -> Option<usize> {
            // SAFETY: bound only when NEON was detected
            unsafe { $kernel($($arg),*) }
        }
    };
}

entry!(find_byte_neon, find_byte, (haystack: &[u8], byte: u8));
entry!(rfind_byte_neon, rfind_byte, (haystack: &[u8], byte: u8));
entry!(find_neon, find, (haystack: &[u8], needle: &[u8]));
entry!(rfind_neon, rfind, (haystack: &[u8], needle: &[u8]));
entry!(find_charset_neon, find_charset, (haystack: &[u8], set: &Charset));
entry!(rfind_charset_neon, rfind_charset, (haystack: &[u8], set: &Charset));

/// Four bits per lane, lane `k` in bits `4k..4k+4`
#[inline]
#[target_feature(enable = "neon")]
unsafe fn movemask(v: uint8x16_t) -> u64 {
    let narrowed = vshrn_n_u16::<4>(vreinterpretq_u16_u8(v));
    vget_lane_u64::<0>(vreinterpret_u64_u8(narrowed))
}

#[inline(always)]
fn first_lane(mask: u64) -> usize {
    (mask.trailing_zeros() / 4) as usize
}

#[inline(always)]
fn last_lane(mask: u64) -> usize {
    15 - (mask.leading_zeros() / 4) as usize
}

#[target_feature(enable = "neon")]
unsafe fn find_byte(haystack: &[u8], byte: u8) -> Option<usize> {
    unsafe {
        let pattern = vdupq_n_u8(byte);
        let ptr = haystack.as_ptr();
        let mut offset = 0;
        while offset + WIDTH <= haystack.len() {
            let mask = movemask(vceqq_u8(vld1q_u8(ptr.add(offset)), pattern));
            if mask != 0 {
                return Some(offset + first_lane(mask));
            }
            offset += WIDTH;
        }
        serial::find_byte(&haystack[offset..], byte).map(|p| offset + p)
    }
}

#[target_feature(enable = "neon")]
unsafe fn rfind_byte(haystack: &[u8], byte: u8) -> Option<usize> {
    unsafe {
        let pattern = vdupq_n_u8(byte);
        let ptr = haystack.as_ptr();
        let mut end = haystack.len();
        while end >= WIDTH {
            let mask = movemask(vceqq_u8(vld1q_u8(ptr.add(end - WIDTH)), pattern));
            if mask != 0 {
                return Some(end - WIDTH + last_lane(mask));
            }
            end -= WIDTH;
        }
        serial::rfind_byte(&haystack[..end], byte)
    }
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn anomaly_mask(ptr: *const u8, at: usize, a: &Anomalies, probes: &[uint8x16_t; 3]) -> u64 {
    unsafe {
        let m0 = vceqq_u8(vld1q_u8(ptr.add(at + a.first)), probes[0]);
        let m1 = vceqq_u8(vld1q_u8(ptr.add(at + a.second)), probes[1]);
        let m2 = vceqq_u8(vld1q_u8(ptr.add(at + a.third)), probes[2]);
        movemask(vandq_u8(vandq_u8(m0, m1), m2))
    }
}

#[target_feature(enable = "neon")]
unsafe fn probes(needle: &[u8], a: &Anomalies) -> [uint8x16_t; 3] {
    [
        vdupq_n_u8(needle[a.first]),
        vdupq_n_u8(needle[a.second]),
        vdupq_n_u8(needle[a.third]),
    ]
}

#[target_feature(enable = "neon")]
unsafe fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
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
                let lane = first_lane(mask);
                let pos = at + lane;
                if &haystack[pos..pos + n] == needle {
                    return Some(pos);
                }
                mask &= !(0xFu64 << (lane * 4));
            }
            at += WIDTH;
        }
        serial::tail_find(haystack, needle, at)
    }
}

#[target_feature(enable = "neon")]
unsafe fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
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
                let lane = last_lane(mask);
                let pos = block + lane;
                if &haystack[pos..pos + n] == needle {
                    return Some(pos);
                }
                mask &= !(0xFu64 << (lane * 4));
            }
            end = block;
        }
        serial::head_rfind(haystack, needle, end)
    }
}

struct Tables {
    even: uint8x16_t,
    odd: uint8x16_t,
    bits: uint8x16_t,
}

#[target_feature(enable = "neon")]
unsafe fn tables(set: &Charset) -> Tables {
    let (even, odd) = set.nibble_tables();
    unsafe {
        Tables {
            even: vld1q_u8(even.as_ptr()),
            odd: vld1q_u8(odd.as_ptr()),
            bits: vld1q_u8(NIBBLE_BITS.as_ptr()),
        }
    }
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn classify(chunk: uint8x16_t, t: &Tables) -> u64 {
    unsafe {
        let lo = vandq_u8(chunk, vdupq_n_u8(0x0F));
        let hi = vshrq_n_u8::<4>(chunk);
        let rows_even = vqtbl1q_u8(t.even, hi);
        let rows_odd = vqtbl1q_u8(t.odd, hi);
        let use_even = vcltq_u8(lo, vdupq_n_u8(8));
        let rows = vbslq_u8(use_even, rows_even, rows_odd);
        let bits = vqtbl1q_u8(t.bits, lo);
        movemask(vtstq_u8(rows, bits))
    }
}

#[target_feature(enable = "neon")]
unsafe fn find_charset(haystack: &[u8], set: &Charset) -> Option<usize> {
    unsafe {
        let t = tables(set);
        let ptr = haystack.as_ptr();
        let mut offset = 0;
        while offset + WIDTH <= haystack.len() {
            let mask = classify(vld1q_u8(ptr.add(offset)), &t);
            if mask != 0 {
                return Some(offset + first_lane(mask));
            }
            offset += WIDTH;
        }
        serial::find_charset(&haystack[offset..], set).map(|p| offset + p)
    }
}

#[target_feature(enable = "neon")]
unsafe fn rfind_charset(haystack: &[u8], set: &Charset) -> Option<usize> {
    unsafe {
        let t = tables(set);
        let ptr = haystack.as_ptr();
        let mut end = haystack.len();
        while end >= WIDTH {
            let mask = classify(vld1q_u8(ptr.add(end - WIDTH)), &t);
            if mask != 0 {
                return Some(end - WIDTH + last_lane(mask));
            }
            end -= WIDTH;
        }
        serial::rfind_charset(&haystack[..end], set)
    }
}
