//! Serial (SWAR) search kernels
//!
//! These are the baseline every vector backend must agree with. Words are
//! loaded little-endian, so the lowest set bit of a match mask is the first
//! matching byte in memory order.

use super::{horspool_find, horspool_rfind, Anomalies};
use crate::string::Charset;

const LO: u64 = 0x0101_0101_0101_0101;
const HI: u64 = 0x8080_8080_8080_8080;
const LOW7: u64 = 0x7F7F_7F7F_7F7F_7F7F;

#[inline(always)]
fn load(bytes: &[u8], at: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(word)
}

#[inline(always)]
const fn broadcast(byte: u8) -> u64 {
    LO * byte as u64
}

/// `0x80` in every byte lane where `x` and `y` are equal, zero elsewhere
#[inline(always)]
fn eq_mask(x: u64, y: u64) -> u64 {
    let diff = x ^ y;
    !(((diff & LOW7) + LOW7) | diff) & HI
}

#[inline(always)]
fn first_lane(mask: u64) -> usize {
    (mask.trailing_zeros() / 8) as usize
}

#[inline(always)]
fn last_lane(mask: u64) -> usize {
    7 - (mask.leading_zeros() / 8) as usize
}

pub(crate) fn find_byte(haystack: &[u8], byte: u8) -> Option<usize> {
    let pattern = broadcast(byte);
    let mut offset = 0;
    while offset + 8 <= haystack.len() {
        let mask = eq_mask(load(haystack, offset), pattern);
        if mask != 0 {
            return Some(offset + first_lane(mask));
        }
        offset += 8;
    }
    haystack[offset..]
        .iter()
        .position(|&b| b == byte)
        .map(|p| offset + p)
}

pub(crate) fn rfind_byte(haystack: &[u8], byte: u8) -> Option<usize> {
    let pattern = broadcast(byte);
    let mut end = haystack.len();
    while end >= 8 {
        let mask = eq_mask(load(haystack, end - 8), pattern);
        if mask != 0 {
            return Some(end - 8 + last_lane(mask));
        }
        end -= 8;
    }
    haystack[..end].iter().rposition(|&b| b == byte)
}

/// Match mask of `needle` at the 8 starts `at..at + 8`; every needle byte is compared
#[inline(always)]
fn shifted_mask(haystack: &[u8], at: usize, needle: &[u8]) -> u64 {
    needle.iter().enumerate().fold(HI, |acc, (j, &b)| {
        acc & eq_mask(load(haystack, at + j), broadcast(b))
    })
}

/// Candidate mask from the three anomaly probes at the 8 starts `at..at + 8`
#[inline(always)]
fn anomaly_mask(haystack: &[u8], at: usize, needle: &[u8], a: &Anomalies) -> u64 {
    eq_mask(load(haystack, at + a.first), broadcast(needle[a.first]))
        & eq_mask(load(haystack, at + a.second), broadcast(needle[a.second]))
        & eq_mask(load(haystack, at + a.third), broadcast(needle[a.third]))
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let n = needle.len();
    if n == 0 || n > haystack.len() {
        return None;
    }
    match n {
        1 => find_byte(haystack, needle[0]),
        2..=4 => find_short(haystack, needle),
        5..=8 => find_word(haystack, needle),
        _ => horspool_find(haystack, needle),
    }
}

pub(crate) fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let n = needle.len();
    if n == 0 || n > haystack.len() {
        return None;
    }
    match n {
        1 => rfind_byte(haystack, needle[0]),
        2..=4 => rfind_short(haystack, needle),
        5..=8 => rfind_word(haystack, needle),
        _ => horspool_rfind(haystack, needle),
    }
}

/// Exact 2..=4 byte comparator: every block checks 8 overlapping starts
fn find_short(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let starts = haystack.len() - needle.len() + 1;
    let mut at = 0;
    // every start in the block needs `needle.len()` readable bytes
    while at + 8 <= starts {
        let mask = shifted_mask(haystack, at, needle);
        if mask != 0 {
            return Some(at + first_lane(mask));
        }
        at += 8;
    }
    tail_find(haystack, needle, at)
}

fn rfind_short(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let mut end = haystack.len() - needle.len() + 1;
    while end >= 8 {
        let mask = shifted_mask(haystack, end - 8, needle);
        if mask != 0 {
            return Some(end - 8 + last_lane(mask));
        }
        end -= 8;
    }
    head_rfind(haystack, needle, end)
}

/// Anomaly filter over words for needles that fit one word
fn find_word(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let anomalies = Anomalies::locate(needle);
    let n = needle.len();
    let starts = haystack.len() - n + 1;
    let mut at = 0;
    while at + 8 <= starts {
        let mut mask = anomaly_mask(haystack, at, needle, &anomalies);
        while mask != 0 {
            let pos = at + first_lane(mask);
            if &haystack[pos..pos + n] == needle {
                return Some(pos);
            }
            mask &= mask - 1;
        }
        at += 8;
    }
    tail_find(haystack, needle, at)
}

fn rfind_word(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let anomalies = Anomalies::locate(needle);
    let n = needle.len();
    let mut end = haystack.len() - n + 1;
    while end >= 8 {
        let block = end - 8;
        let mut mask = anomaly_mask(haystack, block, needle, &anomalies);
        while mask != 0 {
            let lane = last_lane(mask);
            let pos = block + lane;
            if &haystack[pos..pos + n] == needle {
                return Some(pos);
            }
            mask &= !(0x80u64 << (lane * 8));
        }
        end = block;
    }
    head_rfind(haystack, needle, end)
}

/// First match starting at or after `from`, byte by byte
#[inline]
pub(crate) fn tail_find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    let n = needle.len();
    if from + n > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(n)
        .position(|w| w == needle)
        .map(|p| from + p)
}

/// Last match starting before `end`, byte by byte
#[inline]
pub(crate) fn head_rfind(haystack: &[u8], needle: &[u8], end: usize) -> Option<usize> {
    let n = needle.len();
    if end == 0 {
        return None;
    }
    haystack[..end + n - 1].windows(n).rposition(|w| w == needle)
}

pub(crate) fn find_charset(haystack: &[u8], set: &Charset) -> Option<usize> {
    haystack.iter().position(|&b| set.contains(b))
}

pub(crate) fn rfind_charset(haystack: &[u8], set: &Charset) -> Option<usize> {
    haystack.iter().rposition(|&b| set.contains(b))
}
