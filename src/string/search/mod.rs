//! Exact and set-based substring search
//!
//! Public entry points route through the installed dispatch table. Every
//! backend honours the same contract: the offset of the first (or last) match,
//! or `None`. An empty needle, or one longer than the haystack, never matches.
//!
//! Kernel selection by needle length:
//!
//! | needle      | serial                    | vector backends                |
//! |-------------|---------------------------|--------------------------------|
//! | 1 byte      | SWAR broadcast compare    | broadcast + movemask           |
//! | 2..=4 bytes | SWAR shifted comparators  | anomaly masks                  |
//! | ..=width    | SWAR anomaly masks        | anomaly masks                  |
//! | longer      | Horspool + anomaly filter | Horspool + anomaly filter      |
//!
//! The three "anomaly" bytes are picked once per needle (see [`Anomalies`]) and
//! checked before any full comparison.

pub(crate) mod serial;

#[cfg(all(target_arch = "x86_64", feature = "simd"))]
pub(crate) mod x86;

#[cfg(all(target_arch = "aarch64", feature = "simd"))]
pub(crate) mod neon;

use crate::simd::backends;
use crate::string::Charset;

/// Offset of the first occurrence of `needle` in `haystack`
///
/// # Examples
///
/// ```rust
/// assert_eq!(strand::find(b"abcabc", b"bc"), Some(1));
/// assert_eq!(strand::find(b"abcabc", b""), None);
/// ```
#[inline]
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    backends().find(haystack, needle)
}

/// Offset of the last occurrence of `needle` in `haystack`
#[inline]
pub fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    backends().rfind(haystack, needle)
}

/// Offset of the first `byte` in `haystack`
#[inline]
pub fn find_byte(haystack: &[u8], byte: u8) -> Option<usize> {
    backends().find_byte(haystack, byte)
}

/// Offset of the last `byte` in `haystack`
#[inline]
pub fn rfind_byte(haystack: &[u8], byte: u8) -> Option<usize> {
    backends().rfind_byte(haystack, byte)
}

/// Offset of the first byte of `haystack` that belongs to `set`
#[inline]
pub fn find_charset(haystack: &[u8], set: &Charset) -> Option<usize> {
    backends().find_charset(haystack, set)
}

/// Offset of the last byte of `haystack` that belongs to `set`
#[inline]
pub fn rfind_charset(haystack: &[u8], set: &Charset) -> Option<usize> {
    backends().rfind_charset(haystack, set)
}

/// Offset of the first byte of `haystack` outside `set`
#[inline]
pub fn find_not_charset(haystack: &[u8], set: &Charset) -> Option<usize> {
    backends().find_charset(haystack, &set.inverted())
}

/// Offset of the last byte of `haystack` outside `set`
#[inline]
pub fn rfind_not_charset(haystack: &[u8], set: &Charset) -> Option<usize> {
    backends().rfind_charset(haystack, &set.inverted())
}

/// Three probe positions inside a needle, compared before a full match.
///
/// `first` is always 0. The middle probe moves right past bytes equal to the
/// first one and the last probe moves left past repeats of the other two.
/// For longer needles the middle probe also avoids UTF-8 lead bytes
/// (`0xC0..`), which repeat often in non-ASCII text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Anomalies {
    pub first: usize,
    pub second: usize,
    pub third: usize,
}

impl Anomalies {
    pub(crate) fn locate(needle: &[u8]) -> Self {
        debug_assert!(!needle.is_empty());
        let len = needle.len();
        let first = 0;
        let mut second = len / 2;
        let mut third = len - 1;

        if len > 3 {
            while second < third && needle[second] == needle[first] {
                second += 1;
            }
            while third > second + 1
                && (needle[third] == needle[second] || needle[third] == needle[first])
            {
                third -= 1;
            }
        }

        if len > 8 {
            let is_lead = |b: u8| b > 191;
            if is_lead(needle[second]) {
                if let Some(pos) = (second + 1..third)
                    .chain(first + 1..second)
                    .find(|&i| !is_lead(needle[i]) && needle[i] != needle[first])
                {
                    second = pos;
                }
            }
        }

        Self { first, second, third }
    }

    /// Whether the probe bytes of `needle` match `window`
    #[inline(always)]
    pub(crate) fn matches(&self, window: &[u8], needle: &[u8]) -> bool {
        window[self.first] == needle[self.first]
            && window[self.second] == needle[self.second]
            && window[self.third] == needle[self.third]
    }
}

/// Longest prefix (or suffix) the Horspool skip tables are built over
pub(crate) const HORSPOOL_SPAN: usize = 256;

/// Forward bad-character shifts, keyed by the byte under the window's last position.
///
/// Only the last `HORSPOOL_SPAN` needle bytes feed the table, which keeps every
/// shift at most `HORSPOOL_SPAN` and still never skips a match.
pub(crate) fn forward_shifts(needle: &[u8]) -> [u16; 256] {
    let len = needle.len();
    let span = len.min(HORSPOOL_SPAN);
    let mut shifts = [span as u16; 256];
    for i in len - span..len - 1 {
        shifts[needle[i] as usize] = (len - 1 - i) as u16;
    }
    shifts
}

/// Backward bad-character shifts, keyed by the byte under the window's first position
pub(crate) fn backward_shifts(needle: &[u8]) -> [u16; 256] {
    let len = needle.len();
    let span = len.min(HORSPOOL_SPAN);
    let mut shifts = [span as u16; 256];
    for i in (1..span).rev() {
        shifts[needle[i] as usize] = i as u16;
    }
    shifts
}

/// Horspool forward scan with the anomaly pre-filter
pub(crate) fn horspool_find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let len = needle.len();
    if len == 0 || len > haystack.len() {
        return None;
    }
    let anomalies = Anomalies::locate(needle);
    let shifts = forward_shifts(needle);
    let mut pos = 0;
    while pos + len <= haystack.len() {
        let window = &haystack[pos..pos + len];
        if anomalies.matches(window, needle) && window == needle {
            return Some(pos);
        }
        pos += shifts[window[len - 1] as usize] as usize;
    }
    None
}

/// Horspool backward scan with the anomaly pre-filter
pub(crate) fn horspool_rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let len = needle.len();
    if len == 0 || len > haystack.len() {
        return None;
    }
    let anomalies = Anomalies::locate(needle);
    let shifts = backward_shifts(needle);
    let mut pos = haystack.len() - len;
    loop {
        let window = &haystack[pos..pos + len];
        if anomalies.matches(window, needle) && window == needle {
            return Some(pos);
        }
        let shift = shifts[window[0] as usize] as usize;
        if shift > pos {
            return None;
        }
        pos -= shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_find(h: &[u8], n: &[u8]) -> Option<usize> {
        if n.is_empty() || n.len() > h.len() {
            return None;
        }
        h.windows(n.len()).position(|w| w == n)
    }

    fn naive_rfind(h: &[u8], n: &[u8]) -> Option<usize> {
        if n.is_empty() || n.len() > h.len() {
            return None;
        }
        h.windows(n.len()).rposition(|w| w == n)
    }

    #[test]
    fn test_anomalies_in_range() {
        for len in 1..40 {
            let needle: Vec<u8> = (0..len).map(|i| b"aab\xC3\xA9"[i % 5]).collect();
            let a = Anomalies::locate(&needle);
            assert_eq!(a.first, 0);
            assert!(a.second <= a.third);
            assert!(a.third < len);
        }
    }

    #[test]
    fn test_anomalies_skip_duplicates() {
        let a = Anomalies::locate(b"aaaaab");
        assert_ne!(b"aaaaab"[a.second], b'a');
        assert_eq!((a.second, a.third), (5, 5));

        let needle = b"abcaaaaaaz";
        let a = Anomalies::locate(needle);
        assert_ne!(needle[a.second], b'a');
        assert_eq!(a.third, needle.len() - 1);
    }

    #[test]
    fn test_anomalies_avoid_utf8_leads() {
        let needle = "héllo wörld, ça va".as_bytes();
        let a = Anomalies::locate(needle);
        assert!(needle[a.second] <= 191);
    }

    #[test]
    fn test_horspool_matches_naive() {
        let haystack = b"the quick brown fox jumps over the lazy dog; the quick brown cat";
        for needle in [
            &b"the quick brown"[..],
            b"brown cat",
            b"lazy dog;",
            b"fox jumps over the",
            b"not present here",
            b"g",
        ] {
            assert_eq!(horspool_find(haystack, needle), naive_find(haystack, needle));
            assert_eq!(horspool_rfind(haystack, needle), naive_rfind(haystack, needle));
        }
    }

    #[test]
    fn test_horspool_long_needles() {
        let mut haystack = vec![b'x'; 2000];
        let needle: Vec<u8> = (0..600).map(|i| (i % 7) as u8 + b'a').collect();
        haystack[700..1300].copy_from_slice(&needle);
        haystack[1350..1950].copy_from_slice(&needle);
        assert_eq!(horspool_find(&haystack, &needle), Some(700));
        assert_eq!(horspool_rfind(&haystack, &needle), Some(1350));
        assert_eq!(horspool_find(&haystack[..1299], &needle), None);
    }

    #[test]
    fn test_shift_tables_are_bounded() {
        let needle = vec![b'q'; 1000];
        assert!(forward_shifts(&needle).iter().all(|&s| s as usize <= HORSPOOL_SPAN));
        assert!(backward_shifts(&needle).iter().all(|&s| s >= 1));
    }
}
