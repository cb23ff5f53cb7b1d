//! StrView: borrowed byte string with dispatched search
//!
//! A view is a pointer and a length, nothing more: it may be empty, it never
//! needs a terminator, and the bytes need not be UTF-8. Searching goes
//! through the installed backend table.

use super::Charset;
use crate::error::{check_range, Result};
use crate::simd::backends;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str;

/// Whether two byte strings are identical
#[inline]
pub fn equal(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a == b
}

/// Byte-wise lexicographic order; a proper prefix orders first
#[inline]
pub fn order(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// Zero-copy view over a byte string
///
/// # Examples
///
/// ```rust
/// use strand::StrView;
///
/// let s = StrView::from("hello world");
/// assert_eq!(s.len(), 11);
/// assert!(s.starts_with(StrView::from("hello")));
/// assert_eq!(s.find(StrView::from("o")), Some(4));
/// assert_eq!(s.rfind(StrView::from("o")), Some(7));
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct StrView<'a> {
    data: &'a [u8],
}

impl<'a> StrView<'a> {
    /// Wrap a byte slice
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Length in bytes
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the view is empty
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The viewed bytes
    #[inline]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// The bytes as `&str`, if they are valid UTF-8
    #[inline]
    pub fn as_str(&self) -> Option<&'a str> {
        str::from_utf8(self.data).ok()
    }

    /// Byte at `index`
    #[inline]
    pub fn get_byte(&self, index: usize) -> Option<u8> {
        self.data.get(index).copied()
    }

    /// Sub-view of `len` bytes starting at `start`
    pub fn substring(&self, start: usize, len: usize) -> Result<StrView<'a>> {
        let end = start.saturating_add(len);
        check_range(start, end, self.len())?;
        Ok(StrView::new(&self.data[start..end]))
    }

    /// First `len` bytes, or the whole view if shorter
    #[inline]
    pub fn prefix(&self, len: usize) -> StrView<'a> {
        StrView::new(&self.data[..len.min(self.len())])
    }

    /// Last `len` bytes, or the whole view if shorter
    #[inline]
    pub fn suffix(&self, len: usize) -> StrView<'a> {
        StrView::new(&self.data[self.len() - len.min(self.len())..])
    }

    /// Whether this view starts with `prefix`
    #[inline]
    pub fn starts_with(&self, prefix: StrView<'_>) -> bool {
        self.data.starts_with(prefix.data)
    }

    /// Whether this view ends with `suffix`
    #[inline]
    pub fn ends_with(&self, suffix: StrView<'_>) -> bool {
        self.data.ends_with(suffix.data)
    }

    /// Identical bytes
    #[inline]
    pub fn equal(&self, other: StrView<'_>) -> bool {
        equal(self.data, other.data)
    }

    /// Byte-wise order
    #[inline]
    pub fn order(&self, other: StrView<'_>) -> Ordering {
        order(self.data, other.data)
    }

    /// Length of the shared prefix
    pub fn common_prefix_len(&self, other: StrView<'_>) -> usize {
        self.data
            .iter()
            .zip(other.data)
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Offset of the first `byte`
    #[inline]
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        backends().find_byte(self.data, byte)
    }

    /// Offset of the last `byte`
    #[inline]
    pub fn rfind_byte(&self, byte: u8) -> Option<usize> {
        backends().rfind_byte(self.data, byte)
    }

    /// Offset of the first occurrence of `needle`; an empty needle never matches
    #[inline]
    pub fn find(&self, needle: StrView<'_>) -> Option<usize> {
        backends().find(self.data, needle.data)
    }

    /// Offset of the last occurrence of `needle`
    #[inline]
    pub fn rfind(&self, needle: StrView<'_>) -> Option<usize> {
        backends().rfind(self.data, needle.data)
    }

    /// Offset of the first byte in `set`
    #[inline]
    pub fn find_charset(&self, set: &Charset) -> Option<usize> {
        backends().find_charset(self.data, set)
    }

    /// Offset of the last byte in `set`
    #[inline]
    pub fn rfind_charset(&self, set: &Charset) -> Option<usize> {
        backends().rfind_charset(self.data, set)
    }

    /// Offset of the first byte outside `set`
    #[inline]
    pub fn find_not_charset(&self, set: &Charset) -> Option<usize> {
        backends().find_charset(self.data, &set.inverted())
    }

    /// Offset of the last byte outside `set`
    #[inline]
    pub fn rfind_not_charset(&self, set: &Charset) -> Option<usize> {
        backends().rfind_charset(self.data, &set.inverted())
    }

    /// Non-overlapping occurrences of `needle`, left to right
    ///
    /// ```rust
    /// use strand::StrView;
    ///
    /// let text = StrView::from("abababa");
    /// let starts: Vec<usize> = text.matches(StrView::from("aba")).collect();
    /// assert_eq!(starts, [0, 4]);
    /// ```
    pub fn matches<'n>(&self, needle: StrView<'n>) -> Matches<'a, 'n> {
        Matches {
            haystack: self.data,
            needle: needle.data,
            position: 0,
        }
    }

    /// Split on every `delimiter` byte
    pub fn split(&self, delimiter: u8) -> Split<'a> {
        Split {
            remainder: Some(*self),
            delimiter,
        }
    }

    /// Split on the first byte in `set`; `None` when no byte matches
    pub fn split_once_charset(&self, set: &Charset) -> Option<(StrView<'a>, StrView<'a>)> {
        let pos = self.find_charset(set)?;
        Some((StrView::new(&self.data[..pos]), StrView::new(&self.data[pos + 1..])))
    }

    /// View with leading and trailing bytes in `set` removed
    pub fn trim_charset(&self, set: &Charset) -> StrView<'a> {
        let Some(start) = self.find_not_charset(set) else {
            return StrView::default();
        };
        // a byte outside the set exists, so the reverse search finds one too
        let end = self.rfind_not_charset(set).map_or(self.len(), |pos| pos + 1);
        StrView::new(&self.data[start..end])
    }

    /// Lossy conversion to an owned `String`
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.data).into_owned()
    }
}

impl fmt::Debug for StrView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => write!(f, "StrView({:?})", s),
            None => write!(f, "StrView({:?})", self.data),
        }
    }
}

impl fmt::Display for StrView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.data))
    }
}

impl PartialOrd for StrView<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StrView<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order(*other)
    }
}

impl Hash for StrView<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl<'a> From<&'a str> for StrView<'a> {
    fn from(s: &'a str) -> Self {
        StrView::new(s.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for StrView<'a> {
    fn from(data: &'a [u8]) -> Self {
        StrView::new(data)
    }
}

impl AsRef<[u8]> for StrView<'_> {
    fn as_ref(&self) -> &[u8] {
        self.data
    }
}

impl PartialEq<str> for StrView<'_> {
    fn eq(&self, other: &str) -> bool {
        equal(self.data, other.as_bytes())
    }
}

impl PartialEq<&str> for StrView<'_> {
    fn eq(&self, other: &&str) -> bool {
        equal(self.data, other.as_bytes())
    }
}

impl PartialEq<[u8]> for StrView<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        equal(self.data, other)
    }
}

/// Iterator over non-overlapping match offsets, see [`StrView::matches`]
#[derive(Debug, Clone)]
pub struct Matches<'a, 'n> {
    haystack: &'a [u8],
    needle: &'n [u8],
    position: usize,
}

impl Iterator for Matches<'_, '_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.needle.is_empty() || self.position >= self.haystack.len() {
            return None;
        }
        match backends().find(&self.haystack[self.position..], self.needle) {
            Some(index) => {
                let start = self.position + index;
                self.position = start + self.needle.len();
                Some(start)
            }
            None => {
                self.position = self.haystack.len();
                None
            }
        }
    }
}

/// Iterator over the pieces between delimiter bytes, see [`StrView::split`]
#[derive(Debug, Clone)]
pub struct Split<'a> {
    remainder: Option<StrView<'a>>,
    delimiter: u8,
}

impl<'a> Iterator for Split<'a> {
    type Item = StrView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.remainder?;
        match rest.find_byte(self.delimiter) {
            Some(pos) => {
                self.remainder = Some(StrView::new(&rest.data[pos + 1..]));
                Some(StrView::new(&rest.data[..pos]))
            }
            None => {
                self.remainder = None;
                Some(rest)
            }
        }
    }
}
