//! Indexed access to a collection of byte strings

use crate::string::StrView;

/// A read-only collection of byte strings addressed by index.
///
/// Sorting and batch routines never take ownership of the strings: they read
/// through this trait and permute a caller-owned `order` array instead.
///
/// # Examples
///
/// ```rust
/// use strand::Sequence;
///
/// let words = ["pear", "apple", "fig"];
/// assert_eq!(Sequence::len(&words[..]), 3);
/// assert_eq!(Sequence::get(&words[..], 1), b"apple");
/// ```
pub trait Sequence {
    /// Number of strings
    fn len(&self) -> usize;

    /// Bytes of the string at `index`.
    ///
    /// Callers keep `index < len()`; implementations may panic otherwise.
    fn get(&self, index: usize) -> &[u8];

    /// Whether the sequence holds no strings
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: AsRef<[u8]>> Sequence for [T] {
    #[inline]
    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    #[inline]
    fn get(&self, index: usize) -> &[u8] {
        self[index].as_ref()
    }
}

impl<T: AsRef<[u8]>> Sequence for Vec<T> {
    #[inline]
    fn len(&self) -> usize {
        Vec::len(self)
    }

    #[inline]
    fn get(&self, index: usize) -> &[u8] {
        self[index].as_ref()
    }
}

impl<S: Sequence + ?Sized> Sequence for &S {
    #[inline]
    fn len(&self) -> usize {
        (**self).len()
    }

    #[inline]
    fn get(&self, index: usize) -> &[u8] {
        (**self).get(index)
    }
}

/// Strings stored back to back in one buffer, delimited by end offsets.
///
/// The layout used by columnar stores: `offsets[i]` is the end of string `i`
/// and string `0` starts at zero.
#[derive(Debug, Clone, Copy)]
pub struct PackedStrings<'a> {
    data: &'a [u8],
    offsets: &'a [usize],
}

impl<'a> PackedStrings<'a> {
    /// Wrap a tape and its end offsets.
    ///
    /// Offsets must be non-decreasing and end inside `data`.
    pub fn new(data: &'a [u8], offsets: &'a [usize]) -> crate::Result<Self> {
        let mut start = 0;
        for (i, &end) in offsets.iter().enumerate() {
            if end < start || end > data.len() {
                return Err(crate::StrandError::invalid_input(format!(
                    "offset {} of string {} is outside {}..={}",
                    end,
                    i,
                    start,
                    data.len()
                )));
            }
            start = end;
        }
        Ok(Self { data, offsets })
    }

    /// View of the string at `index`
    pub fn view(&self, index: usize) -> StrView<'a> {
        let start = if index == 0 { 0 } else { self.offsets[index - 1] };
        StrView::new(&self.data[start..self.offsets[index]])
    }
}

impl Sequence for PackedStrings<'_> {
    #[inline]
    fn len(&self) -> usize {
        self.offsets.len()
    }

    #[inline]
    fn get(&self, index: usize) -> &[u8] {
        let start = if index == 0 { 0 } else { self.offsets[index - 1] };
        &self.data[start..self.offsets[index]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_and_vec() {
        let owned = vec![String::from("a"), String::from("bc")];
        assert_eq!(Sequence::len(&owned), 2);
        assert_eq!(Sequence::get(&owned, 1), b"bc");

        let bytes: [&[u8]; 2] = [b"\x00\xff", b""];
        assert_eq!(Sequence::get(&bytes[..], 0), b"\x00\xff");
        assert!(!Sequence::is_empty(&bytes[..]));
    }

    #[test]
    fn test_packed_strings() {
        let data = b"applefigpear";
        let offsets = [5, 8, 8, 12];
        let packed = PackedStrings::new(data, &offsets).unwrap();
        assert_eq!(packed.len(), 4);
        assert_eq!(packed.get(0), b"apple");
        assert_eq!(packed.get(2), b"");
        assert_eq!(packed.view(3).as_bytes(), b"pear");

        assert!(PackedStrings::new(data, &[5, 3]).is_err());
        assert!(PackedStrings::new(data, &[13]).is_err());
    }
}
