//! 256-bit byte membership sets
//!
//! A [`Charset`] stores one bit per byte value in four 64-bit words. Vector
//! backends consume it through [`Charset::nibble_tables`], which splits the
//! 32 bytes of the set by the low nibble's top bit so that membership can be
//! reconstructed with two 16-entry table shuffles.

use std::fmt;

/// Set of byte values with O(1) membership tests
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Charset {
    words: [u64; 4],
}

impl Charset {
    /// The empty set
    pub const fn new() -> Self {
        Self { words: [0; 4] }
    }

    /// Set containing every byte value
    pub const fn full() -> Self {
        Self { words: [u64::MAX; 4] }
    }

    /// Set containing every byte of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut set = Self::new();
        for &b in bytes {
            set.add(b);
        }
        set
    }

    /// Set containing every byte for which `pred` holds
    pub fn from_fn<F: FnMut(u8) -> bool>(mut pred: F) -> Self {
        let mut set = Self::new();
        for b in 0..=255u8 {
            if pred(b) {
                set.add(b);
            }
        }
        set
    }

    /// Raw words, bit `c & 63` of word `c >> 6` is byte `c`
    #[inline]
    pub const fn words(&self) -> [u64; 4] {
        self.words
    }

    /// Add a byte to the set
    #[inline]
    pub fn add(&mut self, byte: u8) {
        self.words[(byte >> 6) as usize] |= 1u64 << (byte & 63);
    }

    /// Remove a byte from the set
    #[inline]
    pub fn remove(&mut self, byte: u8) {
        self.words[(byte >> 6) as usize] &= !(1u64 << (byte & 63));
    }

    /// Test membership
    #[inline]
    pub const fn contains(&self, byte: u8) -> bool {
        (self.words[(byte >> 6) as usize] >> (byte & 63)) & 1 != 0
    }

    /// Flip membership of every byte value
    #[inline]
    pub fn invert(&mut self) {
        for word in &mut self.words {
            *word = !*word;
        }
    }

    /// Complement of this set
    #[inline]
    pub fn inverted(&self) -> Self {
        let mut set = *self;
        set.invert();
        set
    }

    /// Union of two sets
    pub fn union(&self, other: &Self) -> Self {
        let mut words = self.words;
        for (w, o) in words.iter_mut().zip(other.words) {
            *w |= o;
        }
        Self { words }
    }

    /// Number of member bytes
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether the set has no members
    pub fn is_empty(&self) -> bool {
        self.words == [0; 4]
    }

    /// The set as 32 bytes, byte `k` holding members `8k..8k+8`
    #[inline]
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (i, word) in self.words.iter().enumerate() {
            bytes[i * 8..i * 8 + 8].copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    /// Shuffle tables indexed by the high nibble of a byte.
    ///
    /// For byte `c = hi << 4 | lo`, membership is bit `lo & 7` of
    /// `even[hi]` when `lo < 8` and of `odd[hi]` otherwise.
    #[inline]
    pub fn nibble_tables(&self) -> ([u8; 16], [u8; 16]) {
        let bytes = self.to_bytes();
        let mut even = [0u8; 16];
        let mut odd = [0u8; 16];
        for hi in 0..16 {
            even[hi] = bytes[hi * 2];
            odd[hi] = bytes[hi * 2 + 1];
        }
        (even, odd)
    }

    // ---- presets (ASCII only) ----

    /// `a-zA-Z`
    pub fn ascii_letters() -> Self {
        Self::from_fn(|b| b.is_ascii_alphabetic())
    }

    /// `a-z`
    pub fn ascii_lowercase() -> Self {
        Self::from_fn(|b| b.is_ascii_lowercase())
    }

    /// `A-Z`
    pub fn ascii_uppercase() -> Self {
        Self::from_fn(|b| b.is_ascii_uppercase())
    }

    /// `0-9`
    pub fn digits() -> Self {
        Self::from_fn(|b| b.is_ascii_digit())
    }

    /// `0-9a-fA-F`
    pub fn hex_digits() -> Self {
        Self::from_fn(|b| b.is_ascii_hexdigit())
    }

    /// Space, tab, line feed, vertical tab, form feed, carriage return
    pub fn whitespace() -> Self {
        Self::from_bytes(b" \t\n\x0B\x0C\r")
    }

    /// ASCII punctuation
    pub fn punctuation() -> Self {
        Self::from_fn(|b| b.is_ascii_punctuation())
    }

    /// ASCII control characters
    pub fn control() -> Self {
        Self::from_fn(|b| b.is_ascii_control())
    }

    /// Printable ASCII including space
    pub fn printable() -> Self {
        Self::from_fn(|b| b.is_ascii_graphic() || b == b' ')
    }

    /// Standard base64 alphabet with padding
    pub fn base64() -> Self {
        Self::from_fn(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Charset({:016x}{:016x}{:016x}{:016x})",
            self.words[3], self.words[2], self.words[1], self.words[0]
        )
    }
}

impl FromIterator<u8> for Charset {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = Self::new();
        for b in iter {
            set.add(b);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_contains_remove() {
        let mut set = Charset::new();
        assert!(set.is_empty());
        set.add(b'a');
        set.add(0);
        set.add(255);
        assert!(set.contains(b'a'));
        assert!(set.contains(0));
        assert!(set.contains(255));
        assert!(!set.contains(b'b'));
        assert_eq!(set.count(), 3);
        set.remove(b'a');
        assert!(!set.contains(b'a'));
    }

    #[test]
    fn test_invert_flips_every_byte() {
        let set = Charset::from_bytes(b"hello, world");
        let inv = set.inverted();
        for b in 0..=255u8 {
            assert_ne!(set.contains(b), inv.contains(b));
        }
        assert_eq!(inv.inverted(), set);
        assert_eq!(set.count() + inv.count(), 256);
    }

    #[test]
    fn test_nibble_tables_reconstruct_membership() {
        let set = Charset::from_bytes(b"\x00\x07\x08\x0F\x10AZaz\x7F\x80\xC3\xFF");
        let (even, odd) = set.nibble_tables();
        for c in 0..=255u8 {
            let hi = (c >> 4) as usize;
            let lo = c & 0x0F;
            let row = if lo < 8 { even[hi] } else { odd[hi] };
            assert_eq!(row & (1 << (lo & 7)) != 0, set.contains(c), "byte {c}");
        }
    }

    #[test]
    fn test_presets() {
        assert_eq!(Charset::ascii_letters().count(), 52);
        assert_eq!(Charset::digits().count(), 10);
        assert_eq!(Charset::hex_digits().count(), 22);
        assert_eq!(Charset::whitespace().count(), 6);
        assert_eq!(Charset::base64().count(), 65);
        assert_eq!(Charset::printable().count(), 95);
        assert_eq!(
            Charset::ascii_lowercase().union(&Charset::ascii_uppercase()),
            Charset::ascii_letters()
        );
        assert_eq!(Charset::full().count(), 256);
    }

    #[test]
    fn test_from_iterator() {
        let set: Charset = b"abcabc".iter().copied().collect();
        assert_eq!(set.count(), 3);
    }
}
