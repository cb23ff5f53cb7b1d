//! Fixed-size bitset sketches built from rolling hashes

use super::hashes;
use crate::error::{Result, StrandError};

/// A bitset of `bits` bits with one bit set per observed hash.
///
/// Power-of-two sizes map a hash to `hash & (bits - 1)`, any other size to
/// `hash % bits`. The number of bits two fingerprints share estimates how many
/// windows their texts have in common.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    words: Vec<u64>,
    bits: usize,
}

impl Fingerprint {
    /// Empty fingerprint of `bits` bits
    pub fn new(bits: usize) -> Result<Self> {
        if bits == 0 {
            return Err(StrandError::invalid_input("fingerprint needs at least one bit"));
        }
        Ok(Self {
            words: vec![0; bits.div_ceil(64)],
            bits,
        })
    }

    /// Fingerprint of every `window`-byte window of `text` at starts that are multiples of `stride`
    ///
    /// ```rust
    /// use strand::Fingerprint;
    /// let a = Fingerprint::from_text(b"the quick brown fox", 1024, 4, 1).unwrap();
    /// let b = Fingerprint::from_text(b"the quick brown cat", 1024, 4, 1).unwrap();
    /// assert!(a.intersection_count(&b).unwrap() > 0);
    /// ```
    pub fn from_text(text: &[u8], bits: usize, window: usize, stride: usize) -> Result<Self> {
        let mut fingerprint = Self::new(bits)?;
        fingerprint.add_text(text, window, stride)?;
        Ok(fingerprint)
    }

    /// Number of bits in the set
    pub fn bits(&self) -> usize {
        self.bits
    }

    #[inline]
    fn slot(&self, hash: u64) -> usize {
        if self.bits.is_power_of_two() {
            (hash & (self.bits as u64 - 1)) as usize
        } else {
            (hash % self.bits as u64) as usize
        }
    }

    /// Record one hash
    #[inline]
    pub fn add(&mut self, hash: u64) {
        let slot = self.slot(hash);
        self.words[slot / 64] |= 1u64 << (slot % 64);
    }

    /// Whether the bit for `hash` is set
    #[inline]
    pub fn contains(&self, hash: u64) -> bool {
        let slot = self.slot(hash);
        self.words[slot / 64] & (1u64 << (slot % 64)) != 0
    }

    /// Record every rolling hash of `text`
    pub fn add_text(&mut self, text: &[u8], window: usize, stride: usize) -> Result<()> {
        hashes(text, window, stride, |_, _, hash| self.add(hash))
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Clear every bit
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Number of bits set in both fingerprints; sizes must match
    pub fn intersection_count(&self, other: &Self) -> Result<usize> {
        if self.bits != other.bits {
            return Err(StrandError::invalid_input(format!(
                "fingerprint sizes differ: {} vs {} bits",
                self.bits, other.bits
            )));
        }
        Ok(self
            .words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum())
    }

    /// Backing words, bit `i % 64` of word `i / 64` is bit `i`
    pub fn as_words(&self) -> &[u64] {
        &self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::window_hash;

    #[test]
    fn test_slot_mapping() {
        let mut pow2 = Fingerprint::new(64).unwrap();
        pow2.add(64 + 5);
        assert!(pow2.contains(5));
        assert_eq!(pow2.as_words()[0], 1 << 5);

        let mut odd = Fingerprint::new(100).unwrap();
        odd.add(205);
        assert!(odd.contains(5));
        assert_eq!(odd.count_ones(), 1);
        assert_eq!(odd.as_words().len(), 2);
    }

    #[test]
    fn test_text_fingerprint_contains_window_hashes() {
        let text = b"abcdefghij";
        let fp = Fingerprint::from_text(text, 4096, 3, 1).unwrap();
        for start in 0..=text.len() - 3 {
            assert!(fp.contains(window_hash(&text[start..start + 3])));
        }
        assert!(fp.count_ones() <= 8);
    }

    #[test]
    fn test_intersection() {
        let a = Fingerprint::from_text(b"shared prefix then differs", 1 << 16, 5, 1).unwrap();
        let b = Fingerprint::from_text(b"shared prefix but not here", 1 << 16, 5, 1).unwrap();
        let same = a.intersection_count(&a).unwrap();
        assert_eq!(same, a.count_ones());
        let shared = a.intersection_count(&b).unwrap();
        // ten windows lie inside the shared prefix
        assert!(shared >= 8);
        assert!(shared < same);

        let small = Fingerprint::new(32).unwrap();
        assert!(a.intersection_count(&small).is_err());
    }

    #[test]
    fn test_zero_bits_rejected() {
        assert!(Fingerprint::new(0).is_err());
        let mut fp = Fingerprint::new(8).unwrap();
        assert!(fp.add_text(b"abc", 2, 3).is_err());
        fp.add(3);
        fp.clear();
        assert_eq!(fp.count_ones(), 0);
    }
}
