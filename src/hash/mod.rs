//! Rolling hashes and fingerprint bitsets
//!
//! [`hashes`] reports one 64-bit hash per window of a text, combining two
//! independent polynomial accumulators modulo the Mersenne prime `2^31 - 1`.
//! [`Fingerprint`] folds those hashes into a fixed-size bitset for cheap
//! near-duplicate estimation. [`hash`] and [`HashState`] give a seeded
//! content hash, one-shot or streamed, and [`fill_random`] reuses the same
//! mixing rounds to generate reproducible noise.

pub mod fingerprint;
pub(crate) mod rolling;
pub mod seeded;

pub use fingerprint::Fingerprint;
pub use seeded::{fill_random, hash, HashState};
pub use rolling::{combine, window_hash, HIGH_BASE, HIGH_OFFSET, LOW_BASE, MODULUS};

use crate::error::Result;
use crate::simd::backends;

/// Report the rolling hash of every `window`-byte window of `text` whose start
/// is a multiple of `stride`.
///
/// `stride` must be a power of two. Windows are reported in increasing start
/// order as `callback(start, window, hash)`; nothing is reported when
/// `window == 0` or the text is shorter than one window.
///
/// # Examples
///
/// ```rust
/// let mut seen = Vec::new();
/// strand::hashes(b"aaaa", 2, 1, |start, len, hash| seen.push((start, len, hash))).unwrap();
/// assert_eq!(seen.len(), 3);
/// assert!(seen.iter().all(|&(_, len, hash)| len == 2 && hash == seen[0].2));
/// ```
#[inline]
pub fn hashes<F>(text: &[u8], window: usize, stride: usize, mut callback: F) -> Result<()>
where
    F: FnMut(usize, usize, u64),
{
    backends().hashes(text, window, stride, &mut callback)
}
