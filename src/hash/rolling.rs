//! Two-accumulator polynomial rolling hash
//!
//! Low half: `h = h * 31 + c`. High half: `h = h * 257 + c + 77`. Both are
//! reduced modulo `2^31 - 1` and the outgoing byte of a sliding window is
//! removed with the precomputed `base^(window - 1)`.

use crate::error::{Result, StrandError};

/// Mersenne prime modulus of both accumulators
pub const MODULUS: u64 = (1 << 31) - 1;
/// Base of the low accumulator
pub const LOW_BASE: u64 = 31;
/// Base of the high accumulator
pub const HIGH_BASE: u64 = 257;
/// Offset added to every byte by the high accumulator
pub const HIGH_OFFSET: u64 = 77;

/// Longest window the lane kernels buffer on the stack
pub(crate) const MAX_LANE_WINDOW: usize = 256;

/// Callback receiving `(start, window, hash)`
pub(crate) type Emit<'a> = &'a mut dyn FnMut(usize, usize, u64);

/// Reduce `x < 2^62` modulo `2^31 - 1`
#[inline(always)]
fn reduce(x: u64) -> u64 {
    let r = (x & MODULUS) + (x >> 31);
    let r = (r & MODULUS) + (r >> 31);
    if r >= MODULUS {
        r - MODULUS
    } else {
        r
    }
}

fn pow_mod(base: u64, mut exp: usize) -> u64 {
    let mut result = 1;
    let mut base = base % MODULUS;
    while exp > 0 {
        if exp & 1 == 1 {
            result = reduce(result * base);
        }
        base = reduce(base * base);
        exp >>= 1;
    }
    result
}

/// Pack the high and low accumulators into one hash
#[inline(always)]
pub const fn combine(high: u64, low: u64) -> u64 {
    (high << 32) | low
}

/// Hash of a single window, as reported by [`hashes`](crate::hashes)
pub fn window_hash(window: &[u8]) -> u64 {
    let (low, high) = accumulate(window);
    combine(high, low)
}

#[inline(always)]
fn accumulate(bytes: &[u8]) -> (u64, u64) {
    let mut low = 0;
    let mut high = 0;
    for &c in bytes {
        low = reduce(low * LOW_BASE + c as u64);
        high = reduce(high * HIGH_BASE + c as u64 + HIGH_OFFSET);
    }
    (low, high)
}

/// Weights of the outgoing byte for a window length
#[derive(Debug, Clone, Copy)]
pub(crate) struct Weights {
    low: u64,
    high: u64,
}

impl Weights {
    pub(crate) fn new(window: usize) -> Self {
        Self {
            low: pow_mod(LOW_BASE, window - 1),
            high: pow_mod(HIGH_BASE, window - 1),
        }
    }

    #[inline(always)]
    fn roll(&self, low: u64, high: u64, outgoing: u8, incoming: u8) -> (u64, u64) {
        let low = reduce(low + MODULUS - reduce(outgoing as u64 * self.low));
        let low = reduce(low * LOW_BASE + incoming as u64);
        let high = reduce(high + MODULUS - reduce((outgoing as u64 + HIGH_OFFSET) * self.high));
        let high = reduce(high * HIGH_BASE + incoming as u64 + HIGH_OFFSET);
        (low, high)
    }
}

/// Validate arguments; `Ok(false)` means there is nothing to report
pub(crate) fn check_args(text: &[u8], window: usize, stride: usize) -> Result<bool> {
    if !stride.is_power_of_two() {
        return Err(StrandError::invalid_input(format!(
            "hash stride {} is not a power of two",
            stride
        )));
    }
    Ok(window != 0 && text.len() >= window)
}

/// Serial kernel over every window start
pub(crate) fn hashes(text: &[u8], window: usize, stride: usize, emit: Emit<'_>) {
    emit_from(text, window, stride, 0, &Weights::new(window), emit);
}

/// Report every window starting at or after `first`
pub(crate) fn emit_from(text: &[u8], window: usize, stride: usize, first: usize, weights: &Weights, emit: Emit<'_>) {
    if first + window > text.len() {
        return;
    }
    let mask = stride - 1;
    let (mut low, mut high) = accumulate(&text[first..first + window]);
    let last = text.len() - window;
    let mut start = first;
    loop {
        if start & mask == 0 {
            emit(start, window, combine(high, low));
        }
        if start == last {
            break;
        }
        (low, high) = weights.roll(low, high, text[start], text[start + window]);
        start += 1;
    }
}

/// `LANES` independent accumulators over adjacent runs of `window` starts.
///
/// Lane `k` of a block at `base` covers starts `base + k * window ..`; hashes
/// are buffered per lane and reported lane by lane, which keeps the global
/// start order. Windows longer than [`MAX_LANE_WINDOW`] and the final partial
/// block go through the serial path.
#[inline(always)]
pub(crate) fn lanes<const LANES: usize>(text: &[u8], window: usize, stride: usize, emit: Emit<'_>) {
    let weights = Weights::new(window);
    if window > MAX_LANE_WINDOW {
        emit_from(text, window, stride, 0, &weights, emit);
        return;
    }

    let mask = stride - 1;
    let span = LANES * window;
    let mut buffer = [[0u64; MAX_LANE_WINDOW]; LANES];
    let mut base = 0;
    // the last lane reads up to `base + span + window - 1`
    while base + span + window - 1 <= text.len() {
        let mut low = [0u64; LANES];
        let mut high = [0u64; LANES];
        for j in 0..window {
            for k in 0..LANES {
                let c = text[base + k * window + j] as u64;
                low[k] = reduce(low[k] * LOW_BASE + c);
                high[k] = reduce(high[k] * HIGH_BASE + c + HIGH_OFFSET);
            }
        }
        for k in 0..LANES {
            buffer[k][0] = combine(high[k], low[k]);
        }
        for i in 1..window {
            for k in 0..LANES {
                let start = base + k * window + i;
                (low[k], high[k]) = weights.roll(low[k], high[k], text[start - 1], text[start - 1 + window]);
                buffer[k][i] = combine(high[k], low[k]);
            }
        }
        for (k, hashes) in buffer.iter().enumerate() {
            for (i, &hash) in hashes[..window].iter().enumerate() {
                let start = base + k * window + i;
                if start & mask == 0 {
                    emit(start, window, hash);
                }
            }
        }
        base += span;
    }
    emit_from(text, window, stride, base, &weights, emit);
}

// =============================================================================
// BACKEND ENTRY POINTS
// =============================================================================

#[cfg(all(target_arch = "x86_64", feature = "simd"))]
mod x86 {
    use super::*;

    #[target_feature(enable = "avx2")]
    unsafe fn hashes_avx2_impl(text: &[u8], window: usize, stride: usize, emit: Emit<'_>) {
        lanes::<8>(text, window, stride, emit)
    }

    pub(crate) fn hashes_avx2(text: &[u8], window: usize, stride: usize, emit: Emit<'_>) {
        // SAFETY: bound only when AVX2 was detected
        unsafe { hashes_avx2_impl(text, window, stride, emit) }
    }

    #[cfg(feature = "avx512")]
    #[target_feature(enable = "avx512f,avx512bw")]
    unsafe fn hashes_avx512_impl(text: &[u8], window: usize, stride: usize, emit: Emit<'_>) {
        lanes::<16>(text, window, stride, emit)
    }

    #[cfg(feature = "avx512")]
    pub(crate) fn hashes_avx512(text: &[u8], window: usize, stride: usize, emit: Emit<'_>) {
        // SAFETY: bound only when AVX-512BW was detected
        unsafe { hashes_avx512_impl(text, window, stride, emit) }
    }
}

#[cfg(all(target_arch = "x86_64", feature = "simd"))]
pub(crate) use x86::*;

#[cfg(all(target_arch = "aarch64", feature = "simd"))]
mod neon {
    use super::*;

    #[target_feature(enable = "neon")]
    unsafe fn hashes_neon_impl(text: &[u8], window: usize, stride: usize, emit: Emit<'_>) {
        lanes::<4>(text, window, stride, emit)
    }

    pub(crate) fn hashes_neon(text: &[u8], window: usize, stride: usize, emit: Emit<'_>) {
        // SAFETY: bound only when NEON was detected
        unsafe { hashes_neon_impl(text, window, stride, emit) }
    }
}

#[cfg(all(target_arch = "aarch64", feature = "simd"))]
pub(crate) use neon::*;

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(kernel: fn(&[u8], usize, usize, Emit<'_>), text: &[u8], window: usize, stride: usize) -> Vec<(usize, u64)> {
        let mut out = Vec::new();
        kernel(text, window, stride, &mut |start, len, hash| {
            assert_eq!(len, window);
            out.push((start, hash));
        });
        out
    }

    #[test]
    fn test_reduce() {
        assert_eq!(reduce(MODULUS), 0);
        assert_eq!(reduce(MODULUS + 5), 5);
        assert_eq!(reduce((1u64 << 62) - 1), ((1u64 << 62) - 1) % MODULUS);
        assert_eq!(pow_mod(31, 0), 1);
        assert_eq!(pow_mod(257, 3), 257 * 257 * 257 % MODULUS);
    }

    #[test]
    fn test_rolling_matches_direct_hash() {
        let text = b"the quick brown fox jumps over the lazy dog";
        for window in [1, 2, 5, 16] {
            let rolled = collect(hashes, text, window, 1);
            assert_eq!(rolled.len(), text.len() - window + 1);
            for (start, hash) in rolled {
                assert_eq!(hash, window_hash(&text[start..start + window]));
            }
        }
    }

    #[test]
    fn test_stride_filters_starts() {
        let text: Vec<u8> = (0..100u8).collect();
        let all = collect(hashes, &text, 7, 1);
        let strided = collect(hashes, &text, 7, 4);
        let expected: Vec<_> = all.into_iter().filter(|(s, _)| s % 4 == 0).collect();
        assert_eq!(strided, expected);
    }

    #[test]
    fn test_lanes_match_serial() {
        let text: Vec<u8> = (0..2000u32).map(|i| (i * 7919 % 251) as u8).collect();
        for window in [1, 3, 8, 33, 256, 300] {
            for stride in [1, 2, 16] {
                let serial = collect(hashes, &text, window, stride);
                assert_eq!(collect(lanes::<4>, &text, window, stride), serial, "w {window} s {stride}");
                assert_eq!(collect(lanes::<8>, &text, window, stride), serial, "w {window} s {stride}");
            }
        }
    }

    #[test]
    fn test_argument_checks() {
        assert!(check_args(b"abc", 2, 3).is_err());
        assert!(check_args(b"abc", 2, 0).is_err());
        assert!(!check_args(b"abc", 0, 1).unwrap());
        assert!(!check_args(b"abc", 4, 1).unwrap());
        assert!(check_args(b"abc", 3, 1).unwrap());
    }
}
