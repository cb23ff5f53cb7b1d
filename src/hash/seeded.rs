//! Seeded 64-bit content hash and a counter-mode byte generator
//!
//! Both are built from single AES encryption rounds evaluated in portable
//! code, so every target produces the same values. Short inputs (up to 64
//! bytes) fold zero-padded 16-byte blocks into one 128-bit lane; longer inputs
//! fold 64-byte blocks into four lanes that are merged at the end.

/// Hex digits of pi after the point, 1024 bits
const PI: [u64; 16] = [
    0x243F6A8885A308D3, 0x13198A2E03707344, 0xA4093822299F31D0, 0x082EFA98EC4E6C89,
    0x452821E638D01377, 0xBE5466CF34E90C6C, 0xC0AC29B7C97C50DD, 0x3F84D5B5B5470917,
    0x9216D5D98979FB1B, 0xD1310BA698DFB5AC, 0x2FFD72DBD01ADFB7, 0xB8E1AFED6A267E96,
    0xBA7C9045F12C7F99, 0x24A19947B3916CF7, 0x0801F2E2858EFC16, 0x636920D871574E69,
];

/// Byte order applied to the additive lanes before each block is summed in
const SHUFFLE: [u8; 16] = [
    0x04, 0x0b, 0x09, 0x06, 0x08, 0x0d, 0x0f, 0x05, 0x0e, 0x03, 0x01, 0x0c, 0x00, 0x07, 0x0a, 0x02,
];

#[rustfmt::skip]
const SBOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16,
];

/// Bytes folded per step of the wide state
const BLOCK: usize = 64;

/// One 128-bit lane as two little-endian words
type Lane = [u64; 2];

#[inline]
fn to_bytes(lane: Lane) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[..8].copy_from_slice(&lane[0].to_le_bytes());
    out[8..].copy_from_slice(&lane[1].to_le_bytes());
    out
}

#[inline]
fn from_bytes(bytes: &[u8; 16]) -> Lane {
    let mut lo = [0u8; 8];
    let mut hi = [0u8; 8];
    lo.copy_from_slice(&bytes[..8]);
    hi.copy_from_slice(&bytes[8..]);
    [u64::from_le_bytes(lo), u64::from_le_bytes(hi)]
}

/// Lane `index` of a zero-padded 64-byte block
#[inline]
fn lane_of(block: &[u8; BLOCK], index: usize) -> Lane {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&block[index * 16..index * 16 + 16]);
    from_bytes(&bytes)
}

#[inline]
fn gf_double(x: u8) -> u8 {
    (x << 1) ^ ((x >> 7) * 0x1b)
}

/// One AES encryption round: `MixColumns(SubBytes(ShiftRows(state))) ^ key`
pub(crate) fn aes_round(state: Lane, key: Lane) -> Lane {
    let input = to_bytes(state);
    let mut s = [0u8; 16];
    for (i, byte) in s.iter_mut().enumerate() {
        *byte = SBOX[input[(5 * i) % 16] as usize];
    }
    for column in s.chunks_exact_mut(4) {
        let [a, b, c, d] = [column[0], column[1], column[2], column[3]];
        let all = a ^ b ^ c ^ d;
        column[0] = a ^ all ^ gf_double(a ^ b);
        column[1] = b ^ all ^ gf_double(b ^ c);
        column[2] = c ^ all ^ gf_double(c ^ d);
        column[3] = d ^ all ^ gf_double(d ^ a);
    }
    let mixed = from_bytes(&s);
    [mixed[0] ^ key[0], mixed[1] ^ key[1]]
}

#[inline]
fn shuffle(lane: Lane) -> Lane {
    let bytes = to_bytes(lane);
    let mut out = [0u8; 16];
    for (dst, &from) in out.iter_mut().zip(SHUFFLE.iter()) {
        *dst = bytes[from as usize];
    }
    from_bytes(&out)
}

/// Fold one 16-byte block into an AES lane and an additive lane
#[inline]
fn absorb(aes: &mut Lane, sum: &mut Lane, block: Lane) {
    *aes = aes_round(*aes, block);
    let shuffled = shuffle(*sum);
    *sum = [shuffled[0].wrapping_add(block[0]), shuffled[1].wrapping_add(block[1])];
}

/// Two extra rounds with the length-salted key; fewer fail avalanche tests
#[inline]
fn finish(mixed: Lane, key: Lane, length: usize) -> u64 {
    let salted = [key[0].wrapping_add(length as u64), key[1]];
    aes_round(aes_round(mixed, salted), mixed)[0]
}

/// Single-lane path for inputs of at most 64 bytes held in a zero-padded block
fn digest_short(seed: u64, block: &[u8; BLOCK], length: usize) -> u64 {
    debug_assert!(length <= BLOCK);
    let mut aes = [seed ^ PI[0], seed ^ PI[1]];
    let mut sum = [seed ^ PI[8], seed ^ PI[9]];
    let lanes = length.div_ceil(16).max(1);
    for index in 0..lanes {
        absorb(&mut aes, &mut sum, lane_of(block, index));
    }
    finish(aes_round(sum, aes), [seed, seed], length)
}

/// Four-lane state for inputs longer than one block
#[derive(Debug, Clone, Copy)]
struct WideState {
    aes: [Lane; 4],
    sum: [Lane; 4],
}

impl WideState {
    fn new(seed: u64) -> Self {
        let mut aes = [[0u64; 2]; 4];
        let mut sum = [[0u64; 2]; 4];
        for k in 0..4 {
            aes[k] = [seed ^ PI[2 * k], seed ^ PI[2 * k + 1]];
            sum[k] = [seed ^ PI[8 + 2 * k], seed ^ PI[9 + 2 * k]];
        }
        Self { aes, sum }
    }

    #[inline]
    fn absorb(&mut self, block: &[u8; BLOCK]) {
        for k in 0..4 {
            absorb(&mut self.aes[k], &mut self.sum[k], lane_of(block, k));
        }
    }

    fn finish(&self, seed: u64, length: usize) -> u64 {
        let mixed: [Lane; 4] = std::array::from_fn(|k| aes_round(self.sum[k], self.aes[k]));
        let left = aes_round(mixed[0], mixed[1]);
        let right = aes_round(mixed[2], mixed[3]);
        finish(aes_round(left, right), [seed, seed], length)
    }
}

/// Seeded 64-bit hash of `text`.
///
/// Not cryptographic. The same `text` and `seed` give the same value on every
/// target and through [`HashState`] regardless of how the input is chunked.
///
/// ```rust
/// assert_eq!(strand::hash(b"hello", 0), strand::hash(b"hello", 0));
/// assert_ne!(strand::hash(b"hello", 0), strand::hash(b"world", 0));
/// assert_ne!(strand::hash(b"hello", 0), strand::hash(b"hello", 1));
/// ```
pub fn hash(text: &[u8], seed: u64) -> u64 {
    let mut block = [0u8; BLOCK];
    if text.len() <= BLOCK {
        block[..text.len()].copy_from_slice(text);
        return digest_short(seed, &block, text.len());
    }

    let mut state = WideState::new(seed);
    let mut chunks = text.chunks_exact(BLOCK);
    for chunk in &mut chunks {
        block.copy_from_slice(chunk);
        state.absorb(&block);
    }
    let tail = chunks.remainder();
    if !tail.is_empty() {
        block = [0u8; BLOCK];
        block[..tail.len()].copy_from_slice(tail);
        state.absorb(&block);
    }
    state.finish(seed, text.len())
}

/// Incremental form of [`hash`].
///
/// A full block stays buffered until more input arrives, so the digest can
/// still take the single-lane path when the total is at most 64 bytes.
///
/// ```rust
/// use strand::HashState;
/// let mut state = HashState::new(7);
/// state.update(b"hello ").update(b"world");
/// assert_eq!(state.digest(), strand::hash(b"hello world", 7));
/// ```
#[derive(Debug, Clone)]
pub struct HashState {
    seed: u64,
    wide: WideState,
    pending: [u8; BLOCK],
    length: usize,
}

impl HashState {
    /// Empty state for `seed`
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            wide: WideState::new(seed),
            pending: [0; BLOCK],
            length: 0,
        }
    }

    /// Seed this state was created with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Total bytes fed so far
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether nothing has been fed yet
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Bytes of the last, possibly full, block held in `pending`
    #[inline]
    fn buffered(&self) -> usize {
        match self.length {
            0 => 0,
            n => (n - 1) % BLOCK + 1,
        }
    }

    /// Append `text` to the hashed input
    pub fn update(&mut self, mut text: &[u8]) -> &mut Self {
        while !text.is_empty() {
            let mut filled = self.buffered();
            if filled == BLOCK {
                self.wide.absorb(&self.pending);
                self.pending = [0; BLOCK];
                filled = 0;
            }
            let take = text.len().min(BLOCK - filled);
            self.pending[filled..filled + take].copy_from_slice(&text[..take]);
            self.length += take;
            text = &text[take..];
        }
        self
    }

    /// Hash of everything fed so far; the state stays usable
    pub fn digest(&self) -> u64 {
        if self.length <= BLOCK {
            return digest_short(self.seed, &self.pending, self.length);
        }
        let mut wide = self.wide;
        wide.absorb(&self.pending);
        wide.finish(self.seed, self.length)
    }

    /// Forget all input, keeping the seed
    pub fn reset(&mut self) {
        *self = Self::new(self.seed);
    }
}

impl Default for HashState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl std::hash::Hasher for HashState {
    fn finish(&self) -> u64 {
        self.digest()
    }

    fn write(&mut self, bytes: &[u8]) {
        self.update(bytes);
    }
}

/// Fill `buffer` with pseudo-random bytes derived from `nonce`.
///
/// Each 16-byte lane `i` is one AES round over `nonce + i` keyed with the nonce
/// mixed into a rotating slice of pi. The same nonce always yields the same
/// bytes, and a shorter buffer gets a prefix of a longer one.
///
/// ```rust
/// let mut a = [0u8; 40];
/// let mut b = [0u8; 40];
/// strand::fill_random(&mut a, 3);
/// strand::fill_random(&mut b, 3);
/// assert_eq!(a, b);
/// ```
pub fn fill_random(buffer: &mut [u8], nonce: u64) {
    for (index, chunk) in buffer.chunks_mut(16).enumerate() {
        let counter = nonce.wrapping_add(index as u64);
        let slot = index % 4;
        let key = [nonce ^ PI[2 * slot], nonce ^ PI[2 * slot + 1]];
        let generated = to_bytes(aes_round([counter, counter], key));
        chunk.copy_from_slice(&generated[..chunk.len()]);
    }
}
