//! Backend tables and binding
//!
//! Each operation has a static candidate list ordered from the most to the
//! least demanding backend. Binding walks the list and takes the first entry
//! whose requirement is a subset of the allowed mask; the serial entry
//! requires only [`Capability::SERIAL`], so every list resolves.

use super::Operation;
use crate::error::{Result, StrandError};
use crate::hash::rolling;
use crate::memory::copy::{self as bulk, check_move};
use crate::memory::Allocator;
use crate::similarity::{self, CostMatrix};
use crate::string::search;
use crate::string::Charset;
use crate::system::{detect_capabilities, Capability};
use std::fmt;
use std::ops::Range;

/// Non-overlapping or overlap-safe copy of `len` bytes
pub(crate) type CopyFn = unsafe fn(*mut u8, *const u8, usize);
pub(crate) type FillFn = fn(&mut [u8], u8);
pub(crate) type FindByteFn = fn(&[u8], u8) -> Option<usize>;
pub(crate) type FindFn = fn(&[u8], &[u8]) -> Option<usize>;
pub(crate) type FindCharsetFn = fn(&[u8], &Charset) -> Option<usize>;
pub(crate) type EditDistanceFn = fn(&[u8], &[u8], usize, &dyn Allocator) -> Result<usize>;
pub(crate) type AlignmentScoreFn = fn(&[u8], &[u8], &CostMatrix, i8, &dyn Allocator) -> Result<i64>;
pub(crate) type HashesFn = fn(&[u8], usize, usize, &mut dyn FnMut(usize, usize, u64));

/// One implementation of an operation and the capabilities it needs
#[derive(Clone, Copy)]
struct Candidate<F> {
    requires: Capability,
    name: &'static str,
    kernel: F,
}

/// A kernel chosen for one operation
#[derive(Clone, Copy)]
struct Slot<F> {
    name: &'static str,
    kernel: F,
}

/// Build a candidate list; entries may carry `#[cfg]` attributes
macro_rules! candidates {
    ($ty:ty; $($(#[$meta:meta])* $requires:ident => $name:literal : $kernel:path),+ $(,)?) => {{
        let mut list: Vec<Candidate<$ty>> = Vec::new();
        $(
            $(#[$meta])*
            list.push(Candidate { requires: Capability::$requires, name: $name, kernel: $kernel as $ty });
        )+
        list
    }};
}

fn select<F: Copy>(mask: Capability, list: &[Candidate<F>]) -> Slot<F> {
    let chosen = list
        .iter()
        .find(|c| mask.contains(c.requires))
        .or_else(|| list.last())
        .copied();
    match chosen {
        Some(c) => Slot { name: c.name, kernel: c.kernel },
        // every list is built with a serial entry
        None => unreachable!("empty candidate list"),
    }
}

/// Resolved function table for one capability mask.
///
/// Tables are plain values: [`bind`] builds one for any mask, the process-wide
/// table behind [`backends`](super::backends) is just the one currently
/// installed. All methods validate their arguments before a kernel runs.
#[derive(Clone, Copy)]
pub struct Backends {
    mask: Capability,
    find_byte: Slot<FindByteFn>,
    rfind_byte: Slot<FindByteFn>,
    find: Slot<FindFn>,
    rfind: Slot<FindFn>,
    find_charset: Slot<FindCharsetFn>,
    rfind_charset: Slot<FindCharsetFn>,
    copy: Slot<CopyFn>,
    copy_overlapping: Slot<CopyFn>,
    fill: Slot<FillFn>,
    edit_distance: Slot<EditDistanceFn>,
    alignment_score: Slot<AlignmentScoreFn>,
    hashes: Slot<HashesFn>,
}

/// Resolve every operation for `requested`, narrowed to the detected capabilities.
///
/// Never fails: the serial baseline is always eligible.
///
/// ```rust
/// use strand::simd::{bind, Operation};
/// use strand::Capability;
///
/// let serial = bind(Capability::SERIAL);
/// assert_eq!(serial.backend_name(Operation::Find), "serial");
/// assert_eq!(serial.find(b"abcabc", b"bc"), Some(1));
/// ```
pub fn bind(requested: Capability) -> Backends {
    let mask = (requested & detect_capabilities()) | Capability::SERIAL;
    Backends {
        mask,
        find_byte: select(mask, &find_byte_candidates()),
        rfind_byte: select(mask, &rfind_byte_candidates()),
        find: select(mask, &find_candidates()),
        rfind: select(mask, &rfind_candidates()),
        find_charset: select(mask, &find_charset_candidates()),
        rfind_charset: select(mask, &rfind_charset_candidates()),
        copy: select(mask, &copy_candidates()),
        copy_overlapping: select(mask, &copy_overlapping_candidates()),
        fill: select(mask, &fill_candidates()),
        edit_distance: select(mask, &edit_distance_candidates()),
        alignment_score: select(mask, &alignment_candidates()),
        hashes: select(mask, &hashes_candidates()),
    }
}

impl Backends {
    /// Capability mask this table was bound against
    pub fn mask(&self) -> Capability {
        self.mask
    }

    /// Name of the backend serving `operation`
    pub fn backend_name(&self, operation: Operation) -> &'static str {
        match operation {
            Operation::FindByte => self.find_byte.name,
            Operation::RfindByte => self.rfind_byte.name,
            Operation::Find => self.find.name,
            Operation::Rfind => self.rfind.name,
            Operation::FindCharset => self.find_charset.name,
            Operation::RfindCharset => self.rfind_charset.name,
            Operation::Copy => self.copy.name,
            Operation::Move => self.copy_overlapping.name,
            Operation::Fill => self.fill.name,
            Operation::EditDistance => self.edit_distance.name,
            Operation::AlignmentScore => self.alignment_score.name,
            Operation::Hashes => self.hashes.name,
        }
    }

    /// See [`find`](crate::find)
    #[inline]
    pub fn find(&self, haystack: &[u8], needle: &[u8]) -> Option<usize> {
        if needle.is_empty() || needle.len() > haystack.len() {
            return None;
        }
        (self.find.kernel)(haystack, needle)
    }

    /// See [`rfind`](crate::rfind)
    #[inline]
    pub fn rfind(&self, haystack: &[u8], needle: &[u8]) -> Option<usize> {
        if needle.is_empty() || needle.len() > haystack.len() {
            return None;
        }
        (self.rfind.kernel)(haystack, needle)
    }

    /// See [`find_byte`](crate::find_byte)
    #[inline]
    pub fn find_byte(&self, haystack: &[u8], byte: u8) -> Option<usize> {
        (self.find_byte.kernel)(haystack, byte)
    }

    /// See [`rfind_byte`](crate::rfind_byte)
    #[inline]
    pub fn rfind_byte(&self, haystack: &[u8], byte: u8) -> Option<usize> {
        (self.rfind_byte.kernel)(haystack, byte)
    }

    /// See [`find_charset`](crate::find_charset)
    #[inline]
    pub fn find_charset(&self, haystack: &[u8], set: &Charset) -> Option<usize> {
        (self.find_charset.kernel)(haystack, set)
    }

    /// See [`rfind_charset`](crate::rfind_charset)
    #[inline]
    pub fn rfind_charset(&self, haystack: &[u8], set: &Charset) -> Option<usize> {
        (self.rfind_charset.kernel)(haystack, set)
    }

    /// See [`copy`](crate::copy)
    pub fn copy(&self, dst: &mut [u8], src: &[u8]) -> Result<()> {
        if dst.len() != src.len() {
            return Err(StrandError::invalid_input(format!(
                "copy length mismatch: destination {} bytes, source {} bytes",
                dst.len(),
                src.len()
            )));
        }
        // SAFETY: both slices are valid for `len` bytes and cannot alias
        // since `dst` is borrowed mutably
        unsafe { (self.copy.kernel)(dst.as_mut_ptr(), src.as_ptr(), src.len()) };
        Ok(())
    }

    /// See [`move_within`](crate::move_within)
    pub fn move_within(&self, buf: &mut [u8], src: Range<usize>, dest: usize) -> Result<()> {
        let (start, len, dest) = check_move(buf.len(), &src, dest)?;
        if len == 0 || start == dest {
            return Ok(());
        }
        let base = buf.as_mut_ptr();
        // SAFETY: both ranges were checked to lie inside `buf`
        unsafe { (self.copy_overlapping.kernel)(base.add(dest), base.add(start), len) };
        Ok(())
    }

    /// See [`fill`](crate::fill)
    #[inline]
    pub fn fill(&self, buf: &mut [u8], value: u8) {
        (self.fill.kernel)(buf, value)
    }

    /// See [`edit_distance`](crate::edit_distance)
    pub fn edit_distance(&self, a: &[u8], b: &[u8], bound: usize, alloc: &dyn Allocator) -> Result<usize> {
        similarity::run_edit_distance(self.edit_distance.kernel, a, b, bound, alloc)
    }

    /// See [`alignment_score`](crate::alignment_score)
    pub fn alignment_score(
        &self,
        a: &[u8],
        b: &[u8],
        costs: &CostMatrix,
        gap: i8,
        alloc: &dyn Allocator,
    ) -> Result<i64> {
        similarity::run_alignment_score(self.alignment_score.kernel, a, b, costs, gap, alloc)
    }

    /// See [`hashes`](crate::hashes)
    pub fn hashes(
        &self,
        text: &[u8],
        window: usize,
        stride: usize,
        callback: &mut dyn FnMut(usize, usize, u64),
    ) -> Result<()> {
        if rolling::check_args(text, window, stride)? {
            (self.hashes.kernel)(text, window, stride, callback);
        }
        Ok(())
    }
}

impl fmt::Debug for Backends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Backends");
        s.field("mask", &self.mask);
        for operation in Operation::ALL {
            s.field(operation.name(), &self.backend_name(operation));
        }
        s.finish()
    }
}

// =============================================================================
// CANDIDATE LISTS
// =============================================================================

fn find_byte_candidates() -> Vec<Candidate<FindByteFn>> {
    candidates![FindByteFn;
        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        AVX512 => "avx512": search::x86::find_byte_avx512,
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        AVX2 => "avx2": search::x86::find_byte_avx2,
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        SSE42 => "sse42": search::x86::find_byte_sse42,
        #[cfg(all(target_arch = "aarch64", feature = "simd"))]
        NEON => "neon": search::neon::find_byte_neon,
        SERIAL => "serial": search::serial::find_byte,
    ]
}

fn rfind_byte_candidates() -> Vec<Candidate<FindByteFn>> {
    candidates![FindByteFn;
        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        AVX512 => "avx512": search::x86::rfind_byte_avx512,
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        AVX2 => "avx2": search::x86::rfind_byte_avx2,
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        SSE42 => "sse42": search::x86::rfind_byte_sse42,
        #[cfg(all(target_arch = "aarch64", feature = "simd"))]
        NEON => "neon": search::neon::rfind_byte_neon,
        SERIAL => "serial": search::serial::rfind_byte,
    ]
}

fn find_candidates() -> Vec<Candidate<FindFn>> {
    candidates![FindFn;
        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        AVX512 => "avx512": search::x86::find_avx512,
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        AVX2 => "avx2": search::x86::find_avx2,
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        SSE42 => "sse42": search::x86::find_sse42,
        #[cfg(all(target_arch = "aarch64", feature = "simd"))]
        NEON => "neon": search::neon::find_neon,
        SERIAL => "serial": search::serial::find,
    ]
}

fn rfind_candidates() -> Vec<Candidate<FindFn>> {
    candidates![FindFn;
        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        AVX512 => "avx512": search::x86::rfind_avx512,
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        AVX2 => "avx2": search::x86::rfind_avx2,
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        SSE42 => "sse42": search::x86::rfind_sse42,
        #[cfg(all(target_arch = "aarch64", feature = "simd"))]
        NEON => "neon": search::neon::rfind_neon,
        SERIAL => "serial": search::serial::rfind,
    ]
}

fn find_charset_candidates() -> Vec<Candidate<FindCharsetFn>> {
    candidates![FindCharsetFn;
        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        AVX512 => "avx512": search::x86::find_charset_avx512,
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        AVX2 => "avx2": search::x86::find_charset_avx2,
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        SSE42 => "sse42": search::x86::find_charset_sse42,
        #[cfg(all(target_arch = "aarch64", feature = "simd"))]
        NEON => "neon": search::neon::find_charset_neon,
        SERIAL => "serial": search::serial::find_charset,
    ]
}

fn rfind_charset_candidates() -> Vec<Candidate<FindCharsetFn>> {
    candidates![FindCharsetFn;
        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        AVX512 => "avx512": search::x86::rfind_charset_avx512,
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        AVX2 => "avx2": search::x86::rfind_charset_avx2,
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        SSE42 => "sse42": search::x86::rfind_charset_sse42,
        #[cfg(all(target_arch = "aarch64", feature = "simd"))]
        NEON => "neon": search::neon::rfind_charset_neon,
        SERIAL => "serial": search::serial::rfind_charset,
    ]
}

fn copy_candidates() -> Vec<Candidate<CopyFn>> {
    candidates![CopyFn;
        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        AVX512 => "avx512": bulk::x86::copy_avx512,
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        AVX2 => "avx2": bulk::x86::copy_avx2,
        #[cfg(all(target_arch = "aarch64", feature = "simd"))]
        NEON => "neon": bulk::neon::copy_neon,
        SERIAL => "serial": bulk::serial::copy,
    ]
}

fn copy_overlapping_candidates() -> Vec<Candidate<CopyFn>> {
    candidates![CopyFn;
        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        AVX512 => "avx512": bulk::x86::copy_overlapping_avx512,
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        AVX2 => "avx2": bulk::x86::copy_overlapping_avx2,
        #[cfg(all(target_arch = "aarch64", feature = "simd"))]
        NEON => "neon": bulk::neon::copy_overlapping_neon,
        SERIAL => "serial": bulk::serial::copy_overlapping,
    ]
}

fn fill_candidates() -> Vec<Candidate<FillFn>> {
    candidates![FillFn;
        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        AVX512 => "avx512": bulk::x86::fill_avx512,
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        AVX2 => "avx2": bulk::x86::fill_avx2,
        #[cfg(all(target_arch = "aarch64", feature = "simd"))]
        NEON => "neon": bulk::neon::fill_neon,
        SERIAL => "serial": bulk::serial::fill,
    ]
}

fn edit_distance_candidates() -> Vec<Candidate<EditDistanceFn>> {
    candidates![EditDistanceFn;
        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        AVX512 => "avx512": similarity::accel::edit_distance_avx512,
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        AVX2 => "avx2": similarity::accel::edit_distance_avx2,
        #[cfg(all(target_arch = "aarch64", feature = "simd"))]
        NEON => "neon": similarity::accel::edit_distance_neon,
        SERIAL => "serial": similarity::serial::edit_distance,
    ]
}

fn alignment_candidates() -> Vec<Candidate<AlignmentScoreFn>> {
    candidates![AlignmentScoreFn;
        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        AVX512 => "avx512": similarity::accel::alignment_avx512,
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        AVX2 => "avx2": similarity::accel::alignment_avx2,
        #[cfg(all(target_arch = "aarch64", feature = "simd"))]
        NEON => "neon": similarity::accel::alignment_neon,
        SERIAL => "serial": similarity::serial::alignment_score,
    ]
}

fn hashes_candidates() -> Vec<Candidate<HashesFn>> {
    candidates![HashesFn;
        #[cfg(all(target_arch = "x86_64", feature = "avx512"))]
        AVX512 => "avx512": rolling::hashes_avx512,
        #[cfg(all(target_arch = "x86_64", feature = "simd"))]
        AVX2 => "avx2": rolling::hashes_avx2,
        #[cfg(all(target_arch = "aarch64", feature = "simd"))]
        NEON => "neon": rolling::hashes_neon,
        SERIAL => "serial": rolling::hashes,
    ]
}
