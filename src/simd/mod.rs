//! # Runtime Backend Dispatch
//!
//! Every vectorized operation exists as a serial kernel plus optional SSE4.2,
//! AVX2, AVX-512 and NEON kernels. [`bind`] resolves one kernel per operation
//! for a capability mask; the resulting [`Backends`] table is published
//! process-wide and read by the free functions of this crate.
//!
//! ## Lifecycle
//!
//! - [`init`] (or the first call of any dispatched operation) installs the
//!   table for the detected capabilities.
//! - [`rebind`] replaces the installed table. Calls already running keep the
//!   table they loaded; later calls see the new one. Concurrent rebinds must
//!   be serialized by the caller, the last store wins.
//! - [`capabilities`] reports the mask of the installed table.
//!
//! Installed tables are never freed. One table is cached per distinct mask,
//! so rebinding back and forth does not grow memory.
//!
//! ## Example
//!
//! ```
//! use strand::simd::{self, Operation};
//! use strand::Capability;
//!
//! simd::init();
//! let table = simd::bind(Capability::SERIAL);
//! assert_eq!(table.backend_name(Operation::EditDistance), "serial");
//! assert!(simd::capabilities().contains(Capability::SERIAL));
//! ```

pub mod dispatch;

pub use dispatch::{bind, Backends};

use crate::config::{Config, DispatchConfig};
use crate::error::Result;
use crate::system::{detect_capabilities, Capability};
use parking_lot::Mutex;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

/// Dispatched operations, for backend queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Single byte search, forward
    FindByte,
    /// Single byte search, backward
    RfindByte,
    /// Substring search, forward
    Find,
    /// Substring search, backward
    Rfind,
    /// Byte-set search, forward
    FindCharset,
    /// Byte-set search, backward
    RfindCharset,
    /// Non-overlapping copy
    Copy,
    /// Overlap-safe move
    Move,
    /// Memory fill
    Fill,
    /// Levenshtein distance
    EditDistance,
    /// Needleman–Wunsch scoring
    AlignmentScore,
    /// Rolling window hashes
    Hashes,
}

impl Operation {
    /// Every operation, in table order
    pub const ALL: [Operation; 12] = [
        Operation::FindByte,
        Operation::RfindByte,
        Operation::Find,
        Operation::Rfind,
        Operation::FindCharset,
        Operation::RfindCharset,
        Operation::Copy,
        Operation::Move,
        Operation::Fill,
        Operation::EditDistance,
        Operation::AlignmentScore,
        Operation::Hashes,
    ];

    /// Snake-case name used in logs
    pub fn name(self) -> &'static str {
        match self {
            Operation::FindByte => "find_byte",
            Operation::RfindByte => "rfind_byte",
            Operation::Find => "find",
            Operation::Rfind => "rfind",
            Operation::FindCharset => "find_charset",
            Operation::RfindCharset => "rfind_charset",
            Operation::Copy => "copy",
            Operation::Move => "move",
            Operation::Fill => "fill",
            Operation::EditDistance => "edit_distance",
            Operation::AlignmentScore => "alignment_score",
            Operation::Hashes => "hashes",
        }
    }
}

/// Currently installed table; null until first use
static INSTALLED: AtomicPtr<Backends> = AtomicPtr::new(ptr::null_mut());

/// Every table ever installed, one per effective mask
static TABLES: Mutex<Vec<&'static Backends>> = parking_lot::const_mutex(Vec::new());

/// The installed backend table, installing the detected one on first use
#[inline]
pub fn backends() -> &'static Backends {
    let current = INSTALLED.load(Ordering::Acquire);
    if current.is_null() {
        return install_detected();
    }
    // SAFETY: INSTALLED only ever holds pointers to leaked tables from `TABLES`
    unsafe { &*current }
}

/// Install the table for the detected capabilities unless one is already installed.
///
/// Returns the mask of the installed table.
pub fn init() -> Capability {
    backends().mask()
}

/// Install the table allowed by `config`, narrowed to the hardware
pub fn init_with_config(config: &DispatchConfig) -> Result<Capability> {
    config.validate()?;
    Ok(rebind(config.capability_mask()))
}

/// Replace the process-wide table with one bound for `requested`.
///
/// Bits the CPU does not support are dropped with a warning. Returns the
/// effective mask.
pub fn rebind(requested: Capability) -> Capability {
    let detected = detect_capabilities();
    let unsupported = requested - detected;
    if !unsupported.is_empty() {
        log::warn!(
            "requested capabilities {} are not supported by this CPU, binding {} instead",
            unsupported,
            (requested & detected) | Capability::SERIAL
        );
    }
    let table = intern(requested);
    INSTALLED.store(as_mut_ptr(table), Ordering::Release);
    log::debug!("rebound dispatch table to {}", table.mask());
    table.mask()
}

/// Mask of the installed table
#[inline]
pub fn capabilities() -> Capability {
    backends().mask()
}

#[cold]
fn install_detected() -> &'static Backends {
    let table = intern(detect_capabilities());
    match INSTALLED.compare_exchange(ptr::null_mut(), as_mut_ptr(table), Ordering::AcqRel, Ordering::Acquire) {
        Ok(_) => {
            log::debug!("strand {} initialized dispatch for {}", crate::VERSION, table.mask());
            table
        }
        // a concurrent init or rebind won
        // SAFETY: see `backends`
        Err(current) => unsafe { &*current },
    }
}

/// Cached table for the effective mask of `requested`
fn intern(requested: Capability) -> &'static Backends {
    let table = bind(requested);
    let mut tables = TABLES.lock();
    if let Some(existing) = tables.iter().find(|t| t.mask() == table.mask()) {
        return existing;
    }
    let leaked: &'static Backends = Box::leak(Box::new(table));
    tables.push(leaked);
    log::debug!("bound dispatch table {:?}", leaked);
    leaked
}

#[inline]
fn as_mut_ptr(table: &'static Backends) -> *mut Backends {
    table as *const Backends as *mut Backends
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_caches_per_mask() {
        let a = intern(Capability::SERIAL);
        let b = intern(Capability::SERIAL);
        assert!(ptr::eq(a, b));
        // bits the CPU lacks collapse onto the same effective mask
        let c = intern(Capability::all());
        let d = intern(detect_capabilities());
        assert!(ptr::eq(c, d));
    }

    #[test]
    fn test_backends_installed_on_first_use() {
        let table = backends();
        assert!(table.mask().contains(Capability::SERIAL));
        assert!(detect_capabilities().contains(table.mask()));
        assert!(capabilities().contains(Capability::SERIAL));
    }

    #[test]
    fn test_operation_names_are_unique() {
        let mut names: Vec<&str> = Operation::ALL.iter().map(|op| op.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Operation::ALL.len());
    }
}
