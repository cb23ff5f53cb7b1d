//! # Strand: Byte-String Processing Engine
//!
//! Vectorized primitives over arbitrary byte strings, selected at runtime for
//! the instruction sets the host CPU supports.
//!
//! ## Key Features
//!
//! - **Search**: forward and reverse byte, substring and byte-set search
//! - **Similarity**: bounded Levenshtein distance, Needleman–Wunsch scoring, Hamming distance
//! - **Hashing**: rolling window hashes, fingerprint bitsets, a seeded streaming hash
//! - **Sorting**: argsort of string sequences, intersection and deduplication
//! - **Memory**: copy, overlapping move, fill, byte translation
//! - **Allocators**: arena, fixed-buffer and system allocators threaded through every
//!   call that needs scratch memory
//! - **Dispatch**: serial, SSE4.2, AVX2, AVX-512 and NEON backends bound once per
//!   process and re-bindable at runtime
//!
//! ## Quick Start
//!
//! ```rust
//! use strand::{
//!     argsort, edit_distance, find, hashes, Charset, Fingerprint, SortConfig, StrView,
//!     SystemAllocator,
//! };
//!
//! // substring and byte-set search
//! assert_eq!(find(b"abcabc", b"bc"), Some(1));
//! let digits = Charset::digits();
//! assert_eq!(StrView::from("room 101").find_charset(&digits), Some(5));
//!
//! // bounded edit distance with explicit scratch memory
//! let alloc = SystemAllocator;
//! assert_eq!(edit_distance(b"kitten", b"sitting", 0, &alloc).unwrap(), 3);
//!
//! // rolling hashes folded into a fingerprint
//! let mut print = Fingerprint::new(1024).unwrap();
//! hashes(b"the quick brown fox", 4, 1, |_, _, hash| print.add(hash)).unwrap();
//! assert!(print.count_ones() > 0);
//!
//! // sort a sequence through an index permutation
//! let words = ["pear", "apple", "fig"];
//! let mut order = [0u64, 1, 2];
//! argsort(&words[..], &mut order, &SortConfig::default()).unwrap();
//! assert_eq!(order, [1, 2, 0]);
//! ```
//!
//! ## Backend Selection
//!
//! The first call into any dispatched operation detects the CPU and installs a
//! table of kernels; see [`simd`] for the lifecycle and [`rebind`] to restrict
//! it at runtime.

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod algorithms;
pub mod config;
pub mod error;
pub mod hash;
pub mod memory;
pub mod similarity;
pub mod simd;
pub mod string;
pub mod system;

// Re-export core types
pub use error::{Result, StrandError};
pub use system::{cpu_info, detect_capabilities, Capability, CpuInfo};

// Dispatch
pub use simd::{capabilities, init_with_config, rebind, Backends, Operation};

// Search and views
pub use string::{
    equal, find, find_byte, find_charset, find_not_charset, order, rfind, rfind_byte, rfind_charset,
    rfind_not_charset, Charset, StrView,
};

// Similarity
pub use similarity::{
    alignment_score, edit_distance, edit_distance_or_sentinel, edit_distances, hamming_distance, CostMatrix,
};

// Hashing
pub use hash::{fill_random, hash, hashes, window_hash, Fingerprint, HashState};

// Sorting
pub use algorithms::{argsort, intersect, unique, PackedStrings, Sequence};
pub use config::{ArenaConfig, DispatchConfig, SortConfig};

// Memory
pub use memory::{
    checksum, copy, fill, lookup, lookup_in_place, move_within, Allocator, ArenaAllocator, FixedBufferAllocator,
    LookupTable, SystemAllocator, ALLOCATION_FAILURE,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library: detect the CPU and install the matching backends.
///
/// Calling it is optional; the first dispatched call does the same. Returns
/// the capability mask of the installed table.
pub fn init() -> Capability {
    log::debug!("Initializing strand v{}", VERSION);
    simd::init()
}
