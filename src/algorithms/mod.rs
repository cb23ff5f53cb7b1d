//! Sorting and set algorithms over collections of byte strings
//!
//! The collections are never copied: routines read strings through the
//! [`Sequence`] trait and permute caller-owned `order` arrays of indices.

pub mod sequence;
pub mod set_ops;
pub mod sort;

pub use sequence::{PackedStrings, Sequence};
pub use set_ops::{intersect, stable_partition, unique};
pub use sort::{argsort, argsort_in, compare_bytes, merge_sorted_runs, sorted_order, MAX_SORT_LEN};
