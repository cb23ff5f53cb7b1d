//! Scratch memory allocators and bulk memory operations
//!
//! Every engine operation that needs temporary memory takes an explicit
//! [`Allocator`]. Three implementations are provided:
//!
//! - [`SystemAllocator`]: the global heap, thread-safe, the default
//! - [`ArenaAllocator`]: an owned bump arena, reset in bulk between batches
//! - [`FixedBufferAllocator`]: a bump allocator over caller-provided memory
//!
//! A `None` from [`Allocator::allocate`] surfaces as
//! [`StrandError::OutOfMemory`](crate::StrandError::OutOfMemory); nothing in the
//! engine aborts on allocation failure.

pub mod bump;
pub mod copy;
pub mod fixed;
pub mod scratch;

pub use bump::{ArenaAllocator, ArenaStats};
pub use copy::{checksum, copy, fill, lookup, lookup_in_place, move_within, LookupTable};
pub use fixed::FixedBufferAllocator;
pub use scratch::{Lane, LaneView, LaneWidth, ScratchBuffer};

use std::alloc::{alloc, dealloc, Layout};
use std::ptr::NonNull;

/// Reserved result of the flat distance entry points when scratch allocation fails
pub const ALLOCATION_FAILURE: usize = usize::MAX;

/// Minimal allocator interface threaded through every allocating call.
///
/// The implementing value is its own context: arenas carry their bump offset,
/// fixed-buffer allocators their borrowed region.
///
/// # Safety
///
/// Scratch buffers write through the returned pointers without further checks.
/// A `Some(ptr)` from [`allocate`](Self::allocate) must be valid for reads and
/// writes of `size` bytes, aligned to `align`, and must not overlap any other
/// live allocation from the same allocator until it is passed to
/// [`free`](Self::free) or the allocator is reset.
pub unsafe trait Allocator {
    /// Allocate `size` bytes aligned to `align` (a power of two).
    ///
    /// Returns `None` when the request cannot be satisfied.
    fn allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>>;

    /// Return memory obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must come from this allocator with the same `size` and `align`, and
    /// must not be used afterwards.
    unsafe fn free(&self, ptr: NonNull<u8>, size: usize, align: usize);

    /// Short name used in log messages
    fn name(&self) -> &'static str {
        "allocator"
    }
}

// SAFETY: forwards to `A`, which upholds the contract
unsafe impl<A: Allocator + ?Sized> Allocator for &A {
    #[inline]
    fn allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        (**self).allocate(size, align)
    }

    #[inline]
    unsafe fn free(&self, ptr: NonNull<u8>, size: usize, align: usize) {
        unsafe { (**self).free(ptr, size, align) }
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Global heap allocator; safe to share across threads
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

// SAFETY: pointers come from the global allocator with the requested layout
unsafe impl Allocator for SystemAllocator {
    fn allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        if !align.is_power_of_two() {
            return None;
        }
        if size == 0 {
            // Zero-sized requests get a well-aligned dangling pointer
            return NonNull::new(align as *mut u8);
        }
        let layout = Layout::from_size_align(size, align).ok()?;
        NonNull::new(unsafe { alloc(layout) })
    }

    unsafe fn free(&self, ptr: NonNull<u8>, size: usize, align: usize) {
        if size == 0 {
            return;
        }
        if let Ok(layout) = Layout::from_size_align(size, align) {
            unsafe { dealloc(ptr.as_ptr(), layout) }
        }
    }

    fn name(&self) -> &'static str {
        "system"
    }
}
