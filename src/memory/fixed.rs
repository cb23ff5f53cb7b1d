//! Bump allocator over caller-provided memory
//!
//! Useful when the host owns the scratch region (stack arrays, pinned buffers)
//! and no heap traffic is acceptable during a call.

use super::Allocator;
use std::cell::Cell;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// Hands out aligned slices of a borrowed byte region; never grows
pub struct FixedBufferAllocator<'a> {
    base: NonNull<u8>,
    len: usize,
    offset: Cell<usize>,
    _buffer: PhantomData<&'a mut [u8]>,
}

impl<'a> FixedBufferAllocator<'a> {
    /// Wrap a mutable byte region for the lifetime `'a`
    pub fn new(buffer: &'a mut [u8]) -> Self {
        let len = buffer.len();
        // A zero-length slice still carries a non-null dangling pointer
        let base = NonNull::new(buffer.as_mut_ptr()).unwrap_or(NonNull::dangling());
        Self {
            base,
            len,
            offset: Cell::new(0),
            _buffer: PhantomData,
        }
    }

    /// Total size of the wrapped region
    pub fn capacity(&self) -> usize {
        self.len
    }

    /// Bytes handed out so far, including alignment padding
    pub fn used_bytes(&self) -> usize {
        self.offset.get()
    }

    /// Release every allocation at once
    pub fn reset(&mut self) {
        self.offset.set(0);
    }
}

// SAFETY: every block lies inside the borrowed region, past all live blocks
unsafe impl Allocator for FixedBufferAllocator<'_> {
    fn allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        if !align.is_power_of_two() {
            return None;
        }
        let base = self.base.as_ptr() as usize;
        let start = base.checked_add(self.offset.get())?;
        let aligned = start.checked_add(align - 1)? & !(align - 1);
        let end = aligned.checked_add(size)?;
        if end - base > self.len {
            return None;
        }
        self.offset.set(end - base);
        // SAFETY: `aligned - base <= len`, inside the borrowed region
        NonNull::new(unsafe { self.base.as_ptr().add(aligned - base) })
    }

    unsafe fn free(&self, ptr: NonNull<u8>, size: usize, _align: usize) {
        let offset = ptr.as_ptr() as usize - self.base.as_ptr() as usize;
        if offset + size == self.offset.get() {
            self.offset.set(offset);
        }
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}
