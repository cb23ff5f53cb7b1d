//! Arena allocator for scratch buffers
//!
//! The arena owns one heap block and hands out memory by bumping an offset.
//! Freeing the most recent allocation rewinds the offset, so the nested
//! allocate/free pattern of the distance kernels reuses the same bytes; any
//! other free is a no-op until [`ArenaAllocator::reset`].

use super::{Allocator, SystemAllocator};
use crate::config::ArenaConfig;
use crate::error::{Result, StrandError};
use std::cell::Cell;
use std::ptr::NonNull;

/// A bump arena that allocates sequentially from an owned block
pub struct ArenaAllocator {
    buffer: NonNull<u8>,
    capacity: usize,
    alignment: usize,
    current: Cell<usize>,
    peak: Cell<usize>,
    allocations: Cell<u64>,
}

/// Arena usage snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStats {
    /// Bytes currently handed out, including alignment padding
    pub used_bytes: usize,
    /// Highest `used_bytes` since creation or the last reset
    pub peak_bytes: usize,
    /// Total capacity of the arena
    pub capacity: usize,
    /// Number of successful allocations since creation or the last reset
    pub allocations: u64,
}

impl ArenaAllocator {
    /// Create a new arena with the specified capacity
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_alignment(capacity, 64)
    }

    /// Create an arena from a validated [`ArenaConfig`]
    pub fn with_config(config: &ArenaConfig) -> Result<Self> {
        Self::with_alignment(config.capacity, config.alignment)
    }

    fn with_alignment(capacity: usize, alignment: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(StrandError::invalid_input("arena capacity cannot be zero"));
        }
        if !alignment.is_power_of_two() {
            return Err(StrandError::invalid_input("arena alignment must be a power of two"));
        }

        let buffer = SystemAllocator
            .allocate(capacity, alignment)
            .ok_or_else(|| StrandError::out_of_memory(capacity))?;

        log::debug!("Created arena of {} bytes", capacity);
        Ok(Self {
            buffer,
            capacity,
            alignment,
            current: Cell::new(0),
            peak: Cell::new(0),
            allocations: Cell::new(0),
        })
    }

    /// Make the whole arena available again.
    ///
    /// Taking `&mut self` guarantees no scratch buffer borrowed from this arena
    /// is still alive.
    pub fn reset(&mut self) {
        self.current.set(0);
        self.peak.set(0);
        self.allocations.set(0);
    }

    /// Get the total capacity of the arena
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the number of bytes remaining
    pub fn remaining_bytes(&self) -> usize {
        self.capacity - self.current.get()
    }

    /// Current usage statistics
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            used_bytes: self.current.get(),
            peak_bytes: self.peak.get(),
            capacity: self.capacity,
            allocations: self.allocations.get(),
        }
    }

    fn base_addr(&self) -> usize {
        self.buffer.as_ptr() as usize
    }
}

// SAFETY: every block lies inside the owned buffer, past all live blocks
unsafe impl Allocator for ArenaAllocator {
    fn allocate(&self, size: usize, align: usize) -> Option<NonNull<u8>> {
        if !align.is_power_of_two() {
            return None;
        }
        let base = self.base_addr();
        let start = base.checked_add(self.current.get())?;
        let aligned = start.checked_add(align - 1)? & !(align - 1);
        let end = aligned.checked_add(size)?;
        if end - base > self.capacity {
            return None;
        }

        self.current.set(end - base);
        self.peak.set(self.peak.get().max(end - base));
        self.allocations.set(self.allocations.get() + 1);
        // SAFETY: `aligned - base` is within the owned block
        NonNull::new(unsafe { self.buffer.as_ptr().add(aligned - base) })
    }

    unsafe fn free(&self, ptr: NonNull<u8>, size: usize, _align: usize) {
        let offset = ptr.as_ptr() as usize - self.base_addr();
        if offset + size == self.current.get() {
            self.current.set(offset);
        }
    }

    fn name(&self) -> &'static str {
        "arena"
    }
}

impl Drop for ArenaAllocator {
    fn drop(&mut self) {
        unsafe { SystemAllocator.free(self.buffer, self.capacity, self.alignment) }
    }
}

// The block is uniquely owned; the Cell offsets keep the arena !Sync.
unsafe impl Send for ArenaAllocator {}
