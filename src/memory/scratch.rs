//! Typed views over allocator-provided scratch memory
//!
//! A [`ScratchBuffer`] owns one zeroed allocation for the duration of a call and
//! releases it on drop. Kernels never reinterpret the raw bytes themselves: they
//! ask for a [`LaneView`] of a given [`LaneWidth`], which is only constructed
//! after the size and alignment have been checked.

use super::Allocator;
use crate::error::{Result, StrandError};
use std::fmt;
use std::ptr::NonNull;

/// Integer width of the lanes a scratch buffer is viewed as
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LaneWidth {
    /// 8-bit lanes
    U8,
    /// 16-bit lanes
    U16,
    /// 32-bit lanes
    U32,
    /// 64-bit lanes
    U64,
}

impl LaneWidth {
    /// Narrowest width able to hold every value in `0..=max_value`
    pub fn for_max_value(max_value: usize) -> Self {
        if max_value <= u8::MAX as usize {
            Self::U8
        } else if max_value <= u16::MAX as usize {
            Self::U16
        } else if max_value as u64 <= u32::MAX as u64 {
            Self::U32
        } else {
            Self::U64
        }
    }

    /// Size of one lane in bytes
    pub const fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
            Self::U64 => 8,
        }
    }
}

/// A scratch buffer viewed as lanes of one integer width
pub enum LaneView<'a> {
    /// Byte lanes
    U8(&'a mut [u8]),
    /// 16-bit lanes
    U16(&'a mut [u16]),
    /// 32-bit lanes
    U32(&'a mut [u32]),
    /// 64-bit lanes
    U64(&'a mut [u64]),
}

impl LaneView<'_> {
    /// Width tag of this view
    pub fn width(&self) -> LaneWidth {
        match self {
            Self::U8(_) => LaneWidth::U8,
            Self::U16(_) => LaneWidth::U16,
            Self::U32(_) => LaneWidth::U32,
            Self::U64(_) => LaneWidth::U64,
        }
    }

    /// Number of lanes in the view
    pub fn len(&self) -> usize {
        match self {
            Self::U8(s) => s.len(),
            Self::U16(s) => s.len(),
            Self::U32(s) => s.len(),
            Self::U64(s) => s.len(),
        }
    }

    /// Whether the view has no lanes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for LaneView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaneView")
            .field("width", &self.width())
            .field("len", &self.len())
            .finish()
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
}

/// Unsigned integer usable as a DP accumulator lane
pub trait Lane: sealed::Sealed + Copy + Ord + Default + fmt::Debug + 'static {
    /// Width tag matching `Self`
    const WIDTH: LaneWidth;
    /// Largest representable value
    const MAX: Self;

    /// Narrowing conversion; callers guarantee the value fits
    fn from_usize(value: usize) -> Self;
    /// Widening conversion
    fn to_usize(self) -> usize;
    /// Saturating increment
    fn inc(self) -> Self;
    /// Wrapping addition
    fn add_lane(self, other: Self) -> Self;
    /// Wrapping subtraction
    fn sub_lane(self, other: Self) -> Self;
    /// Extract the matching slice out of a tagged view
    fn slice<'v>(view: LaneView<'v>) -> Option<&'v mut [Self]>;
}

macro_rules! impl_lane {
    ($ty:ty, $variant:ident) => {
        impl Lane for $ty {
            const WIDTH: LaneWidth = LaneWidth::$variant;
            const MAX: Self = <$ty>::MAX;

            #[inline(always)]
            fn from_usize(value: usize) -> Self {
                debug_assert!(value as u64 <= <$ty>::MAX as u64);
                value as $ty
            }

            #[inline(always)]
            fn to_usize(self) -> usize {
                self as usize
            }

            #[inline(always)]
            fn inc(self) -> Self {
                self.saturating_add(1)
            }

            #[inline(always)]
            fn add_lane(self, other: Self) -> Self {
                self.wrapping_add(other)
            }

            #[inline(always)]
            fn sub_lane(self, other: Self) -> Self {
                self.wrapping_sub(other)
            }

            fn slice<'v>(view: LaneView<'v>) -> Option<&'v mut [Self]> {
                match view {
                    LaneView::$variant(s) => Some(s),
                    _ => None,
                }
            }
        }
    };
}

impl_lane!(u8, U8);
impl_lane!(u16, U16);
impl_lane!(u32, U32);
impl_lane!(u64, U64);

/// Zero-initialized scratch memory released back to its allocator on drop
pub struct ScratchBuffer<'a> {
    allocator: &'a dyn Allocator,
    ptr: NonNull<u8>,
    size: usize,
    align: usize,
}

impl<'a> ScratchBuffer<'a> {
    /// Allocate `size` zeroed bytes aligned for 64-bit lanes
    pub fn new(allocator: &'a dyn Allocator, size: usize) -> Result<Self> {
        Self::with_align(allocator, size, std::mem::align_of::<u64>())
    }

    /// Allocate room for `count` lanes of `width`
    pub fn for_lanes(allocator: &'a dyn Allocator, width: LaneWidth, count: usize) -> Result<Self> {
        let size = count
            .checked_mul(width.bytes())
            .ok_or_else(|| StrandError::out_of_memory(usize::MAX))?;
        Self::new(allocator, size)
    }

    /// Allocate `size` zeroed bytes with an explicit alignment
    pub fn with_align(allocator: &'a dyn Allocator, size: usize, align: usize) -> Result<Self> {
        let ptr = allocator.allocate(size, align).ok_or_else(|| {
            log::debug!("{} allocator refused {} scratch bytes", allocator.name(), size);
            StrandError::out_of_memory(size)
        })?;
        // SAFETY: the allocator returned `size` writable bytes
        unsafe { ptr.as_ptr().write_bytes(0, size) };
        Ok(Self { allocator, ptr, size, align })
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The raw bytes
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: the allocation is `size` initialized bytes owned by `self`
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.size) }
    }

    /// View the buffer as lanes of `width`.
    ///
    /// Fails if the pointer is misaligned for the width or the size is not a
    /// multiple of it.
    pub fn lanes(&mut self, width: LaneWidth) -> Result<LaneView<'_>> {
        let bytes = width.bytes();
        if self.ptr.as_ptr() as usize % bytes != 0 {
            return Err(StrandError::invalid_input(format!(
                "scratch buffer is not aligned for {:?} lanes",
                width
            )));
        }
        if self.size % bytes != 0 {
            return Err(StrandError::invalid_input(format!(
                "scratch size {} is not a multiple of {:?} lanes",
                self.size, width
            )));
        }
        let count = self.size / bytes;
        let raw = self.ptr.as_ptr();
        // SAFETY: alignment and size were checked above; memory is zeroed and
        // exclusively borrowed through `&mut self`.
        Ok(unsafe {
            match width {
                LaneWidth::U8 => LaneView::U8(std::slice::from_raw_parts_mut(raw, count)),
                LaneWidth::U16 => LaneView::U16(std::slice::from_raw_parts_mut(raw.cast(), count)),
                LaneWidth::U32 => LaneView::U32(std::slice::from_raw_parts_mut(raw.cast(), count)),
                LaneWidth::U64 => LaneView::U64(std::slice::from_raw_parts_mut(raw.cast(), count)),
            }
        })
    }

    /// View the buffer as a slice of `T` lanes
    pub fn as_lanes<T: Lane>(&mut self) -> Result<&mut [T]> {
        let view = self.lanes(T::WIDTH)?;
        T::slice(view).ok_or_else(|| StrandError::invalid_input("lane width mismatch"))
    }
}

impl Drop for ScratchBuffer<'_> {
    fn drop(&mut self) {
        unsafe { self.allocator.free(self.ptr, self.size, self.align) }
    }
}
