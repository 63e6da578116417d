//! Bounds-checked views over host buffers.

use core::{
    fmt,
    ops::{Deref, DerefMut, Range},
    slice,
};

/// Why an `(offset, length)` pair was rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Reason {
    /// The offset is negative.
    NegativeOffset,
    /// The length is negative.
    NegativeLength,
    /// `offset + length` overflows.
    Overflow,
    /// `offset + length` is past the end of the buffer.
    PastEnd,
    /// The buffer pointer is null but its capacity is not zero.
    NullBuffer,
    /// The capacity is larger than `isize::MAX`.
    CapacityTooLarge,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NegativeOffset => "negative offset",
            Self::NegativeLength => "negative length",
            Self::Overflow => "offset plus length overflows",
            Self::PastEnd => "range extends past the end of the buffer",
            Self::NullBuffer => "null buffer with non-zero capacity",
            Self::CapacityTooLarge => "capacity exceeds `isize::MAX`",
        };
        f.write_str(s)
    }
}

/// An `(offset, length)` pair does not fit its buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{reason}: offset={off} length={len} capacity={cap}")]
pub struct OutOfRange {
    /// Why the pair was rejected.
    pub reason: Reason,
    /// The requested offset.
    pub off: isize,
    /// The requested length.
    pub len: isize,
    /// The buffer's capacity.
    pub cap: usize,
}

/// Validates `(off, len)` against `cap`.
fn range(cap: usize, off: isize, len: isize) -> Result<Range<usize>, OutOfRange> {
    let err = |reason| OutOfRange {
        reason,
        off,
        len,
        cap,
    };
    let start = usize::try_from(off).map_err(|_| err(Reason::NegativeOffset))?;
    let n = usize::try_from(len).map_err(|_| err(Reason::NegativeLength))?;
    let end = start.checked_add(n).ok_or(err(Reason::Overflow))?;
    if end > cap {
        return Err(err(Reason::PastEnd));
    }
    Ok(start..end)
}

/// Like [`range`], but for in-crate callers that already hold
/// `usize` values.
pub(crate) fn sub(buf: &[u8], off: usize, len: usize) -> Result<&[u8], OutOfRange> {
    let err = |reason| OutOfRange {
        reason,
        off: isize::try_from(off).unwrap_or(isize::MAX),
        len: isize::try_from(len).unwrap_or(isize::MAX),
        cap: buf.len(),
    };
    let end = off.checked_add(len).ok_or(err(Reason::Overflow))?;
    buf.get(off..end).ok_or(err(Reason::PastEnd))
}

/// Checks a raw host buffer.
fn raw_cap(ptr: *const u8, cap: usize, off: isize, len: isize) -> Result<(), OutOfRange> {
    let err = |reason| OutOfRange {
        reason,
        off,
        len,
        cap,
    };
    if isize::try_from(cap).is_err() {
        return Err(err(Reason::CapacityTooLarge));
    }
    if ptr.is_null() && cap != 0 {
        return Err(err(Reason::NullBuffer));
    }
    Ok(())
}

/// A read-only view of exactly `length` bytes at `offset` in a
/// host buffer.
///
/// It borrows the buffer, so it cannot outlive the call that
/// created it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct View<'a> {
    data: &'a [u8],
}

impl<'a> View<'a> {
    /// Creates a view of `buf[off..off + len]`.
    ///
    /// Out-of-range pairs are rejected, never clamped.
    pub fn new(buf: &'a [u8], off: isize, len: isize) -> Result<Self, OutOfRange> {
        let r = range(buf.len(), off, len)?;
        let data = buf.get(r).ok_or(OutOfRange {
            reason: Reason::PastEnd,
            off,
            len,
            cap: buf.len(),
        })?;
        Ok(Self { data })
    }

    /// Creates a view from a raw host buffer of `cap` bytes.
    ///
    /// A null `ptr` is only accepted with a zero `cap`.
    ///
    /// # Safety
    ///
    /// If `cap` is non-zero, `ptr` must be valid for reads of
    /// `cap` bytes for `'a` and must not be mutated for `'a`.
    pub unsafe fn from_raw_parts(
        ptr: *const u8,
        cap: usize,
        off: isize,
        len: isize,
    ) -> Result<Self, OutOfRange> {
        raw_cap(ptr, cap, off, len)?;
        let buf: &'a [u8] = if cap == 0 {
            &[]
        } else {
            // SAFETY: `ptr` is non-null and, per the function's
            // safety docs, valid for `cap <= isize::MAX` bytes.
            unsafe { slice::from_raw_parts(ptr, cap) }
        };
        Self::new(buf, off, len)
    }

    /// Returns the viewed bytes.
    pub const fn as_slice(&self) -> &'a [u8] {
        self.data
    }
}

impl<'a> From<&'a [u8]> for View<'a> {
    fn from(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl Deref for View<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data
    }
}

/// The writable counterpart of [`View`].
#[derive(Debug, Eq, PartialEq)]
pub struct ViewMut<'a> {
    data: &'a mut [u8],
}

impl<'a> ViewMut<'a> {
    /// Creates a view of `buf[off..off + len]`.
    pub fn new(buf: &'a mut [u8], off: isize, len: isize) -> Result<Self, OutOfRange> {
        let cap = buf.len();
        let r = range(cap, off, len)?;
        let data = buf.get_mut(r).ok_or(OutOfRange {
            reason: Reason::PastEnd,
            off,
            len,
            cap,
        })?;
        Ok(Self { data })
    }

    /// Creates a view from a raw host buffer of `cap` bytes.
    ///
    /// # Safety
    ///
    /// If `cap` is non-zero, `ptr` must be valid for reads and
    /// writes of `cap` bytes for `'a` and must not be aliased for
    /// `'a`.
    pub unsafe fn from_raw_parts(
        ptr: *mut u8,
        cap: usize,
        off: isize,
        len: isize,
    ) -> Result<Self, OutOfRange> {
        raw_cap(ptr, cap, off, len)?;
        let buf: &'a mut [u8] = if cap == 0 {
            &mut []
        } else {
            // SAFETY: `ptr` is non-null and, per the function's
            // safety docs, valid and unaliased for `cap` bytes.
            unsafe { slice::from_raw_parts_mut(ptr, cap) }
        };
        Self::new(buf, off, len)
    }

    /// Returns the viewed bytes.
    pub fn into_slice(self) -> &'a mut [u8] {
        self.data
    }
}

impl<'a> From<&'a mut [u8]> for ViewMut<'a> {
    fn from(data: &'a mut [u8]) -> Self {
        Self { data }
    }
}

impl Deref for ViewMut<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data
    }
}

impl DerefMut for ViewMut<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.data
    }
}
