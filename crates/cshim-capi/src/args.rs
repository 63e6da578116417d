//! Argument checking and the call guard shared by every entry
//! point.

use core::{
    ffi::{CStr, c_char, c_int},
    ptr,
};
use std::{boxed::Box, panic};

use buggy::BugExt as _;
use cshim::{BufferTooSmall, View, ViewMut};
use tracing::{debug, error};

use crate::error::{CshimStatus, Error, ErrorCode as _, InvalidArg};

/// Runs `f`, converting its result and any panic to a status.
pub(crate) fn guard<F>(op: &'static str, f: F) -> c_int
where
    F: FnOnce() -> Result<(), Error>,
{
    match run(op, f) {
        Ok(()) => CshimStatus::SUCCESS.code(),
        Err(code) => code.code(),
    }
}

/// Like [`guard`], but for calls that return a non-negative
/// count on success.
pub(crate) fn guard_count<F>(op: &'static str, f: F) -> isize
where
    F: FnOnce() -> Result<usize, Error>,
{
    let n = run(op, || {
        let n = f()?;
        Ok(isize::try_from(n).assume("counts fit in `isize`")?)
    });
    match n {
        Ok(n) => n,
        Err(code) => isize::try_from(code.code()).unwrap_or(isize::MIN),
    }
}

fn run<T, F>(op: &'static str, f: F) -> Result<T, CshimStatus>
where
    F: FnOnce() -> Result<T, Error>,
{
    match panic::catch_unwind(panic::AssertUnwindSafe(f)) {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(err)) => {
            debug!(op, %err, "call failed");
            Err(CshimStatus::from(&err))
        }
        Err(_) => {
            error!(op, "panic caught at the C boundary");
            Err(CshimStatus::Bug)
        }
    }
}

/// Validates a readable `(ptr, cap, off, len)` buffer argument.
///
/// # Safety
///
/// If `cap` is non-zero, `ptr` must be valid for reads of `cap`
/// bytes for `'a`.
pub(crate) unsafe fn view<'a>(
    ptr: *const u8,
    cap: usize,
    off: isize,
    len: isize,
) -> Result<View<'a>, Error> {
    // SAFETY: See the function's safety docs.
    Ok(unsafe { View::from_raw_parts(ptr, cap, off, len) }?)
}

/// Validates a writable `(ptr, cap, off, len)` buffer argument.
///
/// # Safety
///
/// If `cap` is non-zero, `ptr` must be valid for reads and
/// writes of `cap` bytes for `'a` and must not alias any other
/// argument.
pub(crate) unsafe fn view_mut<'a>(
    ptr: *mut u8,
    cap: usize,
    off: isize,
    len: isize,
) -> Result<ViewMut<'a>, Error> {
    // SAFETY: See the function's safety docs.
    Ok(unsafe { ViewMut::from_raw_parts(ptr, cap, off, len) }?)
}

/// Borrows a NUL-terminated name.
///
/// # Safety
///
/// `ptr` must be null or a NUL-terminated string valid for `'a`.
pub(crate) unsafe fn name<'a>(arg: &'static str, ptr: *const c_char) -> Result<&'a CStr, Error> {
    if ptr.is_null() {
        return Err(InvalidArg::new(arg, "null string").into());
    }
    // SAFETY: See the function's safety docs.
    Ok(unsafe { CStr::from_ptr(ptr) })
}

/// Borrows a handle.
///
/// # Safety
///
/// `ptr` must be null or a live handle created by this crate.
pub(crate) unsafe fn handle<'a, T>(arg: &'static str, ptr: *const T) -> Result<&'a T, Error> {
    // SAFETY: See the function's safety docs.
    unsafe { ptr.as_ref() }.ok_or_else(|| InvalidArg::new(arg, "null handle").into())
}

/// Mutably borrows a handle.
///
/// # Safety
///
/// `ptr` must be null or a live handle created by this crate
/// that is not otherwise borrowed for `'a`.
pub(crate) unsafe fn handle_mut<'a, T>(arg: &'static str, ptr: *mut T) -> Result<&'a mut T, Error> {
    // SAFETY: See the function's safety docs.
    unsafe { ptr.as_mut() }.ok_or_else(|| InvalidArg::new(arg, "null handle").into())
}

/// Borrows a writable scalar out-parameter.
///
/// # Safety
///
/// `ptr` must be null or valid for writes for `'a`.
pub(crate) unsafe fn out<'a, T>(arg: &'static str, ptr: *mut T) -> Result<&'a mut T, Error> {
    // SAFETY: See the function's safety docs.
    unsafe { ptr.as_mut() }.ok_or_else(|| InvalidArg::new(arg, "null pointer").into())
}

/// Moves `value` to the heap and stores the pointer in `out`.
///
/// # Safety
///
/// `out` must be null or valid for writes.
pub(crate) unsafe fn init<T>(out: *mut *mut T, value: T) -> Result<(), Error> {
    if out.is_null() {
        return Err(InvalidArg::new("out", "null pointer").into());
    }
    // SAFETY: `out` is non-null and, per the function's safety
    // docs, valid for writes.
    unsafe { ptr::write(out, Box::into_raw(Box::new(value))) };
    Ok(())
}

/// Releases a handle created by [`init`]. Null is ignored.
///
/// # Safety
///
/// `ptr` must be null or a live handle created by [`init`] that
/// is not used afterward.
pub(crate) unsafe fn destroy<T>(ptr: *mut T) {
    if !ptr.is_null() {
        // SAFETY: See the function's safety docs.
        drop(unsafe { Box::from_raw(ptr) });
    }
}

/// Writes `name` with a NUL terminator into the start of `out`
/// and returns its length without the terminator.
pub(crate) fn write_name(out: &mut [u8], name: &str) -> Result<usize, Error> {
    let need = name.len().saturating_add(1);
    let have = out.len();
    let dst = out.get_mut(..need).ok_or(BufferTooSmall { need, have })?;
    let (text, nul) = dst.split_at_mut(name.len());
    text.copy_from_slice(name.as_bytes());
    nul.fill(0);
    Ok(name.len())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::indexing_slicing)]

    use test_log::test;

    use super::*;

    #[test]
    fn test_guard_maps_errors() {
        assert_eq!(guard("ok", || Ok(())), 0);
        let code = guard("bad", || Err(InvalidArg::new("x", "null").into()));
        assert_eq!(code, CshimStatus::InvalidArgument.code());
        assert_eq!(guard_count("n", || Ok(7)), 7);
        let n = guard_count("n", || {
            Err(cshim::Error::from(BufferTooSmall { need: 2, have: 1 }).into())
        });
        assert_eq!(n, -6);
    }

    #[test]
    fn test_write_name() {
        let mut buf = [0xffu8; 8];
        assert_eq!(write_name(&mut buf, "SHA-256").unwrap(), 7);
        assert_eq!(&buf, b"SHA-256\0");
        let err = write_name(&mut buf[..7], "SHA-256").unwrap_err();
        assert_eq!(CshimStatus::from(&err), CshimStatus::BufferTooSmall);
    }

    #[test]
    fn test_null_arguments() {
        // SAFETY: null is always accepted.
        let err = unsafe { name("name", ptr::null()) }.unwrap_err();
        assert_eq!(CshimStatus::from(&err), CshimStatus::InvalidArgument);
        // SAFETY: null is always accepted.
        let err = unsafe { handle_mut::<u8>("h", ptr::null_mut()) }.unwrap_err();
        assert_eq!(CshimStatus::from(&err), CshimStatus::InvalidArgument);
        // SAFETY: null is always accepted.
        let err = unsafe { view(ptr::null(), 4, 0, 0) }.unwrap_err();
        assert_eq!(CshimStatus::from(&err), CshimStatus::OutOfRange);
    }
}
