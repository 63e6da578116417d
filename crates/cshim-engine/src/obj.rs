//! Object handles and the plumbing shared by every entry point.

use core::{
    ffi::{CStr, c_char, c_int},
    panic::AssertUnwindSafe,
    slice,
};
use std::panic;

use tracing::{debug, error};

use crate::rc::{ERROR_EXCEPTION_THROWN, Failure, SUCCESS};

/// An engine object exposed through an opaque pointer.
///
/// Each object carries a per-type magic number that is checked
/// on every use and cleared on destruction, so a stale or
/// mistyped handle is reported as [`Failure::InvalidObject`]
/// instead of being used.
pub(crate) trait Object: Sized {
    /// The engine-side state.
    type Inner;
    /// Identifies the object type.
    const MAGIC: u32;

    fn new(inner: Self::Inner) -> Self;
    fn magic(&self) -> u32;
    fn clear_magic(&mut self);
    fn inner_mut(&mut self) -> &mut Self::Inner;
}

/// Declares an opaque object type.
macro_rules! object {
    ($(#[$meta:meta])* $name:ident($inner:ty) = $magic:literal) => {
        $(#[$meta])*
        pub struct $name {
            magic: u32,
            inner: $inner,
        }

        impl $crate::obj::Object for $name {
            type Inner = $inner;
            const MAGIC: u32 = $magic;

            fn new(inner: Self::Inner) -> Self {
                Self {
                    magic: Self::MAGIC,
                    inner,
                }
            }

            fn magic(&self) -> u32 {
                self.magic
            }

            fn clear_magic(&mut self) {
                self.magic = 0;
            }

            fn inner_mut(&mut self) -> &mut Self::Inner {
                &mut self.inner
            }
        }
    };
}
pub(crate) use object;

/// Runs an entry point, translating its result into a status
/// code.
///
/// Panics are caught and reported as
/// [`ERROR_EXCEPTION_THROWN`](crate::rc::ERROR_EXCEPTION_THROWN).
pub(crate) fn guard<F>(func: &'static str, f: F) -> c_int
where
    F: FnOnce() -> Result<(), Failure>,
{
    guard_value(func, || f().map(|()| SUCCESS))
}

/// Like [`guard`], but for entry points that return a
/// non-negative value on success.
pub(crate) fn guard_value<F>(func: &'static str, f: F) -> c_int
where
    F: FnOnce() -> Result<c_int, Failure>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(v)) => v,
        Ok(Err(err)) => {
            debug!(func, %err, "engine call failed");
            err.code()
        }
        Err(_) => {
            error!(func, "panic caught at the ABI boundary");
            ERROR_EXCEPTION_THROWN
        }
    }
}

/// Allocates a new object and stores its pointer in `out`.
///
/// # Safety
///
/// If non-null, `out` must be valid for writes.
pub(crate) unsafe fn create<T: Object>(out: *mut *mut T, inner: T::Inner) -> Result<(), Failure> {
    // SAFETY: See the function's safety docs.
    let out = unsafe { out_ref(out) }?;
    *out = Box::into_raw(Box::new(T::new(inner)));
    Ok(())
}

/// Returns the state of a live object.
///
/// # Safety
///
/// If non-null, `obj` must have been returned by [`create`] and
/// must not be aliased for the returned lifetime.
pub(crate) unsafe fn get<'a, T>(obj: *mut T) -> Result<&'a mut T::Inner, Failure>
where
    T: Object + 'a,
{
    if obj.is_null() {
        return Err(Failure::NullPointer);
    }
    // SAFETY: See the function's safety docs.
    let obj = unsafe { &mut *obj };
    if obj.magic() != T::MAGIC {
        return Err(Failure::InvalidObject);
    }
    Ok(obj.inner_mut())
}

/// Releases an object. Null is accepted and ignored.
///
/// # Safety
///
/// If non-null, `obj` must have been returned by [`create`] and
/// must not be used afterward.
pub(crate) unsafe fn destroy<T: Object>(obj: *mut T) -> Result<(), Failure> {
    if obj.is_null() {
        return Ok(());
    }
    // SAFETY: See the function's safety docs.
    let magic = unsafe { &*obj }.magic();
    if magic != T::MAGIC {
        return Err(Failure::InvalidObject);
    }
    // SAFETY: `obj` came from `Box::into_raw` in `create` and the
    // magic check shows it has not been destroyed.
    let mut obj = unsafe { Box::from_raw(obj) };
    obj.clear_magic();
    drop(obj);
    Ok(())
}

/// Converts `(ptr, len)` into an input slice.
///
/// A zero length never dereferences `ptr`.
///
/// # Safety
///
/// If `len` is non-zero, `ptr` must be valid for reads of `len`
/// bytes for the returned lifetime.
pub(crate) unsafe fn input<'a>(ptr: *const u8, len: usize) -> Result<&'a [u8], Failure> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(Failure::NullPointer);
    }
    if isize::try_from(len).is_err() {
        return Err(Failure::BadParameter("length exceeds `isize::MAX`"));
    }
    // SAFETY: `ptr` is non-null and, per the function's safety
    // docs, valid for `len` bytes.
    Ok(unsafe { slice::from_raw_parts(ptr, len) })
}

/// Converts `(ptr, len)` into an output slice.
///
/// # Safety
///
/// If `len` is non-zero, `ptr` must be valid for writes of `len`
/// bytes for the returned lifetime and must not be aliased.
pub(crate) unsafe fn output<'a>(ptr: *mut u8, len: usize) -> Result<&'a mut [u8], Failure> {
    if len == 0 {
        return Ok(&mut []);
    }
    if ptr.is_null() {
        return Err(Failure::NullPointer);
    }
    if isize::try_from(len).is_err() {
        return Err(Failure::BadParameter("length exceeds `isize::MAX`"));
    }
    // SAFETY: `ptr` is non-null and, per the function's safety
    // docs, valid for `len` bytes.
    Ok(unsafe { slice::from_raw_parts_mut(ptr, len) })
}

/// Converts a non-null pointer into a reference.
///
/// # Safety
///
/// If non-null, `ptr` must be valid for reads and writes.
pub(crate) unsafe fn out_ref<'a, T>(ptr: *mut T) -> Result<&'a mut T, Failure> {
    // SAFETY: See the function's safety docs.
    unsafe { ptr.as_mut() }.ok_or(Failure::NullPointer)
}

/// Reads a NUL-terminated UTF-8 string.
///
/// # Safety
///
/// If non-null, `ptr` must point to a NUL-terminated string.
pub(crate) unsafe fn cstr<'a>(ptr: *const c_char) -> Result<&'a str, Failure> {
    if ptr.is_null() {
        return Err(Failure::NullPointer);
    }
    // SAFETY: See the function's safety docs.
    let s = unsafe { CStr::from_ptr(ptr) };
    s.to_str().map_err(|_| Failure::StringConversion)
}

/// Reads the bytes of a NUL-terminated string, without requiring
/// them to be UTF-8.
///
/// # Safety
///
/// If non-null, `ptr` must point to a NUL-terminated string.
pub(crate) unsafe fn cbytes<'a>(ptr: *const c_char) -> Result<&'a [u8], Failure> {
    if ptr.is_null() {
        return Err(Failure::NullPointer);
    }
    // SAFETY: See the function's safety docs.
    Ok(unsafe { CStr::from_ptr(ptr) }.to_bytes())
}

/// Copies `data` to `out` using the length-query protocol.
///
/// On entry `*out_len` is the capacity of `out`. On return it is
/// the length of `data`, whether or not it fit.
///
/// # Safety
///
/// - `out_len` must be valid for reads and writes.
/// - `out` must be valid for writes of `*out_len` bytes.
pub(crate) unsafe fn write_output(
    out: *mut u8,
    out_len: *mut usize,
    data: &[u8],
) -> Result<(), Failure> {
    // SAFETY: See the function's safety docs.
    let avail = unsafe { out_ref(out_len) }?;
    let cap = *avail;
    *avail = data.len();
    if cap < data.len() {
        return Err(Failure::InsufficientBufferSpace);
    }
    // SAFETY: See the function's safety docs.
    let dst = unsafe { output(out, data.len()) }?;
    dst.copy_from_slice(data);
    Ok(())
}

/// Like [`write_output`], but appends a NUL terminator that is
/// included in the reported length.
///
/// # Safety
///
/// See [`write_output`].
pub(crate) unsafe fn write_str_output(
    out: *mut c_char,
    out_len: *mut usize,
    s: &str,
) -> Result<(), Failure> {
    let mut data = Vec::with_capacity(s.len().saturating_add(1));
    data.extend_from_slice(s.as_bytes());
    data.push(0);
    // SAFETY: See the function's safety docs.
    unsafe { write_output(out.cast(), out_len, &data) }
}

/// Rejects any flag bits not in `allowed`.
pub(crate) fn check_flags(flags: u32, allowed: u32) -> Result<(), Failure> {
    if flags & !allowed != 0 {
        Err(Failure::BadFlag(flags))
    } else {
        Ok(())
    }
}
