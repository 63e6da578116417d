//! The engine's length-query protocol.

use alloc::{string::String, vec, vec::Vec};
use core::{ffi::c_int, ptr};

use buggy::{BugExt as _, bug};
use cshim_engine::rc;

use crate::{error::Error, status};

/// Returns the number of bytes a length-query call would write.
///
/// `call` receives the output pointer and the in/out length.
pub(crate) fn len<F>(op: &'static str, call: F) -> Result<usize, Error>
where
    F: FnOnce(*mut u8, *mut usize) -> c_int,
{
    let mut n = 0;
    match call(ptr::null_mut(), &mut n) {
        rc::SUCCESS | rc::ERROR_INSUFFICIENT_BUFFER_SPACE => Ok(n),
        code => status::check(op, code).map(|()| n),
    }
}

/// Queries the length, then writes into a buffer of exactly that
/// size.
pub(crate) fn bytes<F>(op: &'static str, mut call: F) -> Result<Vec<u8>, Error>
where
    F: FnMut(*mut u8, *mut usize) -> c_int,
{
    let need = len(op, &mut call)?;
    let mut buf = vec![0u8; need];
    let mut n = buf.len();
    status::check(op, call(buf.as_mut_ptr(), &mut n))?;
    if n > buf.len() {
        bug!("engine wrote past the queried length");
    }
    buf.truncate(n);
    Ok(buf)
}

/// Like [`bytes`], but for NUL-terminated text. The terminator is
/// removed.
pub(crate) fn text<F>(op: &'static str, call: F) -> Result<Vec<u8>, Error>
where
    F: FnMut(*mut u8, *mut usize) -> c_int,
{
    let mut buf = bytes(op, call)?;
    if buf.pop().assume("engine text is NUL-terminated")? != 0 {
        bug!("engine text is NUL-terminated");
    }
    Ok(buf)
}

/// Like [`text`], but returns a `String`.
pub(crate) fn string<F>(op: &'static str, call: F) -> Result<String, Error>
where
    F: FnMut(*mut u8, *mut usize) -> c_int,
{
    let buf = text(op, call)?;
    Ok(String::from_utf8(buf).assume("engine text is UTF-8")?)
}
