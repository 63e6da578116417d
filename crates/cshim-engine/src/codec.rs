use core::ffi::{c_char, c_int};

use crate::{
    obj::{check_flags, guard, input, output, write_output},
    rc::Failure,
};

/// Selects lower-case output for [`eng_hex_encode`].
pub const ENG_HEX_FLAG_LOWER_CASE: u32 = 1;

/// Writes `2 * len` hex digits of `x` to `out`.
///
/// No terminator is written.
///
/// # Safety
///
/// - `x` must be valid for reads of `len` bytes.
/// - `out` must be valid for writes of `2 * len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_hex_encode(
    x: *const u8,
    len: usize,
    out: *mut c_char,
    flags: u32,
) -> c_int {
    guard("eng_hex_encode", || {
        check_flags(flags, ENG_HEX_FLAG_LOWER_CASE)?;
        // SAFETY: See the function's safety docs.
        let x = unsafe { input(x, len) }?;
        let s = if flags & ENG_HEX_FLAG_LOWER_CASE != 0 {
            hex::encode(x)
        } else {
            hex::encode_upper(x)
        };
        // SAFETY: See the function's safety docs.
        let out = unsafe { output(out.cast(), s.len()) }?;
        out.copy_from_slice(s.as_bytes());
        Ok(())
    })
}

/// Decodes `in_len` hex digits of either case into `out` using
/// the length-query protocol.
///
/// # Safety
///
/// - `hex_str` must be valid for reads of `in_len` bytes.
/// - `out_len` must be valid for reads and writes.
/// - `out` must be valid for writes of `*out_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_hex_decode(
    hex_str: *const c_char,
    in_len: usize,
    out: *mut u8,
    out_len: *mut usize,
) -> c_int {
    guard("eng_hex_decode", || {
        // SAFETY: See the function's safety docs.
        let s = unsafe { input(hex_str.cast(), in_len) }?;
        let data = hex::decode(s).map_err(|_| Failure::InvalidInput("malformed hex"))?;
        // SAFETY: See the function's safety docs.
        unsafe { write_output(out, out_len, &data) }
    })
}
