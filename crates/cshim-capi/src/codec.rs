use core::ffi::{c_char, c_int};

use cshim::Case;

use crate::{
    args::{self, guard_count},
    error::{CshimStatus, ErrorCode as _, InvalidArg},
};

/// Use upper-case hex digits.
pub const CSHIM_HEX_FLAG_UPPER: u32 = 0;
/// Use lower-case hex digits.
pub const CSHIM_HEX_FLAG_LOWER: u32 = 1;

/// Hex-encodes the input view into the output view.
///
/// Writes exactly `2 * in_len` bytes with no terminator and
/// returns that count, or a negative status.
///
/// # Safety
///
/// - `input` must be valid for reads of `in_cap` bytes.
/// - `out` must be valid for writes of `out_cap` bytes.
/// - The two buffers must not overlap.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_hex_encode(
    input: *const u8,
    in_cap: usize,
    in_off: isize,
    in_len: isize,
    out: *mut u8,
    out_cap: usize,
    out_off: isize,
    out_len: isize,
    flags: u32,
) -> isize {
    guard_count("cshim_hex_encode", || {
        let case = match flags {
            CSHIM_HEX_FLAG_UPPER => Case::Upper,
            CSHIM_HEX_FLAG_LOWER => Case::Lower,
            _ => return Err(InvalidArg::new("flags", "unknown flag").into()),
        };
        // SAFETY: See the function's safety docs.
        let input = unsafe { args::view(input, in_cap, in_off, in_len) }?;
        // SAFETY: See the function's safety docs.
        let mut out = unsafe { args::view_mut(out, out_cap, out_off, out_len) }?;
        Ok(cshim::hex_encode(&input, &mut out, case)?)
    })
}

/// Decodes the hex input view into the output view and returns
/// the number of bytes written, or a negative status.
///
/// Both digit cases are accepted.
///
/// # Safety
///
/// See [`cshim_hex_encode`].
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_hex_decode(
    input: *const u8,
    in_cap: usize,
    in_off: isize,
    in_len: isize,
    out: *mut u8,
    out_cap: usize,
    out_off: isize,
    out_len: isize,
) -> isize {
    guard_count("cshim_hex_decode", || {
        // SAFETY: See the function's safety docs.
        let input = unsafe { args::view(input, in_cap, in_off, in_len) }?;
        // SAFETY: See the function's safety docs.
        let mut out = unsafe { args::view_mut(out, out_cap, out_off, out_len) }?;
        Ok(cshim::hex_decode(&input, &mut out)?)
    })
}

/// Returns the static description of a status code.
///
/// Unknown codes are described as `unknown error`.
#[unsafe(no_mangle)]
pub extern "C" fn cshim_status_describe(code: c_int) -> *const c_char {
    CshimStatus::try_from_repr(code)
        .unwrap_or(CshimStatus::Unknown)
        .to_cstr()
        .as_ptr()
}
