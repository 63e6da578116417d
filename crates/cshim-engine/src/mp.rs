use core::{
    cmp::Ordering,
    ffi::{c_char, c_int},
};

use num_bigint::BigUint;
use num_traits::Zero;

use crate::{
    obj::{
        create, cstr, destroy, get, guard, guard_value, input, object, out_ref, output,
        write_str_output,
    },
    rc::Failure,
};

object! {
    /// A non-negative multiple precision integer.
    eng_mp_struct(BigUint) = 0xc828_b9b5
}

/// An opaque big integer handle.
pub type eng_mp_t = *mut eng_mp_struct;

/// Upper-case hex with an even number of digits, at least two.
fn to_hex(n: &BigUint) -> String {
    let s = format!("{n:X}");
    if s.len() % 2 == 1 {
        format!("0{s}")
    } else {
        s
    }
}

/// Big-endian bytes without leading zeros. Zero is empty.
fn to_be_bytes(n: &BigUint) -> Vec<u8> {
    if n.is_zero() {
        Vec::new()
    } else {
        n.to_bytes_be()
    }
}

/// Parses digits of `radix`, rejecting anything else (signs,
/// separators, prefixes, and the empty string).
fn parse(s: &str, radix: u32) -> Result<BigUint, Failure> {
    if s.is_empty() || !s.chars().all(|c| c.is_digit(radix)) {
        return Err(Failure::StringConversion);
    }
    BigUint::parse_bytes(s.as_bytes(), radix).ok_or(Failure::StringConversion)
}

/// Creates an integer with the value zero.
///
/// # Safety
///
/// `mp` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mp_init(mp: *mut eng_mp_t) -> c_int {
    // SAFETY: See the function's safety docs.
    guard("eng_mp_init", || unsafe { create(mp, BigUint::zero()) })
}

/// Releases an integer.
///
/// # Safety
///
/// `mp` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mp_destroy(mp: eng_mp_t) -> c_int {
    // SAFETY: See the function's safety docs.
    guard("eng_mp_destroy", || unsafe { destroy(mp) })
}

/// Writes the value as NUL-terminated upper-case hex using the
/// length-query protocol.
///
/// # Safety
///
/// - `mp` must be a live handle.
/// - `out` must be valid for writes of `*out_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mp_to_hex(
    mp: eng_mp_t,
    out: *mut c_char,
    out_len: *mut usize,
) -> c_int {
    // SAFETY: See the function's safety docs.
    unsafe { eng_mp_to_str(mp, 16, out, out_len) }
}

/// Writes the value as a NUL-terminated string in base 10 or 16
/// using the length-query protocol.
///
/// # Safety
///
/// - `mp` must be a live handle.
/// - `out` must be valid for writes of `*out_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mp_to_str(
    mp: eng_mp_t,
    base: u8,
    out: *mut c_char,
    out_len: *mut usize,
) -> c_int {
    guard("eng_mp_to_str", || {
        // SAFETY: See the function's safety docs.
        let n = unsafe { get(mp) }?;
        let s = match base {
            10 => n.to_str_radix(10),
            16 => to_hex(n),
            _ => return Err(Failure::BadParameter("base must be 10 or 16")),
        };
        // SAFETY: See the function's safety docs.
        unsafe { write_str_output(out, out_len, &s) }
    })
}

/// Sets the value from a non-negative integer.
///
/// # Safety
///
/// `mp` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mp_set_from_int(mp: eng_mp_t, v: c_int) -> c_int {
    guard("eng_mp_set_from_int", || {
        // SAFETY: See the function's safety docs.
        let n = unsafe { get(mp) }?;
        let v = u32::try_from(v).map_err(|_| Failure::BadParameter("negative value"))?;
        *n = BigUint::from(v);
        Ok(())
    })
}

/// Sets the value from decimal, or from hex with a `0x` prefix.
///
/// # Safety
///
/// - `mp` must be a live handle.
/// - `s` must be a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mp_set_from_str(mp: eng_mp_t, s: *const c_char) -> c_int {
    guard("eng_mp_set_from_str", || {
        // SAFETY: See the function's safety docs.
        let n = unsafe { get(mp) }?;
        // SAFETY: See the function's safety docs.
        let s = unsafe { cstr(s) }?;
        *n = match s.strip_prefix("0x") {
            Some(digits) => parse(digits, 16)?,
            None => parse(s, 10)?,
        };
        Ok(())
    })
}

/// Sets the value from digits of `radix` (10 or 16).
///
/// # Safety
///
/// - `mp` must be a live handle.
/// - `s` must be a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mp_set_from_radix_str(
    mp: eng_mp_t,
    s: *const c_char,
    radix: usize,
) -> c_int {
    guard("eng_mp_set_from_radix_str", || {
        // SAFETY: See the function's safety docs.
        let n = unsafe { get(mp) }?;
        // SAFETY: See the function's safety docs.
        let s = unsafe { cstr(s) }?;
        *n = match radix {
            10 => parse(s, 10)?,
            16 => parse(s, 16)?,
            _ => return Err(Failure::BadParameter("radix must be 10 or 16")),
        };
        Ok(())
    })
}

/// Stores the number of bytes needed by [`eng_mp_to_bin`].
///
/// # Safety
///
/// - `mp` must be a live handle.
/// - `bytes` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mp_num_bytes(mp: eng_mp_t, bytes: *mut usize) -> c_int {
    guard("eng_mp_num_bytes", || {
        // SAFETY: See the function's safety docs.
        let n = unsafe { get(mp) }?;
        // SAFETY: See the function's safety docs.
        *unsafe { out_ref(bytes) }? = to_be_bytes(n).len();
        Ok(())
    })
}

/// Stores the number of significant bits.
///
/// # Safety
///
/// - `mp` must be a live handle.
/// - `bits` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mp_num_bits(mp: eng_mp_t, bits: *mut usize) -> c_int {
    guard("eng_mp_num_bits", || {
        // SAFETY: See the function's safety docs.
        let n = unsafe { get(mp) }?;
        let v = usize::try_from(n.bits()).map_err(|_| Failure::Internal("bit count overflow"))?;
        // SAFETY: See the function's safety docs.
        *unsafe { out_ref(bits) }? = v;
        Ok(())
    })
}

/// Writes the value as big-endian bytes. `out` must hold
/// [`eng_mp_num_bytes`] bytes.
///
/// # Safety
///
/// - `mp` must be a live handle.
/// - `out` must be valid for writes of the byte length.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mp_to_bin(mp: eng_mp_t, out: *mut u8) -> c_int {
    guard("eng_mp_to_bin", || {
        // SAFETY: See the function's safety docs.
        let n = unsafe { get(mp) }?;
        let bytes = to_be_bytes(n);
        // SAFETY: See the function's safety docs.
        unsafe { output(out, bytes.len()) }?.copy_from_slice(&bytes);
        Ok(())
    })
}

/// Sets the value from big-endian bytes.
///
/// # Safety
///
/// - `mp` must be a live handle.
/// - `bin` must be valid for reads of `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mp_from_bin(mp: eng_mp_t, bin: *const u8, len: usize) -> c_int {
    guard("eng_mp_from_bin", || {
        // SAFETY: See the function's safety docs.
        let n = unsafe { get(mp) }?;
        // SAFETY: See the function's safety docs.
        let bin = unsafe { input(bin, len) }?;
        *n = BigUint::from_bytes_be(bin);
        Ok(())
    })
}

/// Returns 1 if the values are equal, 0 if not, or a negative
/// status.
///
/// # Safety
///
/// `a` and `b` must be live handles.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mp_equal(a: eng_mp_t, b: eng_mp_t) -> c_int {
    guard_value("eng_mp_equal", || {
        // SAFETY: See the function's safety docs.
        let a = unsafe { get(a) }?.clone();
        // SAFETY: See the function's safety docs.
        let b = unsafe { get(b) }?;
        Ok(c_int::from(a == *b))
    })
}

/// Stores -1, 0 or 1 as `a` is less than, equal to or greater
/// than `b`.
///
/// # Safety
///
/// - `result` must be valid for writes.
/// - `a` and `b` must be live handles.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mp_cmp(result: *mut c_int, a: eng_mp_t, b: eng_mp_t) -> c_int {
    guard("eng_mp_cmp", || {
        // SAFETY: See the function's safety docs.
        let a = unsafe { get(a) }?.clone();
        // SAFETY: See the function's safety docs.
        let b = unsafe { get(b) }?;
        let v = match a.cmp(b) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        };
        // SAFETY: See the function's safety docs.
        *unsafe { out_ref(result) }? = v;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::indexing_slicing)]

    use core::ptr;

    use super::*;
    use crate::rc::{ERROR_STRING_CONVERSION_ERROR, SUCCESS};

    fn new_mp() -> eng_mp_t {
        let mut mp = ptr::null_mut();
        // SAFETY: FFI call, no invariants.
        assert_eq!(unsafe { eng_mp_init(&mut mp) }, SUCCESS);
        mp
    }

    fn to_str(mp: eng_mp_t, base: u8) -> String {
        let mut n = 0;
        // SAFETY: FFI call, no invariants.
        unsafe { eng_mp_to_str(mp, base, ptr::null_mut(), &mut n) };
        let mut buf = vec![0u8; n];
        // SAFETY: FFI call, no invariants.
        let rc = unsafe { eng_mp_to_str(mp, base, buf.as_mut_ptr().cast(), &mut n) };
        assert_eq!(rc, SUCCESS);
        assert_eq!(buf.pop(), Some(0));
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_hex_format() {
        let mp = new_mp();
        assert_eq!(to_str(mp, 16), "00");
        assert_eq!(to_str(mp, 10), "0");
        // SAFETY: FFI call, no invariants.
        unsafe { eng_mp_set_from_int(mp, 0xabc) };
        assert_eq!(to_str(mp, 16), "0ABC");
        assert_eq!(to_str(mp, 10), "2748");
        // SAFETY: FFI call, no invariants.
        unsafe { eng_mp_destroy(mp) };
    }

    #[test]
    fn test_parse_strict() {
        let mp = new_mp();
        for bad in [c"", c"+1", c"1_000", c"12a", c"-5"] {
            // SAFETY: FFI call, no invariants.
            let rc = unsafe { eng_mp_set_from_radix_str(mp, bad.as_ptr(), 10) };
            assert_eq!(rc, ERROR_STRING_CONVERSION_ERROR, "{bad:?}");
        }
        // SAFETY: FFI call, no invariants.
        unsafe {
            assert_eq!(eng_mp_set_from_str(mp, c"0xff".as_ptr()), SUCCESS);
        }
        assert_eq!(to_str(mp, 10), "255");
        // SAFETY: FFI call, no invariants.
        unsafe { eng_mp_destroy(mp) };
    }

    #[test]
    fn test_bin_and_compare() {
        let a = new_mp();
        let b = new_mp();
        let bin = [0x01, 0x00, 0x00];
        let (mut bytes, mut bits, mut cmp) = (0, 0, 9);
        let mut out = [0u8; 3];
        // SAFETY: FFI call, no invariants.
        unsafe {
            assert_eq!(eng_mp_from_bin(a, bin.as_ptr(), bin.len()), SUCCESS);
            assert_eq!(eng_mp_num_bytes(a, &mut bytes), SUCCESS);
            assert_eq!(eng_mp_num_bits(a, &mut bits), SUCCESS);
            assert_eq!(eng_mp_to_bin(a, out.as_mut_ptr()), SUCCESS);
            assert_eq!(eng_mp_equal(a, b), 0);
            assert_eq!(eng_mp_cmp(&mut cmp, a, b), SUCCESS);
        }
        assert_eq!((bytes, bits, cmp), (3, 17, 1));
        assert_eq!(out, bin);
        // SAFETY: FFI call, no invariants.
        unsafe {
            eng_mp_set_from_radix_str(b, c"10000".as_ptr(), 16);
            assert_eq!(eng_mp_equal(a, b), 1);
            eng_mp_destroy(a);
            eng_mp_destroy(b);
        }
    }
}
