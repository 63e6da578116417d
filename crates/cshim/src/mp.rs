//! Big integers.

use alloc::{string::String, vec, vec::Vec};
use core::cmp::Ordering;

use buggy::{BugExt as _, bug};
use cshim_engine as eng;

use crate::{
    error::{BufferTooSmall, InvalidEncoding, Result},
    handle::{Handle, kind},
    query, status,
};

/// A non-negative engine big integer.
///
/// Hex output is upper-case with an even number of digits and at
/// least two (`0` is `"00"`). Decimal output has no leading
/// zeros.
#[derive(Debug)]
pub struct Mp {
    handle: Handle<kind::Mp>,
}

impl Mp {
    /// Creates a zero-valued integer.
    pub fn new() -> Result<Self> {
        let handle = Handle::init("eng_mp_init", |out| {
            // SAFETY: FFI call, `out` is valid for writes.
            unsafe { eng::eng_mp_init(out) }
        })?;
        Ok(Self { handle })
    }

    /// Creates an integer from `v`.
    pub fn from_u32(v: u32) -> Result<Self> {
        let mut mp = Self::new()?;
        mp.from_bin(&v.to_be_bytes())?;
        Ok(mp)
    }

    fn raw(&self) -> eng::eng_mp_t {
        self.handle.as_ptr()
    }

    /// Sets the value from big-endian `bytes`.
    #[allow(clippy::wrong_self_convention)]
    pub fn from_bin(&mut self, bytes: &[u8]) -> Result<()> {
        // SAFETY: FFI call, the handle is live and `bytes` is
        // valid for its length.
        let code = unsafe { eng::eng_mp_from_bin(self.raw(), bytes.as_ptr(), bytes.len()) };
        status::check("eng_mp_from_bin", code)
    }

    /// Sets the value from upper- or lower-case hex digits, with
    /// no prefix.
    pub fn set_from_hex(&mut self, text: &[u8]) -> Result<()> {
        self.set_from_radix(text, 16, u8::is_ascii_hexdigit)
    }

    /// Sets the value from decimal digits.
    pub fn set_from_dec(&mut self, text: &[u8]) -> Result<()> {
        self.set_from_radix(text, 10, u8::is_ascii_digit)
    }

    fn set_from_radix(&mut self, text: &[u8], radix: usize, digit: fn(&u8) -> bool) -> Result<()> {
        if text.is_empty() {
            return Err(InvalidEncoding("empty number").into());
        }
        if !text.iter().all(digit) {
            return Err(InvalidEncoding("invalid digit").into());
        }
        let mut s = Vec::with_capacity(text.len().saturating_add(1));
        s.extend_from_slice(text);
        s.push(0);
        // SAFETY: FFI call, the handle is live and `s` is
        // NUL-terminated.
        let code = unsafe { eng::eng_mp_set_from_radix_str(self.raw(), s.as_ptr().cast(), radix) };
        status::check("eng_mp_set_from_radix_str", code)
    }

    /// The number of bytes in the big-endian encoding.
    pub fn byte_len(&self) -> Result<usize> {
        let mut n = 0;
        // SAFETY: FFI call, the handle is live and `n` is valid
        // for writes.
        let code = unsafe { eng::eng_mp_num_bytes(self.raw(), &mut n) };
        status::check("eng_mp_num_bytes", code)?;
        Ok(n)
    }

    /// The number of significant bits.
    pub fn bit_len(&self) -> Result<usize> {
        let mut n = 0;
        // SAFETY: FFI call, the handle is live and `n` is valid
        // for writes.
        let code = unsafe { eng::eng_mp_num_bits(self.raw(), &mut n) };
        status::check("eng_mp_num_bits", code)?;
        Ok(n)
    }

    fn text_len(&self, base: u8) -> Result<usize> {
        let n = query::len("eng_mp_to_str", |out, out_len| {
            // SAFETY: FFI call, the handle is live and the
            // capacity is zero.
            unsafe { eng::eng_mp_to_str(self.raw(), base, out.cast(), out_len) }
        })?;
        // Less the terminator.
        Ok(n.checked_sub(1).assume("engine text is NUL-terminated")?)
    }

    fn text(&self, base: u8) -> Result<Vec<u8>> {
        query::text("eng_mp_to_str", |out, out_len| {
            // SAFETY: FFI call, the handle is live and `out` is
            // valid for `*out_len` bytes.
            unsafe { eng::eng_mp_to_str(self.raw(), base, out.cast(), out_len) }
        })
    }

    fn write_text(&self, base: u8, out: &mut [u8]) -> Result<usize> {
        let text = self.text(base)?;
        let have = out.len();
        out.get_mut(..text.len())
            .ok_or(BufferTooSmall {
                need: text.len(),
                have,
            })?
            .copy_from_slice(&text);
        Ok(text.len())
    }

    /// The number of characters [`to_hex`][Self::to_hex] writes.
    pub fn hex_len(&self) -> Result<usize> {
        self.text_len(16)
    }

    /// The number of characters [`to_dec`][Self::to_dec] writes.
    pub fn dec_len(&self) -> Result<usize> {
        self.text_len(10)
    }

    /// Writes upper-case hex into the start of `out`, without a
    /// terminator, and returns the number of characters written.
    pub fn to_hex(&self, out: &mut [u8]) -> Result<usize> {
        self.write_text(16, out)
    }

    /// Writes decimal into the start of `out`, without a
    /// terminator, and returns the number of characters written.
    pub fn to_dec(&self, out: &mut [u8]) -> Result<usize> {
        self.write_text(10, out)
    }

    /// Writes the [`byte_len`][Self::byte_len] byte big-endian
    /// encoding into the start of `out`.
    pub fn to_bin(&self, out: &mut [u8]) -> Result<usize> {
        let n = self.byte_len()?;
        let have = out.len();
        let dst = out.get_mut(..n).ok_or(BufferTooSmall { need: n, have })?;
        // SAFETY: FFI call, the handle is live and `dst` holds
        // `byte_len` bytes.
        let code = unsafe { eng::eng_mp_to_bin(self.raw(), dst.as_mut_ptr()) };
        status::check("eng_mp_to_bin", code)?;
        Ok(n)
    }

    /// Returns the value as upper-case hex.
    pub fn to_hex_string(&self) -> Result<String> {
        Ok(String::from_utf8(self.text(16)?).assume("hex is ASCII")?)
    }

    /// Returns the value as decimal.
    pub fn to_dec_string(&self) -> Result<String> {
        Ok(String::from_utf8(self.text(10)?).assume("decimal is ASCII")?)
    }

    /// Returns the big-endian encoding.
    pub fn to_bin_vec(&self) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.byte_len()?];
        let n = self.to_bin(&mut out)?;
        if n != out.len() {
            bug!("`byte_len` changed between calls");
        }
        Ok(out)
    }

    /// Reports whether both integers have the same value.
    pub fn equals(&self, other: &Self) -> Result<bool> {
        // SAFETY: FFI call, both handles are live.
        let code = unsafe { eng::eng_mp_equal(self.raw(), other.raw()) };
        status::flag("eng_mp_equal", code)
    }

    /// Compares the values.
    pub fn compare(&self, other: &Self) -> Result<Ordering> {
        let mut v = 0;
        // SAFETY: FFI call, both handles are live and `v` is
        // valid for writes.
        let code = unsafe { eng::eng_mp_cmp(&mut v, self.raw(), other.raw()) };
        status::check("eng_mp_cmp", code)?;
        Ok(v.cmp(&0))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::indexing_slicing)]

    use proptest::prelude::*;
    use test_log::test;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_zero() {
        let mp = Mp::new().unwrap();
        assert_eq!(mp.to_hex_string().unwrap(), "00");
        assert_eq!(mp.to_dec_string().unwrap(), "0");
        assert_eq!(mp.hex_len().unwrap(), 2);
        assert_eq!(mp.dec_len().unwrap(), 1);
        assert_eq!(mp.byte_len().unwrap(), 0);
        assert!(mp.to_bin_vec().unwrap().is_empty());
    }

    #[test]
    fn test_to_hex_at_offset() {
        let mp = Mp::from_u32(0xabc).unwrap();
        let mut buf = [b'.'; 8];
        let n = mp.to_hex(&mut buf[2..]).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buf, b"..0ABC..");

        let err = mp.to_hex(&mut buf[..3]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferTooSmall);
    }

    #[test]
    fn test_parse_errors() {
        let mut mp = Mp::new().unwrap();
        for bad in [&b""[..], b"-1", b"1_000", b"12a", b" 1"] {
            let err = mp.set_from_dec(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidEncoding, "{bad:?}");
        }
        for bad in [&b""[..], b"0x10", b"xyz"] {
            let err = mp.set_from_hex(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidEncoding, "{bad:?}");
        }
    }

    #[test]
    fn test_compare() {
        let a = Mp::from_u32(7).unwrap();
        let b = Mp::from_u32(9).unwrap();
        let mut c = Mp::new().unwrap();
        c.set_from_dec(b"7").unwrap();
        assert_eq!(a.compare(&b).unwrap(), Ordering::Less);
        assert_eq!(b.compare(&a).unwrap(), Ordering::Greater);
        assert!(a.equals(&c).unwrap());
        assert!(!a.equals(&b).unwrap());
        assert!(a.equals(&a).unwrap());
    }

    proptest! {
        #[test]
        fn test_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..48)) {
            let mut src = Mp::new().unwrap();
            src.from_bin(&bytes).unwrap();

            let mut via_hex = Mp::new().unwrap();
            via_hex.set_from_hex(src.to_hex_string().unwrap().as_bytes()).unwrap();
            prop_assert!(via_hex.equals(&src).unwrap());

            let mut via_dec = Mp::new().unwrap();
            via_dec.set_from_dec(src.to_dec_string().unwrap().as_bytes()).unwrap();
            prop_assert!(via_dec.equals(&src).unwrap());

            let mut via_bin = Mp::new().unwrap();
            via_bin.from_bin(&src.to_bin_vec().unwrap()).unwrap();
            prop_assert!(via_bin.equals(&src).unwrap());

            let hex = src.to_hex_string().unwrap();
            prop_assert!(hex.len() >= 2 && hex.len() % 2 == 0);
            prop_assert_eq!(hex.len(), src.hex_len().unwrap());
        }
    }
}
