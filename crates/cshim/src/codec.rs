//! Hex encoding.

use alloc::{string::String, vec, vec::Vec};

use buggy::BugExt as _;
use cshim_engine as eng;

use crate::{
    error::{BufferTooSmall, InvalidEncoding, Result},
    status,
};

/// The letter case of hex output.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Case {
    /// `0-9A-F`.
    Upper,
    /// `0-9a-f`.
    Lower,
}

impl Case {
    fn flags(self) -> u32 {
        match self {
            Self::Upper => 0,
            Self::Lower => eng::ENG_HEX_FLAG_LOWER_CASE,
        }
    }
}

/// Hex encodes `input` into the first `2 * input.len()` bytes of
/// `out`.
///
/// No terminator is written. Returns the number of characters
/// written.
pub fn hex_encode(input: &[u8], out: &mut [u8], case: Case) -> Result<usize> {
    let n = input
        .len()
        .checked_mul(2)
        .assume("slice lengths are at most `isize::MAX`")?;
    let have = out.len();
    let dst = out
        .get_mut(..n)
        .ok_or(BufferTooSmall { need: n, have })?;
    // SAFETY: FFI call, `input` is valid for its length and `dst`
    // for `2 * input.len()` bytes.
    let code = unsafe {
        eng::eng_hex_encode(
            input.as_ptr(),
            input.len(),
            dst.as_mut_ptr().cast(),
            case.flags(),
        )
    };
    status::check("eng_hex_encode", code)?;
    Ok(n)
}

/// Hex encodes `input` into a new string.
pub fn hex_encode_to_string(input: &[u8], case: Case) -> Result<String> {
    let mut out = vec![0u8; input.len().saturating_mul(2)];
    hex_encode(input, &mut out, case)?;
    Ok(String::from_utf8(out).assume("hex is ASCII")?)
}

/// Checks that `input` is an even number of hex digits.
fn validate_hex(input: &[u8]) -> Result<(), InvalidEncoding> {
    if input.len() % 2 != 0 {
        return Err(InvalidEncoding("odd number of hex digits"));
    }
    if !input.iter().all(u8::is_ascii_hexdigit) {
        return Err(InvalidEncoding("invalid hex digit"));
    }
    Ok(())
}

/// Decodes hex `input` (either case) into `out`.
///
/// Returns the number of bytes written. Malformed input is
/// rejected before the engine is called.
pub fn hex_decode(input: &[u8], out: &mut [u8]) -> Result<usize> {
    validate_hex(input)?;
    let need = input.len() / 2;
    if out.len() < need {
        return Err(BufferTooSmall {
            need,
            have: out.len(),
        }
        .into());
    }
    let mut n = out.len();
    // SAFETY: FFI call, `input` is valid for its length and `out`
    // for `n` bytes.
    let code = unsafe {
        eng::eng_hex_decode(
            input.as_ptr().cast(),
            input.len(),
            out.as_mut_ptr(),
            &mut n,
        )
    };
    status::check("eng_hex_decode", code)?;
    Ok(n)
}

/// Decodes hex `input` (either case) into a new buffer.
pub fn hex_decode_to_vec(input: &[u8]) -> Result<Vec<u8>> {
    let mut out = vec![0u8; input.len() / 2];
    let n = hex_decode(input, &mut out)?;
    out.truncate(n);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use test_log::test;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_encode_exact_region() {
        let mut out = [b'.'; 8];
        let n = hex_encode(&[0xab, 0x01], &mut out, Case::Upper).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&out, b"AB01....");

        let n = hex_encode(&[0xab, 0x01], &mut out, Case::Lower).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&out, b"ab01....");
    }

    #[test]
    fn test_encode_too_small() {
        let err = hex_encode(&[1, 2, 3], &mut [0u8; 5], Case::Upper).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferTooSmall);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for bad in [&b"abc"[..], b"zz", b"0x12", b"12 4"] {
            let err = hex_decode_to_vec(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidEncoding, "{bad:?}");
        }
        let err = hex_decode(b"abcd", &mut [0u8; 1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferTooSmall);
    }

    #[test]
    fn test_decode_mixed_case() {
        assert_eq!(hex_decode_to_vec(b"aBcD").unwrap(), [0xab, 0xcd]);
        assert!(hex_decode_to_vec(b"").unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn test_round_trip(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            for case in [Case::Upper, Case::Lower] {
                let text = hex_encode_to_string(&data, case).unwrap();
                prop_assert_eq!(text.len(), data.len() * 2);
                prop_assert_eq!(hex_decode_to_vec(text.as_bytes()).unwrap(), data.clone());
            }
        }
    }
}
