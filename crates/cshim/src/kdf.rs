//! Key derivation and password hashing.

use core::ffi::CStr;

use cshim_engine as eng;
use tracing::instrument;

use crate::{
    error::Result,
    status::{self, Context},
};

/// Derives `out.len()` bytes from `secret`, `salt` and `label`
/// with the named KDF, e.g. `HKDF(SHA-256)`.
#[instrument(skip_all, fields(?algo, out_len = out.len()))]
pub fn kdf(algo: &CStr, out: &mut [u8], secret: &[u8], salt: &[u8], label: &[u8]) -> Result<()> {
    // SAFETY: FFI call, `algo` is NUL-terminated and each buffer
    // is valid for its length.
    let code = unsafe {
        eng::eng_kdf(
            algo.as_ptr(),
            out.as_mut_ptr(),
            out.len(),
            secret.as_ptr(),
            secret.len(),
            salt.as_ptr(),
            salt.len(),
            label.as_ptr(),
            label.len(),
        )
    };
    status::check_in("eng_kdf", Context::Derive, code)
}

/// Password hashing parameters.
///
/// Their meaning depends on the algorithm:
///
/// | Algorithm | `p1` | `p2` | `p3` |
/// |---|---|---|---|
/// | `PBKDF2(..)` | iterations | unused | unused |
/// | `Argon2d`, `Argon2i`, `Argon2id` | memory (KiB) | iterations | parallelism |
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct PwdHashParams {
    /// The first parameter.
    pub p1: usize,
    /// The second parameter.
    pub p2: usize,
    /// The third parameter.
    pub p3: usize,
}

/// Derives `out.len()` bytes from `password` and `salt` with the
/// named password hash and explicit parameters.
#[instrument(skip_all, fields(?algo, ?params, out_len = out.len()))]
pub fn pwdhash(
    algo: &CStr,
    params: PwdHashParams,
    out: &mut [u8],
    password: &[u8],
    salt: &[u8],
) -> Result<()> {
    // SAFETY: FFI call, `algo` is NUL-terminated and each buffer
    // is valid for its length.
    let code = unsafe {
        eng::eng_pwdhash(
            algo.as_ptr(),
            params.p1,
            params.p2,
            params.p3,
            out.as_mut_ptr(),
            out.len(),
            password.as_ptr().cast(),
            password.len(),
            salt.as_ptr(),
            salt.len(),
        )
    };
    status::check_in("eng_pwdhash", Context::Derive, code)
}

/// Like [`pwdhash`], but the engine picks parameters that take
/// about `msec` milliseconds. The chosen parameters are
/// returned.
///
/// This blocks for roughly `msec`.
#[instrument(skip_all, fields(?algo, msec, out_len = out.len()))]
pub fn pwdhash_timed(
    algo: &CStr,
    msec: u32,
    out: &mut [u8],
    password: &[u8],
    salt: &[u8],
) -> Result<PwdHashParams> {
    let mut params = PwdHashParams::default();
    // SAFETY: FFI call, `algo` is NUL-terminated, each buffer is
    // valid for its length and the parameters are valid for
    // writes.
    let code = unsafe {
        eng::eng_pwdhash_timed(
            algo.as_ptr(),
            msec,
            &mut params.p1,
            &mut params.p2,
            &mut params.p3,
            out.as_mut_ptr(),
            out.len(),
            password.as_ptr().cast(),
            password.len(),
            salt.as_ptr(),
            salt.len(),
        )
    };
    status::check_in("eng_pwdhash_timed", Context::Derive, code)?;
    Ok(params)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::{codec::hex_decode_to_vec, error::ErrorKind};

    #[test]
    fn test_hkdf() {
        // RFC 5869, A.1.
        let mut okm = [0u8; 42];
        kdf(
            c"HKDF(SHA-256)",
            &mut okm,
            &[0x0b; 22],
            &hex_decode_to_vec(b"000102030405060708090a0b0c").unwrap(),
            &hex_decode_to_vec(b"f0f1f2f3f4f5f6f7f8f9").unwrap(),
        )
        .unwrap();
        assert_eq!(
            okm[..],
            hex_decode_to_vec(
                b"3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf34007208d5b887185865"
            )
            .unwrap()[..]
        );
    }

    #[test]
    fn test_kdf_errors() {
        let err = kdf(c"HKDF(MD5)", &mut [0; 16], b"k", b"", b"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownAlgorithm);
        let err = kdf(c"HKDF(SHA-256)", &mut vec![0; 255 * 32 + 1], b"k", b"", b"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DerivationFailed);
    }

    #[test]
    fn test_pbkdf2() {
        // RFC 7914, section 11.
        let mut out = [0u8; 64];
        let params = PwdHashParams {
            p1: 1,
            ..Default::default()
        };
        pwdhash(c"PBKDF2(SHA-256)", params, &mut out, b"passwd", b"salt").unwrap();
        assert_eq!(
            out[..],
            hex_decode_to_vec(
                b"55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc49ca9cccf179b645991664b39d77ef317c71b845b1e30bd509112041d3a19783"
            )
            .unwrap()[..]
        );
    }

    #[test]
    fn test_pwdhash_errors() {
        let params = PwdHashParams {
            p1: 1,
            ..Default::default()
        };
        let err = pwdhash(c"scrypt", params, &mut [0; 32], b"pw", b"salt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownAlgorithm);
        let err = pwdhash(
            c"PBKDF2(SHA-256)",
            PwdHashParams::default(),
            &mut [0; 32],
            b"pw",
            b"salt",
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DerivationFailed);
    }

    #[test]
    fn test_pwdhash_timed_reports_params() {
        let mut a = [0u8; 32];
        let params = pwdhash_timed(c"PBKDF2(SHA-256)", 10, &mut a, b"pw", b"saltsalt").unwrap();
        assert!(params.p1 > 0);

        let mut b = [0u8; 32];
        pwdhash(c"PBKDF2(SHA-256)", params, &mut b, b"pw", b"saltsalt").unwrap();
        assert_eq!(a, b);
    }
}
