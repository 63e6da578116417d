use core::ffi::{c_char, c_int};

use hkdf::Hkdf;
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use crate::{
    names::{HashAlgo, wrapped},
    obj::{cstr, guard, input, output},
    rc::Failure,
};

fn hkdf(
    algo: HashAlgo,
    out: &mut [u8],
    secret: &[u8],
    salt: &[u8],
    label: &[u8],
) -> Result<(), Failure> {
    let too_long = |_| Failure::BadParameter("requested output is too long");
    match algo {
        HashAlgo::Sha256 => Hkdf::<Sha256>::new(Some(salt), secret)
            .expand(label, out)
            .map_err(too_long),
        HashAlgo::Sha384 => Hkdf::<Sha384>::new(Some(salt), secret)
            .expand(label, out)
            .map_err(too_long),
        HashAlgo::Sha512 => Hkdf::<Sha512>::new(Some(salt), secret)
            .expand(label, out)
            .map_err(too_long),
        HashAlgo::Sha512_256 => Err(Failure::unknown(algo.name())),
    }
}

/// Derives `out_len` bytes from `secret`, `salt` and `label`.
///
/// `kdf_algo` is `HKDF(SHA-256)`, `HKDF(SHA-384)` or
/// `HKDF(SHA-512)`.
///
/// # Safety
///
/// - `kdf_algo` must be a NUL-terminated string.
/// - `out` must be valid for writes of `out_len` bytes.
/// - The inputs must be valid for reads of their lengths.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_kdf(
    kdf_algo: *const c_char,
    out: *mut u8,
    out_len: usize,
    secret: *const u8,
    secret_len: usize,
    salt: *const u8,
    salt_len: usize,
    label: *const u8,
    label_len: usize,
) -> c_int {
    guard("eng_kdf", || {
        // SAFETY: See the function's safety docs.
        let name = unsafe { cstr(kdf_algo) }?;
        let algo = wrapped(name, "HKDF")
            .and_then(HashAlgo::from_name)
            .ok_or_else(|| Failure::unknown(name))?;
        // SAFETY: See the function's safety docs.
        let (secret, salt, label) = unsafe {
            (
                input(secret, secret_len)?,
                input(salt, salt_len)?,
                input(label, label_len)?,
            )
        };
        let mut buf = Zeroizing::new(vec![0u8; out_len]);
        hkdf(algo, &mut buf, secret, salt, label)?;
        // SAFETY: See the function's safety docs.
        unsafe { output(out, out_len) }?.copy_from_slice(&buf);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rc::{ERROR_BAD_PARAMETER, ERROR_NOT_IMPLEMENTED, SUCCESS};

    #[test]
    fn test_rfc5869_case1() {
        let ikm = [0x0bu8; 22];
        let salt = hex::decode("000102030405060708090a0b0c").unwrap();
        let info = hex::decode("f0f1f2f3f4f5f6f7f8f9").unwrap();
        let mut okm = [0u8; 42];
        // SAFETY: FFI call, no invariants.
        let rc = unsafe {
            eng_kdf(
                c"HKDF(SHA-256)".as_ptr(),
                okm.as_mut_ptr(),
                okm.len(),
                ikm.as_ptr(),
                ikm.len(),
                salt.as_ptr(),
                salt.len(),
                info.as_ptr(),
                info.len(),
            )
        };
        assert_eq!(rc, SUCCESS);
        assert_eq!(
            hex::encode(okm),
            "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf34007208d5b887185865"
        );
    }

    #[test]
    fn test_errors() {
        let mut out = vec![0u8; 255 * 32 + 1];
        for (name, want) in [
            (c"HKDF(MD5)", ERROR_NOT_IMPLEMENTED),
            (c"KDF2(SHA-256)", ERROR_NOT_IMPLEMENTED),
            (c"HKDF(SHA-256)", ERROR_BAD_PARAMETER),
        ] {
            // SAFETY: FFI call, no invariants.
            let rc = unsafe {
                eng_kdf(
                    name.as_ptr(),
                    out.as_mut_ptr(),
                    out.len(),
                    b"k".as_ptr(),
                    1,
                    core::ptr::null(),
                    0,
                    core::ptr::null(),
                    0,
                )
            };
            assert_eq!(rc, want, "{name:?}");
        }
    }
}
