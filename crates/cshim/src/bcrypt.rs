//! bcrypt password hashes.
//!
//! Passwords are arbitrary bytes without interior NULs.

use alloc::{ffi::CString, string::String};

use buggy::BugExt as _;
use cshim_engine as eng;
use tracing::instrument;

use crate::{
    error::{BufferTooSmall, InvalidEncoding, Result},
    rng::Rng,
    status::{self, Validity},
};

/// The size of the region [`generate_into`] writes into.
pub const BCRYPT_OUTPUT_LEN: usize = 64;

/// The smallest accepted work factor.
pub const BCRYPT_MIN_WORK_FACTOR: usize = eng::ENG_BCRYPT_MIN_WORK_FACTOR;

/// The largest accepted work factor.
pub const BCRYPT_MAX_WORK_FACTOR: usize = eng::ENG_BCRYPT_MAX_WORK_FACTOR;

fn c_string(s: &[u8], what: &'static str) -> Result<CString, InvalidEncoding> {
    CString::new(s).map_err(|_| InvalidEncoding(what))
}

/// Hashes `password` into the first [`BCRYPT_OUTPUT_LEN`] bytes
/// of `out`.
///
/// The hash is NUL-terminated. Returns its length including the
/// terminator.
#[instrument(skip_all, fields(work_factor))]
pub fn generate_into(
    out: &mut [u8],
    password: &[u8],
    rng: &mut Rng,
    work_factor: usize,
) -> Result<usize> {
    let password = c_string(password, "password contains a NUL byte")?;
    let have = out.len();
    let region = out.get_mut(..BCRYPT_OUTPUT_LEN).ok_or(BufferTooSmall {
        need: BCRYPT_OUTPUT_LEN,
        have,
    })?;
    let mut n = region.len();
    // SAFETY: FFI call, `region` is valid for `n` bytes,
    // `password` is NUL-terminated and the RNG is live.
    let code = unsafe {
        eng::eng_bcrypt_generate(
            region.as_mut_ptr(),
            &mut n,
            password.as_ptr(),
            rng.as_ptr(),
            work_factor,
            0,
        )
    };
    status::check("eng_bcrypt_generate", code)?;
    Ok(n)
}

/// Hashes `password` and returns the hash string.
pub fn generate(password: &[u8], rng: &mut Rng, work_factor: usize) -> Result<String> {
    let mut buf = [0u8; BCRYPT_OUTPUT_LEN];
    let n = generate_into(&mut buf, password, rng, work_factor)?;
    let hash = buf
        .get(..n.saturating_sub(1))
        .assume("engine wrote within the region")?;
    Ok(String::from_utf8(hash.into()).assume("bcrypt hashes are ASCII")?)
}

/// Checks `password` against `hash`.
///
/// A wrong password is `Ok(Validity::Invalid)`. A malformed hash
/// is an [`ErrorKind::InvalidEncoding`][crate::ErrorKind] error.
#[instrument(skip_all)]
pub fn is_valid(password: &[u8], hash: &[u8]) -> Result<Validity> {
    let password = c_string(password, "password contains a NUL byte")?;
    let hash = c_string(hash, "hash contains a NUL byte")?;
    // SAFETY: FFI call, both strings are NUL-terminated.
    let code = unsafe { eng::eng_bcrypt_is_valid(password.as_ptr(), hash.as_ptr()) };
    status::verdict("eng_bcrypt_is_valid", code)
}
