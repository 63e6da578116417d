//! Password hashing: PBKDF2, Argon2 and bcrypt.

use core::ffi::{c_char, c_int};
use std::time::{Duration, Instant};

use argon2::{Algorithm, Argon2, Params, Version};
use rand_core::RngCore;
use sha2::{Sha256, Sha512};
use tracing::debug;
use zeroize::Zeroizing;

use crate::{
    names::{HashAlgo, wrapped},
    obj::{cbytes, check_flags, cstr, guard, guard_value, input, out_ref, output, write_str_output},
    rc::{Failure, INVALID_VERIFIER, SUCCESS},
    rng::{eng_rng_t, rng_mut},
};

/// The smallest accepted bcrypt work factor.
pub const ENG_BCRYPT_MIN_WORK_FACTOR: usize = 4;
/// The largest accepted bcrypt work factor.
pub const ENG_BCRYPT_MAX_WORK_FACTOR: usize = 18;

/// Argon2 memory used by [`eng_pwdhash_timed`], in KiB.
const TIMED_ARGON2_M: u32 = 8192;
/// PBKDF2 iterations used to measure speed.
const PBKDF2_PROBE: u32 = 1000;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Family {
    Pbkdf2(HashAlgo),
    Argon2(Algorithm),
}

impl Family {
    fn from_name(name: &str) -> Option<Self> {
        let family = match name {
            "Argon2d" => Self::Argon2(Algorithm::Argon2d),
            "Argon2i" => Self::Argon2(Algorithm::Argon2i),
            "Argon2id" => Self::Argon2(Algorithm::Argon2id),
            _ => match wrapped(name, "PBKDF2").and_then(HashAlgo::from_name)? {
                algo @ (HashAlgo::Sha256 | HashAlgo::Sha512) => Self::Pbkdf2(algo),
                _ => return None,
            },
        };
        Some(family)
    }
}

fn param(v: usize) -> Result<u32, Failure> {
    u32::try_from(v).map_err(|_| Failure::BadParameter("parameter out of range"))
}

fn pbkdf2(
    algo: HashAlgo,
    iterations: u32,
    out: &mut [u8],
    password: &[u8],
    salt: &[u8],
) -> Result<(), Failure> {
    if iterations == 0 {
        return Err(Failure::BadParameter("iterations must be non-zero"));
    }
    match algo {
        HashAlgo::Sha256 => pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, out),
        HashAlgo::Sha512 => pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, iterations, out),
        HashAlgo::Sha384 | HashAlgo::Sha512_256 => {
            return Err(Failure::unknown(algo.name()));
        }
    }
    Ok(())
}

fn argon2(
    algorithm: Algorithm,
    (m, t, p): (u32, u32, u32),
    out: &mut [u8],
    password: &[u8],
    salt: &[u8],
) -> Result<(), Failure> {
    let params = Params::new(m, t, p, Some(out.len()))
        .map_err(|_| Failure::BadParameter("invalid Argon2 parameters"))?;
    Argon2::new(algorithm, Version::V0x13, params)
        .hash_password_into(password, salt, out)
        .map_err(|_| Failure::BadParameter("invalid Argon2 input"))
}

fn derive(
    family: Family,
    (p1, p2, p3): (usize, usize, usize),
    out: &mut [u8],
    password: &[u8],
    salt: &[u8],
) -> Result<(), Failure> {
    match family {
        Family::Pbkdf2(algo) => pbkdf2(algo, param(p1)?, out, password, salt),
        Family::Argon2(algorithm) => argon2(
            algorithm,
            (param(p1)?, param(p2)?, param(p3)?),
            out,
            password,
            salt,
        ),
    }
}

/// Scales `probe` so that the work takes about `target`.
fn scale(probe: u32, took: Duration, target: Duration) -> u32 {
    let took = took.as_nanos().max(1);
    let want = u128::from(probe)
        .saturating_mul(target.as_nanos())
        .checked_div(took)
        .unwrap_or(u128::from(probe));
    u32::try_from(want).unwrap_or(u32::MAX).max(1)
}

/// Chooses parameters that take about `msec` milliseconds.
fn calibrate(
    family: Family,
    msec: u32,
    out_len: usize,
) -> Result<(usize, usize, usize), Failure> {
    let target = Duration::from_millis(u64::from(msec));
    let mut scratch = Zeroizing::new(vec![0u8; out_len.max(1)]);
    let salt = [0u8; 16];
    let params = match family {
        Family::Pbkdf2(algo) => {
            let start = Instant::now();
            pbkdf2(algo, PBKDF2_PROBE, &mut scratch, b"calibrate", &salt)?;
            let iterations = scale(PBKDF2_PROBE, start.elapsed(), target).max(PBKDF2_PROBE);
            (iterations as usize, 0, 0)
        }
        Family::Argon2(algorithm) => {
            let start = Instant::now();
            argon2(
                algorithm,
                (TIMED_ARGON2_M, 1, 1),
                &mut scratch,
                b"calibrate",
                &salt,
            )?;
            let t = scale(1, start.elapsed(), target);
            (TIMED_ARGON2_M as usize, t as usize, 1)
        }
    };
    debug!(?family, msec, ?params, "calibrated password hash");
    Ok(params)
}

/// Derives `out_len` bytes from a password with explicit
/// parameters.
///
/// For `PBKDF2(SHA-256)` and `PBKDF2(SHA-512)`, `param1` is the
/// iteration count. For `Argon2d`, `Argon2i` and `Argon2id`,
/// `param1` is the memory in KiB, `param2` the number of passes
/// and `param3` the parallelism. Unused parameters are ignored.
///
/// # Safety
///
/// - `algo` must be a NUL-terminated string.
/// - `out` must be valid for writes of `out_len` bytes.
/// - The inputs must be valid for reads of their lengths.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_pwdhash(
    algo: *const c_char,
    param1: usize,
    param2: usize,
    param3: usize,
    out: *mut u8,
    out_len: usize,
    password: *const c_char,
    password_len: usize,
    salt: *const u8,
    salt_len: usize,
) -> c_int {
    guard("eng_pwdhash", || {
        // SAFETY: See the function's safety docs.
        let name = unsafe { cstr(algo) }?;
        let family = Family::from_name(name).ok_or_else(|| Failure::unknown(name))?;
        // SAFETY: See the function's safety docs.
        let (password, salt) =
            unsafe { (input(password.cast(), password_len)?, input(salt, salt_len)?) };
        let mut buf = Zeroizing::new(vec![0u8; out_len]);
        derive(family, (param1, param2, param3), &mut buf, password, salt)?;
        // SAFETY: See the function's safety docs.
        unsafe { output(out, out_len) }?.copy_from_slice(&buf);
        Ok(())
    })
}

/// Like [`eng_pwdhash`], but chooses parameters that take about
/// `msec` milliseconds and stores them in the out-parameters.
///
/// # Safety
///
/// - `param1`, `param2` and `param3` must be valid for writes.
/// - See [`eng_pwdhash`].
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_pwdhash_timed(
    algo: *const c_char,
    msec: u32,
    param1: *mut usize,
    param2: *mut usize,
    param3: *mut usize,
    out: *mut u8,
    out_len: usize,
    password: *const c_char,
    password_len: usize,
    salt: *const u8,
    salt_len: usize,
) -> c_int {
    guard("eng_pwdhash_timed", || {
        // SAFETY: See the function's safety docs.
        let name = unsafe { cstr(algo) }?;
        let family = Family::from_name(name).ok_or_else(|| Failure::unknown(name))?;
        // SAFETY: See the function's safety docs.
        let (password, salt) =
            unsafe { (input(password.cast(), password_len)?, input(salt, salt_len)?) };
        let params = calibrate(family, msec, out_len)?;
        let mut buf = Zeroizing::new(vec![0u8; out_len]);
        derive(family, params, &mut buf, password, salt)?;
        // SAFETY: See the function's safety docs.
        unsafe {
            *out_ref(param1)? = params.0;
            *out_ref(param2)? = params.1;
            *out_ref(param3)? = params.2;
            output(out, out_len)?.copy_from_slice(&buf);
        }
        Ok(())
    })
}

/// Hashes a NUL-terminated password (any bytes) with bcrypt, writing the
/// NUL-terminated `$2a$` string using the length-query protocol.
///
/// The salt is drawn from `rng`. `flags` must be zero.
///
/// # Safety
///
/// - `out_len` must be valid for reads and writes.
/// - `out` must be valid for writes of `*out_len` bytes.
/// - `password` must be a NUL-terminated string.
/// - `rng` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_bcrypt_generate(
    out: *mut u8,
    out_len: *mut usize,
    password: *const c_char,
    rng: eng_rng_t,
    work_factor: usize,
    flags: u32,
) -> c_int {
    guard("eng_bcrypt_generate", || {
        check_flags(flags, 0)?;
        if !(ENG_BCRYPT_MIN_WORK_FACTOR..=ENG_BCRYPT_MAX_WORK_FACTOR).contains(&work_factor) {
            return Err(Failure::BadParameter("work factor out of range"));
        }
        // SAFETY: See the function's safety docs.
        let password = unsafe { cbytes(password) }?;
        // SAFETY: See the function's safety docs.
        let rng = unsafe { rng_mut(rng) }?;
        let mut salt = [0u8; 16];
        rng.try_fill_bytes(&mut salt)
            .map_err(|_| Failure::System("unable to draw a salt"))?;
        let hash = bcrypt::hash_with_salt(password, param(work_factor)?, salt)
            .map_err(|_| Failure::InvalidInput("bcrypt rejected the password"))?
            .format_for_version(bcrypt::Version::TwoA);
        // SAFETY: See the function's safety docs.
        unsafe { write_str_output(out.cast(), out_len, &hash) }
    })
}

/// Checks a password against a bcrypt hash.
///
/// Returns 0 if it matches, [`INVALID_VERIFIER`] if not, or
/// [`ERROR_INVALID_INPUT`](crate::rc::ERROR_INVALID_INPUT) if the
/// hash is malformed.
///
/// # Safety
///
/// `password` and `hash` must be NUL-terminated strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_bcrypt_is_valid(
    password: *const c_char,
    hash: *const c_char,
) -> c_int {
    guard_value("eng_bcrypt_is_valid", || {
        // SAFETY: See the function's safety docs.
        let (password, hash) = unsafe { (cbytes(password)?, cstr(hash)?) };
        let ok = bcrypt::verify(password, hash)
            .map_err(|_| Failure::InvalidInput("malformed bcrypt hash"))?;
        Ok(if ok { SUCCESS } else { INVALID_VERIFIER })
    })
}
