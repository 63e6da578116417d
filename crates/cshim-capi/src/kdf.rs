use core::ffi::{c_char, c_int};

use cshim::{PwdHashParams, Validity};

use crate::{
    args::{self, guard, guard_count},
    error::{CshimStatus, ErrorCode as _},
    rng::CshimRng,
};

/// Derives the output view from the secret, salt and label
/// views with the named KDF.
///
/// # Safety
///
/// - `algo` must be a NUL-terminated string.
/// - Each buffer must be valid for its capacity.
/// - `out` must not overlap the inputs.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_kdf(
    algo: *const c_char,
    out: *mut u8,
    out_cap: usize,
    out_off: isize,
    out_len: isize,
    secret: *const u8,
    secret_cap: usize,
    secret_off: isize,
    secret_len: isize,
    salt: *const u8,
    salt_cap: usize,
    salt_off: isize,
    salt_len: isize,
    label: *const u8,
    label_cap: usize,
    label_off: isize,
    label_len: isize,
) -> c_int {
    guard("cshim_kdf", || {
        // SAFETY: See the function's safety docs.
        let algo = unsafe { args::name("algo", algo) }?;
        // SAFETY: See the function's safety docs.
        let mut out = unsafe { args::view_mut(out, out_cap, out_off, out_len) }?;
        // SAFETY: See the function's safety docs.
        let secret = unsafe { args::view(secret, secret_cap, secret_off, secret_len) }?;
        // SAFETY: See the function's safety docs.
        let salt = unsafe { args::view(salt, salt_cap, salt_off, salt_len) }?;
        // SAFETY: See the function's safety docs.
        let label = unsafe { args::view(label, label_cap, label_off, label_len) }?;
        Ok(cshim::kdf(algo, &mut out, &secret, &salt, &label)?)
    })
}

/// Derives the output view from the password and salt views
/// with explicit parameters.
///
/// # Safety
///
/// See [`cshim_kdf`].
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_pwdhash(
    algo: *const c_char,
    p1: usize,
    p2: usize,
    p3: usize,
    out: *mut u8,
    out_cap: usize,
    out_off: isize,
    out_len: isize,
    password: *const u8,
    password_cap: usize,
    password_off: isize,
    password_len: isize,
    salt: *const u8,
    salt_cap: usize,
    salt_off: isize,
    salt_len: isize,
) -> c_int {
    guard("cshim_pwdhash", || {
        // SAFETY: See the function's safety docs.
        let algo = unsafe { args::name("algo", algo) }?;
        // SAFETY: See the function's safety docs.
        let mut out = unsafe { args::view_mut(out, out_cap, out_off, out_len) }?;
        // SAFETY: See the function's safety docs.
        let password = unsafe { args::view(password, password_cap, password_off, password_len) }?;
        // SAFETY: See the function's safety docs.
        let salt = unsafe { args::view(salt, salt_cap, salt_off, salt_len) }?;
        let params = PwdHashParams { p1, p2, p3 };
        Ok(cshim::pwdhash(algo, params, &mut out, &password, &salt)?)
    })
}

/// Like [`cshim_pwdhash`], but the engine picks parameters that
/// take about `msec` milliseconds and stores them in `p1`, `p2`
/// and `p3`.
///
/// # Safety
///
/// - See [`cshim_kdf`].
/// - `p1`, `p2` and `p3` must be valid for writes.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_pwdhash_timed(
    algo: *const c_char,
    msec: u32,
    p1: *mut usize,
    p2: *mut usize,
    p3: *mut usize,
    out: *mut u8,
    out_cap: usize,
    out_off: isize,
    out_len: isize,
    password: *const u8,
    password_cap: usize,
    password_off: isize,
    password_len: isize,
    salt: *const u8,
    salt_cap: usize,
    salt_off: isize,
    salt_len: isize,
) -> c_int {
    guard("cshim_pwdhash_timed", || {
        // SAFETY: See the function's safety docs.
        let algo = unsafe { args::name("algo", algo) }?;
        // SAFETY: See the function's safety docs.
        let (p1, p2, p3) = unsafe {
            (
                args::out("p1", p1)?,
                args::out("p2", p2)?,
                args::out("p3", p3)?,
            )
        };
        // SAFETY: See the function's safety docs.
        let mut out = unsafe { args::view_mut(out, out_cap, out_off, out_len) }?;
        // SAFETY: See the function's safety docs.
        let password = unsafe { args::view(password, password_cap, password_off, password_len) }?;
        // SAFETY: See the function's safety docs.
        let salt = unsafe { args::view(salt, salt_cap, salt_off, salt_len) }?;
        let params = cshim::pwdhash_timed(algo, msec, &mut out, &password, &salt)?;
        *p1 = params.p1;
        *p2 = params.p2;
        *p3 = params.p3;
        Ok(())
    })
}

/// Hashes the viewed password with bcrypt.
///
/// The output view must hold at least 64 bytes. The hash is
/// NUL-terminated; the returned length includes the terminator.
///
/// # Safety
///
/// - Each buffer must be valid for its capacity.
/// - `rng` must be a live handle.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_bcrypt_generate(
    out: *mut u8,
    out_cap: usize,
    out_off: isize,
    out_len: isize,
    password: *const u8,
    password_cap: usize,
    password_off: isize,
    password_len: isize,
    rng: *mut CshimRng,
    work_factor: usize,
) -> isize {
    guard_count("cshim_bcrypt_generate", || {
        // SAFETY: See the function's safety docs.
        let mut out = unsafe { args::view_mut(out, out_cap, out_off, out_len) }?;
        // SAFETY: See the function's safety docs.
        let password = unsafe { args::view(password, password_cap, password_off, password_len) }?;
        // SAFETY: See the function's safety docs.
        let rng = unsafe { args::handle_mut("rng", rng) }?;
        Ok(cshim::generate_into(&mut out, &password, rng, work_factor)?)
    })
}

/// Checks the viewed password against the viewed hash.
///
/// Returns 0 if it matches, 1 if it does not, or a negative
/// status if the hash is malformed.
///
/// # Safety
///
/// Each buffer must be valid for its capacity.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_bcrypt_is_valid(
    password: *const u8,
    password_cap: usize,
    password_off: isize,
    password_len: isize,
    hash: *const u8,
    hash_cap: usize,
    hash_off: isize,
    hash_len: isize,
) -> c_int {
    let mut validity = Validity::Invalid;
    let code = guard("cshim_bcrypt_is_valid", || {
        // SAFETY: See the function's safety docs.
        let password = unsafe { args::view(password, password_cap, password_off, password_len) }?;
        // SAFETY: See the function's safety docs.
        let hash = unsafe { args::view(hash, hash_cap, hash_off, hash_len) }?;
        validity = cshim::is_valid(&password, &hash)?;
        Ok(())
    });
    verdict(code, validity)
}

/// Folds a [`Validity`] into a successful status.
pub(crate) fn verdict(code: c_int, validity: Validity) -> c_int {
    if code != CshimStatus::SUCCESS.code() {
        code
    } else if validity.is_valid() {
        CshimStatus::Success.code()
    } else {
        CshimStatus::Invalid.code()
    }
}
