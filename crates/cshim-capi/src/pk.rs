use core::ffi::{c_char, c_int};

use cshim::{PrivateKey, PublicKey, Signer, Validity, Verifier};

use crate::{
    args::{self, guard, guard_count},
    kdf::verdict,
    rng::CshimRng,
};

/// A private key handle.
pub type CshimPrivKey = PrivateKey;
/// A public key handle.
pub type CshimPubKey = PublicKey;
/// A signing operation handle.
pub type CshimSign = Signer;
/// A verification operation handle.
pub type CshimVerify = Verifier;

/// Generates a private key, e.g. `Ed25519` or `ECDSA` with
/// parameters `secp256r1`.
///
/// # Safety
///
/// - `out` must be valid for writes.
/// - `algo` and `params` must be NUL-terminated strings.
/// - `rng` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_privkey_generate(
    out: *mut *mut CshimPrivKey,
    algo: *const c_char,
    params: *const c_char,
    rng: *mut CshimRng,
) -> c_int {
    guard("cshim_privkey_generate", || {
        // SAFETY: See the function's safety docs.
        let (algo, params) =
            unsafe { (args::name("algo", algo)?, args::name("params", params)?) };
        // SAFETY: See the function's safety docs.
        let rng = unsafe { args::handle_mut("rng", rng) }?;
        let key = PrivateKey::generate(algo, params, rng)?;
        // SAFETY: See the function's safety docs.
        unsafe { args::init(out, key) }
    })
}

/// Releases a private key. Null is ignored.
///
/// # Safety
///
/// `key` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_privkey_destroy(key: *mut CshimPrivKey) -> c_int {
    // SAFETY: See the function's safety docs.
    unsafe { args::destroy(key) };
    0
}

/// Creates the public key of `key`.
///
/// # Safety
///
/// - `out` must be valid for writes.
/// - `key` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_privkey_export_pubkey(
    out: *mut *mut CshimPubKey,
    key: *const CshimPrivKey,
) -> c_int {
    guard("cshim_privkey_export_pubkey", || {
        // SAFETY: See the function's safety docs.
        let key = unsafe { args::handle("key", key) }?;
        let pk = key.public_key()?;
        // SAFETY: See the function's safety docs.
        unsafe { args::init(out, pk) }
    })
}

/// Releases a public key. Null is ignored.
///
/// # Safety
///
/// `key` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_pubkey_destroy(key: *mut CshimPubKey) -> c_int {
    // SAFETY: See the function's safety docs.
    unsafe { args::destroy(key) };
    0
}

/// Starts a signing operation.
///
/// # Safety
///
/// - `out` must be valid for writes.
/// - `key` must be a live handle.
/// - `padding` must be a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_sign_init(
    out: *mut *mut CshimSign,
    key: *const CshimPrivKey,
    padding: *const c_char,
) -> c_int {
    guard("cshim_sign_init", || {
        // SAFETY: See the function's safety docs.
        let key = unsafe { args::handle("key", key) }?;
        // SAFETY: See the function's safety docs.
        let padding = unsafe { args::name("padding", padding) }?;
        let op = key.signer(padding)?;
        // SAFETY: See the function's safety docs.
        unsafe { args::init(out, op) }
    })
}

/// Releases a signing operation. Null is ignored.
///
/// # Safety
///
/// `op` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_sign_destroy(op: *mut CshimSign) -> c_int {
    // SAFETY: See the function's safety docs.
    unsafe { args::destroy(op) };
    0
}

/// Absorbs the viewed message bytes.
///
/// # Safety
///
/// - `op` must be a live handle.
/// - `data` must be valid for reads of `cap` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_sign_update(
    op: *mut CshimSign,
    data: *const u8,
    cap: usize,
    off: isize,
    len: isize,
) -> c_int {
    guard("cshim_sign_update", || {
        // SAFETY: See the function's safety docs.
        let op = unsafe { args::handle_mut("op", op) }?;
        // SAFETY: See the function's safety docs.
        let data = unsafe { args::view(data, cap, off, len) }?;
        Ok(op.update(&data)?)
    })
}

/// Returns the signature size, or a negative status.
///
/// # Safety
///
/// `op` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_sign_output_length(op: *const CshimSign) -> isize {
    guard_count("cshim_sign_output_length", || {
        // SAFETY: See the function's safety docs.
        let op = unsafe { args::handle("op", op) }?;
        Ok(op.output_length()?)
    })
}

/// Writes the signature into the output view and returns its
/// length, or a negative status.
///
/// # Safety
///
/// - `op` and `rng` must be live handles.
/// - `out` must be valid for writes of `cap` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_sign_finish(
    op: *mut CshimSign,
    rng: *mut CshimRng,
    out: *mut u8,
    cap: usize,
    off: isize,
    len: isize,
) -> isize {
    guard_count("cshim_sign_finish", || {
        // SAFETY: See the function's safety docs.
        let op = unsafe { args::handle_mut("op", op) }?;
        // SAFETY: See the function's safety docs.
        let rng = unsafe { args::handle_mut("rng", rng) }?;
        // SAFETY: See the function's safety docs.
        let mut out = unsafe { args::view_mut(out, cap, off, len) }?;
        Ok(op.finish_into(rng, &mut out)?)
    })
}

/// Starts a verification operation.
///
/// # Safety
///
/// - `out` must be valid for writes.
/// - `key` must be a live handle.
/// - `padding` must be a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_verify_init(
    out: *mut *mut CshimVerify,
    key: *const CshimPubKey,
    padding: *const c_char,
) -> c_int {
    guard("cshim_verify_init", || {
        // SAFETY: See the function's safety docs.
        let key = unsafe { args::handle("key", key) }?;
        // SAFETY: See the function's safety docs.
        let padding = unsafe { args::name("padding", padding) }?;
        let op = key.verifier(padding)?;
        // SAFETY: See the function's safety docs.
        unsafe { args::init(out, op) }
    })
}

/// Releases a verification operation. Null is ignored.
///
/// # Safety
///
/// `op` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_verify_destroy(op: *mut CshimVerify) -> c_int {
    // SAFETY: See the function's safety docs.
    unsafe { args::destroy(op) };
    0
}

/// Absorbs the viewed message bytes.
///
/// # Safety
///
/// - `op` must be a live handle.
/// - `data` must be valid for reads of `cap` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_verify_update(
    op: *mut CshimVerify,
    data: *const u8,
    cap: usize,
    off: isize,
    len: isize,
) -> c_int {
    guard("cshim_verify_update", || {
        // SAFETY: See the function's safety docs.
        let op = unsafe { args::handle_mut("op", op) }?;
        // SAFETY: See the function's safety docs.
        let data = unsafe { args::view(data, cap, off, len) }?;
        Ok(op.update(&data)?)
    })
}

/// Checks the viewed signature.
///
/// Returns 0 if it is valid, 1 if it is not, or a negative
/// status (e.g. for a signature of the wrong length).
///
/// # Safety
///
/// - `op` must be a live handle.
/// - `sig` must be valid for reads of `cap` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_verify_finish(
    op: *mut CshimVerify,
    sig: *const u8,
    cap: usize,
    off: isize,
    len: isize,
) -> c_int {
    let mut validity = Validity::Invalid;
    let code = guard("cshim_verify_finish", || {
        // SAFETY: See the function's safety docs.
        let op = unsafe { args::handle_mut("op", op) }?;
        // SAFETY: See the function's safety docs.
        let sig = unsafe { args::view(sig, cap, off, len) }?;
        validity = op.finish(&sig)?;
        Ok(())
    });
    verdict(code, validity)
}
