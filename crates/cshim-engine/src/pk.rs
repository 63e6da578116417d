//! Public key signatures: Ed25519 and ECDSA over secp256r1.

use core::ffi::{c_char, c_int};

use ed25519_dalek::Signer as _;
use p256::ecdsa::{
    self,
    signature::{DigestVerifier, RandomizedDigestSigner},
};
use sha2::{Digest, Sha256};

use crate::{
    obj::{
        check_flags, create, cstr, destroy, get, guard, guard_value, input, object, out_ref,
        write_output, write_str_output,
    },
    rc::{Failure, INVALID_VERIFIER, SUCCESS},
    rng::{eng_rng_t, rng_mut},
};

/// The signature size for both algorithms.
const SIG_LEN: usize = 64;

/// Reads an optional NUL-terminated string. Null is empty.
///
/// # Safety
///
/// See [`cstr`].
unsafe fn opt_cstr<'a>(ptr: *const c_char) -> Result<&'a str, Failure> {
    if ptr.is_null() {
        Ok("")
    } else {
        // SAFETY: See the function's safety docs.
        unsafe { cstr(ptr) }
    }
}

pub(crate) enum PrivKey {
    Ed25519(ed25519_dalek::SigningKey),
    Ecdsa(ecdsa::SigningKey),
}

impl PrivKey {
    fn algo_name(&self) -> &'static str {
        match self {
            Self::Ed25519(_) => "Ed25519",
            Self::Ecdsa(_) => "ECDSA",
        }
    }
}

pub(crate) enum PubKey {
    Ed25519(ed25519_dalek::VerifyingKey),
    Ecdsa(ecdsa::VerifyingKey),
}

impl PubKey {
    fn algo_name(&self) -> &'static str {
        match self {
            Self::Ed25519(_) => "Ed25519",
            Self::Ecdsa(_) => "ECDSA",
        }
    }
}

object! {
    /// A private key.
    eng_privkey_struct(PrivKey) = 0x7f96_385e
}

object! {
    /// A public key.
    eng_pubkey_struct(PubKey) = 0x2c28_6516
}

/// An opaque private key handle.
pub type eng_privkey_t = *mut eng_privkey_struct;
/// An opaque public key handle.
pub type eng_pubkey_t = *mut eng_pubkey_struct;

/// Generates a private key.
///
/// `algo_name` is `Ed25519` (no parameters) or `ECDSA` with
/// `algo_params` `secp256r1` (the default when empty).
///
/// # Safety
///
/// - `key` must be valid for writes.
/// - `algo_name` must be a NUL-terminated string.
/// - `algo_params` must be null or a NUL-terminated string.
/// - `rng` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_privkey_create(
    key: *mut eng_privkey_t,
    algo_name: *const c_char,
    algo_params: *const c_char,
    rng: eng_rng_t,
) -> c_int {
    guard("eng_privkey_create", || {
        // SAFETY: See the function's safety docs.
        let (name, params) = unsafe { (cstr(algo_name)?, opt_cstr(algo_params)?) };
        // SAFETY: See the function's safety docs.
        let rng = unsafe { rng_mut(rng) }?;
        let sk = match (name, params) {
            ("Ed25519", "") => PrivKey::Ed25519(ed25519_dalek::SigningKey::generate(rng)),
            ("Ed25519", _) => return Err(Failure::BadParameter("Ed25519 takes no parameters")),
            ("ECDSA", "" | "secp256r1" | "P-256") => {
                PrivKey::Ecdsa(ecdsa::SigningKey::random(rng))
            }
            ("ECDSA", _) => return Err(Failure::unknown(params)),
            _ => return Err(Failure::unknown(name)),
        };
        // SAFETY: See the function's safety docs.
        unsafe { create(key, sk) }
    })
}

/// Releases a private key.
///
/// # Safety
///
/// `key` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_privkey_destroy(key: eng_privkey_t) -> c_int {
    // SAFETY: See the function's safety docs.
    guard("eng_privkey_destroy", || unsafe { destroy(key) })
}

/// Creates the public key of `key`.
///
/// # Safety
///
/// - `out` must be valid for writes.
/// - `key` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_privkey_export_pubkey(
    out: *mut eng_pubkey_t,
    key: eng_privkey_t,
) -> c_int {
    guard("eng_privkey_export_pubkey", || {
        // SAFETY: See the function's safety docs.
        let pk = match unsafe { get(key) }? {
            PrivKey::Ed25519(sk) => PubKey::Ed25519(sk.verifying_key()),
            PrivKey::Ecdsa(sk) => PubKey::Ecdsa(ecdsa::VerifyingKey::from(&*sk)),
        };
        // SAFETY: See the function's safety docs.
        unsafe { create(out, pk) }
    })
}

/// Writes the algorithm name using the length-query protocol.
///
/// # Safety
///
/// - `key` must be a live handle.
/// - `out` must be valid for writes of `*out_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_privkey_algo_name(
    key: eng_privkey_t,
    out: *mut c_char,
    out_len: *mut usize,
) -> c_int {
    guard("eng_privkey_algo_name", || {
        // SAFETY: See the function's safety docs.
        let name = unsafe { get(key) }?.algo_name();
        // SAFETY: See the function's safety docs.
        unsafe { write_str_output(out, out_len, name) }
    })
}

/// Releases a public key.
///
/// # Safety
///
/// `key` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_pubkey_destroy(key: eng_pubkey_t) -> c_int {
    // SAFETY: See the function's safety docs.
    guard("eng_pubkey_destroy", || unsafe { destroy(key) })
}

/// Writes the algorithm name using the length-query protocol.
///
/// # Safety
///
/// - `key` must be a live handle.
/// - `out` must be valid for writes of `*out_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_pubkey_algo_name(
    key: eng_pubkey_t,
    out: *mut c_char,
    out_len: *mut usize,
) -> c_int {
    guard("eng_pubkey_algo_name", || {
        // SAFETY: See the function's safety docs.
        let name = unsafe { get(key) }?.algo_name();
        // SAFETY: See the function's safety docs.
        unsafe { write_str_output(out, out_len, name) }
    })
}

/// Checks the padding (message encoding) for an algorithm.
fn check_padding(algo: &str, padding: &str) -> Result<(), Failure> {
    match (algo, padding) {
        ("Ed25519", "" | "Pure") | ("ECDSA", "SHA-256" | "EMSA1(SHA-256)") => Ok(()),
        _ => Err(Failure::unknown(padding)),
    }
}

pub(crate) enum Signing {
    Ed25519 {
        key: ed25519_dalek::SigningKey,
        msg: Vec<u8>,
    },
    Ecdsa {
        key: ecdsa::SigningKey,
        digest: Sha256,
    },
}

pub(crate) enum Verifying {
    Ed25519 {
        key: ed25519_dalek::VerifyingKey,
        msg: Vec<u8>,
    },
    Ecdsa {
        key: ecdsa::VerifyingKey,
        digest: Sha256,
    },
}

object! {
    /// A signing operation.
    eng_pk_op_sign_struct(Signing) = 0x1af0_c39b
}

object! {
    /// A verification operation.
    eng_pk_op_verify_struct(Verifying) = 0x2fab_8b64
}

/// An opaque signing operation handle.
pub type eng_pk_op_sign_t = *mut eng_pk_op_sign_struct;
/// An opaque verification operation handle.
pub type eng_pk_op_verify_t = *mut eng_pk_op_verify_struct;

/// Creates a signing operation. The operation keeps its own copy
/// of the key.
///
/// # Safety
///
/// - `op` must be valid for writes.
/// - `key` must be a live handle.
/// - `hash_and_padding` must be null or a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_pk_op_sign_create(
    op: *mut eng_pk_op_sign_t,
    key: eng_privkey_t,
    hash_and_padding: *const c_char,
    flags: u32,
) -> c_int {
    guard("eng_pk_op_sign_create", || {
        check_flags(flags, 0)?;
        // SAFETY: See the function's safety docs.
        let sk = unsafe { get(key) }?;
        // SAFETY: See the function's safety docs.
        check_padding(sk.algo_name(), unsafe { opt_cstr(hash_and_padding) }?)?;
        let signing = match sk {
            PrivKey::Ed25519(key) => Signing::Ed25519 {
                key: key.clone(),
                msg: Vec::new(),
            },
            PrivKey::Ecdsa(key) => Signing::Ecdsa {
                key: key.clone(),
                digest: Sha256::new(),
            },
        };
        // SAFETY: See the function's safety docs.
        unsafe { create(op, signing) }
    })
}

/// Releases a signing operation.
///
/// # Safety
///
/// `op` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_pk_op_sign_destroy(op: eng_pk_op_sign_t) -> c_int {
    // SAFETY: See the function's safety docs.
    guard("eng_pk_op_sign_destroy", || unsafe { destroy(op) })
}

/// Stores the signature size.
///
/// # Safety
///
/// - `op` must be a live handle.
/// - `olen` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_pk_op_sign_output_length(
    op: eng_pk_op_sign_t,
    olen: *mut usize,
) -> c_int {
    guard("eng_pk_op_sign_output_length", || {
        // SAFETY: See the function's safety docs.
        unsafe { get(op) }?;
        // SAFETY: See the function's safety docs.
        *unsafe { out_ref(olen) }? = SIG_LEN;
        Ok(())
    })
}

/// Absorbs message bytes.
///
/// # Safety
///
/// - `op` must be a live handle.
/// - `data` must be valid for reads of `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_pk_op_sign_update(
    op: eng_pk_op_sign_t,
    data: *const u8,
    len: usize,
) -> c_int {
    guard("eng_pk_op_sign_update", || {
        // SAFETY: See the function's safety docs.
        let signing = unsafe { get(op) }?;
        // SAFETY: See the function's safety docs.
        let data = unsafe { input(data, len) }?;
        match signing {
            Signing::Ed25519 { msg, .. } => msg.extend_from_slice(data),
            Signing::Ecdsa { digest, .. } => digest.update(data),
        }
        Ok(())
    })
}

/// Signs the absorbed message using the length-query protocol,
/// then resets the operation for a new message.
///
/// # Safety
///
/// - `op` and `rng` must be live handles.
/// - `sig_len` must be valid for reads and writes.
/// - `sig` must be valid for writes of `*sig_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_pk_op_sign_finish(
    op: eng_pk_op_sign_t,
    rng: eng_rng_t,
    sig: *mut u8,
    sig_len: *mut usize,
) -> c_int {
    guard("eng_pk_op_sign_finish", || {
        // SAFETY: See the function's safety docs.
        let signing = unsafe { get(op) }?;
        // SAFETY: See the function's safety docs.
        let rng = unsafe { rng_mut(rng) }?;
        // SAFETY: See the function's safety docs.
        let cap = *unsafe { out_ref(sig_len) }?;
        if cap < SIG_LEN {
            // Report the size without consuming the message.
            // SAFETY: See the function's safety docs.
            return unsafe { write_output(sig, sig_len, &[0u8; SIG_LEN]) };
        }
        let bytes: [u8; SIG_LEN] = match signing {
            Signing::Ed25519 { key, msg } => {
                let sig = key.sign(msg);
                msg.clear();
                sig.to_bytes()
            }
            Signing::Ecdsa { key, digest } => {
                let sig: ecdsa::Signature = key
                    .try_sign_digest_with_rng(rng, core::mem::take(digest))
                    .map_err(|_| Failure::Internal("ECDSA signing failed"))?;
                let mut out = [0u8; SIG_LEN];
                out.copy_from_slice(&sig.to_bytes());
                out
            }
        };
        // SAFETY: See the function's safety docs.
        unsafe { write_output(sig, sig_len, &bytes) }
    })
}

/// Creates a verification operation. The operation keeps its own
/// copy of the key.
///
/// # Safety
///
/// - `op` must be valid for writes.
/// - `key` must be a live handle.
/// - `hash_and_padding` must be null or a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_pk_op_verify_create(
    op: *mut eng_pk_op_verify_t,
    key: eng_pubkey_t,
    hash_and_padding: *const c_char,
    flags: u32,
) -> c_int {
    guard("eng_pk_op_verify_create", || {
        check_flags(flags, 0)?;
        // SAFETY: See the function's safety docs.
        let pk = unsafe { get(key) }?;
        // SAFETY: See the function's safety docs.
        check_padding(pk.algo_name(), unsafe { opt_cstr(hash_and_padding) }?)?;
        let verifying = match pk {
            PubKey::Ed25519(key) => Verifying::Ed25519 {
                key: *key,
                msg: Vec::new(),
            },
            PubKey::Ecdsa(key) => Verifying::Ecdsa {
                key: key.clone(),
                digest: Sha256::new(),
            },
        };
        // SAFETY: See the function's safety docs.
        unsafe { create(op, verifying) }
    })
}

/// Releases a verification operation.
///
/// # Safety
///
/// `op` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_pk_op_verify_destroy(op: eng_pk_op_verify_t) -> c_int {
    // SAFETY: See the function's safety docs.
    guard("eng_pk_op_verify_destroy", || unsafe { destroy(op) })
}

/// Absorbs message bytes.
///
/// # Safety
///
/// - `op` must be a live handle.
/// - `data` must be valid for reads of `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_pk_op_verify_update(
    op: eng_pk_op_verify_t,
    data: *const u8,
    len: usize,
) -> c_int {
    guard("eng_pk_op_verify_update", || {
        // SAFETY: See the function's safety docs.
        let verifying = unsafe { get(op) }?;
        // SAFETY: See the function's safety docs.
        let data = unsafe { input(data, len) }?;
        match verifying {
            Verifying::Ed25519 { msg, .. } => msg.extend_from_slice(data),
            Verifying::Ecdsa { digest, .. } => digest.update(data),
        }
        Ok(())
    })
}

/// Checks `sig` against the absorbed message, then resets the
/// operation for a new message.
///
/// Returns 0 if the signature is valid, [`INVALID_VERIFIER`] if
/// not, or [`ERROR_BAD_PARAMETER`](crate::rc::ERROR_BAD_PARAMETER)
/// if it has the wrong length.
///
/// # Safety
///
/// - `op` must be a live handle.
/// - `sig` must be valid for reads of `sig_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_pk_op_verify_finish(
    op: eng_pk_op_verify_t,
    sig: *const u8,
    sig_len: usize,
) -> c_int {
    guard_value("eng_pk_op_verify_finish", || {
        // SAFETY: See the function's safety docs.
        let verifying = unsafe { get(op) }?;
        // SAFETY: See the function's safety docs.
        let sig = unsafe { input(sig, sig_len) }?;
        let sig: &[u8; SIG_LEN] = sig
            .try_into()
            .map_err(|_| Failure::BadParameter("invalid signature length"))?;
        let valid = match verifying {
            Verifying::Ed25519 { key, msg } => {
                let sig = ed25519_dalek::Signature::from_bytes(sig);
                let ok = key.verify_strict(msg, &sig).is_ok();
                msg.clear();
                ok
            }
            Verifying::Ecdsa { key, digest } => {
                let digest = core::mem::take(digest);
                ecdsa::Signature::from_slice(sig)
                    .is_ok_and(|sig| key.verify_digest(digest, &sig).is_ok())
            }
        };
        Ok(if valid { SUCCESS } else { INVALID_VERIFIER })
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::indexing_slicing)]

    use core::ptr;

    use super::*;
    use crate::{
        rc::{ERROR_BAD_PARAMETER, ERROR_INSUFFICIENT_BUFFER_SPACE, ERROR_NOT_IMPLEMENTED},
        rng::{eng_rng_destroy, eng_rng_init},
    };

    struct Fixture {
        rng: eng_rng_t,
        sk: eng_privkey_t,
        pk: eng_pubkey_t,
    }

    impl Fixture {
        fn new(algo: &core::ffi::CStr, params: &core::ffi::CStr) -> Self {
            let mut rng = ptr::null_mut();
            let mut sk = ptr::null_mut();
            let mut pk = ptr::null_mut();
            // SAFETY: FFI call, no invariants.
            unsafe {
                assert_eq!(eng_rng_init(&mut rng, c"user".as_ptr()), SUCCESS);
                assert_eq!(
                    eng_privkey_create(&mut sk, algo.as_ptr(), params.as_ptr(), rng),
                    SUCCESS
                );
                assert_eq!(eng_privkey_export_pubkey(&mut pk, sk), SUCCESS);
            }
            Self { rng, sk, pk }
        }

        fn sign(&self, padding: &core::ffi::CStr, msg: &[&[u8]]) -> Vec<u8> {
            let mut op = ptr::null_mut();
            let mut sig = vec![0u8; SIG_LEN];
            let mut n = sig.len();
            // SAFETY: FFI call, no invariants.
            unsafe {
                assert_eq!(eng_pk_op_sign_create(&mut op, self.sk, padding.as_ptr(), 0), SUCCESS);
                for part in msg {
                    eng_pk_op_sign_update(op, part.as_ptr(), part.len());
                }
                assert_eq!(eng_pk_op_sign_finish(op, self.rng, sig.as_mut_ptr(), &mut n), SUCCESS);
                eng_pk_op_sign_destroy(op);
            }
            assert_eq!(n, SIG_LEN);
            sig
        }

        fn verify(&self, padding: &core::ffi::CStr, msg: &[u8], sig: &[u8]) -> c_int {
            let mut op = ptr::null_mut();
            // SAFETY: FFI call, no invariants.
            unsafe {
                assert_eq!(eng_pk_op_verify_create(&mut op, self.pk, padding.as_ptr(), 0), SUCCESS);
                eng_pk_op_verify_update(op, msg.as_ptr(), msg.len());
                let rc = eng_pk_op_verify_finish(op, sig.as_ptr(), sig.len());
                eng_pk_op_verify_destroy(op);
                rc
            }
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            // SAFETY: FFI call, no invariants.
            unsafe {
                eng_pubkey_destroy(self.pk);
                eng_privkey_destroy(self.sk);
                eng_rng_destroy(self.rng);
            }
        }
    }

    #[test]
    fn test_sign_verify() {
        for (algo, params, padding) in [
            (c"Ed25519", c"", c"Pure"),
            (c"ECDSA", c"secp256r1", c"SHA-256"),
        ] {
            let f = Fixture::new(algo, params);
            let sig = f.sign(padding, &[b"hello ", b"world"]);
            assert_eq!(f.verify(padding, b"hello world", &sig), SUCCESS, "{algo:?}");
            assert_eq!(f.verify(padding, b"hello there", &sig), INVALID_VERIFIER, "{algo:?}");
            assert_eq!(
                f.verify(padding, b"hello world", &sig[..SIG_LEN - 1]),
                ERROR_BAD_PARAMETER,
                "{algo:?}"
            );
        }
    }

    #[test]
    fn test_algo_names() {
        let f = Fixture::new(c"ECDSA", c"");
        let mut buf = [0u8; 16];
        let mut n = buf.len();
        // SAFETY: FFI call, no invariants.
        let rc = unsafe { eng_pubkey_algo_name(f.pk, buf.as_mut_ptr().cast(), &mut n) };
        assert_eq!(rc, SUCCESS);
        assert_eq!(&buf[..n], b"ECDSA\0");
    }

    #[test]
    fn test_sign_query() {
        let f = Fixture::new(c"Ed25519", c"");
        let mut op = ptr::null_mut();
        let mut n = 0;
        // SAFETY: FFI call, no invariants.
        unsafe {
            eng_pk_op_sign_create(&mut op, f.sk, ptr::null(), 0);
            let rc = eng_pk_op_sign_finish(op, f.rng, ptr::null_mut(), &mut n);
            assert_eq!(rc, ERROR_INSUFFICIENT_BUFFER_SPACE);
            eng_pk_op_sign_destroy(op);
        }
        assert_eq!(n, SIG_LEN);
    }

    #[test]
    fn test_unknown() {
        let f = Fixture::new(c"Ed25519", c"");
        let mut op = ptr::null_mut();
        let mut sk = ptr::null_mut();
        // SAFETY: FFI call, no invariants.
        unsafe {
            assert_eq!(
                eng_pk_op_sign_create(&mut op, f.sk, c"Ed25519ph".as_ptr(), 0),
                ERROR_NOT_IMPLEMENTED
            );
            assert_eq!(
                eng_privkey_create(&mut sk, c"RSA".as_ptr(), c"2048".as_ptr(), f.rng),
                ERROR_NOT_IMPLEMENTED
            );
        }
    }
}
