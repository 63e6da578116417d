//! Signature keys and operations.

use alloc::{string::String, vec, vec::Vec};
use core::ffi::CStr;

use cshim_engine as eng;
use tracing::instrument;

use crate::{
    error::{BufferTooSmall, Result},
    handle::{Handle, kind},
    query,
    rng::Rng,
    state::State,
    status::{self, Validity},
};

/// A private signing key.
#[derive(Debug)]
pub struct PrivateKey {
    handle: Handle<kind::PrivKey>,
}

impl PrivateKey {
    /// Generates a key.
    ///
    /// `algo` is `Ed25519` (no parameters) or `ECDSA` (parameters
    /// `secp256r1`, `P-256` or empty).
    #[instrument(skip_all, fields(?algo, ?params))]
    pub fn generate(algo: &CStr, params: &CStr, rng: &mut Rng) -> Result<Self> {
        let rng = rng.as_ptr();
        let handle = Handle::init("eng_privkey_create", |out| {
            // SAFETY: FFI call, `out` is valid for writes, both
            // strings are NUL-terminated and the RNG is live.
            unsafe { eng::eng_privkey_create(out, algo.as_ptr(), params.as_ptr(), rng) }
        })?;
        Ok(Self { handle })
    }

    /// Returns the matching public key.
    pub fn public_key(&self) -> Result<PublicKey> {
        let handle = Handle::init("eng_privkey_export_pubkey", |out| {
            // SAFETY: FFI call, `out` is valid for writes and the
            // handle is live.
            unsafe { eng::eng_privkey_export_pubkey(out, self.handle.as_ptr()) }
        })?;
        Ok(PublicKey { handle })
    }

    /// The algorithm name.
    pub fn algo_name(&self) -> Result<String> {
        query::string("eng_privkey_algo_name", |out, out_len| {
            // SAFETY: FFI call, the handle is live and `out` is
            // valid for `*out_len` bytes.
            unsafe { eng::eng_privkey_algo_name(self.handle.as_ptr(), out.cast(), out_len) }
        })
    }

    /// Starts a signing operation.
    ///
    /// `padding` is empty or `Pure` for Ed25519 and `SHA-256`
    /// for ECDSA.
    pub fn signer(&self, padding: &CStr) -> Result<Signer> {
        let handle = Handle::init("eng_pk_op_sign_create", |out| {
            // SAFETY: FFI call, `out` is valid for writes, the
            // handle is live and `padding` is NUL-terminated.
            unsafe { eng::eng_pk_op_sign_create(out, self.handle.as_ptr(), padding.as_ptr(), 0) }
        })?;
        Ok(Signer {
            handle,
            state: State::Fresh,
        })
    }
}

/// A public verification key.
#[derive(Debug)]
pub struct PublicKey {
    handle: Handle<kind::PubKey>,
}

impl PublicKey {
    /// The algorithm name.
    pub fn algo_name(&self) -> Result<String> {
        query::string("eng_pubkey_algo_name", |out, out_len| {
            // SAFETY: FFI call, the handle is live and `out` is
            // valid for `*out_len` bytes.
            unsafe { eng::eng_pubkey_algo_name(self.handle.as_ptr(), out.cast(), out_len) }
        })
    }

    /// Starts a verification operation. See
    /// [`PrivateKey::signer`] for `padding`.
    pub fn verifier(&self, padding: &CStr) -> Result<Verifier> {
        let handle = Handle::init("eng_pk_op_verify_create", |out| {
            // SAFETY: FFI call, `out` is valid for writes, the
            // handle is live and `padding` is NUL-terminated.
            unsafe {
                eng::eng_pk_op_verify_create(out, self.handle.as_ptr(), padding.as_ptr(), 0)
            }
        })?;
        Ok(Verifier {
            handle,
            state: State::Fresh,
        })
    }
}

/// Signs one message.
#[derive(Debug)]
pub struct Signer {
    handle: Handle<kind::Sign>,
    state: State,
}

impl Signer {
    /// The current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The signature size in bytes.
    pub fn output_length(&self) -> Result<usize> {
        let mut n = 0;
        // SAFETY: FFI call, the handle is live and `n` is valid
        // for writes.
        let code = unsafe { eng::eng_pk_op_sign_output_length(self.handle.as_ptr(), &mut n) };
        status::check("eng_pk_op_sign_output_length", code)?;
        Ok(n)
    }

    /// Absorbs message bytes.
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        self.state
            .require("update", &[State::Fresh, State::Accumulating])?;
        // SAFETY: FFI call, the handle is live and `data` is
        // valid for its length.
        let code =
            unsafe { eng::eng_pk_op_sign_update(self.handle.as_ptr(), data.as_ptr(), data.len()) };
        status::check("eng_pk_op_sign_update", code)?;
        self.state = State::Accumulating;
        Ok(())
    }

    /// Writes the signature into the start of `out` and returns
    /// its length.
    pub fn finish_into(&mut self, rng: &mut Rng, out: &mut [u8]) -> Result<usize> {
        self.state
            .require("finish", &[State::Fresh, State::Accumulating])?;
        let need = self.output_length()?;
        if out.len() < need {
            return Err(BufferTooSmall {
                need,
                have: out.len(),
            }
            .into());
        }
        let mut n = out.len();
        // SAFETY: FFI call, the handle and RNG are live and `out`
        // is valid for `n` bytes.
        let code = unsafe {
            eng::eng_pk_op_sign_finish(self.handle.as_ptr(), rng.as_ptr(), out.as_mut_ptr(), &mut n)
        };
        self.state = State::Finished;
        status::check("eng_pk_op_sign_finish", code)?;
        Ok(n)
    }

    /// Returns the signature.
    pub fn finish(&mut self, rng: &mut Rng) -> Result<Vec<u8>> {
        let mut sig = vec![0u8; self.output_length()?];
        let n = self.finish_into(rng, &mut sig)?;
        sig.truncate(n);
        Ok(sig)
    }
}

/// Verifies one message.
#[derive(Debug)]
pub struct Verifier {
    handle: Handle<kind::Verify>,
    state: State,
}

impl Verifier {
    /// The current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Absorbs message bytes.
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        self.state
            .require("update", &[State::Fresh, State::Accumulating])?;
        // SAFETY: FFI call, the handle is live and `data` is
        // valid for its length.
        let code = unsafe {
            eng::eng_pk_op_verify_update(self.handle.as_ptr(), data.as_ptr(), data.len())
        };
        status::check("eng_pk_op_verify_update", code)?;
        self.state = State::Accumulating;
        Ok(())
    }

    /// Checks `sig` against the absorbed message.
    ///
    /// A signature of the wrong length is an
    /// [`ErrorKind::InvalidEncoding`][crate::ErrorKind] error. The
    /// operation is finished either way.
    pub fn finish(&mut self, sig: &[u8]) -> Result<Validity> {
        self.state
            .require("finish", &[State::Fresh, State::Accumulating])?;
        // SAFETY: FFI call, the handle is live and `sig` is valid
        // for its length.
        let code =
            unsafe { eng::eng_pk_op_verify_finish(self.handle.as_ptr(), sig.as_ptr(), sig.len()) };
        self.state = State::Finished;
        status::verdict("eng_pk_op_verify_finish", code)
    }
}
