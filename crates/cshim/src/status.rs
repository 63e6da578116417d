//! Classifies engine status codes.
//!
//! `0` is success. Every other code is looked up in the engine's
//! code space (Botan FFI numbering); codes it does not define are
//! [`ErrorKind::Unknown`]. A few call sites refine the generic
//! classification, see [`Context`].

use core::ffi::c_int;

use cshim_engine::rc;
use tracing::debug;

use crate::error::{EngineError, Error, ErrorKind};

/// Where an engine code was returned.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Context {
    General,
    /// Cipher `start`. A bad parameter is the nonce.
    Start,
    /// KDFs and password hashes.
    Derive,
    /// Signature and bcrypt checks. Bad input is malformed
    /// input.
    Verdict,
}

/// The outcome of a check that can legitimately fail.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum Validity {
    /// The password or signature matched.
    Valid,
    /// It did not.
    Invalid,
}

impl Validity {
    /// Reports whether this is [`Validity::Valid`].
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Classifies `code` as returned by an ordinary engine call.
///
/// Returns `None` for success.
pub fn classify(code: c_int) -> Option<ErrorKind> {
    classify_in(code, Context::General)
}

pub(crate) fn classify_in(code: c_int, ctx: Context) -> Option<ErrorKind> {
    use ErrorKind as K;

    let kind = match (code, ctx) {
        (rc::SUCCESS, _) => return None,
        (rc::ERROR_NOT_IMPLEMENTED, _) => K::UnknownAlgorithm,
        (rc::ERROR_BAD_PARAMETER, Context::Start) => K::InvalidNonceLength,
        (rc::ERROR_INVALID_INPUT | rc::ERROR_BAD_PARAMETER, Context::Verdict) => K::InvalidEncoding,
        (
            rc::ERROR_INVALID_INPUT
            | rc::ERROR_EXCEPTION_THROWN
            | rc::ERROR_OUT_OF_MEMORY
            | rc::ERROR_SYSTEM_ERROR
            | rc::ERROR_INTERNAL_ERROR
            | rc::ERROR_BAD_FLAG
            | rc::ERROR_NULL_POINTER
            | rc::ERROR_BAD_PARAMETER
            | rc::ERROR_INVALID_OBJECT,
            Context::Derive,
        ) => K::DerivationFailed,
        (rc::INVALID_VERIFIER | rc::ERROR_BAD_MAC, _) => K::AuthenticationFailed,
        (rc::ERROR_INSUFFICIENT_BUFFER_SPACE, _) => K::BufferTooSmall,
        (rc::ERROR_STRING_CONVERSION_ERROR, _) => K::InvalidEncoding,
        (rc::ERROR_KEY_NOT_SET | rc::ERROR_INVALID_OBJECT_STATE, _) => K::BadState,
        (rc::ERROR_INVALID_KEY_LENGTH, _) => K::InvalidKeyLength,
        (
            rc::ERROR_INVALID_INPUT
            | rc::ERROR_EXCEPTION_THROWN
            | rc::ERROR_OUT_OF_MEMORY
            | rc::ERROR_SYSTEM_ERROR
            | rc::ERROR_INTERNAL_ERROR
            | rc::ERROR_BAD_FLAG
            | rc::ERROR_NULL_POINTER
            | rc::ERROR_BAD_PARAMETER
            | rc::ERROR_INVALID_OBJECT,
            _,
        ) => K::CryptoFailure,
        _ => K::Unknown,
    };
    Some(kind)
}

fn fail(op: &'static str, kind: ErrorKind, code: c_int) -> Error {
    debug!(op, code, %kind, "engine call failed");
    Error::new(kind, EngineError::new(op, code))
}

/// Converts a status code into a `Result`.
pub(crate) fn check(op: &'static str, code: c_int) -> Result<(), Error> {
    check_in(op, Context::General, code)
}

/// Like [`check`], but refined for `ctx`.
pub(crate) fn check_in(op: &'static str, ctx: Context, code: c_int) -> Result<(), Error> {
    match classify_in(code, ctx) {
        None => Ok(()),
        Some(kind) => Err(fail(op, kind, code)),
    }
}

/// Converts the code of a check into a [`Validity`].
pub(crate) fn verdict(op: &'static str, code: c_int) -> Result<Validity, Error> {
    match code {
        rc::SUCCESS => Ok(Validity::Valid),
        rc::INVALID_VERIFIER => Ok(Validity::Invalid),
        _ => {
            let kind = classify_in(code, Context::Verdict).unwrap_or(ErrorKind::Unknown);
            Err(fail(op, kind, code))
        }
    }
}

/// Converts the code of a call that returns a non-negative
/// count on success.
pub(crate) fn count(op: &'static str, code: c_int) -> Result<usize, Error> {
    match usize::try_from(code) {
        Ok(n) => Ok(n),
        Err(_) => check(op, code).map(|()| 0),
    }
}

/// Converts the code of a call that returns 1 or 0 on success.
pub(crate) fn flag(op: &'static str, code: c_int) -> Result<bool, Error> {
    match code {
        0 => Ok(false),
        1 => Ok(true),
        _ => check(op, code).map(|()| false),
    }
}
