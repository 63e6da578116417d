//! Status codes.
//!
//! The numbering matches Botan's FFI so that a caller's status
//! translation works unchanged against either engine.

use core::ffi::c_int;

/// The operation succeeded.
pub const SUCCESS: c_int = 0;
/// A signature, MAC or password did not verify.
///
/// This is not an error: the inputs were well formed.
pub const INVALID_VERIFIER: c_int = 1;

/// The input was rejected.
pub const ERROR_INVALID_INPUT: c_int = -1;
/// An authentication tag did not match.
pub const ERROR_BAD_MAC: c_int = -2;
/// The output buffer is too small.
pub const ERROR_INSUFFICIENT_BUFFER_SPACE: c_int = -10;
/// Text could not be converted.
pub const ERROR_STRING_CONVERSION_ERROR: c_int = -11;
/// An unexpected failure (a caught panic).
pub const ERROR_EXCEPTION_THROWN: c_int = -20;
/// Allocation failed.
pub const ERROR_OUT_OF_MEMORY: c_int = -21;
/// The operating system reported an error.
pub const ERROR_SYSTEM_ERROR: c_int = -22;
/// An internal error.
pub const ERROR_INTERNAL_ERROR: c_int = -23;
/// An unsupported flag was set.
pub const ERROR_BAD_FLAG: c_int = -30;
/// A required pointer was null.
pub const ERROR_NULL_POINTER: c_int = -31;
/// A parameter was out of range.
pub const ERROR_BAD_PARAMETER: c_int = -32;
/// The object has no key.
pub const ERROR_KEY_NOT_SET: c_int = -33;
/// The key length is not accepted.
pub const ERROR_INVALID_KEY_LENGTH: c_int = -34;
/// The object is not in a state that allows the call.
pub const ERROR_INVALID_OBJECT_STATE: c_int = -35;
/// The algorithm is unknown.
pub const ERROR_NOT_IMPLEMENTED: c_int = -40;
/// The handle is not a live object of the expected type.
pub const ERROR_INVALID_OBJECT: c_int = -50;
/// Catch-all.
pub const ERROR_UNKNOWN_ERROR: c_int = -100;

/// Returns a static description of `rc`.
pub fn describe(rc: c_int) -> &'static str {
    match rc {
        SUCCESS => "OK",
        INVALID_VERIFIER => "Invalid verifier",
        ERROR_INVALID_INPUT => "Invalid input",
        ERROR_BAD_MAC => "Invalid authentication code",
        ERROR_INSUFFICIENT_BUFFER_SPACE => "Insufficient buffer space",
        ERROR_STRING_CONVERSION_ERROR => "String conversion error",
        ERROR_EXCEPTION_THROWN => "Exception thrown",
        ERROR_OUT_OF_MEMORY => "Out of memory",
        ERROR_SYSTEM_ERROR => "System error",
        ERROR_INTERNAL_ERROR => "Internal error",
        ERROR_BAD_FLAG => "Bad flag",
        ERROR_NULL_POINTER => "Null pointer argument",
        ERROR_BAD_PARAMETER => "Bad parameter",
        ERROR_KEY_NOT_SET => "Key not set on object",
        ERROR_INVALID_KEY_LENGTH => "Invalid key length",
        ERROR_INVALID_OBJECT_STATE => "Invalid object state",
        ERROR_NOT_IMPLEMENTED => "Not implemented",
        ERROR_INVALID_OBJECT => "Invalid object handle",
        _ => "Unknown error",
    }
}

/// Why an engine call failed.
#[derive(Debug, thiserror::Error)]
pub(crate) enum Failure {
    #[error("did not verify")]
    InvalidVerifier,
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("authentication tag mismatch")]
    BadMac,
    #[error("output buffer too small")]
    InsufficientBufferSpace,
    #[error("string conversion failed")]
    StringConversion,
    #[error("system error: {0}")]
    System(&'static str),
    #[error("internal error: {0}")]
    Internal(&'static str),
    #[error("bad flag {0:#x}")]
    BadFlag(u32),
    #[error("null pointer")]
    NullPointer,
    #[error("bad parameter: {0}")]
    BadParameter(&'static str),
    #[error("key not set")]
    KeyNotSet,
    #[error("invalid key length {0}")]
    InvalidKeyLength(usize),
    #[error("invalid object state: {0}")]
    InvalidObjectState(&'static str),
    #[error("unknown algorithm `{0}`")]
    NotImplemented(String),
    #[error("invalid object")]
    InvalidObject,
}

impl Failure {
    /// Returns the status code reported for the failure.
    pub(crate) fn code(&self) -> c_int {
        match self {
            Self::InvalidVerifier => INVALID_VERIFIER,
            Self::InvalidInput(_) => ERROR_INVALID_INPUT,
            Self::BadMac => ERROR_BAD_MAC,
            Self::InsufficientBufferSpace => ERROR_INSUFFICIENT_BUFFER_SPACE,
            Self::StringConversion => ERROR_STRING_CONVERSION_ERROR,
            Self::System(_) => ERROR_SYSTEM_ERROR,
            Self::Internal(_) => ERROR_INTERNAL_ERROR,
            Self::BadFlag(_) => ERROR_BAD_FLAG,
            Self::NullPointer => ERROR_NULL_POINTER,
            Self::BadParameter(_) => ERROR_BAD_PARAMETER,
            Self::KeyNotSet => ERROR_KEY_NOT_SET,
            Self::InvalidKeyLength(_) => ERROR_INVALID_KEY_LENGTH,
            Self::InvalidObjectState(_) => ERROR_INVALID_OBJECT_STATE,
            Self::NotImplemented(_) => ERROR_NOT_IMPLEMENTED,
            Self::InvalidObject => ERROR_INVALID_OBJECT,
        }
    }

    pub(crate) fn unknown(name: &str) -> Self {
        Self::NotImplemented(name.to_owned())
    }
}
