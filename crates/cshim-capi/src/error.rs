use core::ffi::{CStr, c_int};

use cshim::ErrorKind;

/// A status code returned by the C API.
///
/// # Example
///
/// ```rust
/// use cshim_capi::{CshimStatus, ErrorCode};
///
/// assert_eq!(CshimStatus::try_from_repr(-6), Some(CshimStatus::BufferTooSmall));
/// assert_eq!(CshimStatus::try_from_repr(42), None);
/// assert_eq!(CshimStatus::SUCCESS.to_cstr(), c"success");
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(i32)]
pub enum CshimStatus {
    /// The call succeeded.
    Success = 0,
    /// A verification ran and the input is not valid.
    Invalid = 1,
    /// An `(offset, length)` pair does not fit its buffer.
    OutOfRange = -1,
    /// Malformed text or signature.
    InvalidEncoding = -2,
    /// The key size was rejected.
    InvalidKeyLength = -3,
    /// The nonce size was rejected.
    InvalidNonceLength = -4,
    /// A call was made out of order.
    BadState = -5,
    /// An output buffer is too small.
    BufferTooSmall = -6,
    /// The engine rejected the operation.
    CryptoFailure = -7,
    /// An authentication tag did not match.
    AuthenticationFailed = -8,
    /// The algorithm name is not known.
    UnknownAlgorithm = -9,
    /// Key derivation or password hashing failed.
    DerivationFailed = -10,
    /// A null pointer or an unknown flag was passed.
    InvalidArgument = -11,
    /// An internal invariant was violated.
    Bug = -98,
    /// Anything else.
    Unknown = -99,
}

/// An error code returned by the C API.
pub trait ErrorCode: Sized {
    /// The value returned on success.
    const SUCCESS: Self;

    /// The integer repr.
    type Repr: Sized;

    /// Attempts to create the code from its repr.
    fn try_from_repr(repr: Self::Repr) -> Option<Self>;

    /// Converts the code to a static [`CStr`].
    fn to_cstr(self) -> &'static CStr;
}

impl ErrorCode for CshimStatus {
    const SUCCESS: Self = Self::Success;

    type Repr = c_int;

    fn try_from_repr(repr: c_int) -> Option<Self> {
        let code = match repr {
            0 => Self::Success,
            1 => Self::Invalid,
            -1 => Self::OutOfRange,
            -2 => Self::InvalidEncoding,
            -3 => Self::InvalidKeyLength,
            -4 => Self::InvalidNonceLength,
            -5 => Self::BadState,
            -6 => Self::BufferTooSmall,
            -7 => Self::CryptoFailure,
            -8 => Self::AuthenticationFailed,
            -9 => Self::UnknownAlgorithm,
            -10 => Self::DerivationFailed,
            -11 => Self::InvalidArgument,
            -98 => Self::Bug,
            -99 => Self::Unknown,
            _ => return None,
        };
        Some(code)
    }

    fn to_cstr(self) -> &'static CStr {
        match self {
            Self::Success => c"success",
            Self::Invalid => c"invalid",
            Self::OutOfRange => c"offset or length out of range",
            Self::InvalidEncoding => c"invalid encoding",
            Self::InvalidKeyLength => c"invalid key length",
            Self::InvalidNonceLength => c"invalid nonce length",
            Self::BadState => c"call made in the wrong state",
            Self::BufferTooSmall => c"buffer too small",
            Self::CryptoFailure => c"cryptographic failure",
            Self::AuthenticationFailed => c"authentication failed",
            Self::UnknownAlgorithm => c"unknown algorithm",
            Self::DerivationFailed => c"derivation failed",
            Self::InvalidArgument => c"invalid argument",
            Self::Bug => c"internal bug",
            Self::Unknown => c"unknown error",
        }
    }
}

impl CshimStatus {
    /// Returns the `c_int` repr.
    pub const fn code(self) -> c_int {
        self as c_int
    }
}

impl From<ErrorKind> for CshimStatus {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::OutOfRange => Self::OutOfRange,
            ErrorKind::InvalidEncoding => Self::InvalidEncoding,
            ErrorKind::InvalidKeyLength => Self::InvalidKeyLength,
            ErrorKind::InvalidNonceLength => Self::InvalidNonceLength,
            ErrorKind::BadState => Self::BadState,
            ErrorKind::BufferTooSmall => Self::BufferTooSmall,
            ErrorKind::CryptoFailure => Self::CryptoFailure,
            ErrorKind::AuthenticationFailed => Self::AuthenticationFailed,
            ErrorKind::UnknownAlgorithm => Self::UnknownAlgorithm,
            ErrorKind::DerivationFailed => Self::DerivationFailed,
            ErrorKind::Bug => Self::Bug,
            ErrorKind::Unknown => Self::Unknown,
        }
    }
}

/// A pointer or flag argument is invalid.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid argument `{arg}`: {reason}")]
pub(crate) struct InvalidArg {
    arg: &'static str,
    reason: &'static str,
}

impl InvalidArg {
    pub(crate) const fn new(arg: &'static str, reason: &'static str) -> Self {
        Self { arg, reason }
    }
}

/// The error type of the C API's internals.
#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error(transparent)]
    Cshim(#[from] cshim::Error),
    #[error(transparent)]
    InvalidArg(#[from] InvalidArg),
}

impl From<cshim::OutOfRange> for Error {
    fn from(err: cshim::OutOfRange) -> Self {
        Self::Cshim(err.into())
    }
}

impl From<cshim::BufferTooSmall> for Error {
    fn from(err: cshim::BufferTooSmall) -> Self {
        Self::Cshim(err.into())
    }
}

impl From<buggy::Bug> for Error {
    fn from(err: buggy::Bug) -> Self {
        Self::Cshim(err.into())
    }
}

impl From<&Error> for CshimStatus {
    fn from(err: &Error) -> Self {
        match err {
            Error::Cshim(err) => err.kind().into(),
            Error::InvalidArg(_) => Self::InvalidArgument,
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    const ALL: &[CshimStatus] = &[
        CshimStatus::Success,
        CshimStatus::Invalid,
        CshimStatus::OutOfRange,
        CshimStatus::InvalidEncoding,
        CshimStatus::InvalidKeyLength,
        CshimStatus::InvalidNonceLength,
        CshimStatus::BadState,
        CshimStatus::BufferTooSmall,
        CshimStatus::CryptoFailure,
        CshimStatus::AuthenticationFailed,
        CshimStatus::UnknownAlgorithm,
        CshimStatus::DerivationFailed,
        CshimStatus::InvalidArgument,
        CshimStatus::Bug,
        CshimStatus::Unknown,
    ];

    #[test]
    fn test_repr_round_trip() {
        for &code in ALL {
            assert_eq!(CshimStatus::try_from_repr(code.code()), Some(code));
            assert!(!code.to_cstr().is_empty());
        }
        assert_eq!(CshimStatus::try_from_repr(2), None);
        assert_eq!(CshimStatus::try_from_repr(-12), None);
    }

    #[test]
    fn test_only_success_and_invalid_are_non_negative() {
        for &code in ALL {
            let ok = matches!(code, CshimStatus::Success | CshimStatus::Invalid);
            assert_eq!(code.code() >= 0, ok, "{code:?}");
        }
    }
}
