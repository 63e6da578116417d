use alloc::boxed::Box;
use core::{error, ffi::c_int, fmt};

use buggy::Bug;
use cshim_engine::rc;

use crate::{state::BadState, view::OutOfRange};

/// The result type used by this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// An error returned by an adapter.
#[derive(Debug, thiserror::Error)]
#[error("{err}")]
pub struct Error {
    kind: ErrorKind,
    #[source]
    err: Box<dyn error::Error + Send + Sync + 'static>,
}

impl Error {
    pub(crate) fn new<E>(kind: ErrorKind, err: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        Self {
            kind,
            err: Box::new(err),
        }
    }

    /// Attempts to downcast the error into `T`.
    #[inline]
    pub fn downcast_ref<T: error::Error + 'static>(&self) -> Option<&T> {
        self.err.downcast_ref::<T>()
    }

    /// Describes the kind of error.
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<Bug> for Error {
    fn from(err: Bug) -> Self {
        Self::new(ErrorKind::Bug, err)
    }
}

impl From<OutOfRange> for Error {
    fn from(err: OutOfRange) -> Self {
        Self::new(ErrorKind::OutOfRange, err)
    }
}

impl From<InvalidEncoding> for Error {
    fn from(err: InvalidEncoding) -> Self {
        Self::new(ErrorKind::InvalidEncoding, err)
    }
}

impl From<BadState> for Error {
    fn from(err: BadState) -> Self {
        Self::new(ErrorKind::BadState, err)
    }
}

impl From<BufferTooSmall> for Error {
    fn from(err: BufferTooSmall) -> Self {
        Self::new(ErrorKind::BufferTooSmall, err)
    }
}

impl From<Granularity> for Error {
    fn from(err: Granularity) -> Self {
        Self::new(ErrorKind::BufferTooSmall, err)
    }
}

/// Describes [`Error`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum ErrorKind {
    /// An `(offset, length)` pair does not fit its buffer.
    ///
    /// [`Error`] can be downcast to [`OutOfRange`].
    OutOfRange,
    /// Malformed hex, decimal or bcrypt text, or a malformed
    /// signature.
    InvalidEncoding,
    /// The engine rejected the key size.
    InvalidKeyLength,
    /// The engine rejected the nonce size.
    InvalidNonceLength,
    /// A call was issued out of order.
    ///
    /// [`Error`] can be downcast to [`BadState`] when the order
    /// was checked locally.
    BadState,
    /// An output buffer is too small, or an input violates the
    /// update granularity.
    BufferTooSmall,
    /// The engine rejected the operation.
    CryptoFailure,
    /// An authentication tag did not match.
    AuthenticationFailed,
    /// The engine does not know the algorithm name.
    UnknownAlgorithm,
    /// Key derivation or password hashing failed.
    DerivationFailed,
    /// The engine returned a code this crate does not recognize.
    Unknown,
    /// An internal invariant was violated.
    Bug,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OutOfRange => "offset or length out of range",
            Self::InvalidEncoding => "invalid encoding",
            Self::InvalidKeyLength => "invalid key length",
            Self::InvalidNonceLength => "invalid nonce length",
            Self::BadState => "call made in the wrong state",
            Self::BufferTooSmall => "buffer too small",
            Self::CryptoFailure => "cryptographic failure",
            Self::AuthenticationFailed => "authentication failed",
            Self::UnknownAlgorithm => "unknown algorithm",
            Self::DerivationFailed => "derivation failed",
            Self::Unknown => "unknown engine error",
            Self::Bug => "internal bug",
        };
        f.write_str(s)
    }
}

/// Text or a signature was malformed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid encoding: {0}")]
pub struct InvalidEncoding(pub(crate) &'static str);

/// An output buffer cannot hold the result.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("buffer too small: need {need} bytes, have {have}")]
pub struct BufferTooSmall {
    /// The number of bytes required.
    pub need: usize,
    /// The number of bytes provided.
    pub have: usize,
}

/// A cipher update was not a non-zero multiple of the update
/// granularity.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("input of {len} bytes is not a non-zero multiple of {granularity}")]
pub struct Granularity {
    /// The input length.
    pub len: usize,
    /// The cipher's update granularity.
    pub granularity: usize,
}

/// The engine returned a failure code.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EngineError {
    op: &'static str,
    code: c_int,
}

impl EngineError {
    pub(crate) const fn new(op: &'static str, code: c_int) -> Self {
        Self { op, code }
    }

    /// The raw engine status code.
    pub const fn code(&self) -> c_int {
        self.code
    }

    /// The engine call that failed.
    pub const fn op(&self) -> &'static str {
        self.op
    }
}

impl error::Error for EngineError {}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` failed: {} ({})",
            self.op,
            rc::describe(self.code),
            self.code
        )
    }
}
