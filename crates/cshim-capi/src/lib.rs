//! A flat C API over [`cshim`].
//!
//! Every caller buffer is passed as `(pointer, capacity, offset,
//! length)` and checked with [`cshim::View`] before it is used.
//! Functions return a [`CshimStatus`] as a `c_int`, or a signed
//! count where one is produced (negative values are statuses).
//!
//! Handles are opaque pointers created by `cshim_*_init` (or
//! `cshim_privkey_generate`) and released by `cshim_*_destroy`.
//! A handle must not be used from two threads at once.
//!
//! Input and output buffers of one call must not overlap.
//!
//! `include/cshim.h` declares this API.

#![warn(missing_docs)]

mod args;
mod block;
mod cipher;
mod codec;
mod error;
mod hash;
mod kdf;
mod mp;
mod pk;
mod rng;

pub use block::*;
pub use cipher::*;
pub use codec::*;
pub use error::{CshimStatus, ErrorCode};
pub use hash::*;
pub use kdf::*;
pub use mp::*;
pub use pk::*;
pub use rng::*;
