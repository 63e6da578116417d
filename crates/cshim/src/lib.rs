//! Bounds-checked adapters over a Botan-style native crypto
//! engine.
//!
//! Hosts that describe memory as `(buffer, offset, length)`
//! triples validate them with [`View`] and [`ViewMut`] before
//! anything reaches the engine. The streaming primitives
//! ([`Hash`], [`Mac`], [`Cipher`], [`Signer`], [`Verifier`])
//! carry an explicit [`State`] that is checked before every
//! call, so out-of-order calls fail with
//! [`ErrorKind::BadState`] without touching engine state.
//!
//! Every engine status code is classified by the translator in
//! [`status`].
//!
//! # Example
//!
//! ```rust
//! # use cshim::{Cipher, Direction};
//! # fn main() -> Result<(), cshim::Error> {
//! let key = [0x42; 32];
//! let nonce = [0x24; 12];
//!
//! let mut enc = Cipher::new(c"ChaCha20Poly1305", Direction::Encrypt)?;
//! enc.set_key(&key)?;
//! enc.start(&nonce)?;
//! let ct = enc.process(b"hello world")?;
//!
//! let mut dec = Cipher::new(c"ChaCha20Poly1305", Direction::Decrypt)?;
//! dec.set_key(&key)?;
//! dec.start(&nonce)?;
//! assert_eq!(dec.process(&ct)?, b"hello world");
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

extern crate alloc;

mod bcrypt;
mod block;
mod cipher;
mod codec;
mod error;
mod handle;
mod hash;
mod kdf;
mod keyspec;
mod mac;
mod mp;
mod pk;
mod query;
mod rng;
mod state;
pub mod status;
mod view;

pub use bcrypt::*;
pub use block::*;
pub use cipher::*;
pub use codec::*;
pub use error::*;
pub use hash::*;
pub use kdf::*;
pub use keyspec::*;
pub use mac::*;
pub use mp::*;
pub use pk::*;
pub use rng::*;
pub use state::*;
pub use status::Validity;
pub use view::*;
