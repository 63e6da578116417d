//! A software cryptographic engine with a flat C ABI.
//!
//! Every operation is an `extern "C"` function that takes opaque
//! object handles, `(pointer, length)` pairs and out-parameters,
//! and returns a signed status code from [`rc`]. The calling
//! convention (and the numbering of the status codes) follows
//! Botan's FFI so that callers written against a native library
//! can be exercised without one.
//!
//! # Conventions
//!
//! - `0` is success. Positive [`rc::INVALID_VERIFIER`] means "did
//!   not verify". Negative values are errors.
//! - A `(pointer, length)` pair with a zero length never
//!   dereferences the pointer.
//! - Variable-length output uses a length query: the caller passes
//!   the capacity in `*out_len`, and the engine stores the number
//!   of bytes it wrote, or the number it needed along with
//!   [`rc::ERROR_INSUFFICIENT_BUFFER_SPACE`].
//! - Objects are created by `eng_*_init`/`eng_*_create` and must be
//!   released with the matching `eng_*_destroy`. Handles are not
//!   safe to use from multiple threads at once.
//! - No panic ever unwinds across the ABI; it is reported as
//!   [`rc::ERROR_EXCEPTION_THROWN`].
//!
//! # Algorithms
//!
//! | Family | Names |
//! |---|---|
//! | Hash | `SHA-256`, `SHA-384`, `SHA-512`, `SHA-512-256` |
//! | MAC | `HMAC(SHA-256)`, `HMAC(SHA-384)`, `HMAC(SHA-512)` |
//! | Block cipher | `AES-128`, `AES-192`, `AES-256` |
//! | Cipher mode | `ChaCha20Poly1305`, `AES-128/GCM`, `AES-256/GCM`, `AES-128/CBC/PKCS7`, `AES-256/CBC/PKCS7` |
//! | KDF | `HKDF(SHA-256)`, `HKDF(SHA-384)`, `HKDF(SHA-512)` |
//! | Password hash | `PBKDF2(SHA-256)`, `PBKDF2(SHA-512)`, `Argon2d`, `Argon2i`, `Argon2id` |
//! | Signature | `Ed25519`, `ECDSA` (`secp256r1`) |
//! | RNG | `system`, `user` |

#![allow(non_camel_case_types)]
#![deny(
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::unwrap_used,
    missing_docs
)]

mod block;
mod cipher;
mod codec;
mod hash;
mod kdf;
mod mac;
mod mp;
mod names;
mod obj;
mod pk;
mod pwdhash;
pub mod rc;
mod rng;

pub use block::*;
pub use cipher::*;
pub use codec::*;
pub use hash::*;
pub use kdf::*;
pub use mac::*;
pub use mp::*;
pub use pk::*;
pub use pwdhash::*;
pub use rng::*;
