//! Streaming hash functions.

use alloc::{string::String, vec, vec::Vec};
use core::ffi::CStr;

use cshim_engine as eng;
use tracing::instrument;

use crate::{
    error::{BufferTooSmall, Result},
    handle::{Handle, kind},
    query,
    state::State,
    status,
};

/// A streaming hash.
///
/// `update` may be called any number of times. After
/// [`finish_into`][Self::finish_into] the hash must be
/// [`clear`][Self::clear]ed before it is reused.
#[derive(Debug)]
pub struct Hash {
    handle: Handle<kind::Hash>,
    state: State,
}

impl Hash {
    /// Creates a hash, e.g. `SHA-256`.
    #[instrument(skip_all, fields(?name))]
    pub fn new(name: &CStr) -> Result<Self> {
        let handle = Handle::init("eng_hash_init", |out| {
            // SAFETY: FFI call, `out` is valid for writes and
            // `name` is NUL-terminated.
            unsafe { eng::eng_hash_init(out, name.as_ptr(), 0) }
        })?;
        Ok(Self {
            handle,
            state: State::Fresh,
        })
    }

    /// The current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The digest size in bytes.
    pub fn output_length(&self) -> Result<usize> {
        let mut n = 0;
        // SAFETY: FFI call, the handle is live and `n` is valid
        // for writes.
        let code = unsafe { eng::eng_hash_output_length(self.handle.as_ptr(), &mut n) };
        status::check("eng_hash_output_length", code)?;
        Ok(n)
    }

    /// The algorithm name.
    pub fn name(&self) -> Result<String> {
        query::string("eng_hash_name", |out, out_len| {
            // SAFETY: FFI call, the handle is live and `out` is
            // valid for `*out_len` bytes.
            unsafe { eng::eng_hash_name(self.handle.as_ptr(), out.cast(), out_len) }
        })
    }

    /// Absorbs `data`.
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        self.state
            .require("update", &[State::Fresh, State::Accumulating])?;
        // SAFETY: FFI call, the handle is live and `data` is
        // valid for its length.
        let code = unsafe { eng::eng_hash_update(self.handle.as_ptr(), data.as_ptr(), data.len()) };
        status::check("eng_hash_update", code)?;
        self.state = State::Accumulating;
        Ok(())
    }

    /// Writes the digest into the start of `out` and returns its
    /// length.
    pub fn finish_into(&mut self, out: &mut [u8]) -> Result<usize> {
        self.state
            .require("finish", &[State::Fresh, State::Accumulating])?;
        let n = self.output_length()?;
        let have = out.len();
        let dst = out.get_mut(..n).ok_or(BufferTooSmall { need: n, have })?;
        // SAFETY: FFI call, the handle is live and `dst` holds
        // `output_length` bytes.
        let code = unsafe { eng::eng_hash_final(self.handle.as_ptr(), dst.as_mut_ptr()) };
        status::check("eng_hash_final", code)?;
        self.state = State::Finished;
        Ok(n)
    }

    /// Returns the digest.
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.output_length()?];
        self.finish_into(&mut out)?;
        Ok(out)
    }

    /// Discards absorbed data.
    pub fn clear(&mut self) -> Result<()> {
        // SAFETY: FFI call, the handle is live.
        let code = unsafe { eng::eng_hash_clear(self.handle.as_ptr()) };
        status::check("eng_hash_clear", code)?;
        self.state = State::Fresh;
        Ok(())
    }
}
