//! Streaming cipher modes.

use alloc::{string::String, vec, vec::Vec};
use core::ffi::CStr;

use buggy::bug;
use cshim_engine as eng;
use tracing::{debug, error, instrument};

use crate::{
    error::{BufferTooSmall, Granularity, Result},
    handle::{Handle, kind},
    keyspec::KeySpec,
    query,
    state::State,
    status::{self, Context},
};

/// Whether a [`Cipher`] encrypts or decrypts.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    /// Encrypt.
    Encrypt,
    /// Decrypt.
    Decrypt,
}

impl Direction {
    fn flags(self) -> u32 {
        match self {
            Self::Encrypt => eng::ENG_CIPHER_INIT_FLAG_ENCRYPT,
            Self::Decrypt => eng::ENG_CIPHER_INIT_FLAG_DECRYPT,
        }
    }
}

/// A streaming cipher mode (AEAD or CBC).
///
/// The call sequence is `set_key`, optionally
/// `set_associated_data`, `start`, any number of `update`s and
/// one `finish`. [`reset`][Self::reset] returns to the key-bound
/// state for the next message.
///
/// [`process`][Self::process] runs `update` and `finish` with
/// correctly sized buffers.
#[derive(Debug)]
pub struct Cipher {
    handle: Handle<kind::Cipher>,
    state: State,
    dir: Direction,
}

macro_rules! getter {
    ($(#[$meta:meta])* $name:ident => $func:ident) => {
        $(#[$meta])*
        pub fn $name(&self) -> Result<usize> {
            let mut n = 0;
            // SAFETY: FFI call, the handle is live and `n` is
            // valid for writes.
            let code = unsafe { eng::$func(self.handle.as_ptr(), &mut n) };
            status::check(stringify!($func), code)?;
            Ok(n)
        }
    };
}

impl Cipher {
    /// Creates a cipher mode, e.g. `ChaCha20Poly1305` or
    /// `AES-256/GCM`.
    #[instrument(skip_all, fields(?name, ?dir))]
    pub fn new(name: &CStr, dir: Direction) -> Result<Self> {
        let handle = Handle::init("eng_cipher_init", |out| {
            // SAFETY: FFI call, `out` is valid for writes and
            // `name` is NUL-terminated.
            unsafe { eng::eng_cipher_init(out, name.as_ptr(), dir.flags()) }
        })?;
        Ok(Self {
            handle,
            state: State::Fresh,
            dir,
        })
    }

    /// The current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The direction given to [`new`][Self::new].
    pub fn direction(&self) -> Direction {
        self.dir
    }

    /// The algorithm name.
    pub fn name(&self) -> Result<String> {
        query::string("eng_cipher_name", |out, out_len| {
            // SAFETY: FFI call, the handle is live and `out` is
            // valid for `*out_len` bytes.
            unsafe { eng::eng_cipher_name(self.handle.as_ptr(), out.cast(), out_len) }
        })
    }

    /// The accepted key lengths.
    pub fn keyspec(&self) -> Result<KeySpec> {
        let (mut min, mut max, mut modulo) = (0, 0, 0);
        // SAFETY: FFI call, the handle is live and the
        // out-parameters are valid for writes.
        let code = unsafe {
            eng::eng_cipher_get_keyspec(self.handle.as_ptr(), &mut min, &mut max, &mut modulo)
        };
        status::check("eng_cipher_get_keyspec", code)?;
        Ok(KeySpec { min, max, modulo })
    }

    getter! {
        /// The tag length, or 0 for modes without one.
        tag_length => eng_cipher_get_tag_length
    }

    getter! {
        /// The nonce length [`start`][Self::start] expects by
        /// default.
        default_nonce_length => eng_cipher_get_default_nonce_length
    }

    getter! {
        /// [`update`][Self::update] input must be a non-zero
        /// multiple of this.
        update_granularity => eng_cipher_get_update_granularity
    }

    getter! {
        /// A preferred `update` size. It is a multiple of
        /// [`update_granularity`][Self::update_granularity].
        ideal_update_granularity => eng_cipher_get_ideal_update_granularity
    }

    getter! {
        /// The least input [`finish`][Self::finish] accepts.
        minimum_final_size => eng_cipher_get_minimum_final_size
    }

    /// Reports whether the mode accepts a nonce of `len` bytes.
    pub fn valid_nonce_length(&self, len: usize) -> Result<bool> {
        // SAFETY: FFI call, the handle is live.
        let code = unsafe { eng::eng_cipher_valid_nonce_length(self.handle.as_ptr(), len) };
        status::flag("eng_cipher_valid_nonce_length", code)
    }

    /// The largest output [`finish`][Self::finish] can produce
    /// for `input_len` bytes of input.
    pub fn output_length(&self, input_len: usize) -> Result<usize> {
        let mut n = 0;
        // SAFETY: FFI call, the handle is live and `n` is valid
        // for writes.
        let code =
            unsafe { eng::eng_cipher_output_length(self.handle.as_ptr(), input_len, &mut n) };
        status::check("eng_cipher_output_length", code)?;
        Ok(n)
    }

    /// Binds `key`. Any message in progress is abandoned.
    pub fn set_key(&mut self, key: &[u8]) -> Result<()> {
        // SAFETY: FFI call, the handle is live and `key` is valid
        // for its length.
        let code =
            unsafe { eng::eng_cipher_set_key(self.handle.as_ptr(), key.as_ptr(), key.len()) };
        status::check("eng_cipher_set_key", code)?;
        self.state = State::KeyBound;
        Ok(())
    }

    /// Binds associated data for the next message. AEAD modes
    /// only.
    pub fn set_associated_data(&mut self, ad: &[u8]) -> Result<()> {
        self.state
            .require("set_associated_data", &[State::KeyBound])?;
        // SAFETY: FFI call, the handle is live and `ad` is valid
        // for its length.
        let code = unsafe {
            eng::eng_cipher_set_associated_data(self.handle.as_ptr(), ad.as_ptr(), ad.len())
        };
        status::check("eng_cipher_set_associated_data", code)
    }

    /// Binds `nonce` and starts a message.
    #[instrument(skip_all, fields(nonce_len = nonce.len()))]
    pub fn start(&mut self, nonce: &[u8]) -> Result<()> {
        self.state.require("start", &[State::KeyBound])?;
        // SAFETY: FFI call, the handle is live and `nonce` is
        // valid for its length.
        let code =
            unsafe { eng::eng_cipher_start(self.handle.as_ptr(), nonce.as_ptr(), nonce.len()) };
        status::check_in("eng_cipher_start", Context::Start, code)?;
        self.state = State::Started;
        Ok(())
    }

    /// Processes `input` into the start of `out`.
    ///
    /// `input` must be a non-zero multiple of
    /// [`update_granularity`][Self::update_granularity] and `out`
    /// must be at least as long. Returns the number of bytes
    /// written, which is always `input.len()`.
    pub fn update(&mut self, out: &mut [u8], input: &[u8]) -> Result<usize> {
        self.state
            .require("update", &[State::Started, State::Accumulating])?;
        let granularity = self.update_granularity()?;
        if input.is_empty() || input.len().checked_rem(granularity) != Some(0) {
            return Err(Granularity {
                len: input.len(),
                granularity,
            }
            .into());
        }
        let have = out.len();
        let dst = out.get_mut(..input.len()).ok_or(BufferTooSmall {
            need: input.len(),
            have,
        })?;

        let mut written = 0;
        let mut consumed = 0;
        // SAFETY: FFI call, the handle is live, `dst` and `input`
        // are valid for `input.len()` bytes and the counters are
        // valid for writes.
        let code = unsafe {
            eng::eng_cipher_update(
                self.handle.as_ptr(),
                0,
                dst.as_mut_ptr(),
                dst.len(),
                &mut written,
                input.as_ptr(),
                input.len(),
                &mut consumed,
            )
        };
        status::check("eng_cipher_update", code)?;
        if consumed != written {
            error!(consumed, written, "cipher update consumed != written");
            bug!("cipher update consumed a different amount than it wrote");
        }
        if consumed != input.len() {
            error!(consumed, len = input.len(), "cipher update left input unconsumed");
            bug!("cipher update did not consume a granular input");
        }
        self.state = State::Accumulating;
        Ok(written)
    }

    /// Processes the final `input` (which may be empty) into the
    /// start of `out` and ends the message.
    ///
    /// `out` must hold at least
    /// [`output_length(input.len())`][Self::output_length] bytes.
    /// Returns the number of bytes written, which may be less.
    /// A decryption whose tag does not match fails with
    /// [`ErrorKind::AuthenticationFailed`][crate::ErrorKind] and
    /// `out` must not be used.
    #[instrument(skip_all, fields(input_len = input.len()))]
    pub fn finish(&mut self, out: &mut [u8], input: &[u8]) -> Result<usize> {
        self.state
            .require("finish", &[State::Started, State::Accumulating])?;
        let need = self.output_length(input.len())?;
        if out.len() < need {
            return Err(BufferTooSmall {
                need,
                have: out.len(),
            }
            .into());
        }

        let mut written = 0;
        let mut consumed = 0;
        // SAFETY: FFI call, the handle is live, `out` and `input`
        // are valid for their lengths and the counters are valid
        // for writes.
        let code = unsafe {
            eng::eng_cipher_update(
                self.handle.as_ptr(),
                eng::ENG_CIPHER_UPDATE_FLAG_FINAL,
                out.as_mut_ptr(),
                out.len(),
                &mut written,
                input.as_ptr(),
                input.len(),
                &mut consumed,
            )
        };
        // The message is over whether or not it authenticated.
        self.state = State::Finished;
        status::check("eng_cipher_update", code)?;
        check_finish(input.len(), consumed, written, need)?;
        debug!(written, need, "message finished");
        Ok(written)
    }

    /// Encrypts or decrypts all of `input` as the rest of the
    /// current message and returns the output.
    pub fn process(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.state
            .require("process", &[State::Started, State::Accumulating])?;
        let granularity = self.update_granularity()?;
        let min_final = self.minimum_final_size()?;

        // Everything but the final call's share, in whole
        // granules.
        let body = input.len().saturating_sub(min_final);
        let body = body.saturating_sub(body.checked_rem(granularity).unwrap_or(0));
        let (head, tail) = input.split_at(body);
        let tail_need = self.output_length(tail.len())?;

        let mut out = vec![0u8; body.saturating_add(tail_need)];
        let (head_out, tail_out) = out.split_at_mut(body);
        if !head.is_empty() {
            self.update(head_out, head)?;
        }
        let n = self.finish(tail_out, tail)?;
        out.truncate(body.saturating_add(n));
        Ok(out)
    }

    /// Abandons the current message. The key is kept.
    pub fn reset(&mut self) -> Result<()> {
        // SAFETY: FFI call, the handle is live.
        let code = unsafe { eng::eng_cipher_reset(self.handle.as_ptr()) };
        status::check("eng_cipher_reset", code)?;
        if self.state != State::Fresh {
            self.state = State::KeyBound;
        }
        Ok(())
    }

    /// Removes the key and abandons the current message.
    pub fn clear(&mut self) -> Result<()> {
        // SAFETY: FFI call, the handle is live.
        let code = unsafe { eng::eng_cipher_clear(self.handle.as_ptr()) };
        status::check("eng_cipher_clear", code)?;
        self.state = State::Fresh;
        Ok(())
    }
}

/// Checks the engine's accounting for a final update.
fn check_finish(len: usize, consumed: usize, written: usize, need: usize) -> Result<()> {
    if consumed != len {
        error!(consumed, len, "cipher finish left input unconsumed");
        bug!("cipher finish did not consume its whole input");
    }
    if written > need {
        error!(written, need, "cipher finish exceeded the queried bound");
        bug!("cipher finish wrote more than `output_length`");
    }
    Ok(())
}
