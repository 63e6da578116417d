//! Raw block ciphers.
//!
//! Each call processes whole blocks and keeps no chaining state.

use alloc::string::String;
use core::ffi::{CStr, c_int};

use cshim_engine as eng;
use tracing::instrument;

use crate::{
    error::{BufferTooSmall, Result},
    handle::{Handle, kind},
    keyspec::KeySpec,
    query,
    state::State,
    status, view,
};

type BlockFn = unsafe extern "C" fn(eng::eng_block_cipher_t, *const u8, *mut u8, usize) -> c_int;

/// A raw block cipher.
///
/// Each call processes whole blocks independently; no chaining
/// mode is applied.
#[derive(Debug)]
pub struct BlockCipher {
    handle: Handle<kind::BlockCipher>,
    state: State,
}

impl BlockCipher {
    /// Creates a block cipher, e.g. `AES-256`.
    #[instrument(skip_all, fields(?name))]
    pub fn new(name: &CStr) -> Result<Self> {
        let handle = Handle::init("eng_block_cipher_init", |out| {
            // SAFETY: FFI call, `out` is valid for writes and
            // `name` is NUL-terminated.
            unsafe { eng::eng_block_cipher_init(out, name.as_ptr()) }
        })?;
        Ok(Self {
            handle,
            state: State::Fresh,
        })
    }

    /// Binds `key`.
    pub fn set_key(&mut self, key: &[u8]) -> Result<()> {
        // SAFETY: FFI call, the handle is live and `key` is valid
        // for its length.
        let code =
            unsafe { eng::eng_block_cipher_set_key(self.handle.as_ptr(), key.as_ptr(), key.len()) };
        status::check("eng_block_cipher_set_key", code)?;
        self.state = State::KeyBound;
        Ok(())
    }

    /// Removes the key.
    pub fn clear(&mut self) -> Result<()> {
        // SAFETY: FFI call, the handle is live.
        let code = unsafe { eng::eng_block_cipher_clear(self.handle.as_ptr()) };
        status::check("eng_block_cipher_clear", code)?;
        self.state = State::Fresh;
        Ok(())
    }

    /// The block size in bytes.
    pub fn block_size(&self) -> Result<usize> {
        // SAFETY: FFI call, the handle is live.
        let code = unsafe { eng::eng_block_cipher_block_size(self.handle.as_ptr()) };
        status::count("eng_block_cipher_block_size", code)
    }

    /// The accepted key lengths.
    pub fn keyspec(&self) -> Result<KeySpec> {
        let (mut min, mut max, mut modulo) = (0, 0, 0);
        // SAFETY: FFI call, the handle is live and the
        // out-parameters are valid for writes.
        let code = unsafe {
            eng::eng_block_cipher_get_keyspec(
                self.handle.as_ptr(),
                &mut min,
                &mut max,
                &mut modulo,
                0,
            )
        };
        status::check("eng_block_cipher_get_keyspec", code)?;
        Ok(KeySpec { min, max, modulo })
    }

    /// The algorithm name.
    pub fn name(&self) -> Result<String> {
        query::string("eng_block_cipher_name", |out, out_len| {
            // SAFETY: FFI call, the handle is live and `out` is
            // valid for `*out_len` bytes.
            unsafe { eng::eng_block_cipher_name(self.handle.as_ptr(), out.cast(), out_len) }
        })
    }

    /// Encrypts `blocks` blocks of `input` starting at `offset`
    /// into the start of `out`.
    ///
    /// Returns the number of bytes written.
    #[instrument(skip_all, fields(offset, blocks))]
    pub fn encrypt_blocks(
        &mut self,
        input: &[u8],
        offset: usize,
        out: &mut [u8],
        blocks: usize,
    ) -> Result<usize> {
        self.process(
            "encrypt_blocks",
            eng::eng_block_cipher_encrypt_blocks,
            input,
            offset,
            out,
            blocks,
        )
    }

    /// Decrypts `blocks` blocks of `input` starting at `offset`
    /// into the start of `out`.
    ///
    /// Returns the number of bytes written.
    #[instrument(skip_all, fields(offset, blocks))]
    pub fn decrypt_blocks(
        &mut self,
        input: &[u8],
        offset: usize,
        out: &mut [u8],
        blocks: usize,
    ) -> Result<usize> {
        self.process(
            "decrypt_blocks",
            eng::eng_block_cipher_decrypt_blocks,
            input,
            offset,
            out,
            blocks,
        )
    }

    fn process(
        &mut self,
        op: &'static str,
        f: BlockFn,
        input: &[u8],
        offset: usize,
        out: &mut [u8],
        blocks: usize,
    ) -> Result<usize> {
        self.state.require(op, &[State::KeyBound])?;
        let n = blocks
            .checked_mul(self.block_size()?)
            .ok_or(BufferTooSmall {
                need: usize::MAX,
                have: out.len(),
            })?;
        let src = view::sub(input, offset, n)?;
        let have = out.len();
        let dst = out.get_mut(..n).ok_or(BufferTooSmall { need: n, have })?;
        // SAFETY: FFI call, the handle is live and `src` and `dst`
        // both hold `blocks * block_size` bytes.
        let code = unsafe { f(self.handle.as_ptr(), src.as_ptr(), dst.as_mut_ptr(), blocks) };
        status::check(op, code)?;
        Ok(n)
    }
}
