use core::ffi::{c_char, c_int};

use cshim::BlockCipher;

use crate::args::{self, guard, guard_count};

/// A block cipher handle.
pub type CshimBlockCipher = BlockCipher;

/// Creates a block cipher, e.g. `AES-256`.
///
/// # Safety
///
/// - `out` must be valid for writes.
/// - `name` must be a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_block_cipher_init(
    out: *mut *mut CshimBlockCipher,
    name: *const c_char,
) -> c_int {
    guard("cshim_block_cipher_init", || {
        // SAFETY: See the function's safety docs.
        let name = unsafe { args::name("name", name) }?;
        let bc = BlockCipher::new(name)?;
        // SAFETY: See the function's safety docs.
        unsafe { args::init(out, bc) }
    })
}

/// Releases a block cipher. Null is ignored.
///
/// # Safety
///
/// `bc` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_block_cipher_destroy(bc: *mut CshimBlockCipher) -> c_int {
    // SAFETY: See the function's safety docs.
    unsafe { args::destroy(bc) };
    0
}

/// Binds the viewed key.
///
/// # Safety
///
/// - `bc` must be a live handle.
/// - `key` must be valid for reads of `cap` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_block_cipher_set_key(
    bc: *mut CshimBlockCipher,
    key: *const u8,
    cap: usize,
    off: isize,
    len: isize,
) -> c_int {
    guard("cshim_block_cipher_set_key", || {
        // SAFETY: See the function's safety docs.
        let bc = unsafe { args::handle_mut("bc", bc) }?;
        // SAFETY: See the function's safety docs.
        let key = unsafe { args::view(key, cap, off, len) }?;
        Ok(bc.set_key(&key)?)
    })
}

/// Removes the key.
///
/// # Safety
///
/// `bc` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_block_cipher_clear(bc: *mut CshimBlockCipher) -> c_int {
    guard("cshim_block_cipher_clear", || {
        // SAFETY: See the function's safety docs.
        let bc = unsafe { args::handle_mut("bc", bc) }?;
        Ok(bc.clear()?)
    })
}

/// Returns the block size, or a negative status.
///
/// # Safety
///
/// `bc` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_block_cipher_block_size(bc: *const CshimBlockCipher) -> isize {
    guard_count("cshim_block_cipher_block_size", || {
        // SAFETY: See the function's safety docs.
        let bc = unsafe { args::handle("bc", bc) }?;
        Ok(bc.block_size()?)
    })
}

type BlocksFn = fn(&mut BlockCipher, &[u8], usize, &mut [u8], usize) -> cshim::Result<usize>;

/// Validates the arguments and runs `f`.
///
/// The input view is `blocks * block_size` bytes at `in_off`.
///
/// # Safety
///
/// See [`cshim_block_cipher_encrypt_blocks`].
#[allow(clippy::too_many_arguments)]
unsafe fn blocks(
    op: &'static str,
    f: BlocksFn,
    bc: *mut CshimBlockCipher,
    input: *const u8,
    in_cap: usize,
    in_off: isize,
    out: *mut u8,
    out_cap: usize,
    out_off: isize,
    out_len: isize,
    n: usize,
) -> isize {
    guard_count(op, || {
        // SAFETY: See the function's safety docs.
        let bc = unsafe { args::handle_mut("bc", bc) }?;
        let len = bc
            .block_size()?
            .checked_mul(n)
            .and_then(|len| isize::try_from(len).ok())
            .unwrap_or(isize::MAX);
        // SAFETY: See the function's safety docs.
        let input = unsafe { args::view(input, in_cap, in_off, len) }?;
        // SAFETY: See the function's safety docs.
        let mut out = unsafe { args::view_mut(out, out_cap, out_off, out_len) }?;
        Ok(f(bc, &input, 0, &mut out, n)?)
    })
}

/// Encrypts `n` blocks starting at `in_off` into the output
/// view and returns the bytes written, or a negative status.
///
/// # Safety
///
/// - `bc` must be a live handle.
/// - `input` must be valid for reads of `in_cap` bytes.
/// - `out` must be valid for writes of `out_cap` bytes.
/// - The two buffers must not overlap.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_block_cipher_encrypt_blocks(
    bc: *mut CshimBlockCipher,
    input: *const u8,
    in_cap: usize,
    in_off: isize,
    out: *mut u8,
    out_cap: usize,
    out_off: isize,
    out_len: isize,
    n: usize,
) -> isize {
    // SAFETY: See the function's safety docs.
    unsafe {
        blocks(
            "cshim_block_cipher_encrypt_blocks",
            BlockCipher::encrypt_blocks,
            bc,
            input,
            in_cap,
            in_off,
            out,
            out_cap,
            out_off,
            out_len,
            n,
        )
    }
}

/// Decrypts `n` blocks. See
/// [`cshim_block_cipher_encrypt_blocks`].
///
/// # Safety
///
/// See [`cshim_block_cipher_encrypt_blocks`].
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_block_cipher_decrypt_blocks(
    bc: *mut CshimBlockCipher,
    input: *const u8,
    in_cap: usize,
    in_off: isize,
    out: *mut u8,
    out_cap: usize,
    out_off: isize,
    out_len: isize,
    n: usize,
) -> isize {
    // SAFETY: See the function's safety docs.
    unsafe {
        blocks(
            "cshim_block_cipher_decrypt_blocks",
            BlockCipher::decrypt_blocks,
            bc,
            input,
            in_cap,
            in_off,
            out,
            out_cap,
            out_off,
            out_len,
            n,
        )
    }
}
