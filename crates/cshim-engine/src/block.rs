use core::ffi::{c_char, c_int};

use aes::{
    Aes128, Aes192, Aes256, Block,
    cipher::{BlockDecrypt, BlockEncrypt, KeyInit},
};
use zeroize::Zeroize;

use crate::{
    obj::{
        check_flags, create, cstr, destroy, get, guard, guard_value, input, object, out_ref,
        output, write_str_output,
    },
    rc::Failure,
};

const BLOCK_SIZE: usize = 16;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum AesKind {
    Aes128,
    Aes192,
    Aes256,
}

impl AesKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "AES-128" => Some(Self::Aes128),
            "AES-192" => Some(Self::Aes192),
            "AES-256" => Some(Self::Aes256),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Aes128 => "AES-128",
            Self::Aes192 => "AES-192",
            Self::Aes256 => "AES-256",
        }
    }

    fn key_len(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }
}

/// A keyed AES instance.
pub(crate) enum Aes {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl Aes {
    /// Keys AES with a 16, 24 or 32 byte key.
    pub(crate) fn new(key: &[u8]) -> Result<Self, Failure> {
        let err = |_| Failure::InvalidKeyLength(key.len());
        let aes = match key.len() {
            16 => Self::Aes128(Aes128::new_from_slice(key).map_err(err)?),
            24 => Self::Aes192(Aes192::new_from_slice(key).map_err(err)?),
            32 => Self::Aes256(Aes256::new_from_slice(key).map_err(err)?),
            n => return Err(Failure::InvalidKeyLength(n)),
        };
        Ok(aes)
    }

    pub(crate) fn encrypt_block(&self, block: &mut Block) {
        match self {
            Self::Aes128(c) => c.encrypt_block(block),
            Self::Aes192(c) => c.encrypt_block(block),
            Self::Aes256(c) => c.encrypt_block(block),
        }
    }

    pub(crate) fn decrypt_block(&self, block: &mut Block) {
        match self {
            Self::Aes128(c) => c.decrypt_block(block),
            Self::Aes192(c) => c.decrypt_block(block),
            Self::Aes256(c) => c.decrypt_block(block),
        }
    }
}

pub(crate) struct BlockState {
    kind: AesKind,
    aes: Option<Aes>,
}

object! {
    /// A raw block cipher.
    eng_block_cipher_struct(BlockState) = 0x64c2_9716
}

/// An opaque block cipher handle.
pub type eng_block_cipher_t = *mut eng_block_cipher_struct;

/// Creates a block cipher object, for example `AES-256`.
///
/// # Safety
///
/// - `bc` must be valid for writes.
/// - `name` must be a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_block_cipher_init(
    bc: *mut eng_block_cipher_t,
    name: *const c_char,
) -> c_int {
    guard("eng_block_cipher_init", || {
        // SAFETY: See the function's safety docs.
        let name = unsafe { cstr(name) }?;
        let kind = AesKind::from_name(name).ok_or_else(|| Failure::unknown(name))?;
        // SAFETY: See the function's safety docs.
        unsafe { create(bc, BlockState { kind, aes: None }) }
    })
}

/// Releases a block cipher object.
///
/// # Safety
///
/// `bc` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_block_cipher_destroy(bc: eng_block_cipher_t) -> c_int {
    // SAFETY: See the function's safety docs.
    guard("eng_block_cipher_destroy", || unsafe { destroy(bc) })
}

/// Removes the key.
///
/// # Safety
///
/// `bc` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_block_cipher_clear(bc: eng_block_cipher_t) -> c_int {
    guard("eng_block_cipher_clear", || {
        // SAFETY: See the function's safety docs.
        unsafe { get(bc) }?.aes = None;
        Ok(())
    })
}

/// Binds a key.
///
/// # Safety
///
/// - `bc` must be a live handle.
/// - `key` must be valid for reads of `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_block_cipher_set_key(
    bc: eng_block_cipher_t,
    key: *const u8,
    len: usize,
) -> c_int {
    guard("eng_block_cipher_set_key", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(bc) }?;
        // SAFETY: See the function's safety docs.
        let key = unsafe { input(key, len) }?;
        if key.len() != state.kind.key_len() {
            return Err(Failure::InvalidKeyLength(key.len()));
        }
        state.aes = Some(Aes::new(key)?);
        Ok(())
    })
}

/// Returns the block size in bytes, or a negative status.
///
/// # Safety
///
/// `bc` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_block_cipher_block_size(bc: eng_block_cipher_t) -> c_int {
    guard_value("eng_block_cipher_block_size", || {
        // SAFETY: See the function's safety docs.
        unsafe { get(bc) }?;
        Ok(16)
    })
}

/// Encrypts `blocks` blocks from `input` into `out`.
///
/// The buffers may overlap.
///
/// # Safety
///
/// - `bc` must be a live handle.
/// - `input` and `out` must be valid for `blocks` blocks.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_block_cipher_encrypt_blocks(
    bc: eng_block_cipher_t,
    input: *const u8,
    out: *mut u8,
    blocks: usize,
) -> c_int {
    guard("eng_block_cipher_encrypt_blocks", || {
        // SAFETY: See the function's safety docs.
        unsafe { process(bc, input, out, blocks, Aes::encrypt_block) }
    })
}

/// Decrypts `blocks` blocks from `input` into `out`.
///
/// The buffers may overlap.
///
/// # Safety
///
/// - `bc` must be a live handle.
/// - `input` and `out` must be valid for `blocks` blocks.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_block_cipher_decrypt_blocks(
    bc: eng_block_cipher_t,
    input: *const u8,
    out: *mut u8,
    blocks: usize,
) -> c_int {
    guard("eng_block_cipher_decrypt_blocks", || {
        // SAFETY: See the function's safety docs.
        unsafe { process(bc, input, out, blocks, Aes::decrypt_block) }
    })
}

/// # Safety
///
/// See [`eng_block_cipher_encrypt_blocks`].
unsafe fn process(
    bc: eng_block_cipher_t,
    src: *const u8,
    dst: *mut u8,
    blocks: usize,
    f: fn(&Aes, &mut Block),
) -> Result<(), Failure> {
    // SAFETY: See the function's safety docs.
    let state = unsafe { get(bc) }?;
    let aes = state.aes.as_ref().ok_or(Failure::KeyNotSet)?;
    let len = blocks
        .checked_mul(BLOCK_SIZE)
        .ok_or(Failure::BadParameter("too many blocks"))?;
    // Copy first so that `src` and `dst` may alias.
    // SAFETY: See the function's safety docs.
    let mut data = unsafe { self::input(src, len) }?.to_vec();
    for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
        f(aes, Block::from_mut_slice(chunk));
    }
    // SAFETY: See the function's safety docs.
    unsafe { output(dst, len) }?.copy_from_slice(&data);
    data.zeroize();
    Ok(())
}

/// Writes the algorithm name using the length-query protocol.
///
/// # Safety
///
/// - `bc` must be a live handle.
/// - `name` must be valid for writes of `*name_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_block_cipher_name(
    bc: eng_block_cipher_t,
    name: *mut c_char,
    name_len: *mut usize,
) -> c_int {
    guard("eng_block_cipher_name", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(bc) }?;
        // SAFETY: See the function's safety docs.
        unsafe { write_str_output(name, name_len, state.kind.name()) }
    })
}

/// Stores the minimum and maximum key lengths and the key length
/// modulus.
///
/// # Safety
///
/// - `bc` must be a live handle.
/// - The out-parameters must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_block_cipher_get_keyspec(
    bc: eng_block_cipher_t,
    min_keylen: *mut usize,
    max_keylen: *mut usize,
    mod_keylen: *mut usize,
    flags: u32,
) -> c_int {
    guard("eng_block_cipher_get_keyspec", || {
        check_flags(flags, 0)?;
        // SAFETY: See the function's safety docs.
        let len = unsafe { get(bc) }?.kind.key_len();
        // SAFETY: See the function's safety docs.
        unsafe {
            *out_ref(min_keylen)? = len;
            *out_ref(max_keylen)? = len;
            *out_ref(mod_keylen)? = 1;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::indexing_slicing)]

    use core::ptr;

    use super::*;
    use crate::rc::{ERROR_INVALID_KEY_LENGTH, ERROR_KEY_NOT_SET, SUCCESS};

    // FIPS-197, appendix C.1.
    const KEY: &str = "000102030405060708090a0b0c0d0e0f";
    const PT: &str = "00112233445566778899aabbccddeeff";
    const CT: &str = "69c4e0d86a7b0430d8cdb78070b4c55a";

    fn new_bc(name: &core::ffi::CStr) -> eng_block_cipher_t {
        let mut bc = ptr::null_mut();
        // SAFETY: FFI call, no invariants.
        assert_eq!(unsafe { eng_block_cipher_init(&mut bc, name.as_ptr()) }, SUCCESS);
        bc
    }

    #[test]
    fn test_fips197_in_place() {
        let bc = new_bc(c"AES-128");
        let key = hex::decode(KEY).unwrap();
        let mut buf = [hex::decode(PT).unwrap(), hex::decode(PT).unwrap()].concat();
        let p = buf.as_mut_ptr();
        // SAFETY: FFI call, no invariants.
        unsafe {
            assert_eq!(eng_block_cipher_block_size(bc), 16);
            assert_eq!(eng_block_cipher_set_key(bc, key.as_ptr(), key.len()), SUCCESS);
            assert_eq!(eng_block_cipher_encrypt_blocks(bc, p, p, 2), SUCCESS);
        }
        assert_eq!(hex::encode(&buf[..16]), CT);
        assert_eq!(hex::encode(&buf[16..]), CT);
        // SAFETY: FFI call, no invariants.
        unsafe {
            assert_eq!(eng_block_cipher_decrypt_blocks(bc, p, p, 2), SUCCESS);
            eng_block_cipher_destroy(bc);
        }
        assert_eq!(hex::encode(&buf[..16]), PT);
    }

    #[test]
    fn test_key_errors() {
        let bc = new_bc(c"AES-256");
        let mut block = [0u8; 16];
        let p = block.as_mut_ptr();
        // SAFETY: FFI call, no invariants.
        unsafe {
            assert_eq!(eng_block_cipher_encrypt_blocks(bc, p, p, 1), ERROR_KEY_NOT_SET);
            assert_eq!(
                eng_block_cipher_set_key(bc, [0u8; 16].as_ptr(), 16),
                ERROR_INVALID_KEY_LENGTH
            );
            assert_eq!(eng_block_cipher_set_key(bc, [0u8; 32].as_ptr(), 32), SUCCESS);
            assert_eq!(eng_block_cipher_clear(bc), SUCCESS);
            assert_eq!(eng_block_cipher_encrypt_blocks(bc, p, p, 1), ERROR_KEY_NOT_SET);
            eng_block_cipher_destroy(bc);
        }
    }

    #[test]
    fn test_keyspec() {
        let bc = new_bc(c"AES-192");
        let (mut min, mut max, mut modulo) = (0, 0, 0);
        // SAFETY: FFI call, no invariants.
        unsafe {
            assert_eq!(
                eng_block_cipher_get_keyspec(bc, &mut min, &mut max, &mut modulo, 0),
                SUCCESS
            );
            eng_block_cipher_destroy(bc);
        }
        assert_eq!((min, max, modulo), (24, 24, 1));
    }
}
