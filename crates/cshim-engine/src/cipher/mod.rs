//! Streaming symmetric cipher modes.
//!
//! A cipher object is keyed with `set_key`, optionally given
//! associated data, then started with a nonce. Input is fed in
//! whole multiples of the update granularity, and the final call
//! (with [`ENG_CIPHER_UPDATE_FLAG_FINAL`]) processes the remainder,
//! which must be at least the minimum final size.

mod aead;
mod cbc_mode;

use core::ffi::{c_char, c_int};

use tracing::debug;
use zeroize::Zeroizing;

use crate::{
    obj::{
        check_flags, create, cstr, destroy, get, guard, guard_value, input, object, out_ref,
        output, write_str_output,
    },
    rc::Failure,
};

/// Initialize the cipher for encryption.
pub const ENG_CIPHER_INIT_FLAG_ENCRYPT: u32 = 0;
/// Initialize the cipher for decryption.
pub const ENG_CIPHER_INIT_FLAG_DECRYPT: u32 = 1;
/// Marks the last call to [`eng_cipher_update`].
pub const ENG_CIPHER_UPDATE_FLAG_FINAL: u32 = 1;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Direction {
    Encrypt,
    Decrypt,
}

/// A started cipher.
pub(crate) trait Mode: Send {
    /// Transforms `data` in place. `data` is a whole number of
    /// update granules.
    fn update(&mut self, data: &mut [u8]) -> Result<(), Failure>;

    /// Transforms the final input.
    fn finish(self: Box<Self>, data: Vec<u8>) -> Result<Vec<u8>, Failure>;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Algo {
    ChaCha20Poly1305,
    AesGcm { key_len: usize },
    AesCbc { key_len: usize, padding: bool },
}

impl Algo {
    fn from_name(name: &str) -> Option<Self> {
        let algo = match name {
            "ChaCha20Poly1305" => Self::ChaCha20Poly1305,
            "AES-128/GCM" => Self::AesGcm { key_len: 16 },
            "AES-256/GCM" => Self::AesGcm { key_len: 32 },
            "AES-128/CBC" | "AES-128/CBC/PKCS7" => Self::AesCbc {
                key_len: 16,
                padding: true,
            },
            "AES-256/CBC" | "AES-256/CBC/PKCS7" => Self::AesCbc {
                key_len: 32,
                padding: true,
            },
            "AES-128/CBC/NoPadding" => Self::AesCbc {
                key_len: 16,
                padding: false,
            },
            "AES-256/CBC/NoPadding" => Self::AesCbc {
                key_len: 32,
                padding: false,
            },
            _ => return None,
        };
        Some(algo)
    }

    fn name(self) -> &'static str {
        match self {
            Self::ChaCha20Poly1305 => "ChaCha20Poly1305",
            Self::AesGcm { key_len: 16 } => "AES-128/GCM",
            Self::AesGcm { .. } => "AES-256/GCM",
            Self::AesCbc {
                key_len: 16,
                padding: true,
            } => "AES-128/CBC/PKCS7",
            Self::AesCbc {
                key_len: 16,
                padding: false,
            } => "AES-128/CBC/NoPadding",
            Self::AesCbc { padding: true, .. } => "AES-256/CBC/PKCS7",
            Self::AesCbc { padding: false, .. } => "AES-256/CBC/NoPadding",
        }
    }

    fn key_len(self) -> usize {
        match self {
            Self::ChaCha20Poly1305 => 32,
            Self::AesGcm { key_len } | Self::AesCbc { key_len, .. } => key_len,
        }
    }

    fn is_aead(self) -> bool {
        !matches!(self, Self::AesCbc { .. })
    }

    fn tag_len(self) -> usize {
        if self.is_aead() { aead::TAG_LEN } else { 0 }
    }

    fn nonce_len(self) -> usize {
        match self {
            Self::ChaCha20Poly1305 | Self::AesGcm { .. } => 12,
            Self::AesCbc { .. } => cbc_mode::BLOCK_LEN,
        }
    }

    fn granularity(self) -> usize {
        match self {
            Self::ChaCha20Poly1305 => 64,
            Self::AesGcm { .. } | Self::AesCbc { .. } => 16,
        }
    }

    fn minimum_final_size(self, dir: Direction) -> usize {
        match (self, dir) {
            (_, Direction::Encrypt) => 0,
            (Self::AesCbc { padding, .. }, Direction::Decrypt) => {
                if padding {
                    cbc_mode::BLOCK_LEN
                } else {
                    0
                }
            }
            (_, Direction::Decrypt) => aead::TAG_LEN,
        }
    }

    /// The largest output `finish` can produce for `n` bytes of
    /// input.
    fn output_length(self, dir: Direction, n: usize) -> usize {
        match (self, dir) {
            (Self::AesCbc { padding: true, .. }, Direction::Encrypt) => (n / cbc_mode::BLOCK_LEN)
                .saturating_add(1)
                .saturating_mul(cbc_mode::BLOCK_LEN),
            (Self::AesCbc { .. }, _) => n,
            (_, Direction::Encrypt) => n.saturating_add(aead::TAG_LEN),
            (_, Direction::Decrypt) => n.saturating_sub(aead::TAG_LEN),
        }
    }

    fn start(
        self,
        dir: Direction,
        key: &[u8],
        nonce: &[u8],
        ad: &[u8],
    ) -> Result<Box<dyn Mode>, Failure> {
        match self {
            Self::ChaCha20Poly1305 => aead::chacha20poly1305(dir, key, nonce, ad),
            Self::AesGcm { .. } => aead::aes_gcm(dir, key, nonce, ad),
            Self::AesCbc { padding, .. } => cbc_mode::aes_cbc(dir, key, nonce, padding),
        }
    }
}

pub(crate) struct CipherState {
    algo: Algo,
    dir: Direction,
    key: Option<Zeroizing<Vec<u8>>>,
    ad: Vec<u8>,
    running: Option<Box<dyn Mode>>,
}

impl CipherState {
    fn reset(&mut self) {
        self.ad.clear();
        self.running = None;
    }
}

object! {
    /// A streaming cipher mode.
    eng_cipher_struct(CipherState) = 0xb4a2_bf9c
}

/// An opaque cipher handle.
pub type eng_cipher_t = *mut eng_cipher_struct;

/// Creates a cipher object, for example `AES-256/GCM`.
///
/// # Safety
///
/// - `cipher` must be valid for writes.
/// - `name` must be a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_cipher_init(
    cipher: *mut eng_cipher_t,
    name: *const c_char,
    flags: u32,
) -> c_int {
    guard("eng_cipher_init", || {
        check_flags(flags, ENG_CIPHER_INIT_FLAG_DECRYPT)?;
        // SAFETY: See the function's safety docs.
        let name = unsafe { cstr(name) }?;
        let algo = Algo::from_name(name).ok_or_else(|| Failure::unknown(name))?;
        let dir = if flags & ENG_CIPHER_INIT_FLAG_DECRYPT != 0 {
            Direction::Decrypt
        } else {
            Direction::Encrypt
        };
        let state = CipherState {
            algo,
            dir,
            key: None,
            ad: Vec::new(),
            running: None,
        };
        // SAFETY: See the function's safety docs.
        unsafe { create(cipher, state) }
    })
}

/// Releases a cipher object.
///
/// # Safety
///
/// `cipher` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_cipher_destroy(cipher: eng_cipher_t) -> c_int {
    // SAFETY: See the function's safety docs.
    guard("eng_cipher_destroy", || unsafe { destroy(cipher) })
}

/// Writes the algorithm name using the length-query protocol.
///
/// # Safety
///
/// - `cipher` must be a live handle.
/// - `name` must be valid for writes of `*name_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_cipher_name(
    cipher: eng_cipher_t,
    name: *mut c_char,
    name_len: *mut usize,
) -> c_int {
    guard("eng_cipher_name", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(cipher) }?;
        // SAFETY: See the function's safety docs.
        unsafe { write_str_output(name, name_len, state.algo.name()) }
    })
}

/// Stores the largest output the final call can produce for
/// `in_len` bytes of input.
///
/// # Safety
///
/// - `cipher` must be a live handle.
/// - `out_len` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_cipher_output_length(
    cipher: eng_cipher_t,
    in_len: usize,
    out_len: *mut usize,
) -> c_int {
    guard("eng_cipher_output_length", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(cipher) }?;
        // SAFETY: See the function's safety docs.
        *unsafe { out_ref(out_len) }? = state.algo.output_length(state.dir, in_len);
        Ok(())
    })
}

/// Returns 1 if `nl` is an acceptable nonce length, 0 if not, or
/// a negative status.
///
/// # Safety
///
/// `cipher` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_cipher_valid_nonce_length(cipher: eng_cipher_t, nl: usize) -> c_int {
    guard_value("eng_cipher_valid_nonce_length", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(cipher) }?;
        Ok(c_int::from(nl == state.algo.nonce_len()))
    })
}

macro_rules! getter {
    ($(#[$meta:meta])* $name:ident => |$state:ident| $value:expr) => {
        $(#[$meta])*
        ///
        /// # Safety
        ///
        /// - `cipher` must be a live handle.
        /// - `out` must be valid for writes.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(cipher: eng_cipher_t, out: *mut usize) -> c_int {
            guard(stringify!($name), || {
                // SAFETY: See the function's safety docs.
                let $state = unsafe { get(cipher) }?;
                let v = $value;
                // SAFETY: See the function's safety docs.
                *unsafe { out_ref(out) }? = v;
                Ok(())
            })
        }
    };
}

getter! {
    /// Stores the tag length, or 0 for modes without one.
    eng_cipher_get_tag_length => |state| state.algo.tag_len()
}

getter! {
    /// Stores the default nonce length.
    eng_cipher_get_default_nonce_length => |state| state.algo.nonce_len()
}

getter! {
    /// Stores the update granularity. Non-final input is consumed
    /// in multiples of it.
    eng_cipher_get_update_granularity => |state| state.algo.granularity()
}

getter! {
    /// Stores the preferred update size, a multiple of the update
    /// granularity.
    eng_cipher_get_ideal_update_granularity => |state| state.algo.granularity().saturating_mul(64)
}

getter! {
    /// Stores the least input the final call accepts.
    eng_cipher_get_minimum_final_size => |state| state.algo.minimum_final_size(state.dir)
}

/// Stores the minimum and maximum key lengths and the key length
/// modulus.
///
/// # Safety
///
/// - `cipher` must be a live handle.
/// - The out-parameters must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_cipher_get_keyspec(
    cipher: eng_cipher_t,
    min_keylen: *mut usize,
    max_keylen: *mut usize,
    mod_keylen: *mut usize,
) -> c_int {
    guard("eng_cipher_get_keyspec", || {
        // SAFETY: See the function's safety docs.
        let len = unsafe { get(cipher) }?.algo.key_len();
        // SAFETY: See the function's safety docs.
        unsafe {
            *out_ref(min_keylen)? = len;
            *out_ref(max_keylen)? = len;
            *out_ref(mod_keylen)? = 1;
        }
        Ok(())
    })
}

/// Binds a key. Any message in progress is abandoned.
///
/// # Safety
///
/// - `cipher` must be a live handle.
/// - `key` must be valid for reads of `key_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_cipher_set_key(
    cipher: eng_cipher_t,
    key: *const u8,
    key_len: usize,
) -> c_int {
    guard("eng_cipher_set_key", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(cipher) }?;
        // SAFETY: See the function's safety docs.
        let key = unsafe { input(key, key_len) }?;
        if key.len() != state.algo.key_len() {
            return Err(Failure::InvalidKeyLength(key.len()));
        }
        state.reset();
        state.key = Some(Zeroizing::new(key.to_vec()));
        Ok(())
    })
}

/// Abandons any message in progress. The key is kept.
///
/// # Safety
///
/// `cipher` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_cipher_reset(cipher: eng_cipher_t) -> c_int {
    guard("eng_cipher_reset", || {
        // SAFETY: See the function's safety docs.
        unsafe { get(cipher) }?.reset();
        Ok(())
    })
}

/// Abandons any message in progress and removes the key.
///
/// # Safety
///
/// `cipher` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_cipher_clear(cipher: eng_cipher_t) -> c_int {
    guard("eng_cipher_clear", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(cipher) }?;
        state.reset();
        state.key = None;
        Ok(())
    })
}

/// Sets the associated data for the next message.
///
/// Only AEAD modes accept associated data, and only before
/// [`eng_cipher_start`].
///
/// # Safety
///
/// - `cipher` must be a live handle.
/// - `ad` must be valid for reads of `ad_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_cipher_set_associated_data(
    cipher: eng_cipher_t,
    ad: *const u8,
    ad_len: usize,
) -> c_int {
    guard("eng_cipher_set_associated_data", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(cipher) }?;
        if !state.algo.is_aead() {
            return Err(Failure::BadParameter("not an AEAD mode"));
        }
        if state.running.is_some() {
            return Err(Failure::InvalidObjectState("message already started"));
        }
        // SAFETY: See the function's safety docs.
        let ad = unsafe { input(ad, ad_len) }?;
        state.ad = ad.to_vec();
        Ok(())
    })
}

/// Starts a message with `nonce`.
///
/// # Safety
///
/// - `cipher` must be a live handle.
/// - `nonce` must be valid for reads of `nonce_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_cipher_start(
    cipher: eng_cipher_t,
    nonce: *const u8,
    nonce_len: usize,
) -> c_int {
    guard("eng_cipher_start", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(cipher) }?;
        // SAFETY: See the function's safety docs.
        let nonce = unsafe { input(nonce, nonce_len) }?;
        let key = state.key.as_ref().ok_or(Failure::KeyNotSet)?;
        if nonce.len() != state.algo.nonce_len() {
            return Err(Failure::BadParameter("invalid nonce length"));
        }
        let mode = state.algo.start(state.dir, key, nonce, &state.ad)?;
        state.running = Some(mode);
        Ok(())
    })
}

/// Processes input.
///
/// Without [`ENG_CIPHER_UPDATE_FLAG_FINAL`] the largest whole
/// number of granules that fits in both the input and the output
/// is processed, and the counts are stored in `*input_consumed`
/// and `*output_written`.
///
/// With it, all input is processed and the message ends. The
/// output must hold [`eng_cipher_output_length`] bytes for the
/// input length; if not, the needed size is stored in
/// `*output_written`.
///
/// # Safety
///
/// - `cipher` must be a live handle.
/// - `output` must be valid for writes of `output_size` bytes.
/// - `input_bytes` must be valid for reads of `input_size` bytes.
/// - `output_written` and `input_consumed` must be valid for
///   writes.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_cipher_update(
    cipher: eng_cipher_t,
    flags: u32,
    output: *mut u8,
    output_size: usize,
    output_written: *mut usize,
    input_bytes: *const u8,
    input_size: usize,
    input_consumed: *mut usize,
) -> c_int {
    guard("eng_cipher_update", || {
        check_flags(flags, ENG_CIPHER_UPDATE_FLAG_FINAL)?;
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(cipher) }?;
        // SAFETY: See the function's safety docs.
        let written = unsafe { out_ref(output_written) }?;
        // SAFETY: See the function's safety docs.
        let consumed = unsafe { out_ref(input_consumed) }?;
        *written = 0;
        *consumed = 0;

        if state.running.is_none() {
            return Err(Failure::InvalidObjectState("message not started"));
        }

        // Copied so that input and output may overlap.
        // SAFETY: See the function's safety docs.
        let mut data = Zeroizing::new(unsafe { input(input_bytes, input_size) }?.to_vec());

        if flags & ENG_CIPHER_UPDATE_FLAG_FINAL == 0 {
            let gran = state.algo.granularity();
            let take = input_size.min(output_size);
            let take = take.saturating_sub(take % gran);
            data.truncate(take);
            if let Some(mode) = state.running.as_mut() {
                mode.update(&mut data)?;
            }
            // SAFETY: See the function's safety docs.
            unsafe { self::output(output, take) }?.copy_from_slice(&data);
            *written = take;
            *consumed = take;
            return Ok(());
        }

        if input_size < state.algo.minimum_final_size(state.dir) {
            return Err(Failure::InvalidInput("final input is too short"));
        }
        let need = state.algo.output_length(state.dir, input_size);
        if output_size < need {
            *written = need;
            return Err(Failure::InsufficientBufferSpace);
        }
        let mode = state
            .running
            .take()
            .ok_or(Failure::InvalidObjectState("message not started"))?;
        state.ad.clear();
        let out = Zeroizing::new(mode.finish(core::mem::take(&mut *data))?);
        if out.len() > need {
            return Err(Failure::Internal("output exceeds the reported bound"));
        }
        debug!(
            algo = state.algo.name(),
            input = input_size,
            output = out.len(),
            "message finished"
        );
        // SAFETY: See the function's safety docs.
        unsafe { self::output(output, out.len()) }?.copy_from_slice(&out);
        *written = out.len();
        *consumed = input_size;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::indexing_slicing)]

    use core::ptr;

    use super::*;
    use crate::rc::{
        ERROR_BAD_MAC, ERROR_BAD_PARAMETER, ERROR_INSUFFICIENT_BUFFER_SPACE,
        ERROR_INVALID_KEY_LENGTH, ERROR_INVALID_OBJECT_STATE, ERROR_KEY_NOT_SET, SUCCESS,
    };

    fn new_cipher(name: &core::ffi::CStr, flags: u32) -> eng_cipher_t {
        let mut c = ptr::null_mut();
        // SAFETY: FFI call, no invariants.
        assert_eq!(unsafe { eng_cipher_init(&mut c, name.as_ptr(), flags) }, SUCCESS);
        c
    }

    fn get_usize(
        c: eng_cipher_t,
        f: unsafe extern "C" fn(eng_cipher_t, *mut usize) -> c_int,
    ) -> usize {
        let mut v = 0;
        // SAFETY: FFI call, no invariants.
        assert_eq!(unsafe { f(c, &mut v) }, SUCCESS);
        v
    }

    /// Runs a whole message through `c`, using update for all but
    /// the minimum final size.
    fn process(c: eng_cipher_t, nonce: &[u8], msg: &[u8]) -> Result<Vec<u8>, c_int> {
        let gran = get_usize(c, eng_cipher_get_update_granularity);
        let min_final = get_usize(c, eng_cipher_get_minimum_final_size);
        // SAFETY: FFI call, no invariants.
        let rc = unsafe { eng_cipher_start(c, nonce.as_ptr(), nonce.len()) };
        if rc != SUCCESS {
            return Err(rc);
        }
        let mut out = Vec::new();
        let mut rest = msg;
        while rest.len() >= gran + min_final {
            let mut buf = vec![0u8; gran];
            let (mut w, mut r) = (0, 0);
            // SAFETY: FFI call, no invariants.
            let rc = unsafe {
                eng_cipher_update(
                    c,
                    0,
                    buf.as_mut_ptr(),
                    buf.len(),
                    &mut w,
                    rest.as_ptr(),
                    rest.len(),
                    &mut r,
                )
            };
            assert_eq!(rc, SUCCESS);
            assert_eq!((w, r), (gran, gran));
            out.extend_from_slice(&buf);
            rest = &rest[r..];
        }
        let mut need = 0;
        // SAFETY: FFI call, no invariants.
        unsafe { eng_cipher_output_length(c, rest.len(), &mut need) };
        let mut buf = vec![0u8; need];
        let (mut w, mut r) = (0, 0);
        // SAFETY: FFI call, no invariants.
        let rc = unsafe {
            eng_cipher_update(
                c,
                ENG_CIPHER_UPDATE_FLAG_FINAL,
                buf.as_mut_ptr(),
                buf.len(),
                &mut w,
                rest.as_ptr(),
                rest.len(),
                &mut r,
            )
        };
        if rc != SUCCESS {
            return Err(rc);
        }
        assert!(w <= need);
        assert_eq!(r, rest.len());
        out.extend_from_slice(&buf[..w]);
        Ok(out)
    }

    #[test]
    fn test_round_trip_all_modes() {
        for name in [
            c"ChaCha20Poly1305",
            c"AES-128/GCM",
            c"AES-256/GCM",
            c"AES-128/CBC/PKCS7",
            c"AES-256/CBC",
            c"AES-256/CBC/NoPadding",
        ] {
            let enc = new_cipher(name, ENG_CIPHER_INIT_FLAG_ENCRYPT);
            let dec = new_cipher(name, ENG_CIPHER_INIT_FLAG_DECRYPT);
            let key_len = {
                let (mut min, mut max, mut m) = (0, 0, 0);
                // SAFETY: FFI call, no invariants.
                unsafe { eng_cipher_get_keyspec(enc, &mut min, &mut max, &mut m) };
                max
            };
            let nonce = vec![3u8; get_usize(enc, eng_cipher_get_default_nonce_length)];
            let key = vec![9u8; key_len];
            let msg = vec![0x42u8; 320];
            // SAFETY: FFI call, no invariants.
            unsafe {
                assert_eq!(eng_cipher_set_key(enc, key.as_ptr(), key.len()), SUCCESS);
                assert_eq!(eng_cipher_set_key(dec, key.as_ptr(), key.len()), SUCCESS);
            }
            let ct = process(enc, &nonce, &msg).unwrap();
            let pt = process(dec, &nonce, &ct).unwrap();
            assert_eq!(pt, msg, "{name:?}");
            // SAFETY: FFI call, no invariants.
            unsafe {
                eng_cipher_destroy(enc);
                eng_cipher_destroy(dec);
            }
        }
    }

    #[test]
    fn test_aead_tamper() {
        let enc = new_cipher(c"AES-256/GCM", ENG_CIPHER_INIT_FLAG_ENCRYPT);
        let dec = new_cipher(c"AES-256/GCM", ENG_CIPHER_INIT_FLAG_DECRYPT);
        let key = [1u8; 32];
        let nonce = [2u8; 12];
        // SAFETY: FFI call, no invariants.
        unsafe {
            eng_cipher_set_key(enc, key.as_ptr(), key.len());
            eng_cipher_set_key(dec, key.as_ptr(), key.len());
            assert_eq!(eng_cipher_set_associated_data(enc, b"hdr".as_ptr(), 3), SUCCESS);
            assert_eq!(eng_cipher_set_associated_data(dec, b"hdr".as_ptr(), 3), SUCCESS);
        }
        let mut ct = process(enc, &nonce, b"attack at dawn").unwrap();
        assert_eq!(ct.len(), 14 + 16);
        let last = ct.len() - 1;
        ct[last] ^= 1;
        // SAFETY: FFI call, no invariants.
        unsafe { eng_cipher_set_associated_data(dec, b"hdr".as_ptr(), 3) };
        assert_eq!(process(dec, &nonce, &ct), Err(ERROR_BAD_MAC));
        // SAFETY: FFI call, no invariants.
        unsafe {
            eng_cipher_destroy(enc);
            eng_cipher_destroy(dec);
        }
    }

    #[test]
    fn test_state_errors() {
        let c = new_cipher(c"ChaCha20Poly1305", 0);
        let nonce = [0u8; 12];
        let mut out = [0u8; 64];
        let (mut w, mut r) = (0, 0);
        // SAFETY: FFI call, no invariants.
        unsafe {
            assert_eq!(eng_cipher_start(c, nonce.as_ptr(), 12), ERROR_KEY_NOT_SET);
            assert_eq!(eng_cipher_set_key(c, [0u8; 16].as_ptr(), 16), ERROR_INVALID_KEY_LENGTH);
            assert_eq!(eng_cipher_set_key(c, [0u8; 32].as_ptr(), 32), SUCCESS);
            assert_eq!(
                eng_cipher_update(c, 0, out.as_mut_ptr(), 64, &mut w, out.as_ptr(), 0, &mut r),
                ERROR_INVALID_OBJECT_STATE
            );
            assert_eq!(eng_cipher_start(c, nonce.as_ptr(), 8), ERROR_BAD_PARAMETER);
            assert_eq!(eng_cipher_valid_nonce_length(c, 12), 1);
            assert_eq!(eng_cipher_valid_nonce_length(c, 8), 0);
            assert_eq!(eng_cipher_start(c, nonce.as_ptr(), 12), SUCCESS);
            assert_eq!(
                eng_cipher_set_associated_data(c, b"x".as_ptr(), 1),
                ERROR_INVALID_OBJECT_STATE
            );
            eng_cipher_destroy(c);
        }
    }

    #[test]
    fn test_final_output_query() {
        let c = new_cipher(c"AES-128/GCM", 0);
        let (mut w, mut r) = (0, 0);
        let msg = [0u8; 10];
        // SAFETY: FFI call, no invariants.
        unsafe {
            eng_cipher_set_key(c, [0u8; 16].as_ptr(), 16);
            eng_cipher_start(c, [0u8; 12].as_ptr(), 12);
            let rc = eng_cipher_update(
                c,
                ENG_CIPHER_UPDATE_FLAG_FINAL,
                ptr::null_mut(),
                0,
                &mut w,
                msg.as_ptr(),
                msg.len(),
                &mut r,
            );
            assert_eq!(rc, ERROR_INSUFFICIENT_BUFFER_SPACE);
            eng_cipher_destroy(c);
        }
        assert_eq!(w, 26);
    }

    #[test]
    fn test_cbc_rejects_ad() {
        let c = new_cipher(c"AES-128/CBC/PKCS7", 0);
        assert_eq!(get_usize(c, eng_cipher_get_tag_length), 0);
        // SAFETY: FFI call, no invariants.
        unsafe {
            assert_eq!(
                eng_cipher_set_associated_data(c, b"x".as_ptr(), 1),
                ERROR_BAD_PARAMETER
            );
            eng_cipher_destroy(c);
        }
    }
}
