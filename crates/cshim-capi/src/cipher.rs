use core::ffi::{c_char, c_int};

use cshim::{Cipher, Direction};

use crate::{
    args::{self, guard, guard_count},
    error::InvalidArg,
    hash::store_keyspec,
};

/// A cipher mode handle.
pub type CshimCipher = Cipher;

/// Create an encrypting cipher.
pub const CSHIM_CIPHER_ENCRYPT: u32 = 0;
/// Create a decrypting cipher.
pub const CSHIM_CIPHER_DECRYPT: u32 = 1;

/// Creates a cipher mode, e.g. `AES-256/GCM`.
///
/// # Safety
///
/// - `out` must be valid for writes.
/// - `name` must be a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_cipher_init(
    out: *mut *mut CshimCipher,
    name: *const c_char,
    flags: u32,
) -> c_int {
    guard("cshim_cipher_init", || {
        let dir = match flags {
            CSHIM_CIPHER_ENCRYPT => Direction::Encrypt,
            CSHIM_CIPHER_DECRYPT => Direction::Decrypt,
            _ => return Err(InvalidArg::new("flags", "unknown flag").into()),
        };
        // SAFETY: See the function's safety docs.
        let name = unsafe { args::name("name", name) }?;
        let cipher = Cipher::new(name, dir)?;
        // SAFETY: See the function's safety docs.
        unsafe { args::init(out, cipher) }
    })
}

/// Releases a cipher. Null is ignored.
///
/// # Safety
///
/// `cipher` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_cipher_destroy(cipher: *mut CshimCipher) -> c_int {
    // SAFETY: See the function's safety docs.
    unsafe { args::destroy(cipher) };
    0
}

macro_rules! with_view {
    ($(#[$meta:meta])* $name:ident => $method:ident) => {
        $(#[$meta])*
        ///
        /// # Safety
        ///
        /// - `cipher` must be a live handle.
        /// - `data` must be valid for reads of `cap` bytes.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(
            cipher: *mut CshimCipher,
            data: *const u8,
            cap: usize,
            off: isize,
            len: isize,
        ) -> c_int {
            guard(stringify!($name), || {
                // SAFETY: See the function's safety docs.
                let cipher = unsafe { args::handle_mut("cipher", cipher) }?;
                // SAFETY: See the function's safety docs.
                let data = unsafe { args::view(data, cap, off, len) }?;
                Ok(cipher.$method(&data)?)
            })
        }
    };
}

with_view! {
    /// Binds the viewed key.
    cshim_cipher_set_key => set_key
}

with_view! {
    /// Binds the viewed associated data for the next message.
    cshim_cipher_set_associated_data => set_associated_data
}

with_view! {
    /// Binds the viewed nonce and starts a message.
    cshim_cipher_start => start
}

macro_rules! process {
    ($(#[$meta:meta])* $name:ident => $method:ident) => {
        $(#[$meta])*
        ///
        /// # Safety
        ///
        /// - `cipher` must be a live handle.
        /// - `out` must be valid for writes of `out_cap` bytes.
        /// - `input` must be valid for reads of `in_cap` bytes.
        /// - The two buffers must not overlap.
        #[allow(clippy::too_many_arguments)]
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(
            cipher: *mut CshimCipher,
            out: *mut u8,
            out_cap: usize,
            out_off: isize,
            out_len: isize,
            input: *const u8,
            in_cap: usize,
            in_off: isize,
            in_len: isize,
        ) -> isize {
            guard_count(stringify!($name), || {
                // SAFETY: See the function's safety docs.
                let cipher = unsafe { args::handle_mut("cipher", cipher) }?;
                // SAFETY: See the function's safety docs.
                let mut out = unsafe { args::view_mut(out, out_cap, out_off, out_len) }?;
                // SAFETY: See the function's safety docs.
                let input = unsafe { args::view(input, in_cap, in_off, in_len) }?;
                Ok(cipher.$method(&mut out, &input)?)
            })
        }
    };
}

process! {
    /// Processes the input view, a non-zero multiple of the
    /// update granularity, into the output view. Returns the
    /// bytes written, or a negative status.
    cshim_cipher_update => update
}

process! {
    /// Processes the final input view into the output view,
    /// which must hold `cshim_cipher_output_length(in_len)`
    /// bytes. Returns the bytes written, or a negative status.
    cshim_cipher_finish => finish
}

macro_rules! getter {
    ($(#[$meta:meta])* $name:ident => $method:ident) => {
        $(#[$meta])*
        ///
        /// # Safety
        ///
        /// `cipher` must be a live handle.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(cipher: *const CshimCipher) -> isize {
            guard_count(stringify!($name), || {
                // SAFETY: See the function's safety docs.
                let cipher = unsafe { args::handle("cipher", cipher) }?;
                Ok(cipher.$method()?)
            })
        }
    };
}

getter! {
    /// Returns the tag length, or a negative status.
    cshim_cipher_tag_length => tag_length
}

getter! {
    /// Returns the default nonce length, or a negative status.
    cshim_cipher_default_nonce_length => default_nonce_length
}

getter! {
    /// Returns the update granularity, or a negative status.
    cshim_cipher_update_granularity => update_granularity
}

getter! {
    /// Returns the preferred update size, or a negative status.
    cshim_cipher_ideal_update_granularity => ideal_update_granularity
}

getter! {
    /// Returns the least input `cshim_cipher_finish` accepts, or
    /// a negative status.
    cshim_cipher_minimum_final_size => minimum_final_size
}

/// Returns the largest output `cshim_cipher_finish` can produce
/// for `in_len` input bytes, or a negative status.
///
/// # Safety
///
/// `cipher` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_cipher_output_length(
    cipher: *const CshimCipher,
    in_len: usize,
) -> isize {
    guard_count("cshim_cipher_output_length", || {
        // SAFETY: See the function's safety docs.
        let cipher = unsafe { args::handle("cipher", cipher) }?;
        Ok(cipher.output_length(in_len)?)
    })
}

/// Returns 1 if `len` is an acceptable nonce length, 0 if not,
/// or a negative status.
///
/// # Safety
///
/// `cipher` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_cipher_valid_nonce_length(
    cipher: *const CshimCipher,
    len: usize,
) -> c_int {
    let mut valid = false;
    let code = guard("cshim_cipher_valid_nonce_length", || {
        // SAFETY: See the function's safety docs.
        let cipher = unsafe { args::handle("cipher", cipher) }?;
        valid = cipher.valid_nonce_length(len)?;
        Ok(())
    });
    if code == 0 { c_int::from(valid) } else { code }
}

/// Stores the accepted key lengths.
///
/// # Safety
///
/// - `cipher` must be a live handle.
/// - `min`, `max` and `modulo` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_cipher_get_keyspec(
    cipher: *const CshimCipher,
    min: *mut usize,
    max: *mut usize,
    modulo: *mut usize,
) -> c_int {
    guard("cshim_cipher_get_keyspec", || {
        // SAFETY: See the function's safety docs.
        let cipher = unsafe { args::handle("cipher", cipher) }?;
        // SAFETY: See the function's safety docs.
        unsafe { store_keyspec(cipher.keyspec()?, min, max, modulo) }
    })
}

/// Writes the NUL-terminated algorithm name into the output view
/// and returns its length without the terminator, or a negative
/// status.
///
/// # Safety
///
/// - `cipher` must be a live handle.
/// - `out` must be valid for writes of `cap` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_cipher_name(
    cipher: *const CshimCipher,
    out: *mut u8,
    cap: usize,
    off: isize,
    len: isize,
) -> isize {
    guard_count("cshim_cipher_name", || {
        // SAFETY: See the function's safety docs.
        let cipher = unsafe { args::handle("cipher", cipher) }?;
        // SAFETY: See the function's safety docs.
        let mut out = unsafe { args::view_mut(out, cap, off, len) }?;
        args::write_name(&mut out, &cipher.name()?)
    })
}

/// Abandons the current message. The key is kept.
///
/// # Safety
///
/// `cipher` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_cipher_reset(cipher: *mut CshimCipher) -> c_int {
    guard("cshim_cipher_reset", || {
        // SAFETY: See the function's safety docs.
        let cipher = unsafe { args::handle_mut("cipher", cipher) }?;
        Ok(cipher.reset()?)
    })
}

/// Removes the key and abandons the current message.
///
/// # Safety
///
/// `cipher` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_cipher_clear(cipher: *mut CshimCipher) -> c_int {
    guard("cshim_cipher_clear", || {
        // SAFETY: See the function's safety docs.
        let cipher = unsafe { args::handle_mut("cipher", cipher) }?;
        Ok(cipher.clear()?)
    })
}
