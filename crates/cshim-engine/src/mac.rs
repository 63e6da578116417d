use core::ffi::{c_char, c_int};

use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};

use crate::{
    names::{HashAlgo, wrapped},
    obj::{
        check_flags, create, cstr, destroy, get, guard, input, object, out_ref, output,
        write_str_output,
    },
    rc::Failure,
};

/// The longest HMAC key accepted.
const MAX_KEY_LEN: usize = 4096;

enum Keyed {
    Sha256(Hmac<Sha256>),
    Sha384(Hmac<Sha384>),
    Sha512(Hmac<Sha512>),
}

impl Keyed {
    fn new(algo: HashAlgo, key: &[u8]) -> Result<Self, Failure> {
        if key.len() > MAX_KEY_LEN {
            return Err(Failure::InvalidKeyLength(key.len()));
        }
        let err = |_| Failure::InvalidKeyLength(key.len());
        let mac = match algo {
            HashAlgo::Sha256 => Self::Sha256(Hmac::new_from_slice(key).map_err(err)?),
            HashAlgo::Sha384 => Self::Sha384(Hmac::new_from_slice(key).map_err(err)?),
            HashAlgo::Sha512 => Self::Sha512(Hmac::new_from_slice(key).map_err(err)?),
            HashAlgo::Sha512_256 => return Err(Failure::Internal("unsupported HMAC hash")),
        };
        Ok(mac)
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(m) => m.update(data),
            Self::Sha384(m) => m.update(data),
            Self::Sha512(m) => m.update(data),
        }
    }

    fn finalize_into_reset(&mut self, out: &mut [u8]) {
        match self {
            Self::Sha256(m) => out.copy_from_slice(&m.finalize_reset().into_bytes()),
            Self::Sha384(m) => out.copy_from_slice(&m.finalize_reset().into_bytes()),
            Self::Sha512(m) => out.copy_from_slice(&m.finalize_reset().into_bytes()),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Sha256(m) => Mac::reset(m),
            Self::Sha384(m) => Mac::reset(m),
            Self::Sha512(m) => Mac::reset(m),
        }
    }
}

pub(crate) struct MacState {
    algo: HashAlgo,
    keyed: Option<Keyed>,
}

impl MacState {
    fn name(&self) -> String {
        format!("HMAC({})", self.algo.name())
    }

    fn output_length(&self) -> usize {
        match self.algo {
            HashAlgo::Sha256 => 32,
            HashAlgo::Sha384 => 48,
            HashAlgo::Sha512 | HashAlgo::Sha512_256 => 64,
        }
    }

    fn keyed(&mut self) -> Result<&mut Keyed, Failure> {
        self.keyed.as_mut().ok_or(Failure::KeyNotSet)
    }
}

object! {
    /// A message authentication code.
    eng_mac_struct(MacState) = 0xa06e_8fc5
}

/// An opaque MAC handle.
pub type eng_mac_t = *mut eng_mac_struct;

/// Creates a MAC object, for example `HMAC(SHA-256)`.
///
/// # Safety
///
/// - `mac` must be valid for writes.
/// - `name` must be a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mac_init(
    mac: *mut eng_mac_t,
    name: *const c_char,
    flags: u32,
) -> c_int {
    guard("eng_mac_init", || {
        check_flags(flags, 0)?;
        // SAFETY: See the function's safety docs.
        let name = unsafe { cstr(name) }?;
        let algo = wrapped(name, "HMAC")
            .and_then(HashAlgo::from_name)
            .filter(|algo| *algo != HashAlgo::Sha512_256)
            .ok_or_else(|| Failure::unknown(name))?;
        // SAFETY: See the function's safety docs.
        unsafe { create(mac, MacState { algo, keyed: None }) }
    })
}

/// Releases a MAC object.
///
/// # Safety
///
/// `mac` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mac_destroy(mac: eng_mac_t) -> c_int {
    // SAFETY: See the function's safety docs.
    guard("eng_mac_destroy", || unsafe { destroy(mac) })
}

/// Binds a key, discarding any absorbed input.
///
/// # Safety
///
/// - `mac` must be a live handle.
/// - `key` must be valid for reads of `key_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mac_set_key(mac: eng_mac_t, key: *const u8, key_len: usize) -> c_int {
    guard("eng_mac_set_key", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(mac) }?;
        // SAFETY: See the function's safety docs.
        let key = unsafe { input(key, key_len) }?;
        state.keyed = Some(Keyed::new(state.algo, key)?);
        Ok(())
    })
}

/// Absorbs `len` bytes.
///
/// # Safety
///
/// - `mac` must be a live handle.
/// - `buf` must be valid for reads of `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mac_update(mac: eng_mac_t, buf: *const u8, len: usize) -> c_int {
    guard("eng_mac_update", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(mac) }?;
        // SAFETY: See the function's safety docs.
        let buf = unsafe { input(buf, len) }?;
        state.keyed()?.update(buf);
        Ok(())
    })
}

/// Writes the tag to `out` and resets the absorbed input. The
/// key is kept.
///
/// # Safety
///
/// - `mac` must be a live handle.
/// - `out` must be valid for writes of the output length.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mac_final(mac: eng_mac_t, out: *mut u8) -> c_int {
    guard("eng_mac_final", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(mac) }?;
        let len = state.output_length();
        let keyed = state.keyed()?;
        // SAFETY: See the function's safety docs.
        let out = unsafe { output(out, len) }?;
        keyed.finalize_into_reset(out);
        Ok(())
    })
}

/// Discards any absorbed input. The key is kept.
///
/// # Safety
///
/// `mac` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mac_clear(mac: eng_mac_t) -> c_int {
    guard("eng_mac_clear", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(mac) }?;
        if let Some(keyed) = state.keyed.as_mut() {
            keyed.reset();
        }
        Ok(())
    })
}

/// Writes the algorithm name using the length-query protocol.
///
/// # Safety
///
/// - `mac` must be a live handle.
/// - `name` must be valid for writes of `*name_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mac_name(
    mac: eng_mac_t,
    name: *mut c_char,
    name_len: *mut usize,
) -> c_int {
    guard("eng_mac_name", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(mac) }?;
        // SAFETY: See the function's safety docs.
        unsafe { write_str_output(name, name_len, &state.name()) }
    })
}

/// Stores the minimum and maximum key lengths and the key length
/// modulus.
///
/// # Safety
///
/// - `mac` must be a live handle.
/// - The out-parameters must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mac_get_keyspec(
    mac: eng_mac_t,
    min_keylen: *mut usize,
    max_keylen: *mut usize,
    mod_keylen: *mut usize,
) -> c_int {
    guard("eng_mac_get_keyspec", || {
        // SAFETY: See the function's safety docs.
        unsafe { get(mac) }?;
        // SAFETY: See the function's safety docs.
        unsafe {
            *out_ref(min_keylen)? = 0;
            *out_ref(max_keylen)? = MAX_KEY_LEN;
            *out_ref(mod_keylen)? = 1;
        }
        Ok(())
    })
}

/// Stores the tag size in bytes.
///
/// # Safety
///
/// - `mac` must be a live handle.
/// - `out` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_mac_output_length(mac: eng_mac_t, out: *mut usize) -> c_int {
    guard("eng_mac_output_length", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(mac) }?;
        // SAFETY: See the function's safety docs.
        *unsafe { out_ref(out) }? = state.output_length();
        Ok(())
    })
}
