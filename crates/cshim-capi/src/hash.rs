use core::ffi::{c_char, c_int};

use cshim::{Hash, KeySpec, Mac};

use crate::args::{self, guard, guard_count};

/// A hash handle.
pub type CshimHash = Hash;

/// A MAC handle.
pub type CshimMac = Mac;

/// Creates a hash, e.g. `SHA-256`.
///
/// # Safety
///
/// - `out` must be valid for writes.
/// - `name` must be a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_hash_init(out: *mut *mut CshimHash, name: *const c_char) -> c_int {
    guard("cshim_hash_init", || {
        // SAFETY: See the function's safety docs.
        let name = unsafe { args::name("name", name) }?;
        let hash = Hash::new(name)?;
        // SAFETY: See the function's safety docs.
        unsafe { args::init(out, hash) }
    })
}

/// Releases a hash. Null is ignored.
///
/// # Safety
///
/// `hash` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_hash_destroy(hash: *mut CshimHash) -> c_int {
    // SAFETY: See the function's safety docs.
    unsafe { args::destroy(hash) };
    0
}

/// Absorbs the viewed bytes.
///
/// # Safety
///
/// - `hash` must be a live handle.
/// - `data` must be valid for reads of `cap` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_hash_update(
    hash: *mut CshimHash,
    data: *const u8,
    cap: usize,
    off: isize,
    len: isize,
) -> c_int {
    guard("cshim_hash_update", || {
        // SAFETY: See the function's safety docs.
        let hash = unsafe { args::handle_mut("hash", hash) }?;
        // SAFETY: See the function's safety docs.
        let data = unsafe { args::view(data, cap, off, len) }?;
        Ok(hash.update(&data)?)
    })
}

/// Writes the digest into the output view and returns its
/// length, or a negative status.
///
/// # Safety
///
/// - `hash` must be a live handle.
/// - `out` must be valid for writes of `cap` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_hash_final(
    hash: *mut CshimHash,
    out: *mut u8,
    cap: usize,
    off: isize,
    len: isize,
) -> isize {
    guard_count("cshim_hash_final", || {
        // SAFETY: See the function's safety docs.
        let hash = unsafe { args::handle_mut("hash", hash) }?;
        // SAFETY: See the function's safety docs.
        let mut out = unsafe { args::view_mut(out, cap, off, len) }?;
        Ok(hash.finish_into(&mut out)?)
    })
}

/// Discards absorbed data.
///
/// # Safety
///
/// `hash` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_hash_clear(hash: *mut CshimHash) -> c_int {
    guard("cshim_hash_clear", || {
        // SAFETY: See the function's safety docs.
        let hash = unsafe { args::handle_mut("hash", hash) }?;
        Ok(hash.clear()?)
    })
}

/// Returns the digest size, or a negative status.
///
/// # Safety
///
/// `hash` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_hash_output_length(hash: *const CshimHash) -> isize {
    guard_count("cshim_hash_output_length", || {
        // SAFETY: See the function's safety docs.
        let hash = unsafe { args::handle("hash", hash) }?;
        Ok(hash.output_length()?)
    })
}

/// Creates a MAC, e.g. `HMAC(SHA-256)`.
///
/// # Safety
///
/// - `out` must be valid for writes.
/// - `name` must be a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_mac_init(out: *mut *mut CshimMac, name: *const c_char) -> c_int {
    guard("cshim_mac_init", || {
        // SAFETY: See the function's safety docs.
        let name = unsafe { args::name("name", name) }?;
        let mac = Mac::new(name)?;
        // SAFETY: See the function's safety docs.
        unsafe { args::init(out, mac) }
    })
}

/// Releases a MAC. Null is ignored.
///
/// # Safety
///
/// `mac` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_mac_destroy(mac: *mut CshimMac) -> c_int {
    // SAFETY: See the function's safety docs.
    unsafe { args::destroy(mac) };
    0
}

/// Binds the viewed key.
///
/// # Safety
///
/// - `mac` must be a live handle.
/// - `key` must be valid for reads of `cap` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_mac_set_key(
    mac: *mut CshimMac,
    key: *const u8,
    cap: usize,
    off: isize,
    len: isize,
) -> c_int {
    guard("cshim_mac_set_key", || {
        // SAFETY: See the function's safety docs.
        let mac = unsafe { args::handle_mut("mac", mac) }?;
        // SAFETY: See the function's safety docs.
        let key = unsafe { args::view(key, cap, off, len) }?;
        Ok(mac.set_key(&key)?)
    })
}

/// Absorbs the viewed bytes.
///
/// # Safety
///
/// - `mac` must be a live handle.
/// - `data` must be valid for reads of `cap` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_mac_update(
    mac: *mut CshimMac,
    data: *const u8,
    cap: usize,
    off: isize,
    len: isize,
) -> c_int {
    guard("cshim_mac_update", || {
        // SAFETY: See the function's safety docs.
        let mac = unsafe { args::handle_mut("mac", mac) }?;
        // SAFETY: See the function's safety docs.
        let data = unsafe { args::view(data, cap, off, len) }?;
        Ok(mac.update(&data)?)
    })
}

/// Writes the tag into the output view and returns its length,
/// or a negative status.
///
/// # Safety
///
/// - `mac` must be a live handle.
/// - `out` must be valid for writes of `cap` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_mac_final(
    mac: *mut CshimMac,
    out: *mut u8,
    cap: usize,
    off: isize,
    len: isize,
) -> isize {
    guard_count("cshim_mac_final", || {
        // SAFETY: See the function's safety docs.
        let mac = unsafe { args::handle_mut("mac", mac) }?;
        // SAFETY: See the function's safety docs.
        let mut out = unsafe { args::view_mut(out, cap, off, len) }?;
        Ok(mac.final_into(&mut out)?)
    })
}

/// Discards absorbed data. The key is kept.
///
/// # Safety
///
/// `mac` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_mac_clear(mac: *mut CshimMac) -> c_int {
    guard("cshim_mac_clear", || {
        // SAFETY: See the function's safety docs.
        let mac = unsafe { args::handle_mut("mac", mac) }?;
        Ok(mac.clear()?)
    })
}

/// Returns the tag size, or a negative status.
///
/// # Safety
///
/// `mac` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_mac_output_length(mac: *const CshimMac) -> isize {
    guard_count("cshim_mac_output_length", || {
        // SAFETY: See the function's safety docs.
        let mac = unsafe { args::handle("mac", mac) }?;
        Ok(mac.output_length()?)
    })
}

/// Writes the NUL-terminated algorithm name into the output view
/// and returns its length without the terminator, or a negative
/// status.
///
/// # Safety
///
/// - `mac` must be a live handle.
/// - `out` must be valid for writes of `cap` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_mac_name(
    mac: *const CshimMac,
    out: *mut u8,
    cap: usize,
    off: isize,
    len: isize,
) -> isize {
    guard_count("cshim_mac_name", || {
        // SAFETY: See the function's safety docs.
        let mac = unsafe { args::handle("mac", mac) }?;
        // SAFETY: See the function's safety docs.
        let mut out = unsafe { args::view_mut(out, cap, off, len) }?;
        args::write_name(&mut out, &mac.name()?)
    })
}

/// Stores the accepted key lengths.
///
/// # Safety
///
/// - `mac` must be a live handle.
/// - `min`, `max` and `modulo` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_mac_get_keyspec(
    mac: *const CshimMac,
    min: *mut usize,
    max: *mut usize,
    modulo: *mut usize,
) -> c_int {
    guard("cshim_mac_get_keyspec", || {
        // SAFETY: See the function's safety docs.
        let mac = unsafe { args::handle("mac", mac) }?;
        // SAFETY: See the function's safety docs.
        unsafe { store_keyspec(mac.keyspec()?, min, max, modulo) }
    })
}

/// Writes `spec` to the out-parameters.
///
/// # Safety
///
/// `min`, `max` and `modulo` must be null or valid for writes.
pub(crate) unsafe fn store_keyspec(
    spec: KeySpec,
    min: *mut usize,
    max: *mut usize,
    modulo: *mut usize,
) -> Result<(), crate::error::Error> {
    // SAFETY: See the function's safety docs.
    unsafe {
        *args::out("min", min)? = spec.min;
        *args::out("max", max)? = spec.max;
        *args::out("modulo", modulo)? = spec.modulo;
    }
    Ok(())
}
