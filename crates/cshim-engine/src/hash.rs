use core::ffi::{c_char, c_int};

use sha2::digest::DynDigest;

use crate::{
    names::HashAlgo,
    obj::{
        check_flags, create, cstr, destroy, get, guard, input, object, out_ref, output,
        write_str_output,
    },
    rc::Failure,
};

pub(crate) struct HashState {
    algo: HashAlgo,
    digest: Box<dyn DynDigest + Send>,
}

object! {
    /// A hash function.
    eng_hash_struct(HashState) = 0x1f0a_4f84
}

/// An opaque hash handle.
pub type eng_hash_t = *mut eng_hash_struct;

/// Creates a hash object.
///
/// # Safety
///
/// - `hash` must be valid for writes.
/// - `name` must be a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_hash_init(
    hash: *mut eng_hash_t,
    name: *const c_char,
    flags: u32,
) -> c_int {
    guard("eng_hash_init", || {
        check_flags(flags, 0)?;
        // SAFETY: See the function's safety docs.
        let name = unsafe { cstr(name) }?;
        let algo = HashAlgo::from_name(name).ok_or_else(|| Failure::unknown(name))?;
        let state = HashState {
            algo,
            digest: algo.digest(),
        };
        // SAFETY: See the function's safety docs.
        unsafe { create(hash, state) }
    })
}

/// Releases a hash object.
///
/// # Safety
///
/// `hash` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_hash_destroy(hash: eng_hash_t) -> c_int {
    // SAFETY: See the function's safety docs.
    guard("eng_hash_destroy", || unsafe { destroy(hash) })
}

/// Writes the algorithm name using the length-query protocol.
///
/// # Safety
///
/// - `hash` must be a live handle.
/// - `name` must be valid for writes of `*name_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_hash_name(
    hash: eng_hash_t,
    name: *mut c_char,
    name_len: *mut usize,
) -> c_int {
    guard("eng_hash_name", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(hash) }?;
        // SAFETY: See the function's safety docs.
        unsafe { write_str_output(name, name_len, state.algo.name()) }
    })
}

/// Stores the digest size in bytes.
///
/// # Safety
///
/// - `hash` must be a live handle.
/// - `out` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_hash_output_length(hash: eng_hash_t, out: *mut usize) -> c_int {
    guard("eng_hash_output_length", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(hash) }?;
        // SAFETY: See the function's safety docs.
        *unsafe { out_ref(out) }? = state.digest.output_size();
        Ok(())
    })
}

/// Stores the internal block size in bytes.
///
/// # Safety
///
/// - `hash` must be a live handle.
/// - `out` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_hash_block_size(hash: eng_hash_t, out: *mut usize) -> c_int {
    guard("eng_hash_block_size", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(hash) }?;
        // SAFETY: See the function's safety docs.
        *unsafe { out_ref(out) }? = state.algo.block_size();
        Ok(())
    })
}

/// Absorbs `len` bytes.
///
/// # Safety
///
/// - `hash` must be a live handle.
/// - `data` must be valid for reads of `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_hash_update(hash: eng_hash_t, data: *const u8, len: usize) -> c_int {
    guard("eng_hash_update", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(hash) }?;
        // SAFETY: See the function's safety docs.
        let data = unsafe { input(data, len) }?;
        state.digest.update(data);
        Ok(())
    })
}

/// Writes the digest to `out` and resets the object.
///
/// # Safety
///
/// - `hash` must be a live handle.
/// - `out` must be valid for writes of the digest size.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_hash_final(hash: eng_hash_t, out: *mut u8) -> c_int {
    guard("eng_hash_final", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(hash) }?;
        // SAFETY: See the function's safety docs.
        let out = unsafe { output(out, state.digest.output_size()) }?;
        state
            .digest
            .finalize_into_reset(out)
            .map_err(|_| Failure::Internal("digest size mismatch"))
    })
}

/// Discards any absorbed input.
///
/// # Safety
///
/// `hash` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_hash_clear(hash: eng_hash_t) -> c_int {
    guard("eng_hash_clear", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(hash) }?;
        state.digest.reset();
        Ok(())
    })
}
