use core::ffi::c_int;

use cshim::{Rng, RngKind};

use crate::{
    args::{self, guard},
    error::InvalidArg,
};

/// An RNG handle.
pub type CshimRng = Rng;

/// The operating system's RNG.
pub const CSHIM_RNG_SYSTEM: u32 = 0;
/// A userspace CSPRNG that accepts injected entropy.
pub const CSHIM_RNG_USER: u32 = 1;

/// Creates an RNG of the given kind.
///
/// # Safety
///
/// `out` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_rng_init(out: *mut *mut CshimRng, kind: u32) -> c_int {
    guard("cshim_rng_init", || {
        let kind = match kind {
            CSHIM_RNG_SYSTEM => RngKind::System,
            CSHIM_RNG_USER => RngKind::User,
            _ => return Err(InvalidArg::new("kind", "unknown RNG kind").into()),
        };
        let rng = Rng::new(kind)?;
        // SAFETY: See the function's safety docs.
        unsafe { args::init(out, rng) }
    })
}

/// Releases an RNG. Null is ignored.
///
/// # Safety
///
/// `rng` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_rng_destroy(rng: *mut CshimRng) -> c_int {
    // SAFETY: See the function's safety docs.
    unsafe { args::destroy(rng) };
    0
}

/// Mixes the viewed bytes into the RNG.
///
/// # Safety
///
/// - `rng` must be a live handle.
/// - `seed` must be valid for reads of `cap` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_rng_add_entropy(
    rng: *mut CshimRng,
    seed: *const u8,
    cap: usize,
    off: isize,
    len: isize,
) -> c_int {
    guard("cshim_rng_add_entropy", || {
        // SAFETY: See the function's safety docs.
        let rng = unsafe { args::handle_mut("rng", rng) }?;
        // SAFETY: See the function's safety docs.
        let seed = unsafe { args::view(seed, cap, off, len) }?;
        Ok(rng.add_entropy(&seed)?)
    })
}

/// Fills the viewed bytes with random data.
///
/// # Safety
///
/// - `rng` must be a live handle.
/// - `out` must be valid for writes of `cap` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn cshim_rng_get(
    rng: *mut CshimRng,
    out: *mut u8,
    cap: usize,
    off: isize,
    len: isize,
) -> c_int {
    guard("cshim_rng_get", || {
        // SAFETY: See the function's safety docs.
        let rng = unsafe { args::handle_mut("rng", rng) }?;
        // SAFETY: See the function's safety docs.
        let mut out = unsafe { args::view_mut(out, cap, off, len) }?;
        Ok(rng.fill(&mut out)?)
    })
}
