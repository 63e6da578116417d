use core::ffi::{c_char, c_int};

use rand_chacha::ChaCha20Rng;
use rand_core::{CryptoRng, OsRng, RngCore, SeedableRng};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::{
    obj::{create, cstr, destroy, get, guard, input, object, output},
    rc::Failure,
};

/// A random number generator.
pub(crate) enum RngState {
    /// The operating system's generator.
    System,
    /// A userspace generator seeded from the operating system.
    User(ChaCha20Rng),
}

impl RngState {
    fn user() -> Result<Self, Failure> {
        let mut seed = Zeroizing::new([0u8; 32]);
        OsRng
            .try_fill_bytes(&mut seed[..])
            .map_err(|_| Failure::System("unable to read system entropy"))?;
        Ok(Self::User(ChaCha20Rng::from_seed(*seed)))
    }

    /// Mixes `seed` into the generator's state.
    ///
    /// The system generator ignores caller-supplied entropy.
    fn add_entropy(&mut self, seed: &[u8]) {
        if let Self::User(rng) = self {
            let mut state = Zeroizing::new([0u8; 32]);
            rng.fill_bytes(&mut state[..]);
            let mut h = Sha256::new();
            h.update(&state[..]);
            h.update(seed);
            *rng = ChaCha20Rng::from_seed(h.finalize().into());
        }
    }

    fn fill(&mut self, out: &mut [u8]) -> Result<(), Failure> {
        match self {
            Self::System => OsRng
                .try_fill_bytes(out)
                .map_err(|_| Failure::System("unable to read system entropy")),
            Self::User(rng) => {
                rng.fill_bytes(out);
                Ok(())
            }
        }
    }
}

impl RngCore for RngState {
    fn next_u32(&mut self) -> u32 {
        match self {
            Self::System => OsRng.next_u32(),
            Self::User(rng) => rng.next_u32(),
        }
    }

    fn next_u64(&mut self) -> u64 {
        match self {
            Self::System => OsRng.next_u64(),
            Self::User(rng) => rng.next_u64(),
        }
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        match self {
            Self::System => OsRng.fill_bytes(dest),
            Self::User(rng) => rng.fill_bytes(dest),
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        match self {
            Self::System => OsRng.try_fill_bytes(dest),
            Self::User(rng) => rng.try_fill_bytes(dest),
        }
    }
}

impl CryptoRng for RngState {}

object! {
    /// A random number generator.
    eng_rng_struct(RngState) = 0x4901_f9c1
}

/// An opaque RNG handle.
pub type eng_rng_t = *mut eng_rng_struct;

/// Returns the generator behind a live RNG handle.
///
/// # Safety
///
/// See [`get`].
pub(crate) unsafe fn rng_mut<'a>(rng: eng_rng_t) -> Result<&'a mut RngState, Failure> {
    // SAFETY: See the function's safety docs.
    unsafe { get(rng) }
}

/// Creates an RNG.
///
/// `rng_type` is `system` (also the default for null or empty),
/// `user` or `user-threadsafe`.
///
/// # Safety
///
/// - `rng` must be valid for writes.
/// - `rng_type` must be null or a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_rng_init(rng: *mut eng_rng_t, rng_type: *const c_char) -> c_int {
    guard("eng_rng_init", || {
        let kind = if rng_type.is_null() {
            ""
        } else {
            // SAFETY: See the function's safety docs.
            unsafe { cstr(rng_type) }?
        };
        let state = match kind {
            "" | "system" => RngState::System,
            "user" | "user-threadsafe" => RngState::user()?,
            _ => return Err(Failure::unknown(kind)),
        };
        // SAFETY: See the function's safety docs.
        unsafe { create(rng, state) }
    })
}

/// Releases an RNG.
///
/// # Safety
///
/// `rng` must be null or a live handle that is not used
/// afterward.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_rng_destroy(rng: eng_rng_t) -> c_int {
    // SAFETY: See the function's safety docs.
    guard("eng_rng_destroy", || unsafe { destroy(rng) })
}

/// Fills `out` with `len` random bytes.
///
/// # Safety
///
/// - `rng` must be a live handle.
/// - `out` must be valid for writes of `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_rng_get(rng: eng_rng_t, out: *mut u8, len: usize) -> c_int {
    guard("eng_rng_get", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(rng) }?;
        // SAFETY: See the function's safety docs.
        let out = unsafe { output(out, len) }?;
        state.fill(out)
    })
}

/// Mixes `len` caller-supplied bytes into the generator.
///
/// # Safety
///
/// - `rng` must be a live handle.
/// - `seed` must be valid for reads of `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_rng_add_entropy(rng: eng_rng_t, seed: *const u8, len: usize) -> c_int {
    guard("eng_rng_add_entropy", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(rng) }?;
        // SAFETY: See the function's safety docs.
        let seed = unsafe { input(seed, len) }?;
        state.add_entropy(seed);
        Ok(())
    })
}

/// Reseeds a userspace generator from the operating system.
///
/// # Safety
///
/// `rng` must be a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn eng_rng_reseed(rng: eng_rng_t, bits: usize) -> c_int {
    guard("eng_rng_reseed", || {
        // SAFETY: See the function's safety docs.
        let state = unsafe { get(rng) }?;
        let mut seed = Zeroizing::new(vec![0u8; bits.div_ceil(8).max(32)]);
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|_| Failure::System("unable to read system entropy"))?;
        state.add_entropy(&seed);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use core::ptr;

    use super::*;
    use crate::rc::{ERROR_NOT_IMPLEMENTED, SUCCESS};

    fn new_rng(kind: &core::ffi::CStr) -> eng_rng_t {
        let mut rng = ptr::null_mut();
        // SAFETY: FFI call, no invariants.
        assert_eq!(unsafe { eng_rng_init(&mut rng, kind.as_ptr()) }, SUCCESS);
        rng
    }

    #[test]
    fn test_get() {
        for kind in [c"system", c"user", c""] {
            let rng = new_rng(kind);
            let mut a = [0u8; 32];
            let mut b = [0u8; 32];
            // SAFETY: FFI call, no invariants.
            unsafe {
                assert_eq!(eng_rng_get(rng, a.as_mut_ptr(), a.len()), SUCCESS);
                assert_eq!(eng_rng_add_entropy(rng, b"seed".as_ptr(), 4), SUCCESS);
                assert_eq!(eng_rng_get(rng, b.as_mut_ptr(), b.len()), SUCCESS);
                assert_eq!(eng_rng_reseed(rng, 256), SUCCESS);
                eng_rng_destroy(rng);
            }
            assert_ne!(a, b, "{kind:?}");
        }
    }

    #[test]
    fn test_add_entropy_changes_user_stream() {
        let seed = [7u8; 32];
        let mut a = RngState::User(ChaCha20Rng::from_seed(seed));
        let mut b = RngState::User(ChaCha20Rng::from_seed(seed));
        b.add_entropy(b"extra");
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn test_unknown() {
        let mut rng = ptr::null_mut();
        // SAFETY: FFI call, no invariants.
        let rc = unsafe { eng_rng_init(&mut rng, c"rdrand".as_ptr()) };
        assert_eq!(rc, ERROR_NOT_IMPLEMENTED);
    }
}
