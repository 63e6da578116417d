use core::ffi::CStr;

use cshim_engine as eng;
use tracing::instrument;

use crate::{
    error::Result,
    handle::{Handle, kind},
    status,
};

/// Selects an engine RNG.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RngKind {
    /// The operating system's RNG.
    System,
    /// A userspace CSPRNG seeded from the system RNG. It accepts
    /// injected entropy.
    User,
}

impl RngKind {
    fn name(self) -> &'static CStr {
        match self {
            Self::System => c"system",
            Self::User => c"user",
        }
    }
}

/// An engine RNG.
///
/// It is passed by `&mut` into every call that consumes
/// randomness and is never stored by this crate.
#[derive(Debug)]
pub struct Rng {
    handle: Handle<kind::Rng>,
}

impl Rng {
    /// Creates an RNG.
    #[instrument(skip_all, fields(?kind))]
    pub fn new(kind: RngKind) -> Result<Self> {
        let handle = Handle::init("eng_rng_init", |out| {
            // SAFETY: FFI call, `out` is valid and the name is
            // NUL-terminated.
            unsafe { eng::eng_rng_init(out, kind.name().as_ptr()) }
        })?;
        Ok(Self { handle })
    }

    /// Mixes `seed` into the RNG's state.
    pub fn add_entropy(&mut self, seed: &[u8]) -> Result<()> {
        // SAFETY: FFI call, the handle is live and `seed` is
        // valid for its length.
        let code =
            unsafe { eng::eng_rng_add_entropy(self.handle.as_ptr(), seed.as_ptr(), seed.len()) };
        status::check("eng_rng_add_entropy", code)
    }

    /// Fills `out` with random bytes.
    pub fn fill(&mut self, out: &mut [u8]) -> Result<()> {
        // SAFETY: FFI call, the handle is live and `out` is valid
        // for its length.
        let code = unsafe { eng::eng_rng_get(self.handle.as_ptr(), out.as_mut_ptr(), out.len()) };
        status::check("eng_rng_get", code)
    }

    pub(crate) fn as_ptr(&mut self) -> eng::eng_rng_t {
        self.handle.as_ptr()
    }
}
