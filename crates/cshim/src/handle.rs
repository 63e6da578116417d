//! Owned engine handles.
//!
//! This is the one place where engine objects are acquired and
//! released. The adapters only borrow the raw pointer for the
//! duration of a call.

use core::{ffi::c_int, fmt, marker::PhantomData, ptr, ptr::NonNull};

use buggy::BugExt as _;
use tracing::error;

use crate::{error::Error, status};

/// The kind of engine object behind a [`Handle`].
pub(crate) trait Kind {
    /// The engine's object type.
    type Raw;
    /// Used in log messages.
    const NAME: &'static str;

    /// Releases `raw`.
    ///
    /// # Safety
    ///
    /// `raw` must be a live engine object that is not used
    /// afterward.
    unsafe fn destroy(raw: *mut Self::Raw) -> c_int;
}

macro_rules! kinds {
    ($($(#[$meta:meta])* $name:ident => $raw:ty, $destroy:path;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug)]
            pub(crate) enum $name {}

            impl $crate::handle::Kind for $name {
                type Raw = $raw;
                const NAME: &'static str = stringify!($name);

                unsafe fn destroy(raw: *mut Self::Raw) -> ::core::ffi::c_int {
                    // SAFETY: See the trait's safety docs.
                    unsafe { $destroy(raw) }
                }
            }
        )*
    };
}

/// Handle kinds, one per engine object type.
pub(crate) mod kind {
    use cshim_engine as eng;

    kinds! {
        BlockCipher => eng::eng_block_cipher_struct, eng::eng_block_cipher_destroy;
        Cipher => eng::eng_cipher_struct, eng::eng_cipher_destroy;
        Hash => eng::eng_hash_struct, eng::eng_hash_destroy;
        Mac => eng::eng_mac_struct, eng::eng_mac_destroy;
        Mp => eng::eng_mp_struct, eng::eng_mp_destroy;
        PrivKey => eng::eng_privkey_struct, eng::eng_privkey_destroy;
        PubKey => eng::eng_pubkey_struct, eng::eng_pubkey_destroy;
        Rng => eng::eng_rng_struct, eng::eng_rng_destroy;
        Sign => eng::eng_pk_op_sign_struct, eng::eng_pk_op_sign_destroy;
        Verify => eng::eng_pk_op_verify_struct, eng::eng_pk_op_verify_destroy;
    }
}

/// An owned engine object of kind `K`.
///
/// The kind parameter keeps a hash handle from being passed
/// where a cipher handle is expected.
pub(crate) struct Handle<K: Kind> {
    ptr: NonNull<K::Raw>,
    _kind: PhantomData<K>,
}

// SAFETY: Engine objects do not use thread-local state, and every
// call that advances one takes `&mut self`.
unsafe impl<K: Kind> Send for Handle<K> {}

impl<K: Kind> Handle<K> {
    /// Acquires an object through `init`, which receives the
    /// engine's out-parameter.
    pub(crate) fn init<F>(op: &'static str, init: F) -> Result<Self, Error>
    where
        F: FnOnce(*mut *mut K::Raw) -> c_int,
    {
        let mut raw = ptr::null_mut();
        status::check(op, init(&mut raw))?;
        let ptr = NonNull::new(raw).assume("engine returned a null handle")?;
        Ok(Self {
            ptr,
            _kind: PhantomData,
        })
    }

    /// Returns the raw engine pointer.
    pub(crate) fn as_ptr(&self) -> *mut K::Raw {
        self.ptr.as_ptr()
    }
}

impl<K: Kind> Drop for Handle<K> {
    fn drop(&mut self) {
        // SAFETY: `ptr` came from the engine in `init` and is
        // released exactly once.
        let code = unsafe { K::destroy(self.ptr.as_ptr()) };
        if code != 0 {
            error!(kind = K::NAME, code, "unable to release engine handle");
        }
    }
}

impl<K: Kind> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:p})", K::NAME, self.ptr)
    }
}
