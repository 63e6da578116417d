//! Keyed message authentication codes.
//!
//! [`Mac::clear`] keeps the bound key, so one key can
//! authenticate several messages.

use alloc::{string::String, vec, vec::Vec};
use core::ffi::CStr;

use cshim_engine as eng;
use tracing::instrument;

use crate::{
    error::{BufferTooSmall, Result},
    handle::{Handle, kind},
    keyspec::KeySpec,
    query,
    state::State,
    status,
};

/// A streaming MAC.
#[derive(Debug)]
pub struct Mac {
    handle: Handle<kind::Mac>,
    state: State,
    keyed: bool,
}

impl Mac {
    /// Creates a MAC, e.g. `HMAC(SHA-256)`.
    #[instrument(skip_all, fields(?name))]
    pub fn new(name: &CStr) -> Result<Self> {
        let handle = Handle::init("eng_mac_init", |out| {
            // SAFETY: FFI call, `out` is valid for writes and
            // `name` is NUL-terminated.
            unsafe { eng::eng_mac_init(out, name.as_ptr(), 0) }
        })?;
        Ok(Self {
            handle,
            state: State::Fresh,
            keyed: false,
        })
    }

    /// The current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Binds `key` and starts a new message.
    pub fn set_key(&mut self, key: &[u8]) -> Result<()> {
        // SAFETY: FFI call, the handle is live and `key` is valid
        // for its length.
        let code = unsafe { eng::eng_mac_set_key(self.handle.as_ptr(), key.as_ptr(), key.len()) };
        status::check("eng_mac_set_key", code)?;
        self.keyed = true;
        self.state = State::KeyBound;
        Ok(())
    }

    /// Absorbs `data`.
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        self.state
            .require("update", &[State::KeyBound, State::Accumulating])?;
        // SAFETY: FFI call, the handle is live and `data` is
        // valid for its length.
        let code = unsafe { eng::eng_mac_update(self.handle.as_ptr(), data.as_ptr(), data.len()) };
        status::check("eng_mac_update", code)?;
        self.state = State::Accumulating;
        Ok(())
    }

    /// Writes the tag into the start of `out` and returns its
    /// length.
    pub fn final_into(&mut self, out: &mut [u8]) -> Result<usize> {
        self.state
            .require("final", &[State::KeyBound, State::Accumulating])?;
        let n = self.output_length()?;
        let have = out.len();
        let dst = out.get_mut(..n).ok_or(BufferTooSmall { need: n, have })?;
        // SAFETY: FFI call, the handle is live and `dst` holds
        // `output_length` bytes.
        let code = unsafe { eng::eng_mac_final(self.handle.as_ptr(), dst.as_mut_ptr()) };
        status::check("eng_mac_final", code)?;
        self.state = State::Finished;
        Ok(n)
    }

    /// Returns the tag.
    pub fn finalize(&mut self) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.output_length()?];
        self.final_into(&mut out)?;
        Ok(out)
    }

    /// Discards absorbed data. The key is kept.
    pub fn clear(&mut self) -> Result<()> {
        // SAFETY: FFI call, the handle is live.
        let code = unsafe { eng::eng_mac_clear(self.handle.as_ptr()) };
        status::check("eng_mac_clear", code)?;
        self.state = if self.keyed {
            State::KeyBound
        } else {
            State::Fresh
        };
        Ok(())
    }

    /// The tag size in bytes.
    pub fn output_length(&self) -> Result<usize> {
        let mut n = 0;
        // SAFETY: FFI call, the handle is live and `n` is valid
        // for writes.
        let code = unsafe { eng::eng_mac_output_length(self.handle.as_ptr(), &mut n) };
        status::check("eng_mac_output_length", code)?;
        Ok(n)
    }

    /// The algorithm name.
    pub fn name(&self) -> Result<String> {
        query::string("eng_mac_name", |out, out_len| {
            // SAFETY: FFI call, the handle is live and `out` is
            // valid for `*out_len` bytes.
            unsafe { eng::eng_mac_name(self.handle.as_ptr(), out.cast(), out_len) }
        })
    }

    /// The accepted key lengths.
    pub fn keyspec(&self) -> Result<KeySpec> {
        let (mut min, mut max, mut modulo) = (0, 0, 0);
        // SAFETY: FFI call, the handle is live and the
        // out-parameters are valid for writes.
        let code = unsafe {
            eng::eng_mac_get_keyspec(self.handle.as_ptr(), &mut min, &mut max, &mut modulo)
        };
        status::check("eng_mac_get_keyspec", code)?;
        Ok(KeySpec { min, max, modulo })
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::{
        codec::{Case, hex_encode_to_string},
        error::ErrorKind,
    };

    // RFC 4231, test case 2.
    const TAG: &str = "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843";

    fn tag(mac: &mut Mac) -> String {
        hex_encode_to_string(&mac.finalize().unwrap(), Case::Lower).unwrap()
    }

    #[test]
    fn test_rfc4231() {
        let mut mac = Mac::new(c"HMAC(SHA-256)").unwrap();
        mac.set_key(b"Jefe").unwrap();
        mac.update(b"what do ya want ").unwrap();
        mac.update(b"for nothing?").unwrap();
        assert_eq!(tag(&mut mac), TAG);
        assert_eq!(mac.state(), State::Finished);
    }

    #[test]
    fn test_clear_keeps_key() {
        let mut mac = Mac::new(c"HMAC(SHA-256)").unwrap();
        mac.set_key(b"Jefe").unwrap();
        mac.update(b"garbage").unwrap();
        mac.clear().unwrap();
        assert_eq!(mac.state(), State::KeyBound);
        mac.update(b"what do ya want for nothing?").unwrap();
        assert_eq!(tag(&mut mac), TAG);

        let err = mac.update(b"more").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadState);
        mac.clear().unwrap();
        mac.update(b"what do ya want for nothing?").unwrap();
        assert_eq!(tag(&mut mac), TAG);
    }

    #[test]
    fn test_order() {
        let mut mac = Mac::new(c"HMAC(SHA-384)").unwrap();
        let err = mac.update(b"x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadState);
        mac.clear().unwrap();
        assert_eq!(mac.state(), State::Fresh);
        let err = mac.final_into(&mut [0; 48]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadState);
    }

    #[test]
    fn test_metadata() {
        let mac = Mac::new(c"HMAC(SHA-512)").unwrap();
        assert_eq!(mac.name().unwrap(), "HMAC(SHA-512)");
        assert_eq!(mac.output_length().unwrap(), 64);
        let spec = mac.keyspec().unwrap();
        assert_eq!(spec.modulo, 1);
        assert!(spec.accepts(1));
        assert!(!spec.accepts(spec.max + 1));
    }

    #[test]
    fn test_key_too_long() {
        let mut mac = Mac::new(c"HMAC(SHA-256)").unwrap();
        let max = mac.keyspec().unwrap().max;
        let err = mac.set_key(&vec![0; max + 1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKeyLength);
        assert_eq!(mac.state(), State::Fresh);
    }
}
