//! Algorithm name parsing.

use sha2::{Sha256, Sha384, Sha512, Sha512_256, digest::DynDigest};

/// Strips `prefix(` and `)` from `name`.
///
/// `wrapped("HMAC(SHA-256)", "HMAC")` is `Some("SHA-256")`.
pub(crate) fn wrapped<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    name.strip_prefix(prefix)?
        .strip_prefix('(')?
        .strip_suffix(')')
}

/// A hash function known to the engine.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum HashAlgo {
    Sha256,
    Sha384,
    Sha512,
    Sha512_256,
}

impl HashAlgo {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        let algo = match name {
            "SHA-256" | "SHA2-256" => Self::Sha256,
            "SHA-384" | "SHA2-384" => Self::Sha384,
            "SHA-512" | "SHA2-512" => Self::Sha512,
            "SHA-512-256" | "SHA-512/256" => Self::Sha512_256,
            _ => return None,
        };
        Some(algo)
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
            Self::Sha512_256 => "SHA-512-256",
        }
    }

    pub(crate) fn block_size(self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha384 | Self::Sha512 | Self::Sha512_256 => 128,
        }
    }

    pub(crate) fn digest(self) -> Box<dyn DynDigest + Send> {
        match self {
            Self::Sha256 => Box::new(Sha256::default()),
            Self::Sha384 => Box::new(Sha384::default()),
            Self::Sha512 => Box::new(Sha512::default()),
            Self::Sha512_256 => Box::new(Sha512_256::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped() {
        assert_eq!(wrapped("HMAC(SHA-256)", "HMAC"), Some("SHA-256"));
        assert_eq!(wrapped("HKDF(SHA-512)", "HKDF"), Some("SHA-512"));
        assert_eq!(wrapped("HMAC(SHA-256", "HMAC"), None);
        assert_eq!(wrapped("HMACSHA-256)", "HMAC"), None);
        assert_eq!(wrapped("HKDF(SHA-256)", "HMAC"), None);
    }

    #[test]
    fn test_hash_names() {
        for algo in [
            HashAlgo::Sha256,
            HashAlgo::Sha384,
            HashAlgo::Sha512,
            HashAlgo::Sha512_256,
        ] {
            assert_eq!(HashAlgo::from_name(algo.name()), Some(algo));
        }
        assert_eq!(HashAlgo::from_name("MD5"), None);
    }
}
