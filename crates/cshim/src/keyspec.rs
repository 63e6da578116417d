/// The key lengths an algorithm accepts.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct KeySpec {
    /// The shortest key, in bytes.
    pub min: usize,
    /// The longest key, in bytes.
    pub max: usize,
    /// Key lengths must be a multiple of this.
    pub modulo: usize,
}

impl KeySpec {
    /// Reports whether a key of `len` bytes is acceptable.
    pub fn accepts(&self, len: usize) -> bool {
        (self.min..=self.max).contains(&len) && len.checked_rem(self.modulo) == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts() {
        let spec = KeySpec {
            min: 16,
            max: 32,
            modulo: 8,
        };
        assert!(spec.accepts(16));
        assert!(spec.accepts(24));
        assert!(!spec.accepts(20));
        assert!(!spec.accepts(40));

        let any = KeySpec {
            min: 0,
            max: 4096,
            modulo: 1,
        };
        assert!(any.accepts(0));
        assert!(any.accepts(4096));
    }
}
