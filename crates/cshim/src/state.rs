use core::fmt;

use tracing::warn;

/// The state of a streaming operation.
///
/// | State | Entered via | Valid next calls |
/// |---|---|---|
/// | `Fresh` | creation | `set_key`, or `update` for hashes and signatures |
/// | `KeyBound` | `set_key` | `start` (cipher), `update` (MAC) |
/// | `Started` | `start` | `update`, `finish` |
/// | `Accumulating` | `update` | `update`, `finish` |
/// | `Finished` | `finish` | `clear`/`reset`, or drop the handle |
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum State {
    /// Nothing has been bound.
    Fresh,
    /// A key is bound.
    KeyBound,
    /// A nonce is bound.
    Started,
    /// At least one update was made.
    Accumulating,
    /// The operation produced its result.
    Finished,
}

impl State {
    /// Fails unless the current state is one of `allowed`.
    pub(crate) fn require(self, op: &'static str, allowed: &[Self]) -> Result<(), BadState> {
        if allowed.contains(&self) {
            Ok(())
        } else {
            warn!(op, state = %self, "rejected out-of-order call");
            Err(BadState { op, state: self })
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fresh => "fresh",
            Self::KeyBound => "key-bound",
            Self::Started => "started",
            Self::Accumulating => "accumulating",
            Self::Finished => "finished",
        };
        f.write_str(s)
    }
}

/// A call was made in a state that does not allow it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("`{op}` is not allowed in the {state} state")]
pub struct BadState {
    /// The rejected call.
    pub op: &'static str,
    /// The state at the time of the call.
    pub state: State,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require() {
        assert!(State::Started.require("update", &[State::Started]).is_ok());
        let err = State::Fresh
            .require("update", &[State::Started, State::Accumulating])
            .unwrap_err();
        assert_eq!(err.state, State::Fresh);
        assert_eq!(err.to_string(), "`update` is not allowed in the fresh state");
    }
}
