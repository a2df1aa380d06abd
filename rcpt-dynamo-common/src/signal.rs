use core::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// The value a hook hands back to the pipeline when it is done with a command.
///
/// `Accept` ends recipient processing for the address in the affirmative.
/// `Continue` defers to whatever stage runs next.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Signal {
    Accept,
    Continue,
}

impl Signal {
    #[inline]
    pub const fn is_accept(self) -> bool {
        matches!(self, Self::Accept)
    }
}

impl Display for Signal {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Self::Accept => fmt.write_str("ACCEPT"),
            Self::Continue => fmt.write_str("CONTINUE"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Signal;

    #[test]
    fn signal() {
        assert!(Signal::Accept.is_accept());
        assert!(!Signal::Continue.is_accept());

        assert_eq!(Signal::Accept.to_string(), "ACCEPT");
        assert_eq!(Signal::Continue.to_string(), "CONTINUE");
    }
}
