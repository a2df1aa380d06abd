//! Error types shared between the gate and the host surface it plugs into.

use thiserror::Error;

/// A failure talking to the keyed-lookup store.
///
/// Timeouts, throttling, authentication failures and malformed responses all
/// collapse into this one type. `details` carries the underlying description.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{details}")]
pub struct TransportError {
    details: String,
}

impl TransportError {
    pub fn new(details: impl Into<String>) -> Self {
        Self {
            details: details.into(),
        }
    }

    #[inline]
    pub fn details(&self) -> &str {
        &self.details
    }
}

/// Errors that can occur while parsing the argument of a `RCPT TO:` command.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Empty recipient")]
    Empty,

    #[error("Unterminated path: {0}")]
    UnterminatedPath(String),

    #[error("Invalid mailbox: {0}")]
    InvalidMailbox(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
