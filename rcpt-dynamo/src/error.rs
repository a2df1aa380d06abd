//! Error types for the rcpt-dynamo crate.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while binding configuration at start-up.
///
/// All of these are fatal: the gate is never registered when one occurs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is absent or empty.
    #[error("{0} must be configured")]
    Missing(String),

    /// The configuration file could not be read.
    #[error("Failed to read config from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid RON for this program.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

impl ConfigError {
    /// The setting that was missing, if that is what went wrong
    pub fn missing_key(&self) -> Option<&str> {
        match self {
            Self::Missing(key) => Some(key),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as StdError;

    use super::*;

    #[test]
    fn test_missing_display() {
        let err = ConfigError::Missing("rcpt-dynamo.table-name".to_string());
        assert_eq!(err.to_string(), "rcpt-dynamo.table-name must be configured");
        assert_eq!(err.missing_key(), Some("rcpt-dynamo.table-name"));
    }

    #[test]
    fn test_read_source_chain() {
        let err = ConfigError::Read {
            path: PathBuf::from("/etc/rcpt-dynamo/rcpt-dynamo.config.ron"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        };

        assert!(err.source().is_some());
        assert!(err.missing_key().is_none());
        assert_eq!(
            err.to_string(),
            "Failed to read config from /etc/rcpt-dynamo/rcpt-dynamo.config.ron: access denied"
        );
    }
}
