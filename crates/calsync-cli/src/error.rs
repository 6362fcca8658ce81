//! CLI error types.

use std::path::PathBuf;

use calsync_providers::{CredentialError, ProviderError};
use calsync_server::ServerError;
use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors reported to the user before exiting.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file missing, unreadable or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The event file given to `create` could not be used.
    #[error("invalid event file {path}: {message}")]
    EventFile { path: PathBuf, message: String },

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("server error: {0}")]
    Server(#[from] ServerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns a hint for errors the user can fix by re-authorizing.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Provider(e) if e.is_auth() => {
                Some("the stored credential was rejected; run `calsync auth --force`")
            }
            Self::Credential(CredentialError::Authorization { .. }) => {
                Some("check that credentials.json is the OAuth client downloaded from the Cloud Console")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_carry_a_hint() {
        let err: CliError = ProviderError::authentication("invalid_grant").into();
        assert!(err.hint().unwrap().contains("auth --force"));

        let err: CliError = ProviderError::network("timeout").into();
        assert!(err.hint().is_none());
    }

    #[test]
    fn display() {
        let err = CliError::EventFile {
            path: PathBuf::from("event.json"),
            message: "missing start".to_string(),
        };
        assert_eq!(err.to_string(), "invalid event file event.json: missing start");
        assert_eq!(
            CliError::config("bad port").to_string(),
            "configuration error: bad port"
        );
    }
}
