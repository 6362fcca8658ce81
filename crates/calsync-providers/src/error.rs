//! Error types for provider and credential operations.
//!
//! - [`ProviderError`]: anything that goes wrong talking to the calendar API,
//!   classified by a [`ProviderErrorCode`].
//! - [`CredentialError`]: failures obtaining or persisting an authorized-user
//!   credential.

use std::fmt;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Credentials are invalid, expired, or were revoked.
    AuthenticationFailed,
    /// Authenticated, but not allowed to access the calendar.
    AuthorizationFailed,
    /// Connection failed, timed out, DNS resolution, etc.
    NetworkError,
    /// Too many requests.
    RateLimited,
    /// Server returned a 5xx or otherwise unexpected status.
    ServerError,
    /// Response body could not be decoded.
    InvalidResponse,
    /// Calendar or event not found (404).
    NotFound,
    /// The request was rejected (400), including invalid candidate events.
    BadRequest,
    /// Missing or invalid configuration.
    ConfigurationError,
    /// Unexpected internal state.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true for failures caused by the credential itself.
    ///
    /// Purely informational: nothing in calsync re-authorizes on its own.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed | Self::AuthorizationFailed)
    }

    /// Returns a stable snake_case name for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while interacting with a calendar provider.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// The provider that generated this error (e.g. "google").
    provider: Option<String>,
    #[source]
    source: Option<BoxError>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthorizationFailed, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::BadRequest, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Sets the provider name for this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Returns true if the credential was rejected.
    pub fn is_auth(&self) -> bool {
        self.code.is_auth()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failure to obtain or persist a credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The interactive authorization flow did not complete: network failure,
    /// user denial, malformed secret bundle, or no refresh token granted.
    #[error("authorization failed: {message}")]
    Authorization {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The credential could not be written, or the secret bundle needed to
    /// write it could not be read.
    #[error("credential persistence failed: {message}")]
    Persistence {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl CredentialError {
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
            source: None,
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying cause.
    pub fn with_source<E>(self, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let boxed: Option<BoxError> = Some(Box::new(err));
        match self {
            Self::Authorization { message, .. } => Self::Authorization {
                message,
                source: boxed,
            },
            Self::Persistence { message, .. } => Self::Persistence {
                message,
                source: boxed,
            },
        }
    }
}

impl From<ProviderError> for CredentialError {
    /// Failures of the OAuth endpoints during the interactive flow.
    fn from(err: ProviderError) -> Self {
        let message = err.message().to_string();
        Self::authorization(message).with_source(err)
    }
}

/// A specialized Result type for credential operations.
pub type CredentialResult<T> = Result<T, CredentialError>;
