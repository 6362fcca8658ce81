//! Google configuration: the application secret bundle, credential store
//! settings and Calendar API client settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{CredentialError, CredentialResult};

/// Full read/write access to the user's calendars.
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// The OAuth client id/secret pair of the registered application.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Layout of the `credentials.json` downloaded from the Cloud Console.
#[derive(Debug, Deserialize)]
struct SecretBundle {
    installed: Option<BundleSection>,
    web: Option<BundleSection>,
}

#[derive(Debug, Deserialize)]
struct BundleSection {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Reads the secret bundle at `path`.
    ///
    /// The bundle must have an `installed` or `web` section; `installed` wins
    /// when both are present.
    pub fn from_file(path: impl AsRef<Path>) -> CredentialResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CredentialError::persistence(format!(
                "failed to read secret bundle {}",
                path.display()
            ))
            .with_source(e)
        })?;
        Self::from_json(&content)
    }

    /// Parses a secret bundle from JSON.
    pub fn from_json(json: &str) -> CredentialResult<Self> {
        let bundle: SecretBundle = serde_json::from_str(json).map_err(|e| {
            CredentialError::persistence("failed to parse secret bundle").with_source(e)
        })?;

        let section = bundle.installed.or(bundle.web).ok_or_else(|| {
            CredentialError::persistence("secret bundle has neither an 'installed' nor a 'web' section")
        })?;

        if section.client_id.is_empty() || section.client_secret.is_empty() {
            return Err(CredentialError::persistence(
                "secret bundle has an empty client_id or client_secret",
            ));
        }

        Ok(Self::new(section.client_id, section.client_secret))
    }
}

/// Where the credential store keeps its files and how it authorizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialConfig {
    /// The persisted authorized-user credential. Defaults to `token.json`.
    pub token_path: PathBuf,
    /// The application secret bundle. Defaults to `credentials.json`.
    pub secrets_path: PathBuf,
    /// Scopes requested by the interactive flow.
    pub scopes: Vec<String>,
    /// Ports tried, in order, for the loopback redirect listener.
    pub loopback_port_range: (u16, u16),
    /// Timeout for requests to the token endpoint.
    pub timeout: Duration,
}

impl CredentialConfig {
    pub const DEFAULT_TOKEN_PATH: &'static str = "token.json";
    pub const DEFAULT_SECRETS_PATH: &'static str = "credentials.json";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn new() -> Self {
        Self {
            token_path: PathBuf::from(Self::DEFAULT_TOKEN_PATH),
            secrets_path: PathBuf::from(Self::DEFAULT_SECRETS_PATH),
            scopes: vec![CALENDAR_SCOPE.to_string()],
            loopback_port_range: (8080, 8090),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    pub fn with_secrets_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.secrets_path = path.into();
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_loopback_port_range(mut self, start: u16, end: u16) -> Self {
        self.loopback_port_range = (start, end);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.scopes.is_empty() {
            return Err("at least one OAuth scope is required".to_string());
        }
        if self.loopback_port_range.0 > self.loopback_port_range.1 {
            return Err(format!(
                "invalid loopback port range {}-{}",
                self.loopback_port_range.0, self.loopback_port_range.1
            ));
        }
        Ok(())
    }
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the Google Calendar API client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleConfig {
    /// Base URL of the Calendar v3 API.
    pub api_base: String,
    /// Token endpoint used for refreshing access tokens.
    pub token_url: String,
    /// Request timeout.
    pub timeout: Duration,
    pub user_agent: String,
}

impl GoogleConfig {
    pub const DEFAULT_API_BASE: &'static str = "https://www.googleapis.com/calendar/v3";
    pub const DEFAULT_TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn new() -> Self {
        Self {
            api_base: Self::DEFAULT_API_BASE.to_string(),
            token_url: Self::DEFAULT_TOKEN_URL.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("calsync/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Points the client at a different API host (used by tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self::new()
    }
}
