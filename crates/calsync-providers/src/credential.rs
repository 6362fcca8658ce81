//! Authorized-user credentials.
//!
//! A [`Credential`] is what the OAuth flow produces and what the provider
//! consumes: the application's client id/secret, the long-lived refresh
//! token, and optionally a short-lived access token.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::google::OAuthCredentials;

/// The only credential type calsync reads or writes.
pub const AUTHORIZED_USER: &str = "authorized_user";

/// Safety margin subtracted from access token lifetimes.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A short-lived bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    /// When the token stops being accepted, minus a safety margin.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Creates a token from an OAuth `expires_in` value (seconds).
    ///
    /// Lifetimes too large to represent are clamped to the far past or future.
    pub fn new(token: impl Into<String>, expires_in_secs: Option<i64>) -> Self {
        let expires_at = expires_in_secs.map(|secs| {
            Duration::try_seconds(secs.saturating_sub(EXPIRY_MARGIN_SECS))
                .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
                .unwrap_or(if secs < 0 {
                    DateTime::<Utc>::MIN_UTC
                } else {
                    DateTime::<Utc>::MAX_UTC
                })
        });
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Returns true if the token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false,
        }
    }
}

/// Tokens granted by a successful authorization-code exchange.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: AccessToken,
    /// Google only returns this on the first consent (or with `prompt=consent`).
    pub refresh_token: Option<String>,
    pub scopes: Vec<String>,
}

/// An OAuth2 authorized-user credential.
///
/// Serializes to the on-disk format `{type, client_id, client_secret,
/// refresh_token}`. The access token is never serialized.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Always [`AUTHORIZED_USER`].
    #[serde(rename = "type")]
    pub kind: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(skip)]
    pub access_token: Option<AccessToken>,
}

impl Credential {
    /// Creates an authorized-user credential without an access token.
    pub fn authorized_user(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            kind: AUTHORIZED_USER.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            access_token: None,
        }
    }

    /// Builder method to attach an access token.
    pub fn with_access_token(mut self, token: AccessToken) -> Self {
        self.access_token = Some(token);
        self
    }

    /// Returns the access token if one is present and still live.
    pub fn live_access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref().filter(|t| !t.is_expired())
    }

    /// Returns the client id/secret pair for the token endpoint.
    pub fn oauth_credentials(&self) -> OAuthCredentials {
        OAuthCredentials::new(&self.client_id, &self.client_secret)
    }

    /// Returns true if `kind` is the authorized-user type and no field is blank.
    pub fn is_well_formed(&self) -> bool {
        self.kind == AUTHORIZED_USER
            && !self.client_id.is_empty()
            && !self.client_secret.is_empty()
            && !self.refresh_token.is_empty()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("kind", &self.kind)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
