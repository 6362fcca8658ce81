//! Persisted authorized-user credential and the interactive fallback.
//!
//! [`CredentialStore`] owns the token file. It answers "give me a usable
//! credential" by reading the file, or, when there is none, by running an
//! [`Authorizer`] and persisting what it grants.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::credential::{Credential, TokenGrant};
use crate::error::{CredentialError, CredentialResult};
use crate::provider::BoxFuture;

use super::config::{CredentialConfig, OAuthCredentials};
use super::oauth::OAuthClient;

/// Runs the interactive consent handshake.
pub trait Authorizer: Send + Sync {
    /// Obtains tokens for `scopes` on behalf of the application in `secrets`.
    fn authorize<'a>(
        &'a self,
        secrets: &'a OAuthCredentials,
        scopes: &'a [String],
    ) -> BoxFuture<'a, CredentialResult<TokenGrant>>;
}

/// File-backed credential store.
pub struct CredentialStore {
    config: CredentialConfig,
    authorizer: Box<dyn Authorizer>,
}

impl CredentialStore {
    /// Creates a store that authorizes through the browser loopback flow.
    pub fn new(config: CredentialConfig) -> CredentialResult<Self> {
        let (start, end) = config.loopback_port_range;
        let oauth = OAuthClient::google(config.timeout)
            .map_err(CredentialError::from)?
            .with_port_range(start, end);
        Ok(Self::with_authorizer(config, Box::new(oauth)))
    }

    /// Creates a store with a custom authorizer.
    pub fn with_authorizer(config: CredentialConfig, authorizer: Box<dyn Authorizer>) -> Self {
        Self { config, authorizer }
    }

    pub fn config(&self) -> &CredentialConfig {
        &self.config
    }

    pub fn token_path(&self) -> &Path {
        &self.config.token_path
    }

    /// Returns the persisted credential, if there is a usable one.
    ///
    /// Never fails: a missing file, unreadable file, malformed JSON or a
    /// credential of another type all yield `None`.
    pub fn load_if_exists(&self) -> Option<Credential> {
        let path = &self.config.token_path;
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("no usable token file at {}: {}", path.display(), e);
                return None;
            }
        };

        let credential: Credential = match serde_json::from_str(&content) {
            Ok(credential) => credential,
            Err(e) => {
                debug!("ignoring malformed token file {}: {}", path.display(), e);
                return None;
            }
        };

        if !credential.is_well_formed() {
            debug!(
                kind = %credential.kind,
                "ignoring token file {} with unusable credential",
                path.display()
            );
            return None;
        }

        debug!("loaded credential from {}", path.display());
        Some(credential)
    }

    /// Returns the persisted credential, or authorizes interactively and
    /// persists the result.
    ///
    /// The cached credential is returned as-is even if `scopes` differ from
    /// the ones it was granted with.
    pub async fn resolve(&self, scopes: &[String]) -> CredentialResult<Credential> {
        if let Some(credential) = self.load_if_exists() {
            return Ok(credential);
        }

        info!("no stored credential, starting authorization");
        let secrets = OAuthCredentials::from_file(&self.config.secrets_path)
            .map_err(|e| CredentialError::authorization("cannot start authorization").with_source(e))?;

        let grant = self.authorizer.authorize(&secrets, scopes).await?;
        let refresh_token = grant.refresh_token.ok_or_else(|| {
            CredentialError::authorization(
                "provider granted no refresh token; revoke calsync's access and retry",
            )
        })?;

        let credential =
            Credential::authorized_user(secrets.client_id, secrets.client_secret, refresh_token)
                .with_access_token(grant.access_token);

        self.save(&credential)?;
        Ok(credential)
    }

    /// Writes `credential` to the token file, replacing any previous one.
    ///
    /// The client id and secret are taken from the secret bundle, the
    /// refresh token from `credential`. The access token is not written.
    pub fn save(&self, credential: &Credential) -> CredentialResult<()> {
        let secrets = OAuthCredentials::from_file(&self.config.secrets_path)?;
        if secrets.client_id != credential.client_id {
            warn!("credential client_id differs from the secret bundle, using the bundle's");
        }

        let persisted = Credential::authorized_user(
            secrets.client_id,
            secrets.client_secret,
            credential.refresh_token.clone(),
        );
        let content = serde_json::to_string_pretty(&persisted).map_err(|e| {
            CredentialError::persistence("failed to serialize credential").with_source(e)
        })?;

        let path = &self.config.token_path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                CredentialError::persistence(format!("failed to create {}", parent.display()))
                    .with_source(e)
            })?;
        }

        let temp_path = path.with_extension("json.tmp");
        write_private(&temp_path, content.as_bytes()).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            CredentialError::persistence(format!("failed to write {}", temp_path.display()))
                .with_source(e)
        })?;

        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            CredentialError::persistence(format!("failed to replace {}", path.display()))
                .with_source(e)
        })?;

        info!("saved credential to {}", path.display());
        Ok(())
    }

    /// Deletes the token file. Missing files are not an error.
    pub fn clear(&self) -> CredentialResult<()> {
        let path = &self.config.token_path;
        match fs::remove_file(path) {
            Ok(()) => {
                info!("removed credential {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(
                CredentialError::persistence(format!("failed to remove {}", path.display()))
                    .with_source(e),
            ),
        }
    }
}

/// Writes `content` to a fresh file that only its owner can read.
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(content)?;
    file.sync_all()
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
