//! Subcommand implementations.

pub mod auth;
pub mod config;
pub mod create;
pub mod list;
pub mod serve;

use calsync_providers::google::{CredentialStore, GoogleProvider};
use calsync_providers::{CalendarProvider, Credential, EventSyncWorkflow};

use crate::config::ClientConfig;
use crate::error::CliResult;

/// Builds the credential store described by `config`.
pub fn credential_store(config: &ClientConfig) -> CliResult<CredentialStore> {
    Ok(CredentialStore::new(config.credential_config())?)
}

/// Builds a workflow over `provider` with the configured calendar and rule.
pub fn workflow<P: CalendarProvider>(config: &ClientConfig, provider: P) -> EventSyncWorkflow<P> {
    EventSyncWorkflow::new(provider)
        .with_calendar_id(&config.calendar_id)
        .with_rule(config.duplicate_rule)
}

/// Builds the Google provider described by `config`.
pub fn google_provider(config: &ClientConfig) -> CliResult<GoogleProvider> {
    Ok(GoogleProvider::new(config.google_config())?)
}

/// Loads the stored credential, authorizing first if there is none.
pub async fn resolve_credential(config: &ClientConfig) -> CliResult<Credential> {
    let store = credential_store(config)?;
    Ok(store.resolve(&config.scopes).await?)
}
