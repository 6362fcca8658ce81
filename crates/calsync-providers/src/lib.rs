//! Calendar access for calsync.
//!
//! - [`CalendarProvider`]: the two calendar operations calsync needs
//! - [`google`]: credential store, OAuth flow and the Google Calendar backend
//! - [`EventSyncWorkflow`]: list upcoming events, create one unless it is a duplicate
//! - [`ProviderError`] / [`CredentialError`]: what can go wrong
//!
//! ```ignore
//! use calsync_providers::google::{CredentialConfig, CredentialStore, GoogleConfig, GoogleProvider};
//! use calsync_providers::{CreationResult, EventSyncWorkflow};
//!
//! let config = CredentialConfig::default();
//! let store = CredentialStore::new(config.clone())?;
//! let credential = store.resolve(&config.scopes).await?;
//!
//! let workflow = EventSyncWorkflow::new(GoogleProvider::new(GoogleConfig::default())?);
//! for event in workflow.list_upcoming(&credential).await? {
//!     println!("{} - {}", event.start, event.title());
//! }
//! ```

pub mod credential;
pub mod error;
pub mod google;
pub mod provider;
pub mod sync;

pub use credential::{AccessToken, Credential, TokenGrant};
pub use error::{
    CredentialError, CredentialResult, ProviderError, ProviderErrorCode, ProviderResult,
};
pub use provider::{BoxFuture, CalendarProvider, CreatedEvent, ListQuery, PRIMARY_CALENDAR};
pub use sync::{CreationResult, EventSyncWorkflow};
