use std::sync::Arc;

use calsync_providers::google::CredentialStore;
use calsync_providers::{CalendarProvider, EventSyncWorkflow};

/// The workflow type served over HTTP.
pub type SharedWorkflow = EventSyncWorkflow<Arc<dyn CalendarProvider>>;

/// Shared application state.
///
/// Every request resolves its own credential; nothing is cached here beyond
/// what the provider keeps in memory.
#[derive(Clone)]
pub struct AppState {
    credentials: Arc<CredentialStore>,
    workflow: Arc<SharedWorkflow>,
}

impl AppState {
    pub fn new(credentials: CredentialStore, workflow: SharedWorkflow) -> Self {
        Self {
            credentials: Arc::new(credentials),
            workflow: Arc::new(workflow),
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn workflow(&self) -> &SharedWorkflow {
        &self.workflow
    }
}
