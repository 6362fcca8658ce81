//! Google Calendar implementation of [`CalendarProvider`].

use calsync_core::CalendarEvent;
use tokio::sync::RwLock;
use tracing::debug;

use crate::credential::{AccessToken, Credential};
use crate::error::ProviderResult;
use crate::provider::{BoxFuture, CalendarProvider, CreatedEvent, ListQuery};

use super::client::GoogleCalendarClient;
use super::config::GoogleConfig;
use super::oauth::OAuthClient;

/// An access token obtained by refreshing, remembered per refresh token.
struct CachedToken {
    refresh_token: String,
    token: AccessToken,
}

/// Google Calendar provider.
///
/// Uses the credential's access token while it is live; otherwise refreshes
/// it and keeps the result in memory for the lifetime of the provider.
pub struct GoogleProvider {
    config: GoogleConfig,
    api: GoogleCalendarClient,
    oauth: OAuthClient,
    cached: RwLock<Option<CachedToken>>,
}

impl GoogleProvider {
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        let api = GoogleCalendarClient::new(&config)?;
        let oauth = OAuthClient::new(config.token_url.clone(), config.timeout)?;
        Ok(Self {
            config,
            api,
            oauth,
            cached: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    async fn access_token(&self, credential: &Credential) -> ProviderResult<String> {
        if let Some(token) = credential.live_access_token() {
            return Ok(token.token.clone());
        }

        if let Some(token) = reusable(self.cached.read().await.as_ref(), credential) {
            return Ok(token);
        }

        let mut cached = self.cached.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(token) = reusable(cached.as_ref(), credential) {
            return Ok(token);
        }

        debug!("access token missing or expired, refreshing");
        let token = self.oauth.refresh(credential).await?;
        let value = token.token.clone();
        *cached = Some(CachedToken {
            refresh_token: credential.refresh_token.clone(),
            token,
        });
        Ok(value)
    }
}

fn reusable(cached: Option<&CachedToken>, credential: &Credential) -> Option<String> {
    cached
        .filter(|c| c.refresh_token == credential.refresh_token && !c.token.is_expired())
        .map(|c| c.token.token.clone())
}

impl CalendarProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn list_events<'a>(
        &'a self,
        credential: &'a Credential,
        query: &'a ListQuery,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>> {
        Box::pin(async move {
            let token = self.access_token(credential).await?;
            self.api.list_events(&token, query).await
        })
    }

    fn insert_event<'a>(
        &'a self,
        credential: &'a Credential,
        calendar_id: &'a str,
        event: &'a CalendarEvent,
    ) -> BoxFuture<'a, ProviderResult<CreatedEvent>> {
        Box::pin(async move {
            let token = self.access_token(credential).await?;
            self.api.insert_event(&token, calendar_id, event).await
        })
    }
}

impl std::fmt::Debug for GoogleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
