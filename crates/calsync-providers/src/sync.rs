//! The list-then-create workflow.
//!
//! [`EventSyncWorkflow`] lists the upcoming events of one calendar and
//! creates a candidate event unless an existing one collides with it under
//! the configured [`DuplicateRule`]. The check and the insert are two
//! separate requests; a concurrent writer can slip in between them.

use calsync_core::{CalendarEvent, DuplicateRule, find_duplicate};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::credential::Credential;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{CalendarProvider, CreatedEvent, ListQuery, PRIMARY_CALENDAR};

/// How far into the past an event may start and still count as upcoming.
const CLOCK_SKEW_SECS: i64 = 5;

/// Outcome of [`EventSyncWorkflow::create_if_absent`].
#[derive(Debug, Clone, PartialEq)]
pub enum CreationResult {
    /// An existing event matched; nothing was written.
    Skipped(Box<CalendarEvent>),
    /// The candidate was inserted.
    Created(CreatedEvent),
}

impl CreationResult {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Lists and creates events on a single calendar.
pub struct EventSyncWorkflow<P> {
    provider: P,
    calendar_id: String,
    rule: DuplicateRule,
    clock: fn() -> DateTime<Utc>,
}

impl<P: CalendarProvider> EventSyncWorkflow<P> {
    /// Creates a workflow on the primary calendar with the default rule.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            calendar_id: PRIMARY_CALENDAR.to_string(),
            rule: DuplicateRule::default(),
            clock: Utc::now,
        }
    }

    pub fn with_calendar_id(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = calendar_id.into();
        self
    }

    pub fn with_rule(mut self, rule: DuplicateRule) -> Self {
        self.rule = rule;
        self
    }

    /// Replaces the source of "now".
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Returns events starting from now on, ordered by start time.
    ///
    /// The provider's `timeMin` bounds event *end* times, so events already
    /// in progress come back from it; those are dropped here. All-day events
    /// and events whose start does not parse are kept.
    pub async fn list_upcoming(&self, credential: &Credential) -> ProviderResult<Vec<CalendarEvent>> {
        let now = (self.clock)();
        let query = ListQuery::upcoming(&self.calendar_id, now);

        let mut events = self.provider.list_events(credential, &query).await?;
        let cutoff = now - Duration::seconds(CLOCK_SKEW_SECS);
        let before = events.len();
        events.retain(|event| {
            event
                .start
                .instant()
                .is_none_or(|start| start >= cutoff)
        });

        debug!(
            calendar = %self.calendar_id,
            dropped = before - events.len(),
            "listed {} upcoming events",
            events.len()
        );
        Ok(events)
    }

    /// Creates `candidate` unless an upcoming event already matches it.
    pub async fn create_if_absent(
        &self,
        credential: &Credential,
        candidate: &CalendarEvent,
    ) -> ProviderResult<CreationResult> {
        let existing = self.list_upcoming(credential).await?;

        if let Some(duplicate) = find_duplicate(&existing, candidate, self.rule) {
            info!(
                existing = duplicate.id.as_deref().unwrap_or("?"),
                rule = %self.rule,
                "event already exists, skipping: {}",
                candidate.title()
            );
            return Ok(CreationResult::Skipped(Box::new(duplicate.clone())));
        }

        candidate.validate().map_err(|e| {
            ProviderError::bad_request(format!("invalid event: {}", e)).with_source(e)
        })?;

        let created = self
            .provider
            .insert_event(credential, &self.calendar_id, candidate)
            .await?;
        info!(
            id = created.id.as_deref().unwrap_or("?"),
            link = created.html_link.as_deref().unwrap_or(""),
            "event created: {}",
            candidate.title()
        );
        Ok(CreationResult::Created(created))
    }
}
