//! CalendarProvider trait definition.
//!
//! A provider is the black-box calendar service. calsync consumes exactly two
//! of its operations, listing events and inserting one, each as a single
//! awaited request/response round-trip.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use calsync_core::CalendarEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credential::Credential;
use crate::error::ProviderResult;

/// Calendar id that refers to the authorized user's main calendar.
pub const PRIMARY_CALENDAR: &str = "primary";

/// Parameters of an `events.list` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub calendar_id: String,
    /// Lower bound on the events returned.
    pub time_min: DateTime<Utc>,
    /// Expand recurring events into single occurrences.
    pub single_events: bool,
    /// Order by start time ascending. Requires `single_events`.
    pub order_by_start: bool,
}

impl ListQuery {
    /// Query for events from `time_min` onwards, expanded and ordered by start.
    pub fn upcoming(calendar_id: impl Into<String>, time_min: DateTime<Utc>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            time_min,
            single_events: true,
            order_by_start: true,
        }
    }
}

/// What the provider returns for a newly inserted event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    #[serde(default)]
    pub id: Option<String>,
    /// Shareable link to the event.
    #[serde(default)]
    pub html_link: Option<String>,
}

/// A boxed future for trait methods, keeping the trait object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A calendar backend.
///
/// Implementations receive the credential on every call and are responsible
/// for turning it into whatever the wire protocol needs (e.g. refreshing an
/// access token). They must not persist anything.
pub trait CalendarProvider: Send + Sync {
    /// Returns the name of this provider (e.g. "google").
    fn name(&self) -> &str;

    /// Lists events matching `query`, following pagination to the end.
    fn list_events<'a>(
        &'a self,
        credential: &'a Credential,
        query: &'a ListQuery,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>>;

    /// Inserts `event` into `calendar_id`.
    fn insert_event<'a>(
        &'a self,
        credential: &'a Credential,
        calendar_id: &'a str,
        event: &'a CalendarEvent,
    ) -> BoxFuture<'a, ProviderResult<CreatedEvent>>;
}

impl<T: CalendarProvider + ?Sized> CalendarProvider for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn list_events<'a>(
        &'a self,
        credential: &'a Credential,
        query: &'a ListQuery,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>> {
        (**self).list_events(credential, query)
    }

    fn insert_event<'a>(
        &'a self,
        credential: &'a Credential,
        calendar_id: &'a str,
        event: &'a CalendarEvent,
    ) -> BoxFuture<'a, ProviderResult<CreatedEvent>> {
        (**self).insert_event(credential, calendar_id, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upcoming_query_defaults() {
        let now = Utc::now();
        let query = ListQuery::upcoming(PRIMARY_CALENDAR, now);
        assert_eq!(query.calendar_id, "primary");
        assert_eq!(query.time_min, now);
        assert!(query.single_events);
        assert!(query.order_by_start);
    }

    #[test]
    fn created_event_from_insert_response() {
        let json = r#"{
            "kind": "calendar#event",
            "id": "evt42",
            "htmlLink": "https://www.google.com/calendar/event?eid=evt42",
            "status": "confirmed"
        }"#;
        let created: CreatedEvent = serde_json::from_str(json).unwrap();
        assert_eq!(created.id.as_deref(), Some("evt42"));
        assert_eq!(
            created.html_link.as_deref(),
            Some("https://www.google.com/calendar/event?eid=evt42")
        );
    }
}
