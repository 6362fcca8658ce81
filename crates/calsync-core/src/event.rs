//! Calendar event types.
//!
//! [`CalendarEvent`] follows the shape of the Google Calendar v3 event
//! resource. The fields calsync reads or writes are typed; anything else the
//! provider returns is kept in [`CalendarEvent::extra`] and written back out
//! untouched, so an event list fetched from the provider serializes to the
//! same JSON it was parsed from.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised when an event fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// Neither `dateTime` nor `date` is set on a boundary.
    #[error("event has no {field} time")]
    MissingTime { field: &'static str },

    /// A boundary could not be parsed.
    #[error("invalid {field} time '{value}': {reason}")]
    InvalidTime {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// One boundary is timed and the other is all-day.
    #[error("event mixes a timed boundary with an all-day boundary")]
    MixedBoundaries,

    /// The event does not end strictly after it starts.
    #[error("event must end after it starts (start {start}, end {end})")]
    EndNotAfterStart { start: String, end: String },
}

/// Result type for event validation.
pub type EventResult<T> = Result<T, EventError>;

/// The start or end of an event.
///
/// `date_time` is kept as the raw RFC 3339 string the provider (or the user)
/// supplied. Duplicate detection compares these strings verbatim, so no
/// normalization happens on the way in or out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    /// RFC 3339 timestamp for timed events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,

    /// `YYYY-MM-DD` for all-day events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// IANA timezone identifier, e.g. `America/Argentina/Buenos_Aires`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    /// Creates a timed boundary from an RFC 3339 string.
    pub fn timed(date_time: impl Into<String>) -> Self {
        Self {
            date_time: Some(date_time.into()),
            ..Default::default()
        }
    }

    /// Creates an all-day boundary from a `YYYY-MM-DD` string.
    pub fn all_day(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Default::default()
        }
    }

    /// Builder method to set the timezone identifier.
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    /// Returns the raw `dateTime` string, if this is a timed boundary.
    pub fn raw_date_time(&self) -> Option<&str> {
        self.date_time.as_deref()
    }

    /// Parses `dateTime` as an RFC 3339 instant.
    ///
    /// Returns `None` for all-day boundaries and for strings that do not parse.
    pub fn instant(&self) -> Option<DateTime<FixedOffset>> {
        self.date_time
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    }

    fn boundary(&self, field: &'static str) -> EventResult<Boundary> {
        if let Some(ref raw) = self.date_time {
            return DateTime::parse_from_rfc3339(raw)
                .map(Boundary::Instant)
                .map_err(|e| EventError::InvalidTime {
                    field,
                    value: raw.clone(),
                    reason: e.to_string(),
                });
        }
        if let Some(ref raw) = self.date {
            return NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(Boundary::Day)
                .map_err(|e| EventError::InvalidTime {
                    field,
                    value: raw.clone(),
                    reason: e.to_string(),
                });
        }
        Err(EventError::MissingTime { field })
    }
}

impl fmt::Display for EventDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.date_time, &self.date) {
            (Some(dt), _) => write!(f, "{}", dt),
            (None, Some(d)) => write!(f, "{}", d),
            (None, None) => write!(f, "?"),
        }
    }
}

enum Boundary {
    Instant(DateTime<FixedOffset>),
    Day(NaiveDate),
}

/// How a reminder is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderMethod {
    Email,
    Popup,
    /// Any method this crate does not know about, kept verbatim.
    #[serde(untagged)]
    Other(String),
}

/// A single reminder override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderOverride {
    pub method: ReminderMethod,
    /// Minutes before the event start.
    #[serde(rename = "minutes")]
    pub minutes_before: u32,
}

impl ReminderOverride {
    pub fn new(method: ReminderMethod, minutes_before: u32) -> Self {
        Self {
            method,
            minutes_before,
        }
    }
}

/// Reminder settings for an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    /// Whether the calendar's default reminders apply.
    #[serde(default)]
    pub use_default: bool,

    /// Explicit reminders, used when `use_default` is false.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<ReminderOverride>,
}

impl Reminders {
    /// Reminders with explicit overrides.
    pub fn with_overrides(overrides: Vec<ReminderOverride>) -> Self {
        Self {
            use_default: false,
            overrides,
        }
    }
}

/// A calendar event, either fetched from the provider or proposed for creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    /// Provider-assigned identifier. Absent on candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub start: EventDateTime,

    #[serde(default)]
    pub end: EventDateTime,

    /// Provider color palette index, e.g. `"4"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Reminders>,

    /// Shareable link to the event in the provider's web UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,

    /// Every other field of the provider resource, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CalendarEvent {
    /// Creates a candidate event with the given summary and boundaries.
    pub fn new(summary: impl Into<String>, start: EventDateTime, end: EventDateTime) -> Self {
        Self {
            summary: Some(summary.into()),
            start,
            end,
            ..Default::default()
        }
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the color id.
    pub fn with_color_id(mut self, color_id: impl Into<String>) -> Self {
        self.color_id = Some(color_id.into());
        self
    }

    /// Builder method to set reminders.
    pub fn with_reminders(mut self, reminders: Reminders) -> Self {
        self.reminders = Some(reminders);
        self
    }

    /// Returns the summary, or an empty string.
    pub fn title(&self) -> &str {
        self.summary.as_deref().unwrap_or_default()
    }

    /// Returns true if both boundaries are all-day dates.
    pub fn is_all_day(&self) -> bool {
        self.start.date_time.is_none() && self.start.date.is_some()
    }

    /// Checks that both boundaries parse and that the event ends after it starts.
    ///
    /// Timed boundaries are compared as instants, so offsets are taken into
    /// account here even though duplicate matching ignores them.
    pub fn validate(&self) -> EventResult<()> {
        let start = self.start.boundary("start")?;
        let end = self.end.boundary("end")?;

        let ordered = match (start, end) {
            (Boundary::Instant(s), Boundary::Instant(e)) => s < e,
            (Boundary::Day(s), Boundary::Day(e)) => s < e,
            _ => return Err(EventError::MixedBoundaries),
        };

        if !ordered {
            return Err(EventError::EndNotAfterStart {
                start: self.start.to_string(),
                end: self.end.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> CalendarEvent {
        CalendarEvent::new(
            "Nueva reunión",
            EventDateTime::timed("2024-08-05T09:00:00-03:00")
                .with_time_zone("America/Argentina/Buenos_Aires"),
            EventDateTime::timed("2024-08-05T11:00:00-03:00")
                .with_time_zone("America/Argentina/Buenos_Aires"),
        )
        .with_location("Av. Sta. Fe 911 Piso 1 A, C1059 Cdad. Autónoma de Buenos Aires")
        .with_description("Sesión de fotos")
        .with_color_id("4")
        .with_reminders(Reminders::with_overrides(vec![
            ReminderOverride::new(ReminderMethod::Email, 24 * 60),
            ReminderOverride::new(ReminderMethod::Popup, 10),
        ]))
    }

    #[test]
    fn candidate_serializes_to_provider_shape() {
        let json = serde_json::to_value(session()).unwrap();

        assert_eq!(json["start"]["dateTime"], "2024-08-05T09:00:00-03:00");
        assert_eq!(json["start"]["timeZone"], "America/Argentina/Buenos_Aires");
        assert_eq!(json["colorId"], "4");
        assert_eq!(json["reminders"]["useDefault"], false);
        assert_eq!(json["reminders"]["overrides"][0]["method"], "email");
        assert_eq!(json["reminders"]["overrides"][0]["minutes"], 1440);
        assert!(json.get("id").is_none());
        assert!(json.get("htmlLink").is_none());
    }

    #[test]
    fn unknown_provider_fields_survive() {
        let json = r#"{
            "kind": "calendar#event",
            "id": "abc123",
            "status": "confirmed",
            "htmlLink": "https://www.google.com/calendar/event?eid=abc123",
            "summary": "Standup",
            "start": {"dateTime": "2024-08-05T09:00:00-03:00"},
            "end": {"dateTime": "2024-08-05T09:15:00-03:00"},
            "organizer": {"email": "me@example.com", "self": true}
        }"#;

        let event: CalendarEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.id.as_deref(), Some("abc123"));
        assert_eq!(event.extra["kind"], "calendar#event");
        assert_eq!(event.extra["organizer"]["self"], true);

        let back = serde_json::to_value(&event).unwrap();
        let original: Value = serde_json::from_str(json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn unknown_reminder_method_is_kept() {
        let json = r#"{"useDefault": false, "overrides": [{"method": "sms", "minutes": 5}]}"#;
        let reminders: Reminders = serde_json::from_str(json).unwrap();
        assert_eq!(
            reminders.overrides[0].method,
            ReminderMethod::Other("sms".to_string())
        );
        let back = serde_json::to_value(&reminders).unwrap();
        assert_eq!(back["overrides"][0]["method"], "sms");
    }

    #[test]
    fn validate_accepts_ordered_event() {
        assert!(session().validate().is_ok());
    }

    #[test]
    fn validate_rejects_inverted_event() {
        let event = CalendarEvent::new(
            "Backwards",
            EventDateTime::timed("2024-08-05T11:00:00-03:00"),
            EventDateTime::timed("2024-08-05T09:00:00-03:00"),
        );
        assert!(matches!(
            event.validate(),
            Err(EventError::EndNotAfterStart { .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_length_event() {
        let event = CalendarEvent::new(
            "Instant",
            EventDateTime::timed("2024-08-05T09:00:00-03:00"),
            EventDateTime::timed("2024-08-05T12:00:00Z"),
        );
        // Same instant, different offsets.
        assert!(event.validate().is_err());
    }

    #[test]
    fn validate_all_day() {
        let ok = CalendarEvent::new(
            "Holiday",
            EventDateTime::all_day("2024-08-05"),
            EventDateTime::all_day("2024-08-06"),
        );
        assert!(ok.validate().is_ok());
        assert!(ok.is_all_day());

        let mixed = CalendarEvent::new(
            "Mixed",
            EventDateTime::all_day("2024-08-05"),
            EventDateTime::timed("2024-08-06T00:00:00Z"),
        );
        assert_eq!(mixed.validate(), Err(EventError::MixedBoundaries));
    }

    #[test]
    fn validate_reports_missing_and_malformed() {
        let missing = CalendarEvent::new(
            "No end",
            EventDateTime::timed("2024-08-05T09:00:00Z"),
            EventDateTime::default(),
        );
        assert_eq!(
            missing.validate(),
            Err(EventError::MissingTime { field: "end" })
        );

        let malformed = CalendarEvent::new(
            "Bad start",
            EventDateTime::timed("tomorrow at nine"),
            EventDateTime::timed("2024-08-05T09:00:00Z"),
        );
        assert!(matches!(
            malformed.validate(),
            Err(EventError::InvalidTime { field: "start", .. })
        ));
    }

    #[test]
    fn instant_parses_offsets() {
        let t = EventDateTime::timed("2024-08-05T09:00:00-03:00");
        let utc = EventDateTime::timed("2024-08-05T12:00:00Z");
        assert_eq!(t.instant(), utc.instant());
        assert_ne!(t.raw_date_time(), utc.raw_date_time());
        assert!(EventDateTime::all_day("2024-08-05").instant().is_none());
    }
}
