//! Core types: calendar events, duplicate matching, tracing setup

pub mod dedup;
pub mod event;
pub mod tracing;

pub use dedup::{DuplicateRule, find_duplicate};
pub use event::{
    CalendarEvent, EventDateTime, EventError, EventResult, ReminderMethod, ReminderOverride,
    Reminders,
};
pub use tracing::{LogFormat, TracingConfig, TracingError, init_tracing};
