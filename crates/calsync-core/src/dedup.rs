//! Duplicate detection for candidate events.
//!
//! Matching is done on the raw `dateTime` strings, not on parsed instants:
//! `2024-08-05T09:00:00-03:00` and `2024-08-05T12:00:00Z` are the same moment
//! but do not match.
//!
//! Boundaries without a `dateTime` (all-day events) never match anything. Two
//! missing values are not treated as equal: under [`DuplicateRule::StartOrEnd`]
//! that would make every all-day candidate a duplicate of any all-day event,
//! whatever its date.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::event::{CalendarEvent, EventDateTime};

/// Rule deciding whether an existing event duplicates a candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateRule {
    /// Start strings are equal OR end strings are equal.
    ///
    /// Two events with different starts but the same end are treated as
    /// duplicates of each other.
    #[default]
    StartOrEnd,

    /// Start strings are equal AND end strings are equal.
    StartAndEnd,
}

impl DuplicateRule {
    /// Returns true if `existing` duplicates `candidate` under this rule.
    pub fn matches(&self, existing: &CalendarEvent, candidate: &CalendarEvent) -> bool {
        let same_start = same_date_time(&existing.start, &candidate.start);
        let same_end = same_date_time(&existing.end, &candidate.end);
        match self {
            Self::StartOrEnd => same_start || same_end,
            Self::StartAndEnd => same_start && same_end,
        }
    }

    /// Returns the configuration name of this rule.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartOrEnd => "start-or-end",
            Self::StartAndEnd => "start-and-end",
        }
    }
}

impl fmt::Display for DuplicateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DuplicateRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start-or-end" => Ok(Self::StartOrEnd),
            "start-and-end" => Ok(Self::StartAndEnd),
            other => Err(format!(
                "unknown duplicate rule '{}' (expected start-or-end or start-and-end)",
                other
            )),
        }
    }
}

fn same_date_time(a: &EventDateTime, b: &EventDateTime) -> bool {
    matches!((a.raw_date_time(), b.raw_date_time()), (Some(x), Some(y)) if x == y)
}

/// Scans `existing` in order and returns the first event that duplicates `candidate`.
pub fn find_duplicate<'a>(
    existing: &'a [CalendarEvent],
    candidate: &CalendarEvent,
    rule: DuplicateRule,
) -> Option<&'a CalendarEvent> {
    existing.iter().find(|e| rule.matches(e, candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(start: &str, end: &str) -> CalendarEvent {
        CalendarEvent::new("e", EventDateTime::timed(start), EventDateTime::timed(end))
    }

    fn existing() -> Vec<CalendarEvent> {
        vec![event("2024-08-05T09:00:00-03:00", "2024-08-05T10:00:00-03:00")]
    }

    #[test]
    fn start_match_is_duplicate() {
        let candidate = event("2024-08-05T09:00:00-03:00", "2024-08-05T11:00:00-03:00");
        assert!(find_duplicate(&existing(), &candidate, DuplicateRule::StartOrEnd).is_some());
    }

    #[test]
    fn end_only_match_is_duplicate() {
        let candidate = event("2024-08-05T08:00:00-03:00", "2024-08-05T10:00:00-03:00");
        assert!(find_duplicate(&existing(), &candidate, DuplicateRule::StartOrEnd).is_some());
    }

    #[test]
    fn other_fields_are_ignored() {
        let candidate = event("2024-08-05T09:00:00-03:00", "2024-08-05T23:00:00-03:00")
            .with_location("elsewhere")
            .with_color_id("11");
        let mut list = existing();
        list[0].summary = Some("something else entirely".to_string());
        assert!(find_duplicate(&list, &candidate, DuplicateRule::StartOrEnd).is_some());
    }

    #[test]
    fn no_match_on_different_day() {
        let candidate = event("2024-08-06T09:00:00-03:00", "2024-08-06T11:00:00-03:00");
        assert!(find_duplicate(&existing(), &candidate, DuplicateRule::StartOrEnd).is_none());
    }

    #[test]
    fn equivalent_instants_with_other_offset_do_not_match() {
        let candidate = event("2024-08-05T12:00:00Z", "2024-08-05T14:00:00Z");
        assert!(find_duplicate(&existing(), &candidate, DuplicateRule::StartOrEnd).is_none());
    }

    #[test]
    fn all_day_events_never_match() {
        let all_day = CalendarEvent::new(
            "holiday",
            EventDateTime::all_day("2024-08-05"),
            EventDateTime::all_day("2024-08-06"),
        );
        let list = vec![all_day.clone()];
        assert!(find_duplicate(&list, &all_day, DuplicateRule::StartOrEnd).is_none());

        let other_day = CalendarEvent::new(
            "offsite",
            EventDateTime::all_day("2024-09-01"),
            EventDateTime::all_day("2024-09-02"),
        );
        assert!(!DuplicateRule::StartOrEnd.matches(&all_day, &other_day));
        assert!(!DuplicateRule::StartAndEnd.matches(&all_day, &other_day));
    }

    #[test]
    fn start_and_end_requires_both() {
        let start_only = event("2024-08-05T09:00:00-03:00", "2024-08-05T11:00:00-03:00");
        let both = event("2024-08-05T09:00:00-03:00", "2024-08-05T10:00:00-03:00");
        assert!(find_duplicate(&existing(), &start_only, DuplicateRule::StartAndEnd).is_none());
        assert!(find_duplicate(&existing(), &both, DuplicateRule::StartAndEnd).is_some());
    }

    #[test]
    fn first_match_wins() {
        let mut list = existing();
        let mut second = event("2024-08-05T09:00:00-03:00", "2024-08-05T09:30:00-03:00");
        second.id = Some("second".to_string());
        list[0].id = Some("first".to_string());
        list.push(second);

        let candidate = event("2024-08-05T09:00:00-03:00", "2024-08-05T12:00:00-03:00");
        let found = find_duplicate(&list, &candidate, DuplicateRule::StartOrEnd).unwrap();
        assert_eq!(found.id.as_deref(), Some("first"));
    }

    #[test]
    fn rule_parsing() {
        assert_eq!("start-or-end".parse::<DuplicateRule>(), Ok(DuplicateRule::StartOrEnd));
        assert_eq!("start-and-end".parse::<DuplicateRule>(), Ok(DuplicateRule::StartAndEnd));
        assert!("fuzzy".parse::<DuplicateRule>().is_err());
        assert_eq!(DuplicateRule::default().to_string(), "start-or-end");
    }
}
