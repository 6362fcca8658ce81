//! Creating an event unless it already exists.

use std::path::Path;

use calsync_core::{CalendarEvent, DuplicateRule};
use calsync_providers::CreationResult;

use crate::config::ClientConfig;
use crate::error::{CliError, CliResult};

pub async fn run(config: &ClientConfig, file: &Path, rule: Option<DuplicateRule>) -> CliResult<()> {
    let candidate = read_event(file)?;
    let credential = super::resolve_credential(config).await?;

    let mut workflow = super::workflow(config, super::google_provider(config)?);
    if let Some(rule) = rule {
        workflow = workflow.with_rule(rule);
    }

    let result = workflow.create_if_absent(&credential, &candidate).await?;
    println!("{}", describe(&candidate, &result));
    Ok(())
}

/// Reads and validates a candidate event.
pub fn read_event(path: &Path) -> CliResult<CalendarEvent> {
    let event_file_error = |message: String| CliError::EventFile {
        path: path.to_path_buf(),
        message,
    };

    let content = std::fs::read_to_string(path).map_err(|e| event_file_error(e.to_string()))?;
    let event: CalendarEvent =
        serde_json::from_str(&content).map_err(|e| event_file_error(e.to_string()))?;
    event.validate().map_err(|e| event_file_error(e.to_string()))?;
    Ok(event)
}

/// Human-readable outcome.
pub fn describe(candidate: &CalendarEvent, result: &CreationResult) -> String {
    match result {
        CreationResult::Created(created) => match created.html_link {
            Some(ref link) => format!("Event created: {}", link),
            None => format!("Event created: {}", candidate.title()),
        },
        CreationResult::Skipped(existing) => format!(
            "Event already exists ({} - {}), skipped: {}",
            existing.start,
            existing.end,
            existing.title()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calsync_core::{EventDateTime, ReminderMethod};
    use calsync_providers::CreatedEvent;

    const SESSION: &str = r#"{
        "summary": "Nueva reunión",
        "location": "Av. Sta. Fe 911 Piso 1 A, C1059 Cdad. Autónoma de Buenos Aires",
        "description": "Sesión de fotos",
        "colorId": "4",
        "start": {
            "dateTime": "2024-08-05T09:00:00-03:00",
            "timeZone": "America/Argentina/Buenos_Aires"
        },
        "end": {
            "dateTime": "2024-08-05T11:00:00-03:00",
            "timeZone": "America/Argentina/Buenos_Aires"
        },
        "reminders": {
            "useDefault": false,
            "overrides": [
                {"method": "email", "minutes": 1440},
                {"method": "popup", "minutes": 10}
            ]
        }
    }"#;

    fn write(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event.json");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn read_session_event() {
        let (_dir, path) = write(SESSION);
        let event = read_event(&path).unwrap();

        assert_eq!(event.title(), "Nueva reunión");
        assert_eq!(event.start.raw_date_time(), Some("2024-08-05T09:00:00-03:00"));
        assert_eq!(event.color_id.as_deref(), Some("4"));
        let reminders = event.reminders.unwrap();
        assert!(!reminders.use_default);
        assert_eq!(reminders.overrides[0].method, ReminderMethod::Email);
        assert_eq!(reminders.overrides[0].minutes_before, 1440);
    }

    #[test]
    fn read_rejects_inverted_event() {
        let (_dir, path) = write(
            r#"{"summary": "x",
                "start": {"dateTime": "2024-08-05T11:00:00-03:00"},
                "end": {"dateTime": "2024-08-05T09:00:00-03:00"}}"#,
        );
        let err = read_event(&path).unwrap_err();
        assert!(matches!(err, CliError::EventFile { .. }));
    }

    #[test]
    fn read_rejects_missing_and_malformed() {
        let (dir, path) = write("{ not json");
        assert!(matches!(read_event(&path), Err(CliError::EventFile { .. })));
        assert!(matches!(
            read_event(&dir.path().join("missing.json")),
            Err(CliError::EventFile { .. })
        ));
    }

    #[test]
    fn describe_outcomes() {
        let candidate = CalendarEvent::new(
            "Nueva reunión",
            EventDateTime::timed("2024-08-05T09:00:00-03:00"),
            EventDateTime::timed("2024-08-05T11:00:00-03:00"),
        );

        let created = CreationResult::Created(CreatedEvent {
            id: Some("evt1".to_string()),
            html_link: Some("https://www.google.com/calendar/event?eid=evt1".to_string()),
        });
        assert_eq!(
            describe(&candidate, &created),
            "Event created: https://www.google.com/calendar/event?eid=evt1"
        );

        let existing = CalendarEvent::new(
            "Standup",
            EventDateTime::timed("2024-08-05T09:00:00-03:00"),
            EventDateTime::timed("2024-08-05T10:00:00-03:00"),
        );
        let skipped = CreationResult::Skipped(Box::new(existing));
        insta::assert_snapshot!(
            describe(&candidate, &skipped),
            @"Event already exists (2024-08-05T09:00:00-03:00 - 2024-08-05T10:00:00-03:00), skipped: Standup"
        );
    }
}
