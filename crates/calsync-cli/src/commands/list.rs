//! Listing upcoming events.

use calsync_core::CalendarEvent;

use crate::config::ClientConfig;
use crate::error::CliResult;

pub async fn run(config: &ClientConfig, json: bool) -> CliResult<()> {
    let credential = super::resolve_credential(config).await?;
    let workflow = super::workflow(config, super::google_provider(config)?);
    let events = workflow.list_upcoming(&credential).await?;

    if json {
        let out = serde_json::to_string_pretty(&events).map_err(std::io::Error::from)?;
        println!("{}", out);
    } else {
        print!("{}", render(&events));
    }
    Ok(())
}

/// One `<start> - <summary>` line per event.
pub fn render(events: &[CalendarEvent]) -> String {
    if events.is_empty() {
        return "No upcoming events found.\n".to_string();
    }
    events
        .iter()
        .map(|event| {
            let title = match event.title() {
                "" => "(no title)",
                title => title,
            };
            format!("{} - {}\n", event.start, title)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use calsync_core::EventDateTime;

    #[test]
    fn render_lines() {
        let mut untitled = CalendarEvent::new(
            "",
            EventDateTime::timed("2024-08-06T09:00:00-03:00"),
            EventDateTime::timed("2024-08-06T10:00:00-03:00"),
        );
        untitled.summary = None;

        let events = vec![
            CalendarEvent::new(
                "Nueva reunión",
                EventDateTime::timed("2024-08-05T09:00:00-03:00"),
                EventDateTime::timed("2024-08-05T11:00:00-03:00"),
            ),
            CalendarEvent::new(
                "Feriado",
                EventDateTime::all_day("2024-08-17"),
                EventDateTime::all_day("2024-08-18"),
            ),
            untitled,
        ];

        insta::assert_snapshot!(render(&events).trim_end(), @r"
        2024-08-05T09:00:00-03:00 - Nueva reunión
        2024-08-17 - Feriado
        2024-08-06T09:00:00-03:00 - (no title)
        ");
    }

    #[test]
    fn render_empty() {
        assert_eq!(render(&[]), "No upcoming events found.\n");
    }
}
