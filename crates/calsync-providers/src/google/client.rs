//! Google Calendar API v3 client.
//!
//! Thin wrapper over reqwest for the two endpoints calsync uses,
//! `events.list` and `events.insert`. Events travel as [`CalendarEvent`]
//! so fields calsync does not model survive the round-trip.

use calsync_core::CalendarEvent;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{CreatedEvent, ListQuery};

use super::config::GoogleConfig;

/// Google Calendar API client.
///
/// Stateless apart from the connection pool: the bearer token is supplied
/// per request.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    api_base: String,
}

impl GoogleCalendarClient {
    pub fn new(config: &GoogleConfig) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                ProviderError::configuration("failed to build Calendar HTTP client").with_source(e)
            })?;

        Ok(Self {
            http_client,
            api_base: config.api_base.clone(),
        })
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.api_base,
            urlencoding::encode(calendar_id)
        )
    }

    /// Lists events, following `nextPageToken` until the last page.
    pub async fn list_events(
        &self,
        access_token: &str,
        query: &ListQuery,
    ) -> ProviderResult<Vec<CalendarEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_events_page(access_token, query, page_token.as_deref())
                .await?;
            events.extend(page.items);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            calendar = %query.calendar_id,
            "fetched {} events",
            events.len()
        );
        Ok(events)
    }

    async fn list_events_page(
        &self,
        access_token: &str,
        query: &ListQuery,
        page_token: Option<&str>,
    ) -> ProviderResult<EventListResponse> {
        let mut params = vec![
            ("timeMin", query.time_min.to_rfc3339()),
            ("singleEvents", query.single_events.to_string()),
        ];
        if query.order_by_start {
            params.push(("orderBy", "startTime".to_string()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let response = self
            .http_client
            .get(self.events_url(&query.calendar_id))
            .bearer_auth(access_token)
            .query(&params)
            .send()
            .await
            .map_err(transport_error)?;

        let body = check_status(response).await?.text().await.map_err(transport_error)?;
        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response("failed to parse events.list response").with_source(e)
        })
    }

    /// Inserts an event and returns the provider's id and link for it.
    pub async fn insert_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> ProviderResult<CreatedEvent> {
        let response = self
            .http_client
            .post(self.events_url(calendar_id))
            .bearer_auth(access_token)
            .json(event)
            .send()
            .await
            .map_err(transport_error)?;

        let body = check_status(response).await?.text().await.map_err(transport_error)?;
        let created: CreatedEvent = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response("failed to parse events.insert response").with_source(e)
        })?;

        debug!(id = ?created.id, "inserted event into {}", calendar_id);
        Ok(created)
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    let message = if e.is_timeout() {
        "request timed out"
    } else if e.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    ProviderError::network(message).with_source(e)
}

/// Maps non-2xx statuses onto error codes.
async fn check_status(response: Response) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ApiErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    let err = match status {
        StatusCode::BAD_REQUEST => ProviderError::bad_request(detail),
        StatusCode::UNAUTHORIZED => {
            ProviderError::authentication(format!("access token rejected: {}", detail))
        }
        StatusCode::FORBIDDEN => ProviderError::authorization(detail),
        StatusCode::NOT_FOUND => ProviderError::not_found(detail),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(match retry_after {
            Some(secs) => format!("{} (retry after {}s)", detail, secs),
            None => detail,
        }),
        _ => ProviderError::server(format!("API error ({}): {}", status, detail)),
    };
    Err(err.with_provider("google"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<CalendarEvent>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}
