//! HTTP routes.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use calsync_core::CalendarEvent;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Path of the upcoming-events endpoint.
pub const EVENTS_PATH: &str = "/api/getEvents";

/// Builds the application router with permissive CORS.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(EVENTS_PATH, get(get_events))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// `GET /api/getEvents`: upcoming events of the configured calendar.
async fn get_events(State(state): State<AppState>) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    let scopes = &state.credentials().config().scopes;
    let credential = state.credentials().resolve(scopes).await?;
    let events = state.workflow().list_upcoming(&credential).await?;
    debug!("serving {} events", events.len());
    Ok(Json(events))
}
