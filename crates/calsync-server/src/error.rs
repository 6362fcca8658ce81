//! Server error types.

use std::io;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use calsync_providers::{CredentialError, ProviderError};
use thiserror::Error;
use tracing::error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Serving failed after startup.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Body of every failed `/api/getEvents` response.
pub const FETCH_ERROR_BODY: &str = "Error fetching events";

/// A request that could not be answered.
///
/// The detail is logged; clients only ever see [`FETCH_ERROR_BODY`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self, "error fetching events");
        (StatusCode::INTERNAL_SERVER_ERROR, FETCH_ERROR_BODY).into_response()
    }
}
