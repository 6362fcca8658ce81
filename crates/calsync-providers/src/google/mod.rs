//! Google Calendar backend.
//!
//! - [`CredentialStore`] keeps the authorized-user credential in `token.json`
//!   and falls back to the browser consent flow ([`OAuthClient`]) when there
//!   is none.
//! - [`GoogleProvider`] implements [`CalendarProvider`](crate::CalendarProvider)
//!   on top of the Calendar v3 API, refreshing access tokens as needed.

mod client;
mod config;
mod credentials;
mod oauth;
mod provider;

pub use client::GoogleCalendarClient;
pub use config::{CALENDAR_SCOPE, CredentialConfig, GoogleConfig, OAuthCredentials};
pub use credentials::{Authorizer, CredentialStore};
pub use oauth::{OAuthClient, PkceFlow};
pub use provider::GoogleProvider;
