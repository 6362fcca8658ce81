//! OAuth 2.0 authorization-code flow with PKCE and a loopback redirect.
//!
//! [`OAuthClient`] is the production [`Authorizer`]: it binds a listener on
//! `127.0.0.1`, sends the user's browser to Google's consent page, waits for
//! the redirect carrying the authorization code, and exchanges that code at
//! the token endpoint. It also performs the `refresh_token` grant used by the
//! Google provider.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::credential::{AccessToken, Credential, TokenGrant};
use crate::error::{CredentialError, CredentialResult, ProviderError, ProviderResult};
use crate::provider::BoxFuture;

use super::config::{GoogleConfig, OAuthCredentials};
use super::credentials::Authorizer;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Bytes of entropy in the PKCE code verifier.
const CODE_VERIFIER_LENGTH: usize = 32;

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Read and write timeout for a single redirect connection.
const STREAM_TIMEOUT: Duration = Duration::from_secs(2);

/// Talks to Google's OAuth endpoints.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http_client: reqwest::Client,
    token_url: String,
    port_range: (u16, u16),
    open_browser: bool,
}

impl OAuthClient {
    /// Creates a client for the given token endpoint.
    pub fn new(token_url: impl Into<String>, timeout: Duration) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProviderError::configuration("failed to build OAuth HTTP client").with_source(e)
            })?;

        Ok(Self {
            http_client,
            token_url: token_url.into(),
            port_range: (8080, 8090),
            open_browser: true,
        })
    }

    /// Creates a client for Google's production token endpoint.
    pub fn google(timeout: Duration) -> ProviderResult<Self> {
        Self::new(GoogleConfig::DEFAULT_TOKEN_URL, timeout)
    }

    /// Sets the ports tried for the loopback listener.
    pub fn with_port_range(mut self, start: u16, end: u16) -> Self {
        self.port_range = (start, end);
        self
    }

    /// Only print the consent URL instead of launching a browser.
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }

    /// Runs the full interactive flow and returns the granted tokens.
    pub async fn authorize_interactive(
        &self,
        secrets: &OAuthCredentials,
        scopes: &[String],
    ) -> ProviderResult<TokenGrant> {
        let pkce = PkceFlow::new();
        let (listener, port) = bind_loopback_server(self.port_range)?;
        let redirect_uri = format!("http://127.0.0.1:{}/callback", port);
        let auth_url = pkce.build_auth_url(&secrets.client_id, &redirect_uri, scopes);

        info!(port, "waiting for OAuth consent");
        debug!("authorization URL: {}", auth_url);

        let opened = self.open_browser
            && match open::that(&auth_url) {
                Ok(()) => true,
                Err(e) => {
                    warn!("failed to open browser: {}", e);
                    false
                }
            };
        if !opened {
            eprintln!("\nOpen this URL in your browser to authorize calsync:\n\n{}\n", auth_url);
        }

        let callback = tokio::task::spawn_blocking(move || wait_for_callback(listener, CALLBACK_TIMEOUT))
            .await
            .map_err(|e| ProviderError::internal("callback listener task failed").with_source(e))??;

        if callback.state != pkce.state {
            return Err(ProviderError::authorization(
                "OAuth state mismatch, ignoring callback",
            ));
        }

        info!("received authorization code, exchanging for tokens");
        self.exchange_code(secrets, &callback.code, &pkce.verifier, &redirect_uri, scopes)
            .await
    }

    /// Exchanges an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        secrets: &OAuthCredentials,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> ProviderResult<TokenGrant> {
        let params = [
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];
        let response = self.post_token_form(&params, "token exchange").await?;

        Ok(TokenGrant {
            access_token: AccessToken::new(response.access_token, response.expires_in),
            refresh_token: response.refresh_token,
            scopes: response
                .scope
                .map(|s| s.split_whitespace().map(String::from).collect())
                .unwrap_or_else(|| scopes.to_vec()),
        })
    }

    /// Obtains a fresh access token with the credential's refresh token.
    ///
    /// A revoked or expired refresh token (`invalid_grant`) is reported as
    /// an authentication failure.
    pub async fn refresh(&self, credential: &Credential) -> ProviderResult<AccessToken> {
        let params = [
            ("client_id", credential.client_id.as_str()),
            ("client_secret", credential.client_secret.as_str()),
            ("refresh_token", credential.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let response = self.post_token_form(&params, "token refresh").await?;

        debug!("refreshed access token");
        Ok(AccessToken::new(response.access_token, response.expires_in))
    }

    async fn post_token_form(
        &self,
        params: &[(&str, &str)],
        what: &str,
    ) -> ProviderResult<TokenResponse> {
        let response = self
            .http_client
            .post(&self.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("{} request failed", what)).with_source(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ProviderError::network(format!("failed to read {} response", what)).with_source(e)
        })?;

        if !status.is_success() {
            let reason = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| match e.error_description {
                    Some(desc) => format!("{}: {}", e.error, desc),
                    None => e.error,
                })
                .unwrap_or(body);
            return Err(ProviderError::authentication(format!(
                "{} failed ({}): {}",
                what, status, reason
            ))
            .with_provider("google"));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("invalid {} response", what)).with_source(e)
        })
    }
}

impl Authorizer for OAuthClient {
    fn authorize<'a>(
        &'a self,
        secrets: &'a OAuthCredentials,
        scopes: &'a [String],
    ) -> BoxFuture<'a, CredentialResult<TokenGrant>> {
        Box::pin(async move {
            self.authorize_interactive(secrets, scopes)
                .await
                .map_err(CredentialError::from)
        })
    }
}

/// Binds the first free port in the range on the loopback interface.
fn bind_loopback_server(port_range: (u16, u16)) -> ProviderResult<(TcpListener, u16)> {
    for port in port_range.0..=port_range.1 {
        if let Ok(listener) = TcpListener::bind(("127.0.0.1", port)) {
            let bound = listener
                .local_addr()
                .map_err(|e| ProviderError::internal("loopback listener has no address").with_source(e))?
                .port();
            debug!("bound loopback server on port {}", bound);
            return Ok((listener, bound));
        }
    }
    Err(ProviderError::configuration(format!(
        "no available port in range {}-{}",
        port_range.0, port_range.1
    )))
}

/// The useful part of the redirect request.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Callback {
    code: String,
    state: String,
}

/// Blocks until a callback request arrives or `timeout` elapses.
///
/// The listener is polled without blocking so it is dropped, and the port
/// released, as soon as the deadline passes.
fn wait_for_callback(listener: TcpListener, timeout: Duration) -> ProviderResult<Callback> {
    listener.set_nonblocking(true).map_err(|e| {
        ProviderError::internal("failed to configure loopback listener").with_source(e)
    })?;
    let deadline = Instant::now() + timeout;

    loop {
        match listener.accept() {
            Ok((stream, _)) => {
                if let Some(result) = handle_callback(stream) {
                    return result;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => error!("failed to accept connection: {}", e),
        }

        if Instant::now() >= deadline {
            return Err(ProviderError::authentication(
                "timed out waiting for the OAuth redirect",
            ));
        }
        thread::sleep(ACCEPT_POLL_INTERVAL);
    }
}

/// Answers the browser and extracts the outcome. Requests to other paths
/// (favicon probes and the like) yield `None` and are ignored.
fn handle_callback(mut stream: TcpStream) -> Option<ProviderResult<Callback>> {
    stream.set_nonblocking(false).ok()?;
    stream.set_read_timeout(Some(STREAM_TIMEOUT)).ok()?;
    stream.set_write_timeout(Some(STREAM_TIMEOUT)).ok()?;

    let mut request_line = String::new();
    BufReader::new(&stream).read_line(&mut request_line).ok()?;

    let outcome = parse_callback(&request_line)?;

    let page = match outcome {
        Ok(_) => {
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
            <html><body><h1>calsync is authorized</h1>\
            <p>You can close this window and return to the terminal.</p></body></html>"
        }
        Err(_) => {
            "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
            <html><body><h1>Authorization failed</h1>\
            <p>You can close this window.</p></body></html>"
        }
    };
    let _ = stream.write_all(page.as_bytes());
    let _ = stream.flush();

    Some(outcome)
}

/// Parses `GET /callback?code=...&state=... HTTP/1.1`.
fn parse_callback(request_line: &str) -> Option<ProviderResult<Callback>> {
    let mut parts = request_line.split_whitespace();
    if parts.next()? != "GET" {
        return None;
    }
    let target = parts.next()?;
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    if path != "/callback" {
        return None;
    }

    let mut code = None;
    let mut state = None;
    let mut denied = None;
    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let value = urlencoding::decode(value)
            .map(|v| v.into_owned())
            .unwrap_or_default();
        match key {
            "code" => code = Some(value),
            "state" => state = Some(value),
            "error" => denied = Some(value),
            _ => {}
        }
    }

    if let Some(reason) = denied {
        return Some(Err(ProviderError::authorization(format!(
            "authorization denied: {}",
            reason
        ))));
    }

    Some(match code {
        Some(code) if !code.is_empty() => Ok(Callback {
            code,
            state: state.unwrap_or_default(),
        }),
        _ => Err(ProviderError::authentication(
            "missing authorization code in callback",
        )),
    })
}

/// RFC 7636 verifier, challenge and CSRF state.
#[derive(Debug)]
pub struct PkceFlow {
    pub verifier: String,
    pub challenge: String,
    pub state: String,
}

impl PkceFlow {
    pub fn new() -> Self {
        let verifier = random_token(CODE_VERIFIER_LENGTH);
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
            state: random_token(16),
        }
    }

    /// Builds Google's consent URL.
    ///
    /// `access_type=offline` together with `prompt=consent` makes Google issue
    /// a refresh token even if the user consented before.
    pub fn build_auth_url(&self, client_id: &str, redirect_uri: &str, scopes: &[String]) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            code_challenge={}&code_challenge_method=S256&state={}&\
            access_type=offline&prompt=consent",
            GOOGLE_AUTH_URL,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes.join(" ")),
            urlencoding::encode(&self.challenge),
            urlencoding::encode(&self.state),
        )
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}
