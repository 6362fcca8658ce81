//! CLI configuration.
//!
//! Everything lives in a single `calsync.toml`. The file is looked up at the
//! path given with `--config` (or `CALSYNC_CONFIG`), otherwise in the working
//! directory; without a file the defaults apply. Relative paths inside the
//! file are taken relative to the working directory, like the defaults.

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use calsync_core::DuplicateRule;
use calsync_providers::PRIMARY_CALENDAR;
use calsync_providers::google::{CALENDAR_SCOPE, CredentialConfig, GoogleConfig};
use calsync_server::ServerConfig;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// File name looked up in the working directory.
pub const DEFAULT_FILE: &str = "calsync.toml";

/// Contents of `calsync.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Persisted authorized-user credential.
    pub token_path: PathBuf,

    /// OAuth client secret bundle from the Cloud Console.
    pub secrets_path: PathBuf,

    /// Scopes requested when authorizing.
    pub scopes: Vec<String>,

    /// Calendar listed and written to.
    pub calendar_id: String,

    /// How `create` decides an event already exists.
    pub duplicate_rule: DuplicateRule,

    /// HTTP timeout for Google requests, in seconds.
    pub timeout_secs: u64,

    /// First and last port tried for the OAuth redirect listener.
    pub loopback_ports: [u16; 2],

    /// HTTP surface settings.
    pub server: ServerSettings,
}

/// `[server]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    pub bind: IpAddr,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerConfig::DEFAULT_PORT,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from(CredentialConfig::DEFAULT_TOKEN_PATH),
            secrets_path: PathBuf::from(CredentialConfig::DEFAULT_SECRETS_PATH),
            scopes: vec![CALENDAR_SCOPE.to_string()],
            calendar_id: PRIMARY_CALENDAR.to_string(),
            duplicate_rule: DuplicateRule::default(),
            timeout_secs: GoogleConfig::DEFAULT_TIMEOUT_SECS,
            loopback_ports: [8080, 8090],
            server: ServerSettings::default(),
        }
    }
}

impl ClientConfig {
    /// Loads the configuration.
    ///
    /// An explicit path must exist. Without one, `calsync.toml` in the working
    /// directory is used if present.
    pub fn load(explicit: Option<&Path>) -> CliResult<Self> {
        match Self::path(explicit) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Returns the file [`load`](Self::load) reads, if any.
    pub fn path(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let local = PathBuf::from(DEFAULT_FILE);
                local.is_file().then_some(local)
            }
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)
            .map_err(|e| CliError::config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses and validates TOML.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> CliResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::config(format!("failed to serialize config: {}", e)))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.calendar_id.is_empty() {
            return Err("calendar_id must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be positive".to_string());
        }
        self.credential_config().validate()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn credential_config(&self) -> CredentialConfig {
        CredentialConfig::new()
            .with_token_path(&self.token_path)
            .with_secrets_path(&self.secrets_path)
            .with_scopes(self.scopes.clone())
            .with_loopback_port_range(self.loopback_ports[0], self.loopback_ports[1])
            .with_timeout(self.timeout())
    }

    pub fn google_config(&self) -> GoogleConfig {
        GoogleConfig::new().with_timeout(self.timeout())
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new(self.server.bind, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_defaults() {
        let config = ClientConfig::from_toml("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.token_path, PathBuf::from("token.json"));
        assert_eq!(config.secrets_path, PathBuf::from("credentials.json"));
        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.duplicate_rule, DuplicateRule::StartOrEnd);
        assert_eq!(config.server_config().socket_addr().to_string(), "127.0.0.1:3001");
    }

    #[test]
    fn full_file() {
        let config = ClientConfig::from_toml(
            r#"
            token_path = "/var/lib/calsync/token.json"
            secrets_path = "/etc/calsync/credentials.json"
            scopes = ["https://www.googleapis.com/auth/calendar.events"]
            calendar_id = "team@group.calendar.google.com"
            duplicate_rule = "start-and-end"
            timeout_secs = 10
            loopback_ports = [9000, 9005]

            [server]
            bind = "0.0.0.0"
            port = 8088
            "#,
        )
        .unwrap();

        let credentials = config.credential_config();
        assert_eq!(credentials.token_path, PathBuf::from("/var/lib/calsync/token.json"));
        assert_eq!(credentials.secrets_path, PathBuf::from("/etc/calsync/credentials.json"));
        assert_eq!(
            credentials.scopes,
            vec!["https://www.googleapis.com/auth/calendar.events".to_string()]
        );
        assert_eq!(credentials.loopback_port_range, (9000, 9005));
        assert_eq!(credentials.timeout, Duration::from_secs(10));

        assert_eq!(config.calendar_id, "team@group.calendar.google.com");
        assert_eq!(config.google_config().timeout, Duration::from_secs(10));

        assert_eq!(config.duplicate_rule, DuplicateRule::StartAndEnd);
        assert_eq!(config.server_config().socket_addr().to_string(), "0.0.0.0:8088");
    }

    #[test]
    fn partial_server_table_keeps_defaults() {
        let config = ClientConfig::from_toml("[server]\nport = 4000\n").unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.bind, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(ClientConfig::from_toml(r#"duplicate_rule = "fuzzy""#).is_err());
        assert!(ClientConfig::from_toml("scopes = []").is_err());
        assert!(ClientConfig::from_toml("loopback_ports = [9000, 8000]").is_err());
        assert!(ClientConfig::from_toml("timeout_secs = 0").is_err());
        assert!(ClientConfig::from_toml(r#"calendar_ids = ["a"]"#).is_err());
    }

    #[test]
    fn load_explicit_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calsync.toml");
        std::fs::write(&path, "calendar_id = \"work\"\n").unwrap();

        assert_eq!(ClientConfig::load(Some(&path)).unwrap().calendar_id, "work");

        let missing = dir.path().join("nope.toml");
        let err = ClientConfig::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn dump_round_trips() {
        let config = ClientConfig {
            calendar_id: "work".to_string(),
            ..Default::default()
        };
        let dumped = config.to_toml().unwrap();
        assert_eq!(ClientConfig::from_toml(&dumped).unwrap(), config);
    }

    #[test]
    fn default_dump_names_every_key() {
        let dumped = ClientConfig::default().to_toml().unwrap();
        for key in [
            "token_path = \"token.json\"",
            "secrets_path = \"credentials.json\"",
            "calendar_id = \"primary\"",
            "duplicate_rule = \"start-or-end\"",
            "timeout_secs = 30",
            "[server]",
            "bind = \"127.0.0.1\"",
            "port = 3001",
        ] {
            assert!(dumped.contains(key), "missing {:?} in:\n{}", key, dumped);
        }
    }
}
