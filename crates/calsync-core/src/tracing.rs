//! Tracing setup for calsync
//!
//! One entry point, [`init_tracing`], shared by the CLI and the HTTP server.
//!
//! ```ignore
//! use calsync_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::cli())?;
//! ```

use thiserror::Error;
use tracing::{Level, Subscriber};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("a tracing subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("invalid log filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line human-readable output
    #[default]
    Compact,
    /// Multi-line output with span context
    Pretty,
    /// One JSON object per line
    Json,
}

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level applied to calsync crates when RUST_LOG is not set
    pub default_level: Level,
    pub format: LogFormat,
    /// Include file/line information
    pub include_location: bool,
    pub include_timestamp: bool,
    /// Explicit filter directive, takes precedence over RUST_LOG
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::cli()
    }
}

impl TracingConfig {
    /// Quiet preset for interactive commands: warnings only, no timestamps.
    #[must_use]
    pub fn cli() -> Self {
        Self {
            default_level: Level::WARN,
            format: LogFormat::Compact,
            include_location: false,
            include_timestamp: false,
            env_filter: None,
        }
    }

    /// Verbose preset selected by `--debug`.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            default_level: Level::DEBUG,
            include_location: true,
            ..Self::cli()
        }
    }

    /// Preset for the long-running HTTP server.
    #[must_use]
    pub fn server() -> Self {
        Self {
            default_level: Level::INFO,
            format: LogFormat::Compact,
            include_location: false,
            include_timestamp: true,
            env_filter: None,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    fn build_filter(&self) -> Result<EnvFilter, TracingError> {
        if let Some(ref filter) = self.env_filter {
            return Ok(EnvFilter::try_new(filter)?);
        }
        Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "warn,calsync={level},tower_http={level}",
                level = self.default_level
            ))
        }))
    }
}

/// Install the global tracing subscriber.
///
/// Call once, early in `main`. `RUST_LOG` overrides the configured level
/// unless an explicit filter was set on the config.
///
/// # Errors
///
/// Fails if a global subscriber is already installed or the filter
/// directive does not parse.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let subscriber = tracing_subscriber::registry()
        .with(config.build_filter()?)
        .with(output_layer(&config));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn output_layer<S>(config: &TracingConfig) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let location = config.include_location;
    let base = fmt::layer().with_file(location).with_line_number(location);

    match (config.format, config.include_timestamp) {
        (LogFormat::Compact, true) => base.compact().with_target(location).boxed(),
        (LogFormat::Compact, false) => base.compact().with_target(location).without_time().boxed(),
        (LogFormat::Pretty, _) => base.pretty().boxed(),
        (LogFormat::Json, _) => base.json().boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_preset_is_quiet() {
        let config = TracingConfig::cli();
        assert_eq!(config.default_level, Level::WARN);
        assert_eq!(config.format, LogFormat::Compact);
        assert!(!config.include_timestamp);
    }

    #[test]
    fn debug_preset_raises_level() {
        let config = TracingConfig::cli_debug();
        assert_eq!(config.default_level, Level::DEBUG);
        assert!(config.include_location);
    }

    #[test]
    fn server_preset_has_timestamps() {
        let config = TracingConfig::server();
        assert_eq!(config.default_level, Level::INFO);
        assert!(config.include_timestamp);
    }

    #[test]
    fn explicit_filter_wins() {
        let config = TracingConfig::server()
            .with_format(LogFormat::Json)
            .with_env_filter("calsync_providers=trace");
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.build_filter().is_ok());
    }

    #[test]
    fn invalid_filter_is_an_error() {
        let config = TracingConfig::cli().with_env_filter("calsync=notalevel");
        assert!(matches!(
            config.build_filter(),
            Err(TracingError::EnvFilter(_))
        ));
    }
}
