//! Structured logging setup.
//!
//! Waymark emits `tracing` events: `info` when a contract is parsed and
//! again once its validation plan is compiled, `debug` for routing and
//! validation decisions, `warn` when a response drifts from the contract. [`init_logging`] installs a subscriber for them.
//!
//! # Example
//!
//! ```rust,ignore
//! use waymark::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(operation_id = "listPets", "routed");
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::WaymarkError;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directives (e.g. `"info"`, `"waymark=debug,waymark_router=warn"`).
    pub level: String,

    /// JSON lines instead of pretty output.
    pub json_format: bool,

    /// Include span open/close events.
    pub span_events: bool,

    /// Include file and line.
    pub file_line_info: bool,

    /// Include the target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Human-readable debug output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            include_target: true,
        }
    }

    /// JSON info output.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            include_target: true,
        }
    }
}

/// Installs the global subscriber.
///
/// Does nothing when `config.enabled` is false.
///
/// # Errors
///
/// Returns [`WaymarkError::LoggingInit`] for an invalid filter or when a
/// global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), WaymarkError> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_span_events(span_events)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_target(config.include_target);

    let result = if config.json_format {
        tracing_subscriber::registry()
            .with(layer.json().with_filter(filter))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(layer.pretty().with_filter(filter))
            .try_init()
    };
    result.map_err(|e| WaymarkError::LoggingInit(e.to_string()))
}

/// Parses filter directives.
pub fn create_env_filter(directives: &str) -> Result<EnvFilter, WaymarkError> {
    EnvFilter::try_new(directives)
        .map_err(|e| WaymarkError::LoggingInit(format!("invalid log level: {e}")))
}
