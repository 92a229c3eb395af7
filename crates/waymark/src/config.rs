//! Waymark configuration.
//!
//! Every knob is explicit; nothing is read from the process environment.
//! Configuration files are TOML or JSON, chosen by extension.
//!
//! ```toml
//! [router]
//! mount_prefix = "/api"
//! allow_unknown_operation = true
//!
//! [request_validation]
//! allow_additional_parameters = true
//!
//! [response_validation]
//! enabled = true
//!
//! [logging]
//! level = "debug"
//! json_format = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use waymark_router::MatchOptions;
use waymark_validation::ValidationConfig;

use crate::logging::LogConfig;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read configuration file: {path}")]
    Read {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension is neither `toml` nor `json`.
    #[error("unsupported configuration file format: {}", .path.display())]
    UnsupportedFormat {
        /// Path to the file.
        path: PathBuf,
    },
}

/// Complete Waymark configuration.
///
/// # Example
///
/// ```
/// use waymark::WaymarkConfig;
///
/// let config = WaymarkConfig::from_toml_str(r#"
///     [router]
///     mount_prefix = "/api"
/// "#).unwrap();
///
/// assert_eq!(config.router.mount_prefix, "/api");
/// assert!(config.request_validation.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaymarkConfig {
    /// Routing behavior.
    pub router: RouterConfig,

    /// Request validation behavior.
    pub request_validation: RequestValidationConfig,

    /// Response validation behavior.
    pub response_validation: ResponseValidationConfig,

    /// Logging setup used by [`init_logging`](crate::logging::init_logging).
    pub logging: LogConfig,
}

impl WaymarkConfig {
    /// Development preset.
    ///
    /// - Response validation on
    /// - Pretty debug logging
    #[must_use]
    pub fn development() -> Self {
        Self {
            response_validation: ResponseValidationConfig { enabled: true },
            logging: LogConfig::development(),
            ..Self::default()
        }
    }

    /// Production preset.
    ///
    /// - Response validation off
    /// - JSON info logging
    #[must_use]
    pub fn production() -> Self {
        Self {
            response_validation: ResponseValidationConfig { enabled: false },
            logging: LogConfig::production(),
            ..Self::default()
        }
    }

    /// Parses a TOML document. Missing sections take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Parses a JSON document. Missing sections take their defaults.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Loads a `.toml` or `.json` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        let parse = match extension.as_deref() {
            Some("toml") => Self::from_toml_str,
            Some("json") => Self::from_json_str,
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        parse(&content)
    }
}

/// Routing behavior.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Prefix consumed by an upstream mount point; stripped before matching.
    pub mount_prefix: String,

    /// Let requests that match no operation pass through unannotated.
    pub allow_unknown_operation: bool,

    /// Let placeholders bind empty segments.
    pub allow_empty_parameters: bool,

    /// On a method mismatch, keep looking at lower-priority templates that
    /// declare the method.
    pub method_fallthrough: bool,

    /// Report a method mismatch as not found.
    pub merge_method_mismatch: bool,

    /// Return routing misses as errors instead of outcomes.
    pub raise_error: bool,
}

impl RouterConfig {
    pub(crate) fn match_options(&self) -> MatchOptions {
        MatchOptions {
            allow_empty_parameters: self.allow_empty_parameters,
            method_fallthrough: self.method_fallthrough,
        }
    }
}

/// Request validation behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestValidationConfig {
    /// Validate requests at all.
    pub enabled: bool,

    /// Return invalid requests as errors from the pipeline instead of
    /// rendering a 400.
    pub raise_error: bool,

    /// Accept undeclared query parameters.
    pub allow_additional_parameters: bool,

    /// Convert parameter strings to their declared types.
    pub coerce_parameters: bool,
}

impl Default for RequestValidationConfig {
    fn default() -> Self {
        let validation = ValidationConfig::default();
        Self {
            enabled: true,
            raise_error: false,
            allow_additional_parameters: validation.allow_additional_parameters,
            coerce_parameters: validation.coerce_parameters,
        }
    }
}

impl RequestValidationConfig {
    /// Settings handed to the validation plan.
    #[must_use]
    pub fn validation_config(&self) -> ValidationConfig {
        ValidationConfig {
            allow_additional_parameters: self.allow_additional_parameters,
            coerce_parameters: self.coerce_parameters,
        }
    }
}

/// Response validation behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResponseValidationConfig {
    /// Check handler responses in the pipeline.
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = WaymarkConfig::default();
        assert_eq!(config.router.mount_prefix, "");
        assert!(!config.router.allow_unknown_operation);
        assert!(!config.router.raise_error);
        assert!(config.request_validation.enabled);
        assert!(!config.request_validation.raise_error);
        assert!(!config.request_validation.allow_additional_parameters);
        assert!(config.request_validation.coerce_parameters);
        assert!(!config.response_validation.enabled);
    }

    #[test]
    fn test_presets() {
        let dev = WaymarkConfig::development();
        assert!(dev.response_validation.enabled);
        assert!(!dev.logging.json_format);

        let prod = WaymarkConfig::production();
        assert!(!prod.response_validation.enabled);
        assert!(prod.logging.json_format);
    }

    #[test]
    fn test_toml_sections() {
        let config = WaymarkConfig::from_toml_str(
            r#"
            [router]
            allow_unknown_operation = true
            merge_method_mismatch = true

            [request_validation]
            raise_error = true
            coerce_parameters = false
            "#,
        )
        .unwrap();

        assert!(config.router.allow_unknown_operation);
        assert!(config.router.merge_method_mismatch);
        assert!(config.request_validation.raise_error);
        assert!(config.request_validation.enabled);
        assert!(!config.request_validation.validation_config().coerce_parameters);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = WaymarkConfig::from_toml_str("[router]\nstrict = true").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_from_file_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"router": {{"mount_prefix": "/v1"}}}}"#).unwrap();
        let config = WaymarkConfig::from_file(file.path()).unwrap();
        assert_eq!(config.router.mount_prefix, "/v1");

        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = WaymarkConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = WaymarkConfig::from_file("/nonexistent/waymark.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
