//! Validation error types.
//!
//! Request problems are reported as data ([`RequestInvalid`] carries every
//! cause). Response problems ([`ResponseInvalid`]) mean the implementation
//! broke its contract.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a violation was found.
///
/// Serializes as a single-key object: `{"parameter": "limit"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSource {
    /// A path parameter.
    Path(String),
    /// A query parameter.
    Parameter(String),
    /// A header parameter.
    Header(String),
    /// A JSON pointer into the body.
    Pointer(String),
}

impl ErrorSource {
    /// Returns the parameter name or pointer.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Path(name) | Self::Parameter(name) | Self::Header(name) | Self::Pointer(name) => {
                name
            }
        }
    }

    /// Returns the human label used in error messages.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Path(_) => "Path parameter invalid:",
            Self::Parameter(_) => "Query parameter invalid:",
            Self::Header(_) => "Header invalid:",
            Self::Pointer(_) => "Request body invalid:",
        }
    }
}

/// The class of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required value is missing.
    Required,
    /// A value has the wrong type.
    Type,
    /// A value does not match its format.
    Format,
    /// A value is not among the allowed ones.
    Enum,
    /// A value does not match its pattern.
    Pattern,
    /// An undeclared property or parameter is present.
    AdditionalProperties,
    /// Any other schema violation.
    Schema,
    /// A required body is absent.
    MissingBody,
    /// The body media type is not declared.
    UnsupportedContentType,
    /// The body could not be parsed.
    MalformedBody,
}

/// One conformance violation.
///
/// # Example
///
/// ```rust
/// use waymark_validation::{ErrorKind, ErrorSource, ValidationError};
///
/// let error = ValidationError::new(
///     ErrorSource::Parameter("limit".to_string()),
///     ErrorKind::Type,
///     "\"abc\" is not of type \"integer\"",
/// );
/// let json = serde_json::to_value(&error).unwrap();
/// assert_eq!(json["source"]["parameter"], "limit");
/// assert_eq!(json["kind"], "type");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Where the violation was found.
    pub source: ErrorSource,
    /// What kind of violation it is.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub title: String,
}

impl ValidationError {
    /// Creates a validation error.
    #[must_use]
    pub fn new(source: ErrorSource, kind: ErrorKind, title: impl Into<String>) -> Self {
        Self {
            source,
            kind,
            title: title.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source.label())?;
        if !self.source.name().is_empty() {
            write!(f, " {}", self.source.name())?;
        }
        write!(f, " {}", self.title)
    }
}

fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_pointers(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}", e.source.name(), e.title).trim_start().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The request does not conform to its operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe(.errors))]
pub struct RequestInvalid {
    /// Every violation, ordered path, query, header, body.
    pub errors: Vec<ValidationError>,
}

impl RequestInvalid {
    /// Returns the violations.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Returns the `{"errors": [...]}` body rendered for clients.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "errors": self.errors })
    }
}

/// The response does not conform to its operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseInvalid {
    /// No response is declared for the status, not even `default`.
    #[error("Response status code or default not found: {status} for '{operation_id}'")]
    CodeNotFound {
        /// Operation ID.
        operation_id: String,
        /// Returned status code.
        status: u16,
    },

    /// The status is declared, but not with this content type.
    #[error("Response content type not found '{content_type}' for '{operation_id}' status {status}")]
    ContentTypeNotFound {
        /// Operation ID.
        operation_id: String,
        /// Returned status code.
        status: u16,
        /// Returned content type, empty if absent.
        content_type: String,
    },

    /// The body violates the declared schema.
    #[error("Response body is invalid for '{operation_id}' status {status}: {}", describe_pointers(.errors))]
    BodyInvalid {
        /// Operation ID.
        operation_id: String,
        /// Returned status code.
        status: u16,
        /// Every violation.
        errors: Vec<ValidationError>,
    },
}

/// A contract schema could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid schema for '{operation_id}' at {location}: {reason}")]
pub struct SchemaCompileError {
    /// Operation ID.
    pub operation_id: String,
    /// Which schema failed (e.g. `query`, `requestBody application/json`).
    pub location: String,
    /// Engine message.
    pub reason: String,
}
