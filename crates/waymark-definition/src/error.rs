//! Contract build errors.
//!
//! Every structural problem in a contract is reported while the
//! [`Definition`](crate::Definition) is built. Nothing is parsed lazily, so a
//! definition that loaded successfully never fails at request time.

use std::path::PathBuf;

use thiserror::Error;
use waymark_router::{RouteConflict, TemplateError};

/// Result type alias using [`ContractError`].
pub type ContractResult<T> = Result<T, ContractError>;

/// Errors raised while turning a contract document into a definition.
#[derive(Debug, Error)]
pub enum ContractError {
    /// The contract file could not be read.
    #[error("failed to read contract {}: {source}", path.display())]
    Io {
        /// Path of the contract file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The contract text is not valid JSON or YAML.
    #[error("failed to parse {format} contract: {message}")]
    Parse {
        /// `"json"` or `"yaml"`.
        format: &'static str,
        /// Parser message.
        message: String,
    },

    /// The `openapi` field is missing or names an unsupported version.
    #[error("unsupported OpenAPI version '{version}' (expected 3.0.x or 3.1.x)")]
    UnsupportedVersion {
        /// The declared version, empty if absent.
        version: String,
    },

    /// A part of the document has the wrong shape.
    #[error("malformed contract at {location}: {message}")]
    Malformed {
        /// Where in the document the problem is (e.g. `paths./pets.get`).
        location: String,
        /// What is wrong.
        message: String,
    },

    /// A path template could not be parsed.
    #[error("malformed path template '{template}': {source}")]
    MalformedTemplate {
        /// The template as written.
        template: String,
        /// Parse failure.
        #[source]
        source: TemplateError,
    },

    /// A template placeholder has no `in: path` declaration.
    #[error("operation '{operation_id}' uses path parameter '{name}' without declaring it")]
    UndeclaredPathParameter {
        /// Operation ID.
        operation_id: String,
        /// Placeholder name.
        name: String,
    },

    /// An `in: path` declaration does not appear in the template.
    #[error("operation '{operation_id}' declares path parameter '{name}' missing from its template")]
    UnusedPathParameter {
        /// Operation ID.
        operation_id: String,
        /// Declared name.
        name: String,
    },

    /// A parameter declaration is invalid.
    #[error("operation '{operation_id}' has an invalid parameter: {message}")]
    InvalidParameter {
        /// Operation ID.
        operation_id: String,
        /// What is wrong.
        message: String,
    },

    /// Two operations share an `operationId`.
    #[error("duplicate operationId '{operation_id}'")]
    DuplicateOperationId {
        /// The repeated ID.
        operation_id: String,
    },

    /// A `responses` key is not a status code, class wildcard or `default`.
    #[error("operation '{operation_id}' has invalid response key '{key}'")]
    InvalidStatusKey {
        /// Operation ID.
        operation_id: String,
        /// The offending key.
        key: String,
    },

    /// Two operations cannot be told apart by the router.
    #[error(transparent)]
    RouteConflict(#[from] RouteConflict),
}

impl ContractError {
    pub(crate) fn malformed(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            location: location.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ContractError::UndeclaredPathParameter {
            operation_id: "showPetById".to_string(),
            name: "petId".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "operation 'showPetById' uses path parameter 'petId' without declaring it"
        );

        let err = ContractError::malformed("paths./pets", "expected an object");
        assert_eq!(
            err.to_string(),
            "malformed contract at paths./pets: expected an object"
        );
    }

    #[test]
    fn test_template_error_is_source() {
        use std::error::Error as _;

        let source = waymark_router::PathTemplate::parse("/pets/{id")
            .map(|_| ())
            .unwrap_err();
        let err = ContractError::MalformedTemplate {
            template: "/pets/{id".to_string(),
            source,
        };
        assert!(err.source().is_some());
    }
}
