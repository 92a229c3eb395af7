//! Facade error types.

use http::Method;
use thiserror::Error;
use waymark_definition::ContractError;
use waymark_validation::{RequestInvalid, ResponseInvalid, SchemaCompileError};

use crate::config::ConfigError;

/// Result alias for facade operations.
pub type WaymarkResult<T> = Result<T, WaymarkError>;

/// Errors raised while setting Waymark up.
#[derive(Error, Debug)]
pub enum WaymarkError {
    /// The contract could not be loaded.
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// A contract schema could not be compiled.
    #[error(transparent)]
    Schema(#[from] SchemaCompileError),

    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The logging subscriber could not be installed.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}

/// A routing miss, returned as an error when `router.raise_error` is set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// No operation is declared for the path.
    #[error("Not found: {method} {path}")]
    NotFound {
        /// Request method.
        method: Method,
        /// Full request path.
        path: String,
    },

    /// The path is declared, but not for this method.
    #[error("Method not allowed: {method} {path}")]
    MethodNotAllowed {
        /// Request method.
        method: Method,
        /// Full request path.
        path: String,
        /// Methods declared for the path.
        allowed: Vec<Method>,
    },
}

/// Errors the pipeline returns instead of rendering.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Routing missed and `router.raise_error` is set.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The request is invalid and `request_validation.raise_error` is set.
    #[error(transparent)]
    RequestInvalid(#[from] RequestInvalid),

    /// The handler's response does not match the contract.
    #[error(transparent)]
    ResponseInvalid(#[from] ResponseInvalid),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_error_messages() {
        let err = RouteError::NotFound {
            method: Method::GET,
            path: "/unknown".into(),
        };
        assert_eq!(err.to_string(), "Not found: GET /unknown");

        let err = RouteError::MethodNotAllowed {
            method: Method::DELETE,
            path: "/pets".into(),
            allowed: vec![Method::GET, Method::POST],
        };
        assert_eq!(err.to_string(), "Method not allowed: DELETE /pets");
    }

    #[test]
    fn test_pipeline_error_from_response_invalid() {
        let err: PipelineError = ResponseInvalid::CodeNotFound {
            operation_id: "listPets".into(),
            status: 418,
        }
        .into();
        assert!(matches!(err, PipelineError::ResponseInvalid(_)));
        assert!(err.to_string().contains("418"));
    }
}
