//! Request and response validation against a Waymark contract.
//!
//! A [`ValidationPlan`] compiles every schema of a
//! [`Definition`](waymark_definition::Definition) once. Requests are then
//! checked parameter group by parameter group (path, query, header) and body;
//! responses by status, content type and body.
//!
//! # Example
//!
//! ```rust
//! use http::HeaderMap;
//! use waymark_definition::Definition;
//! use waymark_router::Params;
//! use waymark_validation::{ValidationConfig, ValidationPlan};
//!
//! let definition = Definition::from_yaml_str(r#"
//! openapi: 3.0.2
//! info: { title: Petstore, version: 1.0.0 }
//! paths:
//!   /pets:
//!     get:
//!       operationId: listPets
//!       parameters:
//!         - { name: limit, in: query, schema: { type: integer, maximum: 100 } }
//! "#).unwrap();
//! let plan = ValidationPlan::new(&definition, ValidationConfig::default()).unwrap();
//! let operation = definition.operation("listPets").unwrap();
//!
//! let ok = plan
//!     .requests()
//!     .validate(operation, &Params::new(), Some("limit=10"), &HeaderMap::new(), None, b"")
//!     .unwrap();
//! assert_eq!(ok.query["limit"], 10);
//!
//! let err = plan
//!     .requests()
//!     .validate(operation, &Params::new(), Some("limit=200"), &HeaderMap::new(), None, b"")
//!     .unwrap_err();
//! assert_eq!(err.errors()[0].source.name(), "limit");
//! ```
//!
//! # Coercion
//!
//! Parameter values are strings on the wire. With
//! [`ValidationConfig::coerce_parameters`] on (the default) they are converted
//! to the declared `integer`, `number` or `boolean` before checking.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod coerce;
mod config;
mod content;
mod engine;
pub mod error;
mod plan;
mod query;
mod request;
mod response;

pub use config::ValidationConfig;
pub use engine::{JsonSchemaEngine, SchemaEngine, Violation};
pub use error::{
    ErrorKind, ErrorSource, RequestInvalid, ResponseInvalid, SchemaCompileError, ValidationError,
};
pub use plan::{parameter_schema, ValidationPlan};
pub use query::{parse_query, QueryMap};
pub use request::{RequestValidator, ValidatedRequest};
pub use response::ResponseValidator;
