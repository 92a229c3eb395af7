//! Waymark Definition - the contract model.
//!
//! This crate turns a resolved OpenAPI 3.0/3.1 document into an immutable,
//! indexed [`Definition`]: one [`Operation`] per path template and method,
//! each carrying its parameter declarations, request body and responses.
//!
//! # Overview
//!
//! - Path-item parameters are merged into every operation beneath them
//! - Templates are parsed and registered with a [`waymark_router::Router`]
//! - Structural problems are reported as [`ContractError`] while loading
//!
//! ```text
//!   YAML / JSON text
//!          │ parse
//!          ▼
//!   serde_json::Value ──── DefinitionOptions::only(filter)
//!          │ build
//!          ▼
//!     Definition ──── operations() / operation(id)
//!          │
//!          └──── router() ──► (method, path) → operationId
//! ```
//!
//! # Example
//!
//! ```rust
//! use http::Method;
//! use waymark_definition::Definition;
//!
//! let definition = Definition::from_yaml_str(r#"
//! openapi: 3.0.2
//! info: { title: Petstore, version: 1.0.0 }
//! paths:
//!   /pets/{petId}:
//!     get:
//!       operationId: showPetById
//!       parameters:
//!         - { name: petId, in: path, required: true, schema: { type: string } }
//!       responses:
//!         200: { description: ok }
//! "#).unwrap();
//!
//! let operation = definition.find_operation(&Method::GET, "/pets/1").unwrap();
//! assert_eq!(operation.operation_id(), "showPetById");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod definition;
pub mod error;
mod loader;
mod operation;
mod parameter;
mod responses;

pub use definition::{Definition, DefinitionOptions, OpenApiVersion};
pub use error::{ContractError, ContractResult};
pub use operation::Operation;
pub use parameter::{Parameter, ParameterLocation, ParameterStyle};
pub use responses::{Content, RequestBody, Response, Responses, StatusKey};
