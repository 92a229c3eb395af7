//! # Waymark
//!
//! **Contract-driven HTTP routing and validation**
//!
//! Waymark reads an OpenAPI 3.0/3.1 contract and uses it to:
//!
//! - **Route** a request to the single operation it represents, with decoded
//!   path parameters
//! - **Validate** path, query, header and body values against the declared
//!   schemas, reporting every violation at once
//! - **Assert** that handler responses match the declared status, content
//!   type and body schema
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use waymark::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let waymark = Waymark::load("openapi.yaml", WaymarkConfig::development())?;
//! let pipeline = Pipeline::new(waymark);
//!
//! let request = InboundRequest::new(http::Method::GET, "/pets?limit=2");
//! let response = pipeline.handle(request, |context, _request| {
//!     let query = context.map(RequestContext::query);
//!     http::Response::new(bytes::Bytes::from(format!("{query:?}")))
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! waymark-definition ──► waymark-router     (operations → segment tree)
//!         │
//!         └──────────► waymark-validation   (schemas → compiled plan)
//!
//! waymark: Waymark::route → validate_request → handler → validate_response
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod app;
pub mod config;
mod context;
pub mod error;
pub mod logging;
pub mod pipeline;
mod request;

pub use waymark_definition as definition;
pub use waymark_router as router;
pub use waymark_validation as validation;

pub use app::Waymark;
pub use config::{
    ConfigError, RequestValidationConfig, ResponseValidationConfig, RouterConfig, WaymarkConfig,
};
pub use context::{MatchResult, RequestContext, RouteOutcome};
pub use error::{PipelineError, RouteError, WaymarkError, WaymarkResult};
pub use pipeline::Pipeline;
pub use request::{InboundRequest, OutboundResponse};

/// Common imports.
///
/// ```rust
/// use waymark::prelude::*;
/// ```
pub mod prelude {
    pub use crate::definition::{Definition, Operation};
    pub use crate::validation::{RequestInvalid, ResponseInvalid, ValidationError};
    pub use crate::{
        InboundRequest, MatchResult, OutboundResponse, Pipeline, PipelineError, RequestContext,
        RouteOutcome, Waymark, WaymarkConfig,
    };
}
