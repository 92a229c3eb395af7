//! Request pipeline.
//!
//! ```text
//! InboundRequest → route → validate request → handler → validate response
//!                    │             │
//!                    ├─ 404 / fallback
//!                    ├─ 405 + Allow
//!                    │             └─ 400 {"errors": [...]}
//! ```
//!
//! Routing and request failures are rendered unless their `raise_error`
//! flag is set. A response that breaks the contract is always returned as
//! [`PipelineError::ResponseInvalid`]: it is a bug in the handler, not in
//! the client's input.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::header::ALLOW;
use http::{HeaderValue, Method, StatusCode};
use tracing::debug;

use crate::app::Waymark;
use crate::context::{RequestContext, RouteOutcome};
use crate::error::PipelineError;
use crate::request::{response, InboundRequest, OutboundResponse};

/// Handler invoked for requests that match no operation.
pub type Fallback = Arc<dyn Fn(&InboundRequest) -> OutboundResponse + Send + Sync>;

/// Runs requests through routing and validation around a handler.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use http::{Method, StatusCode};
/// use waymark::{InboundRequest, Pipeline, Waymark, WaymarkConfig};
/// use waymark_definition::Definition;
///
/// let definition = Definition::from_yaml_str(r#"
/// openapi: 3.0.2
/// info: { title: Petstore, version: 1.0.0 }
/// paths:
///   /pets:
///     get:
///       operationId: listPets
///       responses:
///         200: { description: ok }
/// "#).unwrap();
/// let pipeline = Pipeline::new(Waymark::new(definition, WaymarkConfig::default()).unwrap());
///
/// let response = pipeline
///     .handle(InboundRequest::new(Method::GET, "/pets"), |context, _| {
///         assert_eq!(context.unwrap().operation().operation_id(), "listPets");
///         http::Response::new(Bytes::new())
///     })
///     .unwrap();
/// assert_eq!(response.status(), StatusCode::OK);
///
/// let response = pipeline
///     .handle(InboundRequest::new(Method::DELETE, "/pets"), |_, _| unreachable!())
///     .unwrap();
/// assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
/// assert_eq!(response.headers()["allow"], "GET");
/// ```
pub struct Pipeline {
    waymark: Arc<Waymark>,
    fallback: Option<Fallback>,
}

impl Pipeline {
    /// Creates a pipeline without a fallback.
    #[must_use]
    pub fn new(waymark: impl Into<Arc<Waymark>>) -> Self {
        Self {
            waymark: waymark.into(),
            fallback: None,
        }
    }

    /// Delegates unmatched requests to `fallback` instead of rendering 404.
    #[must_use]
    pub fn with_fallback(
        mut self,
        fallback: impl Fn(&InboundRequest) -> OutboundResponse + Send + Sync + 'static,
    ) -> Self {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    /// Returns the underlying contract.
    #[must_use]
    pub fn waymark(&self) -> &Waymark {
        &self.waymark
    }

    /// Processes one request.
    ///
    /// The handler receives `None` for requests passed through as unknown
    /// operations; their responses are not validated.
    pub fn handle<H>(&self, request: InboundRequest, handler: H) -> Result<OutboundResponse, PipelineError>
    where
        H: FnOnce(Option<&RequestContext<'_>>, &InboundRequest) -> OutboundResponse,
    {
        let matched = match self.waymark.route(&request)? {
            RouteOutcome::Matched(matched) => matched,
            RouteOutcome::PassThrough => return Ok(handler(None, &request)),
            RouteOutcome::NotFound => return Ok(self.not_found(&request)),
            RouteOutcome::MethodNotAllowed { allowed } => return Ok(method_not_allowed(&allowed)),
        };

        let context = match self.waymark.validate_request(&matched, &request) {
            Ok(context) => context,
            Err(invalid) if self.waymark.config().request_validation.raise_error => {
                return Err(invalid.into());
            }
            Err(invalid) => {
                debug!(operation_id = %matched.operation_id(), error = %invalid, "rendering 400");
                return Ok(response(
                    StatusCode::BAD_REQUEST,
                    Some("application/json"),
                    invalid.to_json().to_string(),
                ));
            }
        };

        let outbound = handler(Some(&context), &request);
        if self.waymark.config().response_validation.enabled {
            self.waymark.validate_response(context.operation(), &outbound)?;
        }
        Ok(outbound)
    }

    fn not_found(&self, request: &InboundRequest) -> OutboundResponse {
        match &self.fallback {
            Some(fallback) => fallback(request),
            None => response(StatusCode::NOT_FOUND, None, Bytes::new()),
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("waymark", &self.waymark)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

fn method_not_allowed(allowed: &[Method]) -> OutboundResponse {
    let mut outbound = response(StatusCode::METHOD_NOT_ALLOWED, None, Bytes::new());
    let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        outbound.headers_mut().insert(ALLOW, value);
    }
    outbound
}
