//! The compiled contract and its entry points.

use std::path::Path;

use tracing::{debug, info};
use waymark_definition::{Definition, Operation};
use waymark_router::{self as router, strip_mount_prefix};
use waymark_validation::{RequestInvalid, ResponseInvalid, ValidationPlan};

use crate::config::WaymarkConfig;
use crate::context::{MatchResult, RequestContext, RouteOutcome};
use crate::error::{RouteError, WaymarkResult};
use crate::request::{content_type, InboundRequest, OutboundResponse};

/// A loaded contract ready to route and validate.
///
/// Built once and shared read-only between requests.
///
/// # Example
///
/// ```
/// use http::Method;
/// use waymark::{InboundRequest, Waymark, WaymarkConfig};
/// use waymark_definition::Definition;
///
/// let definition = Definition::from_yaml_str(r#"
/// openapi: 3.0.2
/// info: { title: Petstore, version: 1.0.0 }
/// paths:
///   /pets:
///     get:
///       operationId: listPets
///       parameters:
///         - { name: limit, in: query, schema: { type: integer } }
/// "#).unwrap();
/// let waymark = Waymark::new(definition, WaymarkConfig::default()).unwrap();
///
/// let request = InboundRequest::new(Method::GET, "/pets?limit=2");
/// let matched = waymark.route(&request).unwrap().matched().unwrap();
/// assert_eq!(matched.operation_id(), "listPets");
///
/// let context = waymark.validate_request(&matched, &request).unwrap();
/// assert_eq!(context.query()["limit"], 2);
/// ```
#[derive(Debug)]
pub struct Waymark {
    definition: Definition,
    plan: ValidationPlan,
    config: WaymarkConfig,
}

impl Waymark {
    /// Compiles the validation plan for `definition`.
    pub fn new(definition: Definition, config: WaymarkConfig) -> WaymarkResult<Self> {
        let plan = ValidationPlan::new(&definition, config.request_validation.validation_config())?;
        info!(
            title = %definition.title(),
            operations = definition.operations().len(),
            mount_prefix = %config.router.mount_prefix,
            "validation plan ready"
        );
        Ok(Self {
            definition,
            plan,
            config,
        })
    }

    /// Loads a YAML or JSON contract file and compiles it.
    pub fn load(path: impl AsRef<Path>, config: WaymarkConfig) -> WaymarkResult<Self> {
        Self::new(Definition::load(path)?, config)
    }

    /// Returns the contract.
    #[must_use]
    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &WaymarkConfig {
        &self.config
    }

    /// Resolves a request to its operation.
    ///
    /// The mount prefix is stripped from `script_name + path_info` before
    /// matching. A miss is reported as an outcome, as
    /// [`RouteOutcome::PassThrough`] when unknown operations are allowed, or
    /// as an error when `router.raise_error` is set.
    pub fn route(&self, request: &InboundRequest) -> Result<RouteOutcome<'_>, RouteError> {
        let settings = &self.config.router;
        let full_path = request.full_path();

        let outcome = match strip_mount_prefix(&full_path, &settings.mount_prefix) {
            Some(path) => {
                self.definition
                    .router()
                    .match_route_with(&request.method, path, &settings.match_options())
            }
            None => router::RouteOutcome::NotFound,
        };

        let miss = match outcome {
            router::RouteOutcome::Matched(route) => {
                if let Some(operation) = self.definition.operation(route.operation_id) {
                    debug!(
                        method = %request.method,
                        path = %full_path,
                        operation_id = %route.operation_id,
                        template = %route.template,
                        "request routed"
                    );
                    return Ok(RouteOutcome::Matched(MatchResult {
                        operation,
                        params: route.params,
                        script_name: request.script_name.clone(),
                        path_info: request.path_info.clone(),
                    }));
                }
                RouteOutcome::NotFound
            }
            router::RouteOutcome::MethodNotAllowed { allowed } if !settings.merge_method_mismatch => {
                RouteOutcome::MethodNotAllowed { allowed }
            }
            _ => RouteOutcome::NotFound,
        };

        debug!(method = %request.method, path = %full_path, outcome = ?miss, "request not routed");
        if settings.allow_unknown_operation {
            return Ok(RouteOutcome::PassThrough);
        }
        if !settings.raise_error {
            return Ok(miss);
        }

        let method = request.method.clone();
        Err(match miss {
            RouteOutcome::MethodNotAllowed { allowed } => RouteError::MethodNotAllowed {
                method,
                path: full_path,
                allowed,
            },
            _ => RouteError::NotFound {
                method,
                path: full_path,
            },
        })
    }

    /// Validates a routed request.
    ///
    /// With request validation disabled the context carries the raw path
    /// strings, the raw strings of declared query parameters and no body.
    pub fn validate_request<'w>(
        &'w self,
        matched: &MatchResult<'w>,
        request: &InboundRequest,
    ) -> Result<RequestContext<'w>, RequestInvalid> {
        let operation = matched.operation;
        if !self.config.request_validation.enabled {
            return Ok(RequestContext::unvalidated(
                operation,
                &matched.params,
                request.query.as_deref(),
            ));
        }

        self.plan
            .requests()
            .validate(
                operation,
                &matched.params,
                request.query.as_deref(),
                &request.headers,
                request.content_type(),
                &request.body,
            )
            .map(|validated| RequestContext::validated(operation, validated))
    }

    /// Checks a response against its operation.
    pub fn validate_response(
        &self,
        operation: &Operation,
        response: &OutboundResponse,
    ) -> Result<(), ResponseInvalid> {
        self.plan.responses().validate(
            operation,
            response.status().as_u16(),
            content_type(response.headers()),
            response.body(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouterConfig;
    use http::Method;

    const CONTRACT: &str = r#"
openapi: 3.0.2
info: { title: Petstore, version: 1.0.0 }
paths:
  /pets:
    get:
      operationId: listPets
    post:
      operationId: createPets
  /pets/mine:
    get:
      operationId: listMyPets
  /pets/{petId}:
    delete:
      operationId: deletePet
      parameters:
        - { name: petId, in: path, schema: { type: string } }
"#;

    fn waymark(router: RouterConfig) -> Waymark {
        let config = WaymarkConfig {
            router,
            ..WaymarkConfig::default()
        };
        Waymark::new(Definition::from_yaml_str(CONTRACT).unwrap(), config).unwrap()
    }

    fn route<'w>(waymark: &'w Waymark, method: Method, target: &str) -> Result<RouteOutcome<'w>, RouteError> {
        waymark.route(&InboundRequest::new(method, target))
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_load_logs_each_stage_once() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            waymark(RouterConfig::default());
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("contract loaded").count(), 1);
        assert_eq!(output.matches("validation plan ready").count(), 1);
    }

    #[test]
    fn test_method_mismatch_is_distinct() {
        let waymark = waymark(RouterConfig::default());
        let outcome = route(&waymark, Method::DELETE, "/pets").unwrap();
        assert_eq!(
            outcome,
            RouteOutcome::MethodNotAllowed {
                allowed: vec![Method::GET, Method::POST]
            }
        );
        assert_eq!(route(&waymark, Method::GET, "/nope").unwrap(), RouteOutcome::NotFound);
    }

    #[test]
    fn test_merge_method_mismatch() {
        let waymark = waymark(RouterConfig {
            merge_method_mismatch: true,
            ..RouterConfig::default()
        });
        assert_eq!(route(&waymark, Method::DELETE, "/pets").unwrap(), RouteOutcome::NotFound);
    }

    #[test]
    fn test_method_fallthrough() {
        let strict = waymark(RouterConfig::default());
        assert!(matches!(
            route(&strict, Method::DELETE, "/pets/mine").unwrap(),
            RouteOutcome::MethodNotAllowed { .. }
        ));

        let fallthrough = waymark(RouterConfig {
            method_fallthrough: true,
            ..RouterConfig::default()
        });
        let matched = route(&fallthrough, Method::DELETE, "/pets/mine").unwrap().matched().unwrap();
        assert_eq!(matched.operation_id(), "deletePet");
        assert_eq!(matched.params.get("petId"), Some("mine"));
    }

    #[test]
    fn test_raise_error() {
        let waymark = waymark(RouterConfig {
            raise_error: true,
            ..RouterConfig::default()
        });
        assert!(matches!(
            route(&waymark, Method::GET, "/nope"),
            Err(RouteError::NotFound { .. })
        ));
        let Err(RouteError::MethodNotAllowed { allowed, path, .. }) = route(&waymark, Method::PUT, "/pets") else {
            panic!("expected MethodNotAllowed");
        };
        assert_eq!(path, "/pets");
        assert_eq!(allowed, vec![Method::GET, Method::POST]);
    }

    #[test]
    fn test_unknown_operation_passes_through() {
        let waymark = waymark(RouterConfig {
            allow_unknown_operation: true,
            raise_error: true,
            ..RouterConfig::default()
        });
        assert_eq!(route(&waymark, Method::GET, "/nope").unwrap(), RouteOutcome::PassThrough);
        assert!(route(&waymark, Method::GET, "/pets").unwrap().is_matched());
    }

    #[test]
    fn test_mount_prefix() {
        let waymark = waymark(RouterConfig {
            mount_prefix: "/api".into(),
            ..RouterConfig::default()
        });

        let request = InboundRequest::new(Method::GET, "/pets/mine").with_script_name("/api");
        let matched = waymark.route(&request).unwrap().matched().unwrap();
        assert_eq!(matched.operation_id(), "listMyPets");
        assert_eq!(matched.script_name, "/api");
        assert_eq!(matched.path_info, "/pets/mine");

        let request = InboundRequest::new(Method::GET, "/api/pets");
        assert!(waymark.route(&request).unwrap().is_matched());

        let request = InboundRequest::new(Method::GET, "/pets");
        assert_eq!(waymark.route(&request).unwrap(), RouteOutcome::NotFound);
    }

    #[test]
    fn test_decoded_path_params() {
        let waymark = waymark(RouterConfig::default());
        let matched = route(&waymark, Method::DELETE, "/pets/a%20b").unwrap().matched().unwrap();
        assert_eq!(matched.params.get("petId"), Some("a b"));
    }
}
