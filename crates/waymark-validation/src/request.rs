//! Request validation.

use http::HeaderMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use waymark_definition::Operation;
use waymark_router::Params;

use crate::coerce;
use crate::content::{self, BodyFormat};
use crate::engine::{SchemaEngine, Violation};
use crate::error::{ErrorKind, ErrorSource, RequestInvalid, ValidationError};
use crate::plan::{OperationPlan, ParameterGroup, ValidationPlan};
use crate::query::parse_query;

/// The values a valid request carries.
///
/// Only declared parameters appear; undeclared query parameters are
/// dropped even when they were allowed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidatedRequest {
    /// Path parameters, coerced.
    pub path_params: Map<String, Value>,
    /// Declared query parameters present in the request, coerced.
    pub query: Map<String, Value>,
    /// Declared headers present in the request, coerced.
    pub headers: Map<String, Value>,
    /// The parsed body. `None` when there is no body or it has an opaque
    /// media type.
    pub body: Option<Value>,
    /// The declared media type the body was matched against.
    pub media_type: Option<String>,
}

/// Validates requests against a [`ValidationPlan`].
#[derive(Debug)]
pub struct RequestValidator<'p, E: SchemaEngine> {
    plan: &'p ValidationPlan<E>,
}

impl<'p, E: SchemaEngine> RequestValidator<'p, E> {
    pub(crate) fn new(plan: &'p ValidationPlan<E>) -> Self {
        Self { plan }
    }

    /// Validates path parameters, query, headers and body.
    ///
    /// Violations from every source are collected in the order path,
    /// query, header, body.
    pub fn validate(
        &self,
        operation: &Operation,
        path_params: &Params,
        query: Option<&str>,
        headers: &HeaderMap,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<ValidatedRequest, RequestInvalid> {
        let Some(plan) = self.plan.operation(operation.operation_id()) else {
            warn!(
                operation_id = %operation.operation_id(),
                "operation is not part of the validation plan; request not validated"
            );
            return Ok(ValidatedRequest::default());
        };

        let mut errors = Vec::new();
        let mut validated = ValidatedRequest::default();

        if let Some(group) = &plan.path {
            let raw = path_params
                .iter()
                .map(|(name, value)| (name.to_string(), vec![value.to_string()]));
            validated.path_params = self.check_group(group, raw, ErrorSource::Path, &mut errors);
        }

        if let Some(group) = &plan.query {
            let raw = parse_query(query.unwrap_or_default());
            validated.query = self.check_group(group, raw, ErrorSource::Parameter, &mut errors);
        }

        if let Some(group) = &plan.header {
            let raw = group.parameters.iter().filter_map(|parameter| {
                let values: Vec<String> = headers
                    .get_all(parameter.name())
                    .iter()
                    .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                    .collect();
                (!values.is_empty()).then(|| (parameter.name().to_string(), values))
            });
            validated.headers = self.check_group(group, raw, ErrorSource::Header, &mut errors);
        }

        if operation.request_body().is_some() {
            match self.check_body(operation, plan, content_type, body) {
                Ok((media_type, value)) => {
                    validated.media_type = media_type;
                    validated.body = value;
                }
                Err(body_errors) => errors.extend(body_errors),
            }
        }

        if errors.is_empty() {
            Ok(validated)
        } else {
            debug!(
                operation_id = %operation.operation_id(),
                errors = errors.len(),
                "request invalid"
            );
            Err(RequestInvalid { errors })
        }
    }

    /// Builds the instance for a parameter group, checks it and returns the
    /// declared values found.
    fn check_group(
        &self,
        group: &ParameterGroup<E::Compiled>,
        raw: impl IntoIterator<Item = (String, Vec<String>)>,
        source: fn(String) -> ErrorSource,
        errors: &mut Vec<ValidationError>,
    ) -> Map<String, Value> {
        let coerce = self.plan.config().coerce_parameters;

        let mut instance = Map::new();
        for (name, values) in raw {
            let value = match group.find(&name) {
                Some(parameter) => coerce::parameter_value(&values, parameter, coerce),
                None => undeclared(values),
            };
            instance.insert(name, value);
        }

        let instance = Value::Object(instance);
        let violations = self.plan.engine().check(&group.compiled, &instance);
        errors.extend(violations.into_iter().map(|v| {
            let name = v.first_token();
            ValidationError::new(source(name), v.kind, v.message)
        }));

        group
            .parameters
            .iter()
            .filter_map(|p| {
                instance
                    .get(p.name())
                    .map(|value| (p.name().to_string(), value.clone()))
            })
            .collect()
    }

    fn check_body(
        &self,
        operation: &Operation,
        plan: &OperationPlan<E::Compiled>,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<(Option<String>, Option<Value>), Vec<ValidationError>> {
        let Some(declared) = operation.request_body() else {
            return Ok((None, None));
        };

        if body.is_empty() {
            if declared.required() {
                return Err(vec![body_error(ErrorKind::MissingBody, "Request body is required")]);
            }
            return Ok((None, None));
        }

        let selected = content::parse_content_type(content_type)
            .and_then(|mime| content::select(declared.content(), &mime).map(|key| (mime, key)));
        let Some((mime, media_type)) = selected else {
            return Err(vec![body_error(
                ErrorKind::UnsupportedContentType,
                format!(
                    "Unsupported Media Type '{}'",
                    content_type.unwrap_or_default()
                ),
            )]);
        };

        let schema = declared.content().get(media_type).and_then(Option::as_ref);
        let coerce = self.plan.config().coerce_parameters;
        let value = content::parse_body(BodyFormat::of(&mime), body, schema, coerce)
            .map_err(|message| vec![body_error(ErrorKind::MalformedBody, message)])?;

        if let (Some(instance), Some(Some(compiled))) = (&value, plan.body.get(media_type)) {
            let violations = self.plan.engine().check(compiled, instance);
            if !violations.is_empty() {
                return Err(violations.into_iter().map(pointer_error).collect());
            }
        }

        Ok((Some(media_type.to_string()), value))
    }
}

fn undeclared(values: Vec<String>) -> Value {
    if values.len() == 1 {
        values.into_iter().next().map_or(Value::Null, Value::String)
    } else {
        Value::from(values)
    }
}

fn body_error(kind: ErrorKind, title: impl Into<String>) -> ValidationError {
    ValidationError::new(ErrorSource::Pointer(String::new()), kind, title)
}

pub(crate) fn pointer_error(violation: Violation) -> ValidationError {
    ValidationError::new(
        ErrorSource::Pointer(violation.pointer),
        violation.kind,
        violation.message,
    )
}
