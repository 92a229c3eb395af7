//! Per-request routing and validation results.

use http::Method;
use serde_json::{Map, Value};
use waymark_definition::Operation;
use waymark_router::Params;
use waymark_validation::ValidatedRequest;

/// The operation a request was routed to.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult<'w> {
    /// The matched operation.
    pub operation: &'w Operation,
    /// Percent-decoded path parameter values.
    pub params: Params,
    /// The mount prefix, as received.
    pub script_name: String,
    /// The path below the mount prefix, as received.
    pub path_info: String,
}

impl MatchResult<'_> {
    /// Returns the matched operation's ID.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        self.operation.operation_id()
    }
}

/// How a request was routed.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome<'w> {
    /// The request maps to an operation.
    Matched(MatchResult<'w>),
    /// No operation is declared for the path.
    NotFound,
    /// The path is declared, but not for this method.
    MethodNotAllowed {
        /// Methods declared for the path.
        allowed: Vec<Method>,
    },
    /// No operation matched and unknown operations are allowed through.
    PassThrough,
}

impl<'w> RouteOutcome<'w> {
    /// Returns the match, if any.
    #[must_use]
    pub fn matched(self) -> Option<MatchResult<'w>> {
        match self {
            Self::Matched(m) => Some(m),
            _ => None,
        }
    }

    /// Returns true for [`RouteOutcome::Matched`].
    #[must_use]
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_))
    }
}

/// What downstream code reads after a request passed validation.
///
/// Parameters are coerced to their declared types unless validation is
/// disabled, in which case they are the raw strings.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext<'w> {
    operation: &'w Operation,
    path_params: Map<String, Value>,
    query: Map<String, Value>,
    headers: Map<String, Value>,
    body: Option<Value>,
    media_type: Option<String>,
}

impl<'w> RequestContext<'w> {
    pub(crate) fn validated(operation: &'w Operation, validated: ValidatedRequest) -> Self {
        Self {
            operation,
            path_params: validated.path_params,
            query: validated.query,
            headers: validated.headers,
            body: validated.body,
            media_type: validated.media_type,
        }
    }

    /// Builds a context from raw values, without validation.
    ///
    /// Undeclared query parameters are dropped.
    pub(crate) fn unvalidated(operation: &'w Operation, params: &Params, query: Option<&str>) -> Self {
        let path_params = params
            .iter()
            .map(|(name, value)| (name.to_string(), Value::from(value)))
            .collect();

        let query = waymark_validation::parse_query(query.unwrap_or_default())
            .into_iter()
            .filter(|(name, _)| operation.query_parameters().any(|p| p.name() == name))
            .filter_map(|(name, mut values)| {
                let value = if values.len() == 1 {
                    Value::String(values.pop()?)
                } else {
                    Value::from(values)
                };
                Some((name, value))
            })
            .collect();

        Self {
            operation,
            path_params,
            query,
            headers: Map::new(),
            body: None,
            media_type: None,
        }
    }

    /// The matched operation.
    #[must_use]
    pub fn operation(&self) -> &'w Operation {
        self.operation
    }

    /// Path parameters.
    #[must_use]
    pub fn path_params(&self) -> &Map<String, Value> {
        &self.path_params
    }

    /// Declared query parameters present in the request.
    #[must_use]
    pub fn query(&self) -> &Map<String, Value> {
        &self.query
    }

    /// Declared headers present in the request.
    #[must_use]
    pub fn headers(&self) -> &Map<String, Value> {
        &self.headers
    }

    /// Path and query parameters together. A path parameter wins over a
    /// query parameter of the same name.
    #[must_use]
    pub fn parameters(&self) -> Map<String, Value> {
        let mut merged = self.query.clone();
        merged.extend(self.path_params.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// The parsed body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// The declared media type the body was matched against.
    #[must_use]
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use waymark_definition::Definition;

    fn definition() -> Definition {
        Definition::from_yaml_str(
            r#"
openapi: 3.0.2
paths:
  /pets/{petId}:
    get:
      operationId: showPetById
      parameters:
        - { name: petId, in: path, schema: { type: string } }
        - { name: fields, in: query, schema: { type: array, items: { type: string } } }
        - { name: limit, in: query, schema: { type: integer } }
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_unvalidated_keeps_raw_strings() {
        let definition = definition();
        let operation = definition.operation("showPetById").unwrap();
        let mut params = Params::new();
        params.push("petId", "7");

        let context = RequestContext::unvalidated(operation, &params, Some("limit=1&fields=a&fields=b"));
        assert_eq!(context.path_params()["petId"], json!("7"));
        assert_eq!(context.query()["limit"], json!("1"));
        assert_eq!(context.query()["fields"], json!(["a", "b"]));
        assert!(context.body().is_none());
    }

    #[test]
    fn test_unvalidated_query_keeps_only_declared() {
        let definition = definition();
        let operation = definition.operation("showPetById").unwrap();

        let context = RequestContext::unvalidated(operation, &Params::new(), Some("limit=1&debug=true&x=2"));
        assert_eq!(context.query(), json!({"limit": "1"}).as_object().unwrap());
    }

    #[test]
    fn test_parameters_prefers_path() {
        let definition = definition();
        let operation = definition.operation("showPetById").unwrap();
        let mut params = Params::new();
        params.push("petId", "7");

        let context = RequestContext::unvalidated(operation, &params, Some("petId=9&limit=2"));
        let merged = context.parameters();
        assert_eq!(merged["petId"], json!("7"));
        assert_eq!(merged["limit"], json!("2"));
    }

    #[test]
    fn test_outcome_helpers() {
        assert!(!RouteOutcome::NotFound.is_matched());
        assert!(RouteOutcome::PassThrough.matched().is_none());
    }
}
