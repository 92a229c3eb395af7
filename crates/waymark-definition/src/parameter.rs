//! Parameter declarations.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Header declarations that OpenAPI says must be ignored.
const IGNORED_HEADERS: [&str; 3] = ["accept", "content-type", "authorization"];

/// Where a parameter is carried in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// A path template placeholder.
    Path,
    /// A query string key.
    Query,
    /// A request header.
    Header,
    /// A cookie. Retained but never validated.
    Cookie,
}

impl ParameterLocation {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }

    /// Returns the lowercase `in` value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }

    fn default_style(self) -> ParameterStyle {
        match self {
            Self::Path | Self::Header => ParameterStyle::Simple,
            Self::Query | Self::Cookie => ParameterStyle::Form,
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialization style of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterStyle {
    /// `1,2,3`
    Simple,
    /// `a=1&a=2` when exploded, `a=1,2` otherwise.
    Form,
    /// `;a=1`
    Matrix,
    /// `.1.2`
    Label,
    /// `a=1%202`
    SpaceDelimited,
    /// `a=1|2`
    PipeDelimited,
    /// `a[x]=1`
    DeepObject,
}

impl ParameterStyle {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "simple" => Some(Self::Simple),
            "form" => Some(Self::Form),
            "matrix" => Some(Self::Matrix),
            "label" => Some(Self::Label),
            "spaceDelimited" => Some(Self::SpaceDelimited),
            "pipeDelimited" => Some(Self::PipeDelimited),
            "deepObject" => Some(Self::DeepObject),
            _ => None,
        }
    }

    /// Returns the separator between array items in a single value.
    #[must_use]
    pub const fn delimiter(self) -> char {
        match self {
            Self::SpaceDelimited => ' ',
            Self::PipeDelimited => '|',
            _ => ',',
        }
    }
}

/// A declared request parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    location: ParameterLocation,
    required: bool,
    schema: Value,
    style: ParameterStyle,
    explode: bool,
    deprecated: bool,
}

impl Parameter {
    /// Creates a parameter with the location's default style.
    ///
    /// Path parameters are always required.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        location: ParameterLocation,
        required: bool,
        schema: Value,
    ) -> Self {
        let style = location.default_style();
        Self {
            name: name.into(),
            location,
            required: required || location == ParameterLocation::Path,
            schema,
            style,
            explode: style == ParameterStyle::Form,
            deprecated: false,
        }
    }

    /// Parses a parameter object from the contract.
    ///
    /// Returns `Ok(None)` for header declarations OpenAPI says to ignore.
    pub(crate) fn from_value(value: &Value) -> Result<Option<Self>, String> {
        let object = value
            .as_object()
            .ok_or_else(|| "parameter must be an object".to_string())?;

        let name = object
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| "parameter is missing 'name'".to_string())?;

        let raw_location = object
            .get("in")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("parameter '{name}' is missing 'in'"))?;
        let location = ParameterLocation::parse(raw_location)
            .ok_or_else(|| format!("parameter '{name}' has unknown location '{raw_location}'"))?;

        if location == ParameterLocation::Header
            && IGNORED_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name))
        {
            return Ok(None);
        }

        let required = object.get("required").and_then(Value::as_bool).unwrap_or(false);
        let mut parameter = Self::new(name, location, required, schema_of(object));

        if let Some(style) = object.get("style") {
            let raw = style.as_str().unwrap_or_default();
            parameter.style = ParameterStyle::parse(raw)
                .ok_or_else(|| format!("parameter '{name}' has unknown style '{raw}'"))?;
        }
        parameter.explode = object
            .get("explode")
            .and_then(Value::as_bool)
            .unwrap_or(parameter.style == ParameterStyle::Form);
        parameter.deprecated = object
            .get("deprecated")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Ok(Some(parameter))
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns where the parameter is carried.
    #[must_use]
    pub fn location(&self) -> ParameterLocation {
        self.location
    }

    /// Returns true if the parameter must be present.
    #[must_use]
    pub fn required(&self) -> bool {
        self.required
    }

    /// Returns the parameter schema (`{}` when none was declared).
    #[must_use]
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Returns the serialization style.
    #[must_use]
    pub fn style(&self) -> ParameterStyle {
        self.style
    }

    /// Returns true if array values are spread over repeated keys.
    #[must_use]
    pub fn explode(&self) -> bool {
        self.explode
    }

    /// Returns true if the parameter is marked deprecated.
    #[must_use]
    pub fn deprecated(&self) -> bool {
        self.deprecated
    }

    /// Returns true if `other` declares the same parameter.
    ///
    /// Header names compare case-insensitively.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.location == other.location
            && match self.location {
                ParameterLocation::Header => self.name.eq_ignore_ascii_case(&other.name),
                _ => self.name == other.name,
            }
    }

    /// Sets the style.
    #[must_use]
    pub fn with_style(mut self, style: ParameterStyle, explode: bool) -> Self {
        self.style = style;
        self.explode = explode;
        self
    }
}

/// Reads `schema`, or the schema of the first `content` entry.
fn schema_of(object: &Map<String, Value>) -> Value {
    if let Some(schema) = object.get("schema") {
        return schema.clone();
    }
    object
        .get("content")
        .and_then(Value::as_object)
        .and_then(|content| content.values().next())
        .and_then(|media| media.get("schema"))
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Parameter {
        Parameter::from_value(&value).unwrap().unwrap()
    }

    #[test]
    fn test_query_defaults() {
        let p = parse(json!({"name": "limit", "in": "query", "schema": {"type": "integer"}}));
        assert_eq!(p.name(), "limit");
        assert_eq!(p.location(), ParameterLocation::Query);
        assert!(!p.required());
        assert_eq!(p.style(), ParameterStyle::Form);
        assert!(p.explode());
        assert_eq!(p.schema(), &json!({"type": "integer"}));
    }

    #[test]
    fn test_path_parameters_are_required() {
        let p = parse(json!({"name": "petId", "in": "path", "required": false}));
        assert!(p.required());
        assert_eq!(p.style(), ParameterStyle::Simple);
        assert!(!p.explode());
        assert_eq!(p.schema(), &json!({}));
    }

    #[test]
    fn test_explicit_style() {
        let p = parse(json!({
            "name": "tags", "in": "query", "style": "pipeDelimited", "explode": false,
            "schema": {"type": "array", "items": {"type": "string"}}
        }));
        assert_eq!(p.style(), ParameterStyle::PipeDelimited);
        assert_eq!(p.style().delimiter(), '|');
        assert!(!p.explode());
    }

    #[test]
    fn test_content_schema() {
        let p = parse(json!({
            "name": "filter", "in": "query",
            "content": {"application/json": {"schema": {"type": "object"}}}
        }));
        assert_eq!(p.schema(), &json!({"type": "object"}));
    }

    #[test]
    fn test_ignored_headers() {
        for name in ["Accept", "content-type", "AUTHORIZATION"] {
            let parsed = Parameter::from_value(&json!({"name": name, "in": "header"})).unwrap();
            assert!(parsed.is_none(), "{name} should be ignored");
        }
        assert!(Parameter::from_value(&json!({"name": "X-Request-Id", "in": "header"}))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_invalid_declarations() {
        assert!(Parameter::from_value(&json!("limit")).is_err());
        assert!(Parameter::from_value(&json!({"in": "query"})).is_err());
        assert!(Parameter::from_value(&json!({"name": "a", "in": "body"})).is_err());
        assert!(Parameter::from_value(&json!({"name": "a", "in": "query", "style": "weird"})).is_err());
    }

    #[test]
    fn test_same_as() {
        let a = Parameter::new("X-Trace", ParameterLocation::Header, false, json!({}));
        let b = Parameter::new("x-trace", ParameterLocation::Header, true, json!({}));
        let c = Parameter::new("X-Trace", ParameterLocation::Query, false, json!({}));
        assert!(a.same_as(&b));
        assert!(!a.same_as(&c));
    }
}
