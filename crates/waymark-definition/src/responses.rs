//! Request bodies and declared responses.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

/// Media type to schema. `None` means the media type is declared without a
/// schema and any payload is accepted.
pub type Content = IndexMap<String, Option<Value>>;

pub(crate) fn parse_content(value: Option<&Value>, location: &str) -> Result<Content, String> {
    let Some(value) = value else {
        return Ok(Content::new());
    };
    let object = value
        .as_object()
        .ok_or_else(|| format!("{location}.content must be an object"))?;

    Ok(object
        .iter()
        .map(|(media_type, media)| (media_type.to_ascii_lowercase(), media.get("schema").cloned()))
        .collect())
}

/// A declared request body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestBody {
    required: bool,
    content: Content,
}

impl RequestBody {
    /// Creates a request body declaration.
    #[must_use]
    pub fn new(required: bool, content: Content) -> Self {
        Self { required, content }
    }

    pub(crate) fn from_value(value: &Value) -> Result<Self, String> {
        if !value.is_object() {
            return Err("requestBody must be an object".to_string());
        }
        Ok(Self {
            required: value.get("required").and_then(Value::as_bool).unwrap_or(false),
            content: parse_content(value.get("content"), "requestBody")?,
        })
    }

    /// Returns true if a body must be sent.
    #[must_use]
    pub fn required(&self) -> bool {
        self.required
    }

    /// Returns the declared media types with their schemas.
    #[must_use]
    pub fn content(&self) -> &Content {
        &self.content
    }
}

/// A key of the `responses` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusKey {
    /// An exact status code (`"200"`).
    Exact(u16),
    /// A status class wildcard (`"2XX"`), holding the leading digit.
    Class(u8),
    /// The `default` response.
    Default,
}

impl StatusKey {
    /// Parses a `responses` key.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "default" {
            return Some(Self::Default);
        }

        let bytes = raw.as_bytes();
        if bytes.len() != 3 || !(b'1'..=b'5').contains(&bytes[0]) {
            return None;
        }
        let class = bytes[0] - b'0';

        if bytes[1..].iter().all(|b| b.eq_ignore_ascii_case(&b'X')) {
            return Some(Self::Class(class));
        }
        if bytes[1..].iter().all(u8::is_ascii_digit) {
            return raw.parse().ok().map(Self::Exact);
        }
        None
    }

    /// Returns true if `status` falls under this key.
    #[must_use]
    pub fn covers(self, status: u16) -> bool {
        match self {
            Self::Exact(code) => code == status,
            Self::Class(class) => status / 100 == u16::from(class),
            Self::Default => true,
        }
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(code) => write!(f, "{code}"),
            Self::Class(class) => write!(f, "{class}XX"),
            Self::Default => f.write_str("default"),
        }
    }
}

/// One declared response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Response {
    description: Option<String>,
    content: Content,
}

impl Response {
    /// Creates a response declaration.
    #[must_use]
    pub fn new(content: Content) -> Self {
        Self {
            description: None,
            content,
        }
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the declared media types with their schemas.
    #[must_use]
    pub fn content(&self) -> &Content {
        &self.content
    }
}

/// The `responses` object of an operation.
///
/// # Example
///
/// ```rust
/// use waymark_definition::{Response, Responses, StatusKey};
///
/// let mut responses = Responses::default();
/// responses.insert(StatusKey::Exact(200), Response::default());
/// responses.insert(StatusKey::Class(4), Response::default());
///
/// assert_eq!(responses.lookup(200).map(|(k, _)| k), Some(StatusKey::Exact(200)));
/// assert_eq!(responses.lookup(404).map(|(k, _)| k), Some(StatusKey::Class(4)));
/// assert!(responses.lookup(500).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Responses {
    entries: IndexMap<StatusKey, Response>,
}

impl Responses {
    /// Parses the `responses` object. Errors carry the offending key.
    pub(crate) fn from_value(value: Option<&Value>) -> Result<Self, ResponsesError> {
        let mut responses = Self::default();
        let Some(value) = value else {
            return Ok(responses);
        };
        let object = value
            .as_object()
            .ok_or_else(|| ResponsesError::Malformed("responses must be an object".to_string()))?;

        for (key, value) in object {
            let status = StatusKey::parse(key).ok_or_else(|| ResponsesError::InvalidKey(key.clone()))?;
            let location = format!("responses.{key}");
            let response = Response {
                description: value
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                content: parse_content(value.get("content"), &location).map_err(ResponsesError::Malformed)?,
            };
            responses.insert(status, response);
        }
        Ok(responses)
    }

    /// Adds or replaces a response.
    pub fn insert(&mut self, status: StatusKey, response: Response) {
        self.entries.insert(status, response);
    }

    /// Finds the response for `status`: exact code, then class wildcard,
    /// then `default`.
    #[must_use]
    pub fn lookup(&self, status: u16) -> Option<(StatusKey, &Response)> {
        let class = u8::try_from(status / 100).ok();
        [
            Some(StatusKey::Exact(status)),
            class.map(StatusKey::Class),
            Some(StatusKey::Default),
        ]
        .into_iter()
        .flatten()
        .find_map(|key| self.entries.get(&key).map(|response| (key, response)))
    }

    /// Iterates over declared responses in document order.
    pub fn iter(&self) -> impl Iterator<Item = (StatusKey, &Response)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Returns true if no response is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of declared responses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

pub(crate) enum ResponsesError {
    InvalidKey(String),
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_key_parse() {
        assert_eq!(StatusKey::parse("200"), Some(StatusKey::Exact(200)));
        assert_eq!(StatusKey::parse("2XX"), Some(StatusKey::Class(2)));
        assert_eq!(StatusKey::parse("4xx"), Some(StatusKey::Class(4)));
        assert_eq!(StatusKey::parse("default"), Some(StatusKey::Default));
        assert_eq!(StatusKey::parse("600"), None);
        assert_eq!(StatusKey::parse("20"), None);
        assert_eq!(StatusKey::parse("2X0"), None);
        assert_eq!(StatusKey::parse("ok"), None);
    }

    #[test]
    fn test_status_key_display() {
        assert_eq!(StatusKey::Exact(201).to_string(), "201");
        assert_eq!(StatusKey::Class(5).to_string(), "5XX");
        assert_eq!(StatusKey::Default.to_string(), "default");
    }

    #[test]
    fn test_lookup_order() {
        let value = json!({
            "default": {"description": "error"},
            "2XX": {"description": "any success"},
            "201": {"description": "created", "content": {"application/json": {"schema": {"type": "object"}}}}
        });
        let Ok(responses) = Responses::from_value(Some(&value)) else {
            panic!("responses should parse");
        };

        let (key, response) = responses.lookup(201).unwrap();
        assert_eq!(key, StatusKey::Exact(201));
        assert_eq!(response.description(), Some("created"));
        assert!(response.content().contains_key("application/json"));

        assert_eq!(responses.lookup(204).unwrap().0, StatusKey::Class(2));
        assert_eq!(responses.lookup(500).unwrap().0, StatusKey::Default);
    }

    #[test]
    fn test_invalid_key() {
        let value = json!({"success": {}});
        assert!(matches!(
            Responses::from_value(Some(&value)),
            Err(ResponsesError::InvalidKey(key)) if key == "success"
        ));
    }

    #[test]
    fn test_request_body() {
        let body = RequestBody::from_value(&json!({
            "required": true,
            "content": {
                "Application/JSON": {"schema": {"type": "object"}},
                "text/plain": {}
            }
        }))
        .unwrap();

        assert!(body.required());
        assert_eq!(body.content().len(), 2);
        assert!(body.content()["application/json"].is_some());
        assert!(body.content()["text/plain"].is_none());
    }
}
