//! Normalized request and response values.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method, StatusCode};

/// The response type handlers produce and the pipeline returns.
pub type OutboundResponse = http::Response<Bytes>;

/// A request as the transport hands it over.
///
/// `script_name` is the part of the URL already consumed by an upstream
/// mount point; `path_info` is the rest. Both are kept verbatim.
///
/// # Example
///
/// ```
/// use http::Method;
/// use waymark::InboundRequest;
///
/// let request = InboundRequest::new(Method::GET, "/pets?limit=2");
/// assert_eq!(request.path_info, "/pets");
/// assert_eq!(request.query.as_deref(), Some("limit=2"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    /// Request method.
    pub method: Method,
    /// Already-consumed mount prefix.
    pub script_name: String,
    /// Path below the mount prefix.
    pub path_info: String,
    /// Raw query string without `?`.
    pub query: Option<String>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

impl InboundRequest {
    /// Creates a request from a method and a path with optional query.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path_info, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };
        Self {
            method,
            path_info,
            query,
            ..Self::default()
        }
    }

    /// Sets the already-consumed mount prefix.
    #[must_use]
    pub fn with_script_name(mut self, script_name: impl Into<String>) -> Self {
        self.script_name = script_name.into();
        self
    }

    /// Adds a header. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets the body and its content type.
    #[must_use]
    pub fn with_body(self, content_type: &str, body: impl Into<Bytes>) -> Self {
        let mut request = self.with_header(CONTENT_TYPE.as_str(), content_type);
        request.body = body.into();
        request
    }

    /// Returns `script_name` followed by `path_info`.
    #[must_use]
    pub fn full_path(&self) -> String {
        format!("{}{}", self.script_name, self.path_info)
    }

    /// Returns the `Content-Type` header, if readable.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        content_type(&self.headers)
    }
}

impl From<http::Request<Bytes>> for InboundRequest {
    fn from(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            script_name: String::new(),
            path_info: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body,
        }
    }
}

/// Returns the `Content-Type` header, if readable.
pub(crate) fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
}

/// Builds a response with a status, optional content type and body.
pub(crate) fn response(status: StatusCode, content_type: Option<&'static str>, body: impl Into<Bytes>) -> OutboundResponse {
    let mut response = http::Response::new(body.into());
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_splits_query() {
        let request = InboundRequest::new(Method::GET, "/pets");
        assert_eq!(request.path_info, "/pets");
        assert!(request.query.is_none());
    }

    #[test]
    fn test_full_path() {
        let request = InboundRequest::new(Method::GET, "/pets").with_script_name("/api");
        assert_eq!(request.full_path(), "/api/pets");
    }

    #[test]
    fn test_with_body() {
        let request = InboundRequest::new(Method::POST, "/pets").with_body("application/json", r#"{"name":"Rex"}"#);
        assert_eq!(request.content_type(), Some("application/json"));
        assert_eq!(&request.body[..], br#"{"name":"Rex"}"#);
    }

    #[test]
    fn test_invalid_header_ignored() {
        let request = InboundRequest::new(Method::GET, "/").with_header("bad header", "x");
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_from_http_request() {
        let request = http::Request::builder()
            .method(Method::PUT)
            .uri("/pets/1?dry=true")
            .header("content-type", "text/plain")
            .body(Bytes::from_static(b"hi"))
            .unwrap();
        let inbound = InboundRequest::from(request);
        assert_eq!(inbound.method, Method::PUT);
        assert_eq!(inbound.path_info, "/pets/1");
        assert_eq!(inbound.query.as_deref(), Some("dry=true"));
        assert_eq!(inbound.content_type(), Some("text/plain"));
    }

    #[test]
    fn test_response_builder() {
        let res = response(StatusCode::NOT_FOUND, None, Bytes::new());
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.headers().get(CONTENT_TYPE).is_none());
    }
}
