//! Media type selection and body parsing.

use mime::Mime;
use serde_json::Value;
use waymark_definition::Content;

use crate::coerce;
use crate::query::parse_query;

/// How a body is turned into a schema instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodyFormat {
    /// `application/json`, `*/*+json`
    Json,
    /// `application/x-www-form-urlencoded`
    Form,
    /// `text/*`, checked as a JSON string.
    Text,
    /// Anything else; accepted without a schema check.
    Opaque,
}

impl BodyFormat {
    pub(crate) fn of(mime: &Mime) -> Self {
        if mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON) {
            Self::Json
        } else if mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
            Self::Form
        } else if mime.type_() == mime::TEXT {
            Self::Text
        } else {
            Self::Opaque
        }
    }
}

/// Parses a `Content-Type` header value.
pub(crate) fn parse_content_type(content_type: Option<&str>) -> Option<Mime> {
    content_type?.trim().parse().ok()
}

/// Selects the declared media type for `mime`: exact essence, then
/// `type/*`, then `*/*`.
///
/// Returns the declared key.
pub(crate) fn select<'a>(content: &'a Content, mime: &Mime) -> Option<&'a str> {
    let essence = mime.essence_str().to_ascii_lowercase();
    let range = format!("{}/*", mime.type_().as_str().to_ascii_lowercase());

    let selected = [essence.as_str(), range.as_str(), "*/*"]
        .into_iter()
        .find_map(|wanted| {
            content
                .keys()
                .find(|declared| declared_essence(declared) == wanted)
        })
        .map(String::as_str);
    selected
}

fn declared_essence(declared: &str) -> &str {
    declared.split(';').next().unwrap_or(declared).trim()
}

/// Turns body bytes into an instance.
///
/// `Ok(None)` means the body is accepted without a schema check.
pub(crate) fn parse_body(
    format: BodyFormat,
    body: &[u8],
    schema: Option<&Value>,
    coerce_form: bool,
) -> Result<Option<Value>, String> {
    match format {
        BodyFormat::Json => serde_json::from_slice(body)
            .map(Some)
            .map_err(|e| format!("Failed to parse body as JSON: {e}")),
        BodyFormat::Form => {
            let text = std::str::from_utf8(body).map_err(|e| format!("Body is not UTF-8: {e}"))?;
            let fields: Vec<(String, Vec<String>)> = parse_query(text).into_iter().collect();
            let empty = Value::Null;
            Ok(Some(coerce::form_object(
                &fields,
                schema.unwrap_or(&empty),
                coerce_form,
            )))
        }
        BodyFormat::Text => std::str::from_utf8(body)
            .map(|text| Some(Value::String(text.to_string())))
            .map_err(|e| format!("Body is not UTF-8: {e}")),
        BodyFormat::Opaque => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content(keys: &[&str]) -> Content {
        keys.iter().map(|k| ((*k).to_string(), None)).collect()
    }

    fn mime(raw: &str) -> Mime {
        parse_content_type(Some(raw)).unwrap()
    }

    #[test]
    fn test_select_order() {
        let declared = content(&["*/*", "application/*", "application/json"]);
        assert_eq!(select(&declared, &mime("application/json; charset=utf-8")), Some("application/json"));
        assert_eq!(select(&declared, &mime("application/xml")), Some("application/*"));
        assert_eq!(select(&declared, &mime("text/plain")), Some("*/*"));
    }

    #[test]
    fn test_select_is_case_insensitive_and_ignores_declared_params() {
        let declared = content(&["application/json; charset=utf-8"]);
        assert_eq!(
            select(&declared, &mime("Application/JSON")),
            Some("application/json; charset=utf-8")
        );
        assert_eq!(select(&declared, &mime("text/plain")), None);
    }

    #[test]
    fn test_body_format() {
        assert_eq!(BodyFormat::of(&mime("application/json")), BodyFormat::Json);
        assert_eq!(BodyFormat::of(&mime("application/vnd.api+json")), BodyFormat::Json);
        assert_eq!(
            BodyFormat::of(&mime("application/x-www-form-urlencoded")),
            BodyFormat::Form
        );
        assert_eq!(BodyFormat::of(&mime("text/csv")), BodyFormat::Text);
        assert_eq!(BodyFormat::of(&mime("image/png")), BodyFormat::Opaque);
    }

    #[test]
    fn test_parse_json() {
        assert_eq!(
            parse_body(BodyFormat::Json, br#"{"name": "Rex"}"#, None, true).unwrap(),
            Some(json!({"name": "Rex"}))
        );
        assert!(parse_body(BodyFormat::Json, b"{name", None, true).is_err());
    }

    #[test]
    fn test_parse_form() {
        let schema = json!({"type": "object", "properties": {"age": {"type": "integer"}}});
        assert_eq!(
            parse_body(BodyFormat::Form, b"name=Rex&age=3", Some(&schema), true).unwrap(),
            Some(json!({"name": "Rex", "age": 3}))
        );
    }

    #[test]
    fn test_parse_text_and_opaque() {
        assert_eq!(
            parse_body(BodyFormat::Text, b"hello", None, true).unwrap(),
            Some(json!("hello"))
        );
        assert!(parse_body(BodyFormat::Text, &[0xff, 0xfe], None, true).is_err());
        assert_eq!(parse_body(BodyFormat::Opaque, &[0xff], None, true).unwrap(), None);
    }

    #[test]
    fn test_unparsable_content_type() {
        assert!(parse_content_type(Some("not a mime")).is_none());
        assert!(parse_content_type(None).is_none());
    }
}
