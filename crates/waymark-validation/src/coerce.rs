//! Parameter coercion.
//!
//! Path, query and header values arrive as strings. When coercion is on they
//! are converted to the type the schema declares before the schema is
//! checked. A value that does not convert stays a string, so the engine
//! reports the type mismatch.

use serde_json::{Map, Number, Value};
use waymark_definition::{Parameter, ParameterLocation};

/// Schema used for undeclared values; it declares no type.
static UNTYPED: Value = Value::Null;

/// Builds the instance value for a parameter from its raw occurrences.
///
/// `raw` holds every occurrence in request order; it is never empty.
pub(crate) fn parameter_value(raw: &[String], parameter: &Parameter, coerce: bool) -> Value {
    let split = match parameter.location() {
        ParameterLocation::Query | ParameterLocation::Cookie if parameter.explode() => None,
        _ => Some(parameter.style().delimiter()),
    };
    schema_value(raw, parameter.schema(), split, coerce)
}

/// Builds a value for `schema` from raw strings.
///
/// Arrays take every occurrence, or split a single occurrence on `split`.
/// Scalars take the last occurrence.
pub(crate) fn schema_value(raw: &[String], schema: &Value, split: Option<char>, coerce: bool) -> Value {
    if primary_type(schema) == Some("array") {
        let items_schema = schema.get("items").unwrap_or(&UNTYPED);
        let parts: Vec<&str> = match (raw, split) {
            ([single], Some(_)) if single.is_empty() => Vec::new(),
            ([single], Some(delimiter)) => single.split(delimiter).collect(),
            _ => raw.iter().map(String::as_str).collect(),
        };
        return Value::Array(
            parts
                .into_iter()
                .map(|part| scalar(part, items_schema, coerce))
                .collect(),
        );
    }

    raw.last()
        .map_or(Value::Null, |last| scalar(last, schema, coerce))
}

/// Converts a single string per the schema `type`.
pub(crate) fn scalar(raw: &str, schema: &Value, coerce: bool) -> Value {
    if !coerce {
        return Value::String(raw.to_string());
    }

    let converted = match primary_type(schema) {
        Some("integer") => integer(raw),
        Some("number") => integer(raw)
            .or_else(|| raw.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)),
        Some("boolean") => match raw {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    };
    converted.unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Parses an integer in the full `i64` and `u64` range.
fn integer(raw: &str) -> Option<Value> {
    raw.parse::<i64>()
        .ok()
        .map(Value::from)
        .or_else(|| raw.parse::<u64>().ok().map(Value::from))
}

/// Builds an object from form fields, converting each per its property.
pub(crate) fn form_object(fields: &[(String, Vec<String>)], schema: &Value, coerce: bool) -> Value {
    let empty = Value::Object(Map::new());
    let properties = schema.get("properties").unwrap_or(&empty);

    let object = fields
        .iter()
        .map(|(name, values)| {
            let property = properties.get(name).unwrap_or(&UNTYPED);
            (name.clone(), schema_value(values, property, None, coerce))
        })
        .collect();
    Value::Object(object)
}

/// Returns the declared type, skipping `null` in a type list.
fn primary_type(schema: &Value) -> Option<&str> {
    match schema.get("type")? {
        Value::String(ty) => Some(ty),
        Value::Array(types) => types.iter().filter_map(Value::as_str).find(|t| *t != "null"),
        _ => None,
    }
}
