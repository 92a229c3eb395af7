//! The schema conformance seam.
//!
//! Validation never evaluates JSON Schema keywords itself. It hands a schema
//! to a [`SchemaEngine`] once at startup and asks it for [`Violation`]s per
//! instance. [`JsonSchemaEngine`] is the default, backed by `jsonschema`.

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, Validator};
use serde_json::Value;
use waymark_definition::OpenApiVersion;

use crate::error::ErrorKind;

/// One violation reported by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer to the offending value. For missing and unexpected
    /// properties it points at the property itself.
    pub pointer: String,
    /// The class of the violation.
    pub kind: ErrorKind,
    /// Engine message.
    pub message: String,
}

impl Violation {
    /// Returns the first token of the pointer, unescaped.
    ///
    /// For parameter objects this is the parameter name.
    #[must_use]
    pub fn first_token(&self) -> String {
        self.pointer
            .split('/')
            .nth(1)
            .map(unescape)
            .unwrap_or_default()
    }
}

/// Compiles schemas and checks instances against them.
pub trait SchemaEngine: Send + Sync {
    /// A compiled schema.
    type Compiled: Send + Sync;

    /// Compiles `schema`, returning a message on failure.
    fn compile(&self, schema: &Value) -> Result<Self::Compiled, String>;

    /// Returns every violation of `instance`, in a stable order.
    fn check(&self, compiled: &Self::Compiled, instance: &Value) -> Vec<Violation>;
}

/// [`SchemaEngine`] backed by the `jsonschema` crate.
///
/// OpenAPI 3.0 schemas are evaluated as draft 4 with `nullable` rewritten to
/// a `null` type; OpenAPI 3.1 schemas as draft 2020-12. Format assertions
/// are always on.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use waymark_definition::OpenApiVersion;
/// use waymark_validation::{ErrorKind, JsonSchemaEngine, SchemaEngine};
///
/// let engine = JsonSchemaEngine::new(OpenApiVersion::V3_0);
/// let schema = engine.compile(&json!({"type": "integer", "nullable": true})).unwrap();
///
/// assert!(engine.check(&schema, &json!(null)).is_empty());
/// assert_eq!(engine.check(&schema, &json!("x"))[0].kind, ErrorKind::Type);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonSchemaEngine {
    version: OpenApiVersion,
}

impl JsonSchemaEngine {
    /// Creates an engine for the given OpenAPI release line.
    #[must_use]
    pub const fn new(version: OpenApiVersion) -> Self {
        Self { version }
    }

    const fn draft(&self) -> Draft {
        match self.version {
            OpenApiVersion::V3_0 => Draft::Draft4,
            OpenApiVersion::V3_1 => Draft::Draft202012,
        }
    }
}

impl SchemaEngine for JsonSchemaEngine {
    type Compiled = Validator;

    fn compile(&self, schema: &Value) -> Result<Validator, String> {
        let mut schema = schema.clone();
        if self.version == OpenApiVersion::V3_0 {
            rewrite_nullable(&mut schema);
        }

        jsonschema::options()
            .with_draft(self.draft())
            .should_validate_formats(true)
            .build(&schema)
            .map_err(|e| e.to_string())
    }

    fn check(&self, compiled: &Validator, instance: &Value) -> Vec<Violation> {
        let mut violations = Vec::new();
        for error in compiled.iter_errors(instance) {
            let pointer = error.instance_path.to_string();
            let message = error.to_string();
            match &error.kind {
                ValidationErrorKind::Required { property } => {
                    let name = property.as_str().map_or_else(|| property.to_string(), str::to_string);
                    violations.push(Violation {
                        pointer: child_pointer(&pointer, &name),
                        kind: ErrorKind::Required,
                        message,
                    });
                }
                ValidationErrorKind::AdditionalProperties { unexpected } => {
                    for name in unexpected {
                        violations.push(Violation {
                            pointer: child_pointer(&pointer, name),
                            kind: ErrorKind::AdditionalProperties,
                            message: format!("property '{name}' is not allowed"),
                        });
                    }
                }
                kind => violations.push(Violation {
                    pointer,
                    kind: classify(kind),
                    message,
                }),
            }
        }
        violations
    }
}

fn classify(kind: &ValidationErrorKind) -> ErrorKind {
    match kind {
        ValidationErrorKind::Type { .. } => ErrorKind::Type,
        ValidationErrorKind::Format { .. } => ErrorKind::Format,
        ValidationErrorKind::Enum { .. } => ErrorKind::Enum,
        ValidationErrorKind::Pattern { .. } => ErrorKind::Pattern,
        _ => ErrorKind::Schema,
    }
}

/// Rewrites OpenAPI 3.0 `nullable: true` into a JSON Schema `null` type.
fn rewrite_nullable(schema: &mut Value) {
    match schema {
        Value::Object(object) => {
            let nullable = match object.get("nullable") {
                Some(Value::Bool(flag)) => *flag,
                _ => false,
            };
            if matches!(object.get("nullable"), Some(Value::Bool(_))) {
                object.remove("nullable");
            }
            if nullable {
                if let Some(ty) = object.get_mut("type") {
                    match ty {
                        Value::String(name) => {
                            let name = std::mem::take(name);
                            *ty = Value::from(vec![name, "null".to_string()]);
                        }
                        Value::Array(types) if !types.iter().any(|t| t == "null") => {
                            types.push(Value::from("null"));
                        }
                        _ => {}
                    }
                }
                if let Some(Value::Array(options)) = object.get_mut("enum") {
                    if !options.contains(&Value::Null) {
                        options.push(Value::Null);
                    }
                }
            }
            for (keyword, value) in object.iter_mut() {
                match keyword.as_str() {
                    // Keys of these maps are names, their values are schemas.
                    "properties" | "patternProperties" | "definitions" | "$defs" => {
                        if let Value::Object(named) = value {
                            named.values_mut().for_each(rewrite_nullable);
                        }
                    }
                    "enum" | "const" | "default" | "example" | "examples" | "required" => {}
                    _ => rewrite_nullable(value),
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(rewrite_nullable),
        _ => {}
    }
}

fn child_pointer(parent: &str, name: &str) -> String {
    format!("{parent}/{}", name.replace('~', "~0").replace('/', "~1"))
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}
