//! Precompiled validation plan.
//!
//! Every schema an operation can need is compiled once, when the plan is
//! built. A contract whose schemas do not compile fails here rather than on
//! the first request that reaches them.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use tracing::info;
use waymark_definition::{Definition, Operation, Parameter, ParameterLocation, StatusKey};

use crate::config::ValidationConfig;
use crate::engine::{JsonSchemaEngine, SchemaEngine};
use crate::error::SchemaCompileError;
use crate::request::RequestValidator;
use crate::response::ResponseValidator;

/// Builds the object schema checked against a group of parameters.
///
/// ```rust
/// use serde_json::json;
/// use waymark_definition::{Parameter, ParameterLocation};
/// use waymark_validation::parameter_schema;
///
/// let limit = Parameter::new("limit", ParameterLocation::Query, true, json!({"type": "integer"}));
/// assert_eq!(
///     parameter_schema([&limit], false),
///     json!({
///         "type": "object",
///         "required": ["limit"],
///         "additionalProperties": false,
///         "properties": {"limit": {"type": "integer"}}
///     })
/// );
/// ```
pub fn parameter_schema<'a>(
    parameters: impl IntoIterator<Item = &'a Parameter>,
    additional_properties: bool,
) -> Value {
    let mut required = Vec::new();
    let mut properties = Map::new();
    for parameter in parameters {
        if parameter.required() {
            required.push(Value::from(parameter.name()));
        }
        properties.insert(parameter.name().to_string(), parameter.schema().clone());
    }

    let mut schema = Map::new();
    schema.insert("type".into(), json!("object"));
    if !required.is_empty() {
        schema.insert("required".into(), Value::Array(required));
    }
    schema.insert("additionalProperties".into(), json!(additional_properties));
    schema.insert("properties".into(), Value::Object(properties));
    Value::Object(schema)
}

/// Compiled parameters of one location.
pub(crate) struct ParameterGroup<C> {
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) compiled: C,
}

impl<C> ParameterGroup<C> {
    pub(crate) fn find(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name() == name)
    }
}

/// Compiled schemas of one operation.
pub(crate) struct OperationPlan<C> {
    pub(crate) path: Option<ParameterGroup<C>>,
    pub(crate) query: Option<ParameterGroup<C>>,
    pub(crate) header: Option<ParameterGroup<C>>,
    pub(crate) body: IndexMap<String, Option<C>>,
    pub(crate) responses: HashMap<StatusKey, IndexMap<String, Option<C>>>,
}

/// Every compiled schema of a definition.
///
/// # Example
///
/// ```rust
/// use waymark_definition::Definition;
/// use waymark_validation::{ValidationConfig, ValidationPlan};
///
/// let definition = Definition::from_yaml_str(r#"
/// openapi: 3.0.2
/// info: { title: t, version: "1" }
/// paths:
///   /pets:
///     get:
///       operationId: listPets
///       parameters:
///         - { name: limit, in: query, schema: { type: integer } }
/// "#).unwrap();
///
/// let plan = ValidationPlan::new(&definition, ValidationConfig::default()).unwrap();
/// assert_eq!(plan.len(), 1);
/// ```
pub struct ValidationPlan<E: SchemaEngine = JsonSchemaEngine> {
    engine: E,
    config: ValidationConfig,
    operations: HashMap<String, OperationPlan<E::Compiled>>,
}

impl ValidationPlan<JsonSchemaEngine> {
    /// Compiles a plan with the engine matching the contract's version.
    pub fn new(definition: &Definition, config: ValidationConfig) -> Result<Self, SchemaCompileError> {
        Self::compile(
            definition,
            JsonSchemaEngine::new(definition.version_line()),
            config,
        )
    }
}

impl<E: SchemaEngine> ValidationPlan<E> {
    /// Compiles every schema of `definition` with `engine`.
    pub fn compile(
        definition: &Definition,
        engine: E,
        config: ValidationConfig,
    ) -> Result<Self, SchemaCompileError> {
        let mut operations = HashMap::with_capacity(definition.operations().len());
        for operation in definition.operations() {
            let plan = compile_operation(&engine, &config, operation)?;
            operations.insert(operation.operation_id().to_string(), plan);
        }

        info!(
            operations = operations.len(),
            allow_additional_parameters = config.allow_additional_parameters,
            coerce_parameters = config.coerce_parameters,
            "validation plan compiled"
        );
        Ok(Self {
            engine,
            config,
            operations,
        })
    }

    /// Returns a request validator backed by this plan.
    #[must_use]
    pub fn requests(&self) -> RequestValidator<'_, E> {
        RequestValidator::new(self)
    }

    /// Returns a response validator backed by this plan.
    #[must_use]
    pub fn responses(&self) -> ResponseValidator<'_, E> {
        ResponseValidator::new(self)
    }

    /// Returns the settings the plan was compiled with.
    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Returns the number of compiled operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns true if no operation was compiled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub(crate) fn engine(&self) -> &E {
        &self.engine
    }

    pub(crate) fn operation(&self, operation_id: &str) -> Option<&OperationPlan<E::Compiled>> {
        self.operations.get(operation_id)
    }
}

impl<E: SchemaEngine> fmt::Debug for ValidationPlan<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationPlan")
            .field("config", &self.config)
            .field("operations", &self.operations.len())
            .finish_non_exhaustive()
    }
}

fn compile_operation<E: SchemaEngine>(
    engine: &E,
    config: &ValidationConfig,
    operation: &Operation,
) -> Result<OperationPlan<E::Compiled>, SchemaCompileError> {
    let compile = |schema: &Value, location: String| {
        engine.compile(schema).map_err(|reason| SchemaCompileError {
            operation_id: operation.operation_id().to_string(),
            location,
            reason,
        })
    };

    let group = |location: ParameterLocation,
                 additional: bool|
     -> Result<Option<ParameterGroup<E::Compiled>>, SchemaCompileError> {
        let parameters: Vec<Parameter> = operation.parameters_in(location).cloned().collect();
        if parameters.is_empty() {
            return Ok(None);
        }
        let compiled = compile(
            &parameter_schema(&parameters, additional),
            location.as_str().to_string(),
        )?;
        Ok(Some(ParameterGroup {
            parameters,
            compiled,
        }))
    };

    let path = group(ParameterLocation::Path, true)?;
    let query = group(ParameterLocation::Query, config.allow_additional_parameters)?;
    let header = group(ParameterLocation::Header, true)?;

    let mut body = IndexMap::new();
    if let Some(request_body) = operation.request_body() {
        for (media_type, schema) in request_body.content() {
            let compiled = schema
                .as_ref()
                .map(|s| compile(s, format!("requestBody {media_type}")))
                .transpose()?;
            body.insert(media_type.clone(), compiled);
        }
    }

    let mut responses = HashMap::new();
    for (status, response) in operation.responses().iter() {
        let mut by_media = IndexMap::new();
        for (media_type, schema) in response.content() {
            let compiled = schema
                .as_ref()
                .map(|s| compile(s, format!("response {status} {media_type}")))
                .transpose()?;
            by_media.insert(media_type.clone(), compiled);
        }
        responses.insert(status, by_media);
    }

    Ok(OperationPlan {
        path,
        query,
        header,
        body,
        responses,
    })
}
