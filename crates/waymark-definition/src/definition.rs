//! The compiled contract.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;
use serde_json::{Map, Value};
use tracing::{debug, info};
use waymark_router::{PathTemplate, RouteOutcome, Router};

use crate::error::{ContractError, ContractResult};
use crate::operation::{merge_parameters, Operation};
use crate::parameter::{Parameter, ParameterLocation};
use crate::responses::{RequestBody, Responses, ResponsesError};

/// Path-item keys that hold operations, in the order they are registered.
const METHODS: [(&str, Method); 8] = [
    ("get", Method::GET),
    ("put", Method::PUT),
    ("post", Method::POST),
    ("delete", Method::DELETE),
    ("options", Method::OPTIONS),
    ("head", Method::HEAD),
    ("patch", Method::PATCH),
    ("trace", Method::TRACE),
];

/// OpenAPI release line of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenApiVersion {
    /// OpenAPI 3.0.x (JSON Schema draft 4 dialect).
    V3_0,
    /// OpenAPI 3.1.x (JSON Schema 2020-12).
    V3_1,
}

impl OpenApiVersion {
    fn parse(raw: &str) -> Option<Self> {
        if raw.starts_with("3.0") {
            Some(Self::V3_0)
        } else if raw.starts_with("3.1") {
            Some(Self::V3_1)
        } else {
            None
        }
    }
}

type PathFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Options applied while building a [`Definition`].
///
/// # Example
///
/// ```rust
/// use waymark_definition::DefinitionOptions;
///
/// let yaml = r#"
/// openapi: 3.0.3
/// info: { title: Petstore, version: "1.0" }
/// paths:
///   /pets:
///     get: { operationId: listPets, responses: { "200": { description: ok } } }
///   /admin/stats:
///     get: { operationId: stats, responses: { "200": { description: ok } } }
/// "#;
///
/// let definition = DefinitionOptions::new()
///     .only(|path| path.starts_with("/pets"))
///     .from_yaml_str(yaml)
///     .unwrap();
///
/// assert!(definition.operation("listPets").is_some());
/// assert!(definition.operation("stats").is_none());
/// ```
#[derive(Clone, Default)]
pub struct DefinitionOptions {
    only: Option<PathFilter>,
}

impl DefinitionOptions {
    /// Creates options that admit every path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits only path templates for which `filter` returns true.
    #[must_use]
    pub fn only(mut self, filter: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.only = Some(Arc::new(filter));
        self
    }

    fn admits(&self, path: &str) -> bool {
        self.only.as_ref().map_or(true, |filter| filter(path))
    }

    /// Builds a definition from a resolved document.
    pub fn from_document(&self, document: &Value) -> ContractResult<Definition> {
        Definition::build(document, self)
    }
}

impl fmt::Debug for DefinitionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionOptions")
            .field("only", &self.only.as_ref().map(|_| "<filter>"))
            .finish()
    }
}

/// An immutable, indexed contract.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct Definition {
    openapi_version: String,
    version_line: OpenApiVersion,
    title: String,
    version: String,
    operations: Vec<Operation>,
    by_id: HashMap<String, usize>,
    router: Router,
}

impl Definition {
    /// Builds a definition from a resolved document.
    pub fn from_document(document: &Value) -> ContractResult<Self> {
        Self::build(document, &DefinitionOptions::default())
    }

    fn build(document: &Value, options: &DefinitionOptions) -> ContractResult<Self> {
        let root = document
            .as_object()
            .ok_or_else(|| ContractError::malformed("$", "document must be an object"))?;

        let openapi_version = root
            .get("openapi")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let version_line = OpenApiVersion::parse(&openapi_version).ok_or_else(|| {
            ContractError::UnsupportedVersion {
                version: openapi_version.clone(),
            }
        })?;

        let info = root.get("info");
        let title = info_text(info, "title");
        let version = info_text(info, "version");

        let mut definition = Self {
            openapi_version,
            version_line,
            title,
            version,
            operations: Vec::new(),
            by_id: HashMap::new(),
            router: Router::new(),
        };

        let empty = Map::new();
        let paths = match root.get("paths") {
            None => &empty,
            Some(paths) => paths
                .as_object()
                .ok_or_else(|| ContractError::malformed("paths", "expected an object"))?,
        };

        for (path, item) in paths {
            if !options.admits(path) {
                debug!(path = %path, "path excluded by filter");
                continue;
            }
            definition.add_path_item(path, item)?;
        }

        info!(
            title = %definition.title,
            version = %definition.version,
            openapi = %definition.openapi_version,
            operations = definition.operations.len(),
            "contract loaded"
        );
        Ok(definition)
    }

    fn add_path_item(&mut self, path: &str, item: &Value) -> ContractResult<()> {
        let location = format!("paths.{path}");
        let item = item
            .as_object()
            .ok_or_else(|| ContractError::malformed(&location, "expected an object"))?;

        let template = PathTemplate::parse(path).map_err(|source| ContractError::MalformedTemplate {
            template: path.to_string(),
            source,
        })?;

        let shared = parse_parameters(item.get("parameters"), &location)
            .map_err(|message| ContractError::malformed(&location, message))?;

        for (key, method) in &METHODS {
            let Some(raw) = item.get(*key) else {
                continue;
            };
            let operation = build_operation(&template, method.clone(), raw, &shared, &location)?;
            self.register(operation)?;
        }
        Ok(())
    }

    fn register(&mut self, operation: Operation) -> ContractResult<()> {
        if self.by_id.contains_key(operation.operation_id()) {
            return Err(ContractError::DuplicateOperationId {
                operation_id: operation.operation_id().to_string(),
            });
        }

        self.router.insert(
            operation.path_template(),
            operation.method().clone(),
            operation.operation_id(),
        )?;

        debug!(
            operation_id = %operation.operation_id(),
            method = %operation.method(),
            path = %operation.path(),
            "operation registered"
        );
        self.by_id
            .insert(operation.operation_id().to_string(), self.operations.len());
        self.operations.push(operation);
        Ok(())
    }

    /// Returns all operations in document order.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Returns the operation with the given ID.
    #[must_use]
    pub fn operation(&self, operation_id: &str) -> Option<&Operation> {
        self.by_id.get(operation_id).map(|&index| &self.operations[index])
    }

    /// Finds the operation a request targets, ignoring any mount prefix.
    #[must_use]
    pub fn find_operation(&self, method: &Method, path: &str) -> Option<&Operation> {
        match self.router.match_route(method, path) {
            RouteOutcome::Matched(m) => self.operation(m.operation_id),
            RouteOutcome::MethodNotAllowed { .. } | RouteOutcome::NotFound => None,
        }
    }

    /// Returns the router built from the operations.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns `info.title`.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns `info.version`.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the `openapi` field as written.
    #[must_use]
    pub fn openapi_version(&self) -> &str {
        &self.openapi_version
    }

    /// Returns the OpenAPI release line.
    #[must_use]
    pub fn version_line(&self) -> OpenApiVersion {
        self.version_line
    }
}

/// Reads an `info` field, accepting numbers YAML did not quote.
fn info_text(info: Option<&Value>, key: &str) -> String {
    match info.and_then(|i| i.get(key)) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn parse_parameters(value: Option<&Value>, location: &str) -> Result<Vec<Parameter>, String> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let list = value
        .as_array()
        .ok_or_else(|| format!("{location}.parameters must be an array"))?;

    let mut parameters: Vec<Parameter> = Vec::with_capacity(list.len());
    for raw in list {
        if let Some(parameter) = Parameter::from_value(raw)? {
            if parameters.iter().any(|p| p.same_as(&parameter)) {
                return Err(format!(
                    "parameter '{}' in {} is declared twice",
                    parameter.name(),
                    parameter.location()
                ));
            }
            parameters.push(parameter);
        }
    }
    Ok(parameters)
}

fn build_operation(
    template: &PathTemplate,
    method: Method,
    raw: &Value,
    shared: &[Parameter],
    path_location: &str,
) -> ContractResult<Operation> {
    let location = format!("{path_location}.{}", method.as_str().to_ascii_lowercase());
    let object = raw
        .as_object()
        .ok_or_else(|| ContractError::malformed(&location, "expected an object"))?;

    let operation_id = object
        .get("operationId")
        .and_then(Value::as_str)
        .map_or_else(|| format!("{method} {}", template.as_str()), str::to_string);

    let own = parse_parameters(object.get("parameters"), &location).map_err(|message| {
        ContractError::InvalidParameter {
            operation_id: operation_id.clone(),
            message,
        }
    })?;
    let parameters = merge_parameters(shared, own);
    check_path_parameters(&operation_id, template, &parameters)?;

    let request_body = object
        .get("requestBody")
        .map(RequestBody::from_value)
        .transpose()
        .map_err(|message| ContractError::malformed(&location, message))?;

    let responses = Responses::from_value(object.get("responses")).map_err(|err| match err {
        ResponsesError::InvalidKey(key) => ContractError::InvalidStatusKey {
            operation_id: operation_id.clone(),
            key,
        },
        ResponsesError::Malformed(message) => ContractError::malformed(&location, message),
    })?;

    Ok(Operation {
        operation_id,
        method,
        template: template.clone(),
        summary: object.get("summary").and_then(Value::as_str).map(str::to_string),
        tags: object
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default(),
        deprecated: object.get("deprecated").and_then(Value::as_bool).unwrap_or(false),
        parameters,
        request_body,
        responses,
    })
}

fn check_path_parameters(
    operation_id: &str,
    template: &PathTemplate,
    parameters: &[Parameter],
) -> ContractResult<()> {
    let declared = || {
        parameters
            .iter()
            .filter(|p| p.location() == ParameterLocation::Path)
    };

    if let Some(name) = template
        .param_names()
        .find(|name| !declared().any(|p| p.name() == *name))
    {
        return Err(ContractError::UndeclaredPathParameter {
            operation_id: operation_id.to_string(),
            name: name.to_string(),
        });
    }

    if let Some(parameter) = declared().find(|p| !template.has_param(p.name())) {
        return Err(ContractError::UnusedPathParameter {
            operation_id: operation_id.to_string(),
            name: parameter.name().to_string(),
        });
    }
    Ok(())
}
