//! Loading contracts from JSON, YAML and files.
//!
//! YAML documents are converted to `serde_json::Value` before the definition
//! is built. Mapping keys that YAML reads as numbers or booleans (`200:`)
//! become strings.

use std::path::Path;

use serde_json::{Map, Number, Value};
use tracing::info;

use crate::definition::{Definition, DefinitionOptions};
use crate::error::{ContractError, ContractResult};

impl DefinitionOptions {
    /// Builds a definition from JSON text.
    pub fn from_json_str(&self, json: &str) -> ContractResult<Definition> {
        let document: Value = serde_json::from_str(json).map_err(|e| ContractError::Parse {
            format: "json",
            message: e.to_string(),
        })?;
        self.from_document(&document)
    }

    /// Builds a definition from YAML text.
    pub fn from_yaml_str(&self, yaml: &str) -> ContractResult<Definition> {
        let document: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(|e| ContractError::Parse {
            format: "yaml",
            message: e.to_string(),
        })?;
        self.from_document(&yaml_to_json(document)?)
    }

    /// Builds a definition from a file: JSON for `.json`, YAML otherwise.
    pub fn load(&self, path: impl AsRef<Path>) -> ContractResult<Definition> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading contract from file");

        let content = std::fs::read_to_string(path).map_err(|source| ContractError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            self.from_json_str(&content)
        } else {
            self.from_yaml_str(&content)
        }
    }
}

impl Definition {
    /// Builds a definition from JSON text.
    pub fn from_json_str(json: &str) -> ContractResult<Self> {
        DefinitionOptions::default().from_json_str(json)
    }

    /// Builds a definition from YAML text.
    pub fn from_yaml_str(yaml: &str) -> ContractResult<Self> {
        DefinitionOptions::default().from_yaml_str(yaml)
    }

    /// Builds a definition from a file: JSON for `.json`, YAML otherwise.
    pub fn load(path: impl AsRef<Path>) -> ContractResult<Self> {
        DefinitionOptions::default().load(path)
    }
}

fn yaml_to_json(value: serde_yaml::Value) -> ContractResult<Value> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => yaml_number(&n),
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<ContractResult<_>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => {
            let mut object = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                object.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number)
    }
}

fn yaml_key(key: serde_yaml::Value) -> ContractResult<String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Null => Ok("null".to_string()),
        other => Err(ContractError::Parse {
            format: "yaml",
            message: format!("unsupported mapping key {other:?}"),
        }),
    }
}
