//! Parsing text formats into the core override mapping
//!
//! Each parser produces a [`ValueMap`] that `Factory::create` consumes
//! unmodified: nested tables/objects become nested maps, scalars become
//! [`Value`]s. Mappings inside arrays have no core representation and are
//! rejected.

use std::fs;
use std::path::Path;

use cfgtree_core::{Value, ValueMap};

use crate::error::{Error, Result};
use crate::format::Format;

/// Parse TOML text into an override mapping.
pub fn from_toml_str(text: &str) -> Result<ValueMap> {
    let table: toml::Table =
        toml::from_str(text).map_err(|e| Error::parse(Format::Toml, e.to_string()))?;
    toml_table_to_map(&table)
}

/// Parse YAML text into an override mapping.
pub fn from_yaml_str(text: &str) -> Result<ValueMap> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|e| Error::parse(Format::Yaml, e.to_string()))?;
    match value {
        serde_yaml::Value::Mapping(mapping) => yaml_mapping_to_map(&mapping),
        serde_yaml::Value::Null => Ok(ValueMap::new()),
        _ => Err(Error::parse(
            Format::Yaml,
            "top level must be a mapping".to_string(),
        )),
    }
}

/// Parse JSON text into an override mapping.
pub fn from_json_str(text: &str) -> Result<ValueMap> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| Error::parse(Format::Json, e.to_string()))?;
    match value {
        serde_json::Value::Object(object) => json_object_to_map(&object),
        _ => Err(Error::parse(
            Format::Json,
            "top level must be an object".to_string(),
        )),
    }
}

/// Read a file and parse it according to its extension.
pub fn load_path(path: impl AsRef<Path>) -> Result<ValueMap> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    tracing::debug!(path = %path.display(), %format, "loading overrides");
    let text = fs::read_to_string(path)?;
    match format {
        Format::Toml => from_toml_str(&text),
        Format::Yaml => from_yaml_str(&text),
        Format::Json => from_json_str(&text),
    }
}

fn toml_table_to_map(table: &toml::Table) -> Result<ValueMap> {
    let mut map = ValueMap::new();
    for (key, entry) in table {
        match entry {
            toml::Value::Table(nested) => {
                map.insert(key.clone(), toml_table_to_map(nested)?);
            }
            other => {
                map.insert(key.clone(), toml_to_value(other)?);
            }
        }
    }
    Ok(map)
}

fn toml_to_value(value: &toml::Value) -> Result<Value> {
    match value {
        toml::Value::String(s) => Ok(Value::Str(s.clone())),
        toml::Value::Integer(i) => Ok(Value::Int(*i)),
        toml::Value::Float(x) => Ok(Value::Float(*x)),
        toml::Value::Boolean(b) => Ok(Value::Bool(*b)),
        toml::Value::Datetime(dt) => Ok(Value::Str(dt.to_string())),
        toml::Value::Array(items) => Ok(Value::List(
            items.iter().map(toml_to_value).collect::<Result<_>>()?,
        )),
        toml::Value::Table(_) => Err(Error::unrepresentable(
            Format::Toml,
            "a table nested inside an array",
        )),
    }
}

fn yaml_mapping_to_map(mapping: &serde_yaml::Mapping) -> Result<ValueMap> {
    let mut map = ValueMap::new();
    for (key, entry) in mapping {
        let key = key
            .as_str()
            .ok_or_else(|| Error::parse(Format::Yaml, "mapping keys must be strings"))?;
        match entry {
            serde_yaml::Value::Mapping(nested) => {
                map.insert(key, yaml_mapping_to_map(nested)?);
            }
            other => {
                map.insert(key, yaml_to_value(other)?);
            }
        }
    }
    Ok(map)
}

fn yaml_to_value(value: &serde_yaml::Value) -> Result<Value> {
    match value {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(x) = n.as_f64() {
                Ok(Value::Float(x))
            } else {
                Err(Error::parse(Format::Yaml, format!("unrepresentable number {n}")))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::Str(s.clone())),
        serde_yaml::Value::Sequence(items) => Ok(Value::List(
            items.iter().map(yaml_to_value).collect::<Result<_>>()?,
        )),
        serde_yaml::Value::Mapping(_) => Err(Error::unrepresentable(
            Format::Yaml,
            "a mapping nested inside a sequence",
        )),
        serde_yaml::Value::Tagged(tagged) => yaml_to_value(&tagged.value),
    }
}

fn json_object_to_map(object: &serde_json::Map<String, serde_json::Value>) -> Result<ValueMap> {
    let mut map = ValueMap::new();
    for (key, entry) in object {
        match entry {
            serde_json::Value::Object(nested) => {
                map.insert(key.clone(), json_object_to_map(nested)?);
            }
            other => {
                map.insert(key.clone(), json_to_value(other)?);
            }
        }
    }
    Ok(map)
}

fn json_to_value(value: &serde_json::Value) -> Result<Value> {
    match value {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(x) = n.as_f64() {
                Ok(Value::Float(x))
            } else {
                Err(Error::parse(Format::Json, format!("unrepresentable number {n}")))
            }
        }
        serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
        serde_json::Value::Array(items) => Ok(Value::List(
            items.iter().map(json_to_value).collect::<Result<_>>()?,
        )),
        serde_json::Value::Object(_) => Err(Error::unrepresentable(
            Format::Json,
            "an object nested inside an array",
        )),
    }
}
