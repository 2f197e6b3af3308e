//! Serializing an exported mapping back to text
//!
//! Works over the `ValueMap` returned by `to_map`: either the full
//! resolved configuration or only the explicitly-set values, the caller's
//! choice. JSON and YAML serialize the map directly; TOML goes through an
//! explicit conversion because it has no null and keeps tables last.

use std::fs;
use std::path::Path;

use cfgtree_core::{MapValue, Value, ValueMap};

use crate::error::{Error, Result};
use crate::format::Format;

/// Render a mapping as pretty TOML. Fails on `Null` values and on
/// mappings nested inside lists, which TOML cannot express.
pub fn to_toml_string(map: &ValueMap) -> Result<String> {
    let table = map_to_toml_table(map)?;
    toml::to_string_pretty(&toml::Value::Table(table))
        .map_err(|e| Error::serialize(Format::Toml, e.to_string()))
}

/// Render a mapping as YAML.
pub fn to_yaml_string(map: &ValueMap) -> Result<String> {
    serde_yaml::to_string(map).map_err(|e| Error::serialize(Format::Yaml, e.to_string()))
}

/// Render a mapping as pretty JSON.
pub fn to_json_string(map: &ValueMap) -> Result<String> {
    serde_json::to_string_pretty(map).map_err(|e| Error::serialize(Format::Json, e.to_string()))
}

/// Serialize a mapping to a file, dispatching on the file extension.
pub fn save_path(path: impl AsRef<Path>, map: &ValueMap) -> Result<()> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    tracing::debug!(path = %path.display(), %format, "saving configuration");
    let text = match format {
        Format::Toml => to_toml_string(map)?,
        Format::Yaml => to_yaml_string(map)?,
        Format::Json => to_json_string(map)?,
    };
    fs::write(path, text)?;
    Ok(())
}

fn map_to_toml_table(map: &ValueMap) -> Result<toml::Table> {
    let mut table = toml::Table::new();
    for (key, entry) in map.iter() {
        match entry {
            MapValue::Value(value) => {
                table.insert(key.to_string(), value_to_toml(value)?);
            }
            MapValue::Map(nested) => {
                table.insert(
                    key.to_string(),
                    toml::Value::Table(map_to_toml_table(nested)?),
                );
            }
        }
    }
    Ok(table)
}

fn value_to_toml(value: &Value) -> Result<toml::Value> {
    match value {
        Value::Null => Err(Error::unrepresentable(Format::Toml, "a null value")),
        Value::Bool(b) => Ok(toml::Value::Boolean(*b)),
        Value::Int(i) => Ok(toml::Value::Integer(*i)),
        Value::Float(x) => Ok(toml::Value::Float(*x)),
        Value::Str(s) => Ok(toml::Value::String(s.clone())),
        Value::List(items) => Ok(toml::Value::Array(
            items.iter().map(value_to_toml).collect::<Result<_>>()?,
        )),
    }
}
