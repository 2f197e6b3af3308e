//! Runtime values and the nested override mapping
//!
//! `Value` is the closed set of runtime types an option can hold.
//! `ValueMap` is the ordered, possibly-nested `name -> value` mapping used
//! both as the input to `Factory::create` and as the output of exports.

use std::fmt;
use std::str::FromStr;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::Error;

/// A runtime option value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    /// The runtime-type tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::List(_) => ValueKind::List,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Numeric view: `Int` widened to `f64`, `Float` as-is.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "\"{s}\""),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// Runtime-type tag, used to express type constraints on options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Str,
    List,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "str",
            ValueKind::List => "list",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ValueKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "null" => Ok(ValueKind::Null),
            "bool" | "boolean" => Ok(ValueKind::Bool),
            "int" | "integer" => Ok(ValueKind::Int),
            "float" => Ok(ValueKind::Float),
            "str" | "string" => Ok(ValueKind::Str),
            "list" | "array" => Ok(ValueKind::List),
            _ => Err(Error::UnknownKind {
                kind: s.to_string(),
            }),
        }
    }
}

/// One entry in a [`ValueMap`]: either a plain value for an option, or a
/// nested mapping for a subsection.
#[derive(Debug, Clone, PartialEq)]
pub enum MapValue {
    Value(Value),
    Map(ValueMap),
}

impl From<Value> for MapValue {
    fn from(v: Value) -> Self {
        MapValue::Value(v)
    }
}

impl From<ValueMap> for MapValue {
    fn from(m: ValueMap) -> Self {
        MapValue::Map(m)
    }
}

impl From<bool> for MapValue {
    fn from(b: bool) -> Self {
        MapValue::Value(b.into())
    }
}

impl From<i32> for MapValue {
    fn from(i: i32) -> Self {
        MapValue::Value(i.into())
    }
}

impl From<i64> for MapValue {
    fn from(i: i64) -> Self {
        MapValue::Value(i.into())
    }
}

impl From<f64> for MapValue {
    fn from(x: f64) -> Self {
        MapValue::Value(x.into())
    }
}

impl From<&str> for MapValue {
    fn from(s: &str) -> Self {
        MapValue::Value(s.into())
    }
}

impl From<String> for MapValue {
    fn from(s: String) -> Self {
        MapValue::Value(s.into())
    }
}

/// An ordered nested mapping of option/subsection names to values.
///
/// Insertion order is preserved; `insert` on an existing key replaces the
/// entry in place. Lookups are linear, which is the right trade-off for
/// configuration-sized maps.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueMap {
    entries: Vec<(String, MapValue)>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    pub fn get(&self, name: &str) -> Option<&MapValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Insert or replace an entry, preserving the position of replaced keys.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<MapValue>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            slot.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<MapValue> {
        let index = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MapValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Chainable form of [`insert`](Self::insert), for building literals.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<MapValue>) -> Self {
        self.insert(name, value);
        self
    }
}

impl Serialize for ValueMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            match entry {
                MapValue::Value(v) => map.serialize_entry(key, v)?,
                MapValue::Map(m) => map.serialize_entry(key, m)?,
            }
        }
        map.end()
    }
}

impl FromIterator<(String, MapValue)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (String, MapValue)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}
