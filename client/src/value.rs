//! # Configuration Values
//!
//! Format-independent tree produced by a [`crate::DocumentParser`] and
//! returned by every lookup.

use errors::{CoreError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Mapping from key to value; the shape every configuration file has at its
/// top level.
pub type Document = BTreeMap<String, ConfigValue>;

/// A value found in a configuration document.
///
/// Leaves are scalars or lists, inner nodes are [`ConfigValue::Document`]s.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<ConfigValue>),
    Document(Document),
}

impl ConfigValue {
    /// Short name of the variant, used in error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Document(_) => "document",
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Self::Document(document) => Some(document),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<Document> for ConfigValue {
    fn from(document: Document) -> Self {
        Self::Document(document)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

// Conversions used by typed lookups. On mismatch the value is handed back so
// the caller can report what was actually found.

impl TryFrom<ConfigValue> for String {
    type Error = ConfigValue;

    fn try_from(value: ConfigValue) -> std::result::Result<Self, Self::Error> {
        match value {
            ConfigValue::String(value) => Ok(value),
            other => Err(other),
        }
    }
}

impl TryFrom<ConfigValue> for bool {
    type Error = ConfigValue;

    fn try_from(value: ConfigValue) -> std::result::Result<Self, Self::Error> {
        match value {
            ConfigValue::Bool(value) => Ok(value),
            other => Err(other),
        }
    }
}

impl TryFrom<ConfigValue> for i64 {
    type Error = ConfigValue;

    fn try_from(value: ConfigValue) -> std::result::Result<Self, Self::Error> {
        match value {
            ConfigValue::Integer(value) => Ok(value),
            other => Err(other),
        }
    }
}

impl TryFrom<ConfigValue> for u64 {
    type Error = ConfigValue;

    fn try_from(value: ConfigValue) -> std::result::Result<Self, Self::Error> {
        match value {
            ConfigValue::Integer(value) => {
                u64::try_from(value).map_err(|_| ConfigValue::Integer(value))
            }
            other => Err(other),
        }
    }
}

impl TryFrom<ConfigValue> for f64 {
    type Error = ConfigValue;

    fn try_from(value: ConfigValue) -> std::result::Result<Self, Self::Error> {
        match value {
            ConfigValue::Float(value) => Ok(value),
            ConfigValue::Integer(value) => Ok(value as f64),
            other => Err(other),
        }
    }
}

impl TryFrom<ConfigValue> for Vec<ConfigValue> {
    type Error = ConfigValue;

    fn try_from(value: ConfigValue) -> std::result::Result<Self, Self::Error> {
        match value {
            ConfigValue::List(values) => Ok(values),
            other => Err(other),
        }
    }
}

impl TryFrom<ConfigValue> for Document {
    type Error = ConfigValue;

    fn try_from(value: ConfigValue) -> std::result::Result<Self, Self::Error> {
        match value {
            ConfigValue::Document(document) => Ok(document),
            other => Err(other),
        }
    }
}

/// Converts the value found under `key` into `T`.
///
/// A mismatch is reported as invalid input at the last segment of `key`.
pub fn coerce<T>(key: &str, value: ConfigValue) -> Result<T>
where
    T: TryFrom<ConfigValue, Error = ConfigValue>,
{
    T::try_from(value).map_err(|found| {
        let segment = key.rsplit(crate::provider::KEY_SEPARATOR).next().unwrap_or(key);
        CoreError::invalid_input(
            segment,
            format!(
                "expected {} but found {}",
                std::any::type_name::<T>(),
                found.shape()
            ),
        )
    })
}
