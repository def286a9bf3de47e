//! Document parsing.
//!
//! The provider only depends on [`DocumentParser`]; YAML is the format the
//! configuration server ships.

use crate::value::{ConfigValue, Document};
use errors::{CoreError, Result};
use serde_yaml::Value;

/// Turns the raw bytes of a configuration file into a [`ConfigValue`] tree.
pub trait DocumentParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<ConfigValue>;
}

/// YAML parser.
///
/// Merge keys (`<<: *anchor`) are resolved, tags are dropped and scalar
/// mapping keys (numbers, booleans) are stringified.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl DocumentParser for YamlParser {
    fn parse(&self, bytes: &[u8]) -> Result<ConfigValue> {
        let mut value: Value =
            serde_yaml::from_slice(bytes).map_err(|e| CoreError::SerializationFailure {
                reason: format!("invalid YAML: {e}"),
            })?;

        value.apply_merge().map_err(|e| CoreError::SerializationFailure {
            reason: format!("invalid YAML merge key: {e}"),
        })?;

        convert(value)
    }
}

fn convert(value: Value) -> Result<ConfigValue> {
    Ok(match value {
        Value::Null => ConfigValue::Null,
        Value::Bool(b) => ConfigValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => ConfigValue::Integer(i),
            None => ConfigValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => ConfigValue::String(s),
        Value::Sequence(items) => {
            ConfigValue::List(items.into_iter().map(convert).collect::<Result<Vec<_>>>()?)
        }
        Value::Mapping(mapping) => {
            let mut document = Document::new();
            for (key, value) in mapping {
                document.insert(convert_key(key)?, convert(value)?);
            }
            ConfigValue::Document(document)
        }
        Value::Tagged(tagged) => convert(tagged.value)?,
    })
}

fn convert_key(key: Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Tagged(tagged) => convert_key(tagged.value),
        other => Err(CoreError::SerializationFailure {
            reason: format!("unsupported mapping key: {other:?}"),
        }),
    }
}
