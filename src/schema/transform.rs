//! Record typing against a stream schema

use super::types::{JsonSchema, JsonType, SchemaProperty};
use crate::error::{Error, Result};
use crate::types::JsonObject;
use crate::window::{format_timestamp, parse_timestamp};
use serde_json::{Map, Number, Value};
use std::collections::BTreeSet;

/// Coerces records to their stream schema before emission
///
/// - `date-time` strings are normalised to RFC 3339 UTC
/// - numeric and boolean strings become numbers and booleans
/// - scalars in string properties are stringified
/// - deselected fields are dropped
///
/// Values that cannot be coerced fail the record.
#[derive(Debug, Clone)]
pub struct SchemaTransformer<'a> {
    schema: &'a JsonSchema,
    deselected: &'a BTreeSet<String>,
}

impl<'a> SchemaTransformer<'a> {
    pub fn new(schema: &'a JsonSchema, deselected: &'a BTreeSet<String>) -> Self {
        Self { schema, deselected }
    }

    /// Type one record
    pub fn transform(&self, record: JsonObject) -> Result<JsonObject> {
        let mut out = Map::with_capacity(record.len());
        for (key, value) in record {
            if self.deselected.contains(&key) {
                continue;
            }
            match self.schema.get_property(&key) {
                Some(property) => {
                    let typed = coerce(value, property, &key)?;
                    out.insert(key, typed);
                }
                None if self.schema.additional_properties => {
                    out.insert(key, value);
                }
                None => {}
            }
        }
        Ok(out)
    }

    /// Type a record that may not be an object
    pub fn transform_value(&self, record: Value) -> Result<JsonObject> {
        match record {
            Value::Object(map) => self.transform(map),
            other => Err(Error::decode(format!("record is not an object: {other}"))),
        }
    }
}

fn mismatch(path: &str, expected: JsonType, value: &Value) -> Error {
    Error::decode(format!("field '{path}': expected {expected}, got {value}"))
}

fn coerce(value: Value, property: &SchemaProperty, path: &str) -> Result<Value> {
    if value.is_null() {
        return if property.is_nullable() {
            Ok(Value::Null)
        } else {
            Err(Error::decode(format!("field '{path}' must not be null")))
        };
    }

    let Some(expected) = property.json_type.primary_type() else {
        return Ok(value);
    };

    match expected {
        JsonType::String if property.is_date_time() => match &value {
            Value::String(s) => {
                let parsed = parse_timestamp(s)?;
                Ok(Value::String(format_timestamp(parsed)))
            }
            _ => Err(mismatch(path, expected, &value)),
        },
        JsonType::String => match value {
            Value::String(_) => Ok(value),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(mismatch(path, expected, &other)),
        },
        JsonType::Integer => coerce_integer(value, path),
        JsonType::Number => coerce_number(value, path),
        JsonType::Boolean => match &value {
            Value::Bool(_) => Ok(value),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
            _ => Err(mismatch(path, expected, &value)),
        },
        JsonType::Object => match value {
            Value::Object(map) => coerce_object(map, property, path).map(Value::Object),
            other => Err(mismatch(path, expected, &other)),
        },
        JsonType::Array => match value {
            Value::Array(items) => match &property.items {
                Some(item_schema) => items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| coerce(item, item_schema, &format!("{path}[{i}]")))
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Array),
                None => Ok(Value::Array(items)),
            },
            other => Err(mismatch(path, expected, &other)),
        },
        JsonType::Null => Err(mismatch(path, expected, &value)),
    }
}

fn coerce_object(map: JsonObject, property: &SchemaProperty, path: &str) -> Result<JsonObject> {
    let Some(properties) = &property.properties else {
        return Ok(map);
    };
    let open = property.additional_properties.unwrap_or(true);

    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        match properties.get(&key) {
            Some(nested) => {
                let typed = coerce(value, nested, &format!("{path}.{key}"))?;
                out.insert(key, typed);
            }
            None if open => {
                out.insert(key, value);
            }
            None => {}
        }
    }
    Ok(out)
}

fn coerce_integer(value: Value, path: &str) -> Result<Value> {
    match &value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(Value::from(f as i64)),
            _ => Err(mismatch(path, JsonType::Integer, &value)),
        },
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| mismatch(path, JsonType::Integer, &value)),
        _ => Err(mismatch(path, JsonType::Integer, &value)),
    }
}

fn coerce_number(value: Value, path: &str) -> Result<Value> {
    match &value {
        Value::Number(_) => Ok(value),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Value::from(i));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| mismatch(path, JsonType::Number, &value))
        }
        _ => Err(mismatch(path, JsonType::Number, &value)),
    }
}
