//! camelCase to snake_case key conversion

use serde_json::{Map, Value};
use std::sync::LazyLock;

use regex::Regex;

static LOWER_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex"));

static ACRONYM_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("valid regex"));

/// Snake-case a single key
///
/// All-uppercase and purely numeric keys are left untouched.
pub fn decamelize_key(key: &str) -> String {
    let has_lower = key.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = key.chars().any(|c| c.is_ascii_uppercase());
    if !has_upper || !has_lower {
        return key.to_string();
    }

    let split = ACRONYM_WORD.replace_all(key, "${1}_${2}");
    let split = LOWER_UPPER.replace_all(&split, "${1}_${2}");
    split.to_lowercase()
}

/// Snake-case every object key, recursing through nested objects and arrays
pub fn decamelize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(decamelize_object(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(decamelize).collect()),
        other => other,
    }
}

pub fn decamelize_object(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| (decamelize_key(&key), decamelize(value)))
        .collect()
}
