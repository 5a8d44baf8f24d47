//! Entity envelope decoding

use super::case::decamelize_object;
use super::types::{DecodeContext, RecordDecoder, SUCCESS};
use crate::error::{Error, Result};
use crate::streams::{StreamDefinition, Targeting};
use crate::template::{render, TemplateContext};
use crate::types::JsonObject;
use serde_json::{Map, Value};
use tracing::error;

/// Decodes `{array_key: [{sub_request_status, record_key: {...}}]}` pages
///
/// Targeting reference records get their dimension stamped in, and child
/// records carry the `<relation>_id` of the parent they were fetched for.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityDecoder;

impl EntityDecoder {
    pub fn new() -> Self {
        Self
    }

    fn record_key(stream: &StreamDefinition) -> Result<String> {
        match stream.targeting {
            Some(targeting) => render(
                stream.record_key,
                &TemplateContext::new().with("targeting_type", targeting.kind),
            ),
            None => Ok(stream.record_key.to_string()),
        }
    }
}

impl RecordDecoder for EntityDecoder {
    fn decode(&self, page: &Value, ctx: &DecodeContext<'_>) -> Result<Vec<JsonObject>> {
        let stream = ctx.stream;
        let record_key = Self::record_key(stream)?;
        let wrappers = page
            .get(stream.array_key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut records = Vec::with_capacity(wrappers.len());
        for wrapper in wrappers {
            let status = wrapper.get("sub_request_status").and_then(Value::as_str);
            if status != Some(SUCCESS) {
                error!(stream = stream.name, payload = %wrapper, "sub_request_status is not SUCCESS");
                return Err(Error::SubRequestFailed {
                    stream: stream.name.to_string(),
                    payload: wrapper.clone(),
                });
            }

            let mut record = match wrapper.get(&record_key) {
                Some(Value::Object(map)) => map.clone(),
                None | Some(Value::Null) => Map::new(),
                Some(other) => {
                    return Err(Error::decode(format!(
                        "stream {}: '{record_key}' is not an object: {other}",
                        stream.name
                    )))
                }
            };

            if let Some(targeting) = stream.targeting {
                stamp_targeting(&mut record, targeting, ctx.country_code);
            }
            if let (Some(relation), Some(parent_id)) = (stream.parent, ctx.parent_id) {
                record.insert(relation.id_field(), Value::String(parent_id.to_string()));
            }

            let record = decamelize_object(record);
            check_key_fields(stream, &record)?;
            records.push(record);
        }

        Ok(records)
    }
}

fn stamp_targeting(record: &mut JsonObject, targeting: Targeting, country_code: Option<&str>) {
    record.insert("targeting_group".into(), Value::from(targeting.group));
    record.insert("targeting_type".into(), Value::from(targeting.kind));
    if let Some(code) = country_code {
        record.insert("country_code".into(), Value::from(code));
    }

    if targeting.group == "geo" {
        let nested = record.get(targeting.kind);
        let id = nested.and_then(|n| n.get("id")).cloned().unwrap_or(Value::Null);
        let name = nested
            .and_then(|n| n.get("name"))
            .cloned()
            .unwrap_or(Value::Null);
        record.insert("id".into(), id);
        record.insert("name".into(), name);
    }

    if targeting.kind == "postal_code" {
        let code = record.remove("postalCode").unwrap_or(Value::Null);
        record.insert("id".into(), code.clone());
        record.insert("name".into(), code);
    }
}

/// Every key field must hold a non-empty value
fn check_key_fields(stream: &StreamDefinition, record: &JsonObject) -> Result<()> {
    for field in stream.key_fields {
        let present = match record.get(*field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
            Some(_) => true,
        };
        if !present {
            error!(stream = stream.name, field, "Missing key field");
            return Err(Error::MissingKeyField {
                stream: stream.name.to_string(),
                field: (*field).to_string(),
                record: Value::Object(record.clone()),
            });
        }
    }
    Ok(())
}
