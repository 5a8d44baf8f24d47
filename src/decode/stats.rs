//! Stats time-series decoding

use super::case::decamelize_object;
use super::types::{DecodeContext, RecordDecoder};
use crate::error::{Error, Result};
use crate::types::JsonObject;
use serde_json::Value;
use tracing::error;

const REQUIRED_KEYS: [&str; 2] = ["id", "start_time"];

/// Explodes `{array_key: [{record_key: {..., timeseries: [...]}}]}` pages
///
/// Each timeseries entry becomes one record carrying the base record's
/// identifying fields, with its nested `stats` object lifted to the top.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsDecoder;

impl StatsDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl RecordDecoder for StatsDecoder {
    fn decode(&self, page: &Value, ctx: &DecodeContext<'_>) -> Result<Vec<JsonObject>> {
        let stream = ctx.stream;
        let wrappers = page
            .get(stream.array_key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut records = Vec::new();
        for wrapper in wrappers {
            let Some(base) = wrapper.get(stream.record_key).and_then(Value::as_object) else {
                error!(
                    stream = stream.name,
                    field = stream.record_key,
                    "Stats wrapper missing record"
                );
                return Err(Error::MissingStatsKey {
                    stream: stream.name.to_string(),
                    field: stream.record_key.to_string(),
                    record: wrapper.clone(),
                });
            };
            let series = base
                .get("timeseries")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();

            for entry in series {
                let mut record = match entry {
                    Value::Object(map) => map.clone(),
                    other => {
                        return Err(Error::decode(format!(
                            "stream {}: timeseries entry is not an object: {other}",
                            stream.name
                        )))
                    }
                };

                for (key, value) in base {
                    if !matches!(key.as_str(), "start_time" | "end_time" | "timeseries") {
                        record.insert(key.clone(), value.clone());
                    }
                }

                if let Some(Value::Object(stats)) = record.remove("stats") {
                    record.extend(stats);
                }

                let record = decamelize_object(record);
                for key in REQUIRED_KEYS {
                    if !record.contains_key(key) {
                        error!(stream = stream.name, field = key, "Stats record missing key");
                        return Err(Error::MissingStatsKey {
                            stream: stream.name.to_string(),
                            field: key.to_string(),
                            record: Value::Object(record),
                        });
                    }
                }
                records.push(record);
            }
        }

        Ok(records)
    }
}
