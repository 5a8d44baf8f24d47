//! Stream schemas
//!
//! # Features
//!
//! - **Schema Types**: serde model of the JSON Schema subset Singer uses
//! - **Stream Schemas**: documented fields of every Snapchat stream
//! - **Record Typing**: coercion of decoded records to their schema

mod snapchat;
mod transform;
mod types;

pub use snapchat::stream_schema;
pub use transform::SchemaTransformer;
pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};
