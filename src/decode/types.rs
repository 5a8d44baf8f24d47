//! Decoder types and traits

use crate::error::Result;
use crate::streams::StreamDefinition;
use crate::types::JsonObject;
use serde_json::Value;

pub(crate) const SUCCESS: &str = "SUCCESS";

/// Where a page came from
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    pub stream: &'a StreamDefinition,
    /// Id of the parent record the page was requested for
    pub parent_id: Option<&'a str>,
    /// Country the page was requested for, on country-partitioned streams
    pub country_code: Option<&'a str>,
}

impl<'a> DecodeContext<'a> {
    pub fn new(stream: &'a StreamDefinition) -> Self {
        Self {
            stream,
            parent_id: None,
            country_code: None,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent_id: Option<&'a str>) -> Self {
        self.parent_id = parent_id;
        self
    }

    #[must_use]
    pub fn with_country(mut self, country_code: Option<&'a str>) -> Self {
        self.country_code = country_code;
        self
    }
}

/// Turns one API page into flat, snake-cased records
pub trait RecordDecoder: Send + Sync {
    /// Decode every wrapper in the page's record array
    fn decode(&self, page: &Value, ctx: &DecodeContext<'_>) -> Result<Vec<JsonObject>>;
}
