//! Singer catalog document types

use crate::error::{Error, Result, ResultExt};
use crate::schema::JsonSchema;
use crate::types::ReplicationMethod;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;

/// Whether a field can be left out of a sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Inclusion {
    Available,
    Automatic,
    Unsupported,
}

/// Metadata attached to the table (empty breadcrumb) or one field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inclusion: Option<Inclusion>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_key_properties: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub forced_replication_method: Option<ReplicationMethod>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_replication_keys: Option<Vec<String>>,

    /// Keys written by other tools, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One `metadata` list item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub breadcrumb: Vec<String>,
    pub metadata: Metadata,
}

impl MetadataEntry {
    /// Table-level entry
    pub fn table(metadata: Metadata) -> Self {
        Self {
            breadcrumb: Vec::new(),
            metadata,
        }
    }

    /// Entry for a top-level property
    pub fn field(name: &str, metadata: Metadata) -> Self {
        Self {
            breadcrumb: vec!["properties".to_string(), name.to_string()],
            metadata,
        }
    }

    /// Property name for a top-level field breadcrumb
    pub fn field_name(&self) -> Option<&str> {
        match self.breadcrumb.as_slice() {
            [properties, name] if properties == "properties" => Some(name),
            _ => None,
        }
    }
}

/// One stream of a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub tap_stream_id: String,
    pub stream: String,
    #[serde(default)]
    pub key_properties: Vec<String>,
    pub schema: JsonSchema,
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

impl CatalogEntry {
    /// Table-level metadata, if present
    pub fn table_metadata(&self) -> Option<&Metadata> {
        self.metadata
            .iter()
            .find(|entry| entry.breadcrumb.is_empty())
            .map(|entry| &entry.metadata)
    }

    /// Whether the stream is selected for sync
    pub fn is_selected(&self) -> bool {
        self.table_metadata()
            .and_then(|m| m.selected)
            .unwrap_or(false)
    }

    /// Set table-level selection, adding the table entry if missing
    pub fn set_selected(&mut self, selected: bool) {
        match self.metadata.iter_mut().find(|e| e.breadcrumb.is_empty()) {
            Some(entry) => entry.metadata.selected = Some(selected),
            None => self.metadata.insert(
                0,
                MetadataEntry::table(Metadata {
                    selected: Some(selected),
                    ..Metadata::default()
                }),
            ),
        }
    }

    /// Fields explicitly deselected; automatic fields are never dropped
    pub fn deselected_fields(&self) -> BTreeSet<String> {
        self.metadata
            .iter()
            .filter(|entry| {
                entry.metadata.selected == Some(false)
                    && entry.metadata.inclusion != Some(Inclusion::Automatic)
            })
            .filter_map(|entry| entry.field_name().map(ToString::to_string))
            .collect()
    }
}

/// A Singer catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Load a catalog file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        Self::from_json_str(&contents)
    }

    /// Parse a catalog document
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("Invalid catalog: {e}")))
    }

    /// Entry for a stream
    pub fn get(&self, stream: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|e| e.tap_stream_id == stream)
    }

    /// Names of the selected streams, in catalog order
    pub fn selected_streams(&self) -> Vec<&str> {
        self.streams
            .iter()
            .filter(|e| e.is_selected())
            .map(|e| e.tap_stream_id.as_str())
            .collect()
    }

    /// Select exactly the named streams
    pub fn select_only(&mut self, names: &[String]) -> Result<()> {
        for name in names {
            if self.get(name).is_none() {
                return Err(Error::StreamNotFound {
                    stream: name.clone(),
                });
            }
        }
        for entry in &mut self.streams {
            let selected = names.contains(&entry.tap_stream_id);
            entry.set_selected(selected);
        }
        Ok(())
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
