//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs in the
//! Singer layout: `{"bookmarks": {stream: {key: timestamp}}, "currently_syncing": ...}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bookmarks of one stream, keyed by [`bookmark_key`]
pub type StreamBookmarks = BTreeMap<String, String>;

/// Complete state for the tap
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, StreamBookmarks>,

    /// Root stream being synced when the last run stopped
    #[serde(default)]
    pub currently_syncing: Option<String>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a bookmark value
    pub fn get_bookmark(&self, stream: &str, key: &str) -> Option<&str> {
        self.bookmarks.get(stream)?.get(key).map(String::as_str)
    }

    /// Set a bookmark value, creating the stream entry if needed
    pub fn set_bookmark(&mut self, stream: &str, key: String, value: String) {
        self.bookmarks
            .entry(stream.to_string())
            .or_default()
            .insert(key, value);
    }
}

/// Key of a bookmark inside its stream entry
///
/// Parent-less streams use the replication field itself; child streams get
/// one entry per parent, e.g. `updated_at(parent_ad_account_id:abc)`.
pub fn bookmark_key(replication_field: &str, parent: Option<(&str, &str)>) -> String {
    match parent {
        Some((relation, parent_id)) if !parent_id.is_empty() => {
            format!("{replication_field}(parent_{relation}_id:{parent_id})")
        }
        _ => replication_field.to_string(),
    }
}
