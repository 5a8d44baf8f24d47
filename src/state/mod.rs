//! State management module
//!
//! Handles bookmark tracking, checkpointing, and resumability.
//! State is persisted between sync runs to enable incremental syncs.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Singer bookmarks plus the `currently_syncing` marker
//! - `StateManager` - File-based state persistence, saved after every mutation
//! - `bookmark_key` - Per-parent bookmark keys for child streams

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{bookmark_key, State, StreamBookmarks};
