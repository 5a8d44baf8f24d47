//! Stream registry
//!
//! # Overview
//!
//! Every stream the tap can replicate is described by a [`StreamDefinition`]:
//! its path template, envelope keys, paging flag, replication settings and
//! request parameters. Definitions are arranged in a [`Registry`], an
//! immutable tree whose parent and child links are indices, so the engine can
//! walk from a parent record to the streams that hang below it.
//!
//! - Roots: `organizations` plus the `targeting_*` reference streams
//! - Interior nodes: `ad_accounts`, `campaigns`, `ad_squads`, `ads`, ...
//! - Stats leaves: `*_stats_daily` / `*_stats_hourly`

mod definition;
mod registry;
mod snapchat;

pub use definition::{DateWindowFields, ParentRelation, StreamDefinition, StreamId, Targeting};
pub use registry::{Registry, RegistryBuilder};
pub use snapchat::{build_registry, snapchat_registry, ALL_STATS_FIELDS, HOURLY_STATS_FIELDS};
