//! Singer catalog
//!
//! # Overview
//!
//! `discover` describes every stream with its schema, key properties and
//! replication metadata. A catalog passed back to `sync` carries the user's
//! choices: table-level `selected` picks streams, field-level
//! `selected: false` drops optional fields from emitted records.

mod discover;
mod types;

pub use discover::discover;
pub use types::{Catalog, CatalogEntry, Inclusion, Metadata, MetadataEntry};
