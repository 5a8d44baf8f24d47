//! Response denormalization
//!
//! # Overview
//!
//! API pages wrap every record in an envelope. The decoders here unwrap
//! them into flat, snake-cased records ready for schema typing:
//!
//! - [`EntityDecoder`]: per-record `sub_request_status` wrappers, with
//!   targeting and parent linkage fields stamped in
//! - [`StatsDecoder`]: one record per time-series bucket of a stats report

mod case;
mod entity;
mod stats;
mod types;

pub use case::{decamelize, decamelize_key};
pub use entity::EntityDecoder;
pub use stats::StatsDecoder;
pub use types::{DecodeContext, RecordDecoder};

use crate::streams::StreamDefinition;

/// Decoder matching a stream's envelope shape
pub fn decoder_for(stream: &StreamDefinition) -> &'static dyn RecordDecoder {
    if stream.is_stats() {
        &StatsDecoder
    } else {
        &EntityDecoder
    }
}

#[cfg(test)]
mod tests;
