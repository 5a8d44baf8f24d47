//! Catalog discovery from the stream registry

use super::types::{Catalog, CatalogEntry, Inclusion, Metadata, MetadataEntry};
use crate::schema::stream_schema;
use crate::streams::{Registry, StreamDefinition};

/// Build the catalog of every registered stream, nothing selected
pub fn discover(registry: &Registry) -> Catalog {
    Catalog {
        streams: registry.iter().map(|(_, s)| catalog_entry(s)).collect(),
    }
}

fn catalog_entry(stream: &StreamDefinition) -> CatalogEntry {
    let schema = stream_schema(stream);
    let key_properties: Vec<String> = stream.key_fields.iter().map(ToString::to_string).collect();
    let replication_keys: Vec<String> = stream
        .replication_field
        .iter()
        .map(ToString::to_string)
        .collect();

    let mut metadata = vec![MetadataEntry::table(Metadata {
        inclusion: Some(Inclusion::Available),
        table_key_properties: Some(key_properties.clone()),
        forced_replication_method: Some(stream.replication_method),
        valid_replication_keys: (!replication_keys.is_empty()).then(|| replication_keys.clone()),
        ..Metadata::default()
    })];

    for field in schema.properties.keys() {
        let automatic = key_properties.contains(field) || replication_keys.contains(field);
        metadata.push(MetadataEntry::field(
            field,
            Metadata {
                inclusion: Some(if automatic {
                    Inclusion::Automatic
                } else {
                    Inclusion::Available
                }),
                ..Metadata::default()
            },
        ));
    }

    CatalogEntry {
        tap_stream_id: stream.name.to_string(),
        stream: stream.name.to_string(),
        key_properties,
        schema,
        metadata,
    }
}
