//! Arena-backed stream tree

use super::definition::{ParentRelation, StreamDefinition, StreamId};
use crate::error::{Error, Result};
use crate::types::ReplicationMethod;
use std::collections::BTreeSet;

/// Immutable tree of stream definitions
///
/// Definitions live in one vector in declaration order; parent and child
/// links are indices into it.
#[derive(Debug, Clone)]
pub struct Registry {
    streams: Vec<StreamDefinition>,
    roots: Vec<StreamId>,
}

impl Registry {
    /// Start building a registry
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Definition behind an id
    pub fn get(&self, id: StreamId) -> &StreamDefinition {
        &self.streams[id.0]
    }

    /// Look a stream up by name
    pub fn find(&self, name: &str) -> Option<StreamId> {
        self.streams
            .iter()
            .position(|s| s.name == name)
            .map(StreamId)
    }

    /// Look a stream up by name, failing when unknown
    pub fn require(&self, name: &str) -> Result<StreamId> {
        self.find(name).ok_or_else(|| Error::StreamNotFound {
            stream: name.to_string(),
        })
    }

    /// Parent-less streams in sync order
    pub fn roots(&self) -> &[StreamId] {
        &self.roots
    }

    /// Children of a stream in sync order
    pub fn children(&self, id: StreamId) -> &[StreamId] {
        &self.get(id).children
    }

    /// All streams in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (StreamId, &StreamDefinition)> {
        self.streams
            .iter()
            .enumerate()
            .map(|(i, s)| (StreamId(i), s))
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Ancestors from the direct parent up to the root
    pub fn ancestors(&self, id: StreamId) -> Vec<StreamId> {
        let mut chain = Vec::new();
        let mut current = self.get(id).parent;
        while let Some(relation) = current {
            chain.push(relation.stream);
            current = self.get(relation.stream).parent;
        }
        chain
    }

    /// Root stream of the tree containing `id`
    pub fn root_of(&self, id: StreamId) -> StreamId {
        self.ancestors(id).last().copied().unwrap_or(id)
    }

    /// Selected streams plus every ancestor needed to reach them
    pub fn sync_closure(&self, selected: &BTreeSet<StreamId>) -> BTreeSet<StreamId> {
        let mut closure = selected.clone();
        for id in selected {
            closure.extend(self.ancestors(*id));
        }
        closure
    }
}

/// Builder collecting definitions and validating the tree on `build`
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    streams: Vec<StreamDefinition>,
    roots: Vec<StreamId>,
    errors: Vec<String>,
}

impl RegistryBuilder {
    /// Add a parent-less stream
    #[must_use]
    pub fn root(mut self, definition: StreamDefinition) -> Self {
        let id = self.push(definition);
        self.roots.push(id);
        self
    }

    /// Add a child of the already-declared `parent` stream
    ///
    /// `relation` is the singular parent name used for `<relation>_id`
    /// linkage fields and bookmark keys.
    #[must_use]
    pub fn child(
        mut self,
        parent: &str,
        relation: &'static str,
        mut definition: StreamDefinition,
    ) -> Self {
        let Some(parent_index) = self.streams.iter().position(|s| s.name == parent) else {
            self.errors.push(format!(
                "stream '{}' declares unknown parent '{parent}'",
                definition.name
            ));
            return self;
        };

        definition.parent = Some(ParentRelation {
            stream: StreamId(parent_index),
            name: relation,
        });
        let id = self.push(definition);
        self.streams[parent_index].children.push(id);
        self
    }

    fn push(&mut self, definition: StreamDefinition) -> StreamId {
        if self.streams.iter().any(|s| s.name == definition.name) {
            self.errors
                .push(format!("stream '{}' is declared twice", definition.name));
        }
        self.streams.push(definition);
        StreamId(self.streams.len() - 1)
    }

    /// Validate and freeze the tree
    pub fn build(self) -> Result<Registry> {
        let mut errors = self.errors;

        for stream in &self.streams {
            if stream.replication_method == ReplicationMethod::Incremental
                && stream.replication_field.is_none()
            {
                errors.push(format!(
                    "incremental stream '{}' has no replication field",
                    stream.name
                ));
            }
            if stream.is_stats() {
                if stream.replication_method != ReplicationMethod::Incremental {
                    errors.push(format!(
                        "stats stream '{}' must be incremental",
                        stream.name
                    ));
                }
                if stream.key_fields != ["id", "start_time"] {
                    errors.push(format!(
                        "stats stream '{}' must be keyed by (id, start_time)",
                        stream.name
                    ));
                }
            }
            if stream.key_fields.is_empty() {
                errors.push(format!("stream '{}' has no key fields", stream.name));
            }
        }

        if errors.is_empty() {
            Ok(Registry {
                streams: self.streams,
                roots: self.roots,
            })
        } else {
            Err(Error::config(format!(
                "invalid stream registry: {}",
                errors.join("; ")
            )))
        }
    }
}
