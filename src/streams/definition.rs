//! Stream definition records

use crate::types::{Granularity, ReplicationMethod};

/// Index of a stream inside its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId(pub(crate) usize);

impl StreamId {
    /// Position in registry declaration order
    pub fn index(self) -> usize {
        self.0
    }
}

/// Link from a child stream to its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentRelation {
    pub stream: StreamId,
    /// Singular parent name, e.g. `ad_account`
    pub name: &'static str,
}

impl ParentRelation {
    /// Field stamped on child records, e.g. `ad_account_id`
    pub fn id_field(&self) -> String {
        format!("{}_id", self.name)
    }
}

/// Query parameter names carrying the window bounds of a stats stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindowFields {
    pub start_param: &'static str,
    pub end_param: &'static str,
}

/// Targeting dimension a reference stream lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Targeting {
    /// e.g. `demographics`, `geo`
    pub group: &'static str,
    /// e.g. `age_group`, `postal_code`
    pub kind: &'static str,
}

/// Static description of one stream
#[derive(Debug, Clone)]
pub struct StreamDefinition {
    pub name: &'static str,
    /// Relative path, may contain `{parent_id}`, `{targeting_group}`,
    /// `{targeting_type}` and `{country_code}`
    pub path: &'static str,
    pub key_fields: &'static [&'static str],
    pub replication_method: ReplicationMethod,
    pub replication_field: Option<&'static str>,
    /// Top-level array holding the wrappers
    pub array_key: &'static str,
    /// Key inside each wrapper holding the record, may contain `{targeting_type}`
    pub record_key: &'static str,
    pub paged: bool,
    /// Ordered request parameter templates
    pub params: &'static [(&'static str, &'static str)],
    pub date_window: Option<DateWindowFields>,
    pub window_size_days: i64,
    pub country_partitioned: bool,
    pub targeting: Option<Targeting>,
    /// Fetch by configured id instead of listing when `org_account_ids` is set
    pub profile_lookup: bool,
    /// Read the timezone for descendants from each record's `timezone`
    pub sets_timezone: bool,
    pub parent: Option<ParentRelation>,
    pub children: Vec<StreamId>,
}

impl StreamDefinition {
    /// Start a FULL_TABLE, unpaged stream keyed by `id`
    pub fn new(
        name: &'static str,
        path: &'static str,
        array_key: &'static str,
        record_key: &'static str,
    ) -> Self {
        Self {
            name,
            path,
            key_fields: &["id"],
            replication_method: ReplicationMethod::FullTable,
            replication_field: None,
            array_key,
            record_key,
            paged: false,
            params: &[],
            date_window: None,
            window_size_days: 1,
            country_partitioned: false,
            targeting: None,
            profile_lookup: false,
            sets_timezone: false,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Replicate incrementally on `field`
    #[must_use]
    pub fn incremental(mut self, field: &'static str) -> Self {
        self.replication_method = ReplicationMethod::Incremental;
        self.replication_field = Some(field);
        self
    }

    #[must_use]
    pub fn paged(mut self) -> Self {
        self.paged = true;
        self
    }

    #[must_use]
    pub fn key_fields(mut self, fields: &'static [&'static str]) -> Self {
        self.key_fields = fields;
        self
    }

    #[must_use]
    pub fn params(mut self, params: &'static [(&'static str, &'static str)]) -> Self {
        self.params = params;
        self
    }

    /// Query in `[start_param, end_param)` windows of `size_days`
    #[must_use]
    pub fn date_window(
        mut self,
        start_param: &'static str,
        end_param: &'static str,
        size_days: i64,
    ) -> Self {
        self.date_window = Some(DateWindowFields {
            start_param,
            end_param,
        });
        self.window_size_days = size_days;
        self
    }

    #[must_use]
    pub fn targeting(mut self, group: &'static str, kind: &'static str) -> Self {
        self.targeting = Some(Targeting { group, kind });
        self
    }

    #[must_use]
    pub fn country_partitioned(mut self) -> Self {
        self.country_partitioned = true;
        self
    }

    #[must_use]
    pub fn profile_lookup(mut self) -> Self {
        self.profile_lookup = true;
        self
    }

    #[must_use]
    pub fn sets_timezone(mut self) -> Self {
        self.sets_timezone = true;
        self
    }

    /// Stats streams explode a time series instead of unwrapping entities
    pub fn is_stats(&self) -> bool {
        self.date_window.is_some()
    }

    /// Value of a static request parameter
    pub fn param(&self, name: &str) -> Option<&'static str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    /// Report granularity from the `granularity` parameter
    pub fn granularity(&self) -> Granularity {
        Granularity::from_param(self.param("granularity"))
    }

    /// Key field whose value identifies a record to its children
    pub fn parent_id_field(&self) -> Option<&'static str> {
        if self.key_fields.contains(&"id") {
            Some("id")
        } else {
            self.key_fields.first().copied()
        }
    }
}
