//! Execution engine module
//!
//! Depth-first sync of the stream tree.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - walks the registry from each root, invoking every stream
//!   in scope once per parent record
//! - `SyncSettings` - config-derived inputs of a run
//! - `SyncStats` - per-stream record counts and page totals
//!
//! A stream is in scope when it is selected or has a selected descendant.
//! Streams that are only in scope are fetched to discover parent ids, but
//! emit nothing and write no bookmarks.

mod types;

pub use types::{SyncSettings, SyncStats};

use crate::catalog::Catalog;
use crate::decode::{decoder_for, DecodeContext};
use crate::error::{Error, Result};
use crate::http::{build_request_url, ApiClient};
use crate::output::{Message, MessageWriter};
use crate::pagination::Pager;
use crate::schema::{JsonSchema, SchemaTransformer};
use crate::state::StateManager;
use crate::streams::{Registry, StreamDefinition, StreamId};
use crate::template::{render, TemplateContext};
use crate::types::JsonObject;
use crate::window::{
    compute_windows, format_timestamp, parse_timestamp, query_bounds, DateWindow, WindowRequest,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

const SUCCESS: &str = "SUCCESS";

/// Catalog view of a selected stream
#[derive(Debug)]
struct SelectedStream {
    schema: JsonSchema,
    deselected: BTreeSet<String>,
    key_properties: Vec<String>,
}

/// One invocation of a stream with what its parent passed down
#[derive(Debug, Clone)]
struct NodeContext {
    stream: StreamId,
    parent_id: Option<String>,
    timezone: Tz,
}

impl NodeContext {
    fn root(stream: StreamId) -> Self {
        Self {
            stream,
            parent_id: None,
            timezone: Tz::UTC,
        }
    }
}

/// Sync engine for orchestrating data extraction
pub struct SyncEngine<'a> {
    /// Transport
    client: Arc<dyn ApiClient>,
    /// Stream tree
    registry: &'a Registry,
    /// Bookmarks and resume marker
    state: StateManager,
    /// Message sink
    writer: Arc<dyn MessageWriter>,
    settings: SyncSettings,
    /// Streams that emit records
    selected: BTreeMap<StreamId, Arc<SelectedStream>>,
    /// Selected streams plus their ancestors
    sync_streams: BTreeSet<StreamId>,
    schemas_written: BTreeSet<StreamId>,
    /// Fixed once per run
    now: DateTime<Utc>,
    stats: SyncStats,
}

impl<'a> SyncEngine<'a> {
    /// Create a new sync engine
    ///
    /// Fails when the catalog selects a stream the registry does not know.
    pub fn new(
        client: Arc<dyn ApiClient>,
        registry: &'a Registry,
        catalog: &Catalog,
        state: StateManager,
        writer: Arc<dyn MessageWriter>,
        settings: SyncSettings,
    ) -> Result<Self> {
        let mut selected = BTreeMap::new();
        for name in catalog.selected_streams() {
            let id = registry.require(name)?;
            let Some(entry) = catalog.get(name) else {
                continue;
            };
            selected.insert(
                id,
                Arc::new(SelectedStream {
                    schema: entry.schema.clone(),
                    deselected: entry.deselected_fields(),
                    key_properties: entry.key_properties.clone(),
                }),
            );
        }

        let ids: BTreeSet<StreamId> = selected.keys().copied().collect();
        let sync_streams = registry.sync_closure(&ids);

        Ok(Self {
            client,
            registry,
            state,
            writer,
            settings,
            selected,
            sync_streams,
            schemas_written: BTreeSet::new(),
            now: Utc::now(),
            stats: SyncStats::default(),
        })
    }

    /// Pin the run's notion of "now"
    #[must_use]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Sync every root stream in scope, in registry order
    ///
    /// Any error aborts the run; the state written so far is the resume point.
    pub async fn run(&mut self) -> Result<SyncStats> {
        let started = Instant::now();

        if self.selected.is_empty() {
            warn!("No streams selected");
        } else {
            let names: Vec<&str> = self
                .selected
                .keys()
                .map(|id| self.registry.get(*id).name)
                .collect();
            info!(streams = ?names, "Selected streams");
        }

        let mut roots_synced = 0;
        for root in self.resume_roots().await {
            if !self.sync_streams.contains(&root) {
                continue;
            }
            let name = self.registry.get(root).name;
            self.state.set_currently_syncing(Some(name)).await?;
            self.emit_state().await?;

            info!(stream = name, "START Syncing");
            let count = self.sync_node(NodeContext::root(root)).await?;
            info!(stream = name, records = count, "FINISHED Syncing");

            self.state.set_currently_syncing(None).await?;
            self.emit_state().await?;
            roots_synced += 1;
        }

        // A stale resume marker is still cleared when nothing ran
        if roots_synced == 0 {
            self.state.set_currently_syncing(None).await?;
            self.emit_state().await?;
        }

        self.stats.set_duration(started.elapsed().as_millis() as u64);
        for (stream, count) in &self.stats.records {
            info!(stream = %stream, records = count, "Stream summary");
        }
        info!(
            records = self.stats.total_records(),
            pages = self.stats.pages_fetched,
            duration_ms = self.stats.duration_ms,
            "Sync completed"
        );

        Ok(self.stats.clone())
    }

    /// Roots to sync, skipping those finished before an interrupted run
    async fn resume_roots(&self) -> Vec<StreamId> {
        let roots = self.registry.roots();
        let Some(current) = self.state.currently_syncing().await else {
            return roots.to_vec();
        };

        match self.registry.find(&current) {
            Some(id) => {
                let root = self.registry.root_of(id);
                let position = roots.iter().position(|r| *r == root).unwrap_or(0);
                info!(
                    currently_syncing = %current,
                    resume_from = self.registry.get(root).name,
                    "Resuming interrupted sync"
                );
                roots[position..].to_vec()
            }
            None => {
                warn!(
                    currently_syncing = %current,
                    "Unknown stream in state, starting from the first stream"
                );
                roots.to_vec()
            }
        }
    }

    /// Sync one stream invocation and, per fetched page, its children
    ///
    /// Returns the number of records emitted by this invocation.
    fn sync_node(&mut self, node: NodeContext) -> BoxFuture<'_, Result<u64>> {
        Box::pin(async move {
            let registry = self.registry;
            let def = registry.get(node.stream);
            let selected = self.selected.get(&node.stream).cloned();
            self.stats.add_stream();

            if let Some(out) = &selected {
                self.write_schema(node.stream, def, out)?;
            }

            let parent = def
                .parent
                .zip(node.parent_id.as_deref())
                .map(|(relation, id)| (relation.name, id));

            let last_bookmark = match def.replication_field {
                Some(field) => match self.state.get_bookmark(def.name, field, parent).await {
                    Some(value) => parse_timestamp(&value)?,
                    None => self.settings.start_date,
                },
                None => self.settings.start_date,
            };

            let plan = compute_windows(&WindowRequest {
                last_bookmark,
                now: self.now,
                attribution_days: self.settings.attribution_days,
                date_windowed: def.is_stats(),
                window_size_days: def.window_size_days,
                granularity: def.granularity(),
                timezone: node.timezone,
            });

            let countries: Vec<Option<String>> = if def.country_partitioned {
                self.settings
                    .country_codes
                    .iter()
                    .cloned()
                    .map(Some)
                    .collect()
            } else {
                vec![None]
            };

            let children: Vec<StreamId> = registry
                .children(node.stream)
                .iter()
                .copied()
                .filter(|child| self.sync_streams.contains(child))
                .collect();

            let mut max_bookmark = last_bookmark;
            let mut emitted = 0;

            for window in &plan.windows {
                if def.is_stats() {
                    info!(
                        stream = def.name,
                        parent_id = ?node.parent_id,
                        start = %window.start,
                        end = %window.end,
                        timezone = %node.timezone,
                        "Date window"
                    );
                }

                for country in &countries {
                    let url = self.request_url(def, &node, window, country.as_deref())?;
                    let mut pager =
                        Pager::new(Arc::clone(&self.client), url.clone(), def.name, def.array_key);
                    let mut lookup = self.uses_profile_lookup(def);

                    loop {
                        let page = if std::mem::take(&mut lookup) {
                            let body = self
                                .lookup_profiles(def, node.parent_id.as_deref())
                                .await?;
                            pager.accept(body)?
                        } else {
                            pager.next_page().await.inspect_err(|e| {
                                error!(stream = def.name, url = %url, error = %e, "Request failed");
                            })?
                        };
                        let Some(page) = page else {
                            break;
                        };
                        self.stats.add_page();
                        let time_extracted = Utc::now();

                        let ctx = DecodeContext::new(def)
                            .with_parent(node.parent_id.as_deref())
                            .with_country(country.as_deref());
                        let records = decoder_for(def).decode(&page, &ctx)?;
                        if records.is_empty() {
                            debug!(stream = def.name, "No records in page");
                            break;
                        }

                        if let Some(out) = &selected {
                            emitted += self.emit_records(
                                def,
                                out,
                                &records,
                                last_bookmark,
                                &mut max_bookmark,
                                time_extracted,
                            )?;
                        }

                        if children.is_empty() {
                            continue;
                        }
                        let Some(id_field) = def.parent_id_field() else {
                            continue;
                        };
                        for child in &children {
                            let child_name = registry.get(*child).name;
                            for record in &records {
                                let parent_id = parent_id_value(def, record, id_field)?;
                                let timezone = if def.sets_timezone {
                                    record_timezone(record)?.unwrap_or(node.timezone)
                                } else {
                                    node.timezone
                                };

                                info!(
                                    stream = child_name,
                                    parent_stream = def.name,
                                    parent_id = %parent_id,
                                    "START Sync"
                                );
                                let count = self
                                    .sync_node(NodeContext {
                                        stream: *child,
                                        parent_id: Some(parent_id),
                                        timezone,
                                    })
                                    .await?;
                                debug!(stream = child_name, records = count, "FINISHED Sync");
                            }
                        }
                    }
                }
            }

            if let (Some(field), Some(_)) = (def.replication_field, &selected) {
                if !plan.windows.is_empty() {
                    self.state
                        .write_bookmark(def.name, field, parent, format_timestamp(max_bookmark))
                        .await?;
                    self.emit_state().await?;
                }
            }

            Ok(emitted)
        })
    }

    /// Type, filter and emit one page of a selected stream
    ///
    /// Records older than the starting bookmark still raise the running max.
    fn emit_records(
        &mut self,
        def: &StreamDefinition,
        out: &SelectedStream,
        records: &[JsonObject],
        last_bookmark: DateTime<Utc>,
        max_bookmark: &mut DateTime<Utc>,
        time_extracted: DateTime<Utc>,
    ) -> Result<u64> {
        let transformer = SchemaTransformer::new(&out.schema, &out.deselected);
        let mut count = 0;

        for record in records {
            let typed = transformer.transform(record.clone())?;
            if let Some(field) = def.replication_field {
                if let Some(value) = replication_value(&typed, field)? {
                    if value > *max_bookmark {
                        *max_bookmark = value;
                    }
                    if value < last_bookmark {
                        continue;
                    }
                }
            }
            self.writer.write(&Message::record(def.name, typed, time_extracted))?;
            count += 1;
        }

        self.stats.add_records(def.name, count);
        debug!(stream = def.name, records = count, "Processed page");
        Ok(count)
    }

    fn write_schema(
        &mut self,
        id: StreamId,
        def: &StreamDefinition,
        out: &SelectedStream,
    ) -> Result<()> {
        if !self.schemas_written.insert(id) {
            return Ok(());
        }
        let bookmark_properties = def
            .replication_field
            .map(|field| vec![field.to_string()])
            .unwrap_or_default();
        self.writer.write(&Message::schema(
            def.name,
            out.schema.to_json(),
            out.key_properties.clone(),
            bookmark_properties,
        ))
    }

    async fn emit_state(&self) -> Result<()> {
        let value = self.state.to_value().await?;
        self.writer.write(&Message::state(value))
    }

    /// Resolve the request URL of one window and country
    fn request_url(
        &self,
        def: &StreamDefinition,
        node: &NodeContext,
        window: &DateWindow,
        country: Option<&str>,
    ) -> Result<String> {
        let mut ctx = TemplateContext::new()
            .with(
                "swipe_up_attribution_window",
                self.settings.swipe_up_attribution_window.as_str(),
            )
            .with(
                "view_attribution_window",
                self.settings.view_attribution_window.as_str(),
            )
            .with("omit_empty", self.settings.omit_empty.as_str())
            .with("country_code", country.unwrap_or("none"));
        if let Some(parent_id) = &node.parent_id {
            ctx.set("parent_id", parent_id.as_str());
        }
        if let Some(targeting) = def.targeting {
            ctx.set("targeting_group", targeting.group);
            ctx.set("targeting_type", targeting.kind);
        }

        let path = render(def.path, &ctx)?;
        let mut query = def
            .params
            .iter()
            .map(|(name, value)| Ok(((*name).to_string(), render(value, &ctx)?)))
            .collect::<Result<Vec<_>>>()?;

        if let Some(fields) = def.date_window {
            let (start, end) = query_bounds(window, def.granularity(), node.timezone);
            query.push((fields.start_param.to_string(), start));
            query.push((fields.end_param.to_string(), end));
        }
        if def.paged {
            query.push(("limit".to_string(), self.settings.page_size.to_string()));
        }

        build_request_url(self.client.base_url(), &path, &query)
    }

    fn uses_profile_lookup(&self, def: &StreamDefinition) -> bool {
        def.profile_lookup && self.settings.profile_selection.is_some()
    }

    /// Fetch the configured organizations or ad accounts one by one
    ///
    /// The responses are assembled into a single page shaped like the list
    /// endpoint's.
    async fn lookup_profiles(
        &self,
        def: &StreamDefinition,
        parent_id: Option<&str>,
    ) -> Result<Value> {
        let selection = self.settings.profile_selection.as_deref().unwrap_or_default();

        let ids: Vec<&str> = if def.parent.is_none() {
            selection
                .iter()
                .map(|profile| profile.organisation_id.as_str())
                .collect()
        } else {
            selection
                .iter()
                .find(|profile| Some(profile.organisation_id.as_str()) == parent_id)
                .map(|profile| profile.ad_accounts.iter().map(String::as_str).collect())
                .unwrap_or_default()
        };

        if ids.is_empty() && def.parent.is_some() {
            warn!(
                stream = def.name,
                organization_id = ?parent_id,
                "No ad accounts selected or present for organization"
            );
        }

        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            let url = build_request_url(
                self.client.base_url(),
                &format!("{}/{id}", def.array_key),
                &[],
            )?;
            let body = self.client.get(&url, def.name).await.inspect_err(|e| {
                error!(stream = def.name, url = %url, error = %e, "Request failed");
            })?;
            let item = body
                .get(def.array_key)
                .and_then(Value::as_array)
                .and_then(|items| items.first())
                .cloned()
                .ok_or_else(|| {
                    Error::decode(format!(
                        "stream {}: no '{}' entry in response for id {id}",
                        def.name, def.array_key
                    ))
                })?;
            items.push(item);
        }

        let mut page = Map::new();
        page.insert("request_status".to_string(), Value::String(SUCCESS.to_string()));
        page.insert(def.array_key.to_string(), Value::Array(items));
        Ok(Value::Object(page))
    }
}

/// Replication timestamp of a typed record, `None` when absent
fn replication_value(record: &JsonObject, field: &str) -> Result<Option<DateTime<Utc>>> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => parse_timestamp(s).map(Some),
        Some(other) => Err(Error::decode(format!(
            "replication field '{field}' is not a date-time: {other}"
        ))),
    }
}

fn parent_id_value(def: &StreamDefinition, record: &JsonObject, field: &str) -> Result<String> {
    match record.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(Error::MissingKeyField {
            stream: def.name.to_string(),
            field: field.to_string(),
            record: Value::Object(record.clone()),
        }),
    }
}

/// IANA zone named by a record's `timezone`
fn record_timezone(record: &JsonObject) -> Result<Option<Tz>> {
    match record.get("timezone").and_then(Value::as_str) {
        None | Some("") => Ok(None),
        Some(name) => name
            .parse::<Tz>()
            .map(Some)
            .map_err(|_| Error::InvalidTimezone {
                value: name.to_string(),
            }),
    }
}
