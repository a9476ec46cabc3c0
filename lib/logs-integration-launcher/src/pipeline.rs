//! Downstream pipeline contract and the Source Publisher.
//!
//! The downstream tailing pipeline is an external collaborator: this crate
//! only needs to know the shape of what it publishes and that publication is
//! idempotent per integration. [`PipelineProvider`] narrows that down to one
//! trait method, the same reason `vector_core::source::Source` is consumed
//! as a trait object elsewhere in this codebase rather than a concrete type
//! call sites match on — the launcher loop should depend on an interface,
//! not a specific downstream implementation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codec::id_to_filename;
use crate::internal_events::LauncherInternalEvents;
use crate::registry::FileRegistry;
use crate::writer::create_or_open;

/// One entry of an integration's config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationConfigEntry {
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// An ordered sequence of config entries, as supplied by the producer on
/// registration.
pub type IntegrationConfig = Vec<IntegrationConfigEntry>;

/// Parse an integration's `LogsConfig` as the integrations component
/// delivers it: a JSON array of entries.
pub fn parse_integration_config(raw: &str) -> Result<IntegrationConfig, serde_json::Error> {
    serde_json::from_str(raw)
}

/// A log source published downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSource {
    /// Always `"file"` for sources this crate publishes.
    pub source_type: &'static str,
    pub path: PathBuf,
    pub source: Option<String>,
    pub service: Option<String>,
    pub tags: Vec<String>,
    /// `integration:<id>`, tagging the source with its originating
    /// integration ID.
    pub origin: String,
}

/// The downstream tailing pipeline, as consumed by this crate. Publication
/// must be safe to call from the launcher loop's single thread and must
/// never block it.
pub trait PipelineProvider: Send + 'static {
    fn publish(&self, source: LogSource);
}

/// A [`PipelineProvider`] backed by a bounded `crossbeam_channel`, matching
/// this codebase's general preference for that crate when multiplexing or
/// handing work to a channel outside of the async runtime. `publish` never
/// blocks: a full channel simply drops the source, matching the non-blocking
/// contract the loop must uphold toward downstream.
#[derive(Debug, Clone)]
pub struct ChannelPipelineProvider {
    sender: crossbeam_channel::Sender<LogSource>,
}

impl ChannelPipelineProvider {
    pub fn new(sender: crossbeam_channel::Sender<LogSource>) -> Self {
        Self { sender }
    }
}

impl PipelineProvider for ChannelPipelineProvider {
    fn publish(&self, source: LogSource) {
        let _ = self.sender.try_send(source);
    }
}

/// Translates integration registrations into downstream file sources,
/// publishing each integration ID exactly once.
#[derive(Debug, Default)]
pub struct SourcePublisher {
    published: HashSet<String>,
}

impl SourcePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle one `(id, config)` registration.
    ///
    /// Drops the event at debug level if `config` has no `type == "integration"`
    /// entry. Otherwise ensures the file exists on disk (creating a
    /// zero-sized record if this is the first time this ID is seen), and
    /// publishes the source downstream unless it was already published for
    /// this ID — a re-registration only refreshes the record's
    /// `modified_at`.
    pub fn handle_registration<E: LauncherInternalEvents, P: PipelineProvider>(
        &mut self,
        id: &str,
        config: &IntegrationConfig,
        run_path: &Path,
        registry: &mut FileRegistry,
        pipeline: &P,
        events: &E,
    ) {
        let Some(entry) = config.iter().find(|entry| entry.entry_type == "integration") else {
            events.emit_registration_dropped_no_integration_entry(id);
            return;
        };

        let filename = id_to_filename(id);
        let path = run_path.join(&filename);

        if registry.lookup(id).is_some() {
            registry.touch(id);
        } else {
            match create_or_open(&path) {
                Ok(()) => {
                    events.emit_file_created(id, &path);
                    registry.insert(id, filename.clone(), 0, chrono::Utc::now());
                }
                Err(error) => {
                    events.emit_file_not_writable(id, &path, &error);
                }
            }
        }

        if self.published.insert(id.to_string()) {
            let source = LogSource {
                source_type: "file",
                path: path.clone(),
                source: entry.source.clone(),
                service: entry.service.clone(),
                tags: entry.tags.clone(),
                origin: format!("integration:{id}"),
            };
            pipeline.publish(source);
            events.emit_source_published(id, &path);
        }
    }
}
