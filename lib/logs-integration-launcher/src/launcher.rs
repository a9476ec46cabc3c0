//! The single-threaded cooperative event loop multiplexing registrations,
//! logs, and shutdown.
//!
//! A plain loop, owned by a struct, taking its shutdown receiver as a
//! parameter rather than owning its construction. Multiplexing three input
//! channels uses `crossbeam_channel::Select`, this codebase's tool of choice
//! for exactly this shape outside of an async runtime. `Launcher::run` takes
//! its channels as explicit arguments so the surrounding process keeps
//! ownership of wiring producers to the loop.

use std::path::Path;
use std::thread::{self, JoinHandle};

use chrono::Utc;
use crossbeam_channel::{Receiver, Select};

use crate::codec::id_to_filename;
use crate::config::LauncherSettings;
use crate::eviction::evict_until_within_budget;
use crate::internal_events::LauncherInternalEvents;
use crate::pipeline::{IntegrationConfig, PipelineProvider, SourcePublisher};
use crate::registry::FileRegistry;
use crate::scanner::scan_initial_files;
use crate::writer::{append_line, create_or_open, WriteOutcome};

/// A new integration registration: `(id, config)` from the integrations
/// component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub id: String,
    pub config: IntegrationConfig,
}

/// One log line emitted by an integration producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub id: String,
    pub line: String,
}

/// Owns the registry, the publisher's idempotency set, and drives the
/// launcher loop. Not `Clone`: per the single-writer discipline, there is
/// exactly one of these per `run_path`.
pub struct Launcher<E: LauncherInternalEvents, P: PipelineProvider> {
    settings: LauncherSettings,
    registry: FileRegistry,
    publisher: SourcePublisher,
    events: E,
    pipeline: P,
}

impl<E: LauncherInternalEvents, P: PipelineProvider> Launcher<E, P> {
    pub fn new(settings: LauncherSettings, pipeline: P, events: E) -> Self {
        Self {
            settings,
            registry: FileRegistry::new(),
            publisher: SourcePublisher::new(),
            events,
            pipeline,
        }
    }

    pub fn run_path(&self) -> &Path {
        &self.settings.run_path
    }

    /// Exposed for tests that want to inspect registry state without going
    /// through the channels.
    pub fn registry(&self) -> &FileRegistry {
        &self.registry
    }

    /// Spawn the loop on a dedicated OS thread, returning a handle the
    /// caller can join after sending on `shutdown`.
    pub fn spawn(
        self,
        registrations: Receiver<Registration>,
        logs: Receiver<LogLine>,
        shutdown: Receiver<()>,
    ) -> JoinHandle<Self>
    where
        E: 'static,
        P: 'static,
    {
        thread::spawn(move || self.run(registrations, logs, shutdown))
    }

    /// Run the loop in the calling thread until `shutdown` fires. Scans
    /// `run_path` for pre-existing files before reading any channel.
    pub fn run(
        mut self,
        registrations: Receiver<Registration>,
        logs: Receiver<LogLine>,
        shutdown: Receiver<()>,
    ) -> Self {
        scan_initial_files(
            &self.settings.run_path,
            &mut self.registry,
            self.settings.combined_usage_max,
            &self.events,
        );

        loop {
            let mut select = Select::new();
            let registrations_idx = select.recv(&registrations);
            let logs_idx = select.recv(&logs);
            let shutdown_idx = select.recv(&shutdown);

            let oper = select.select();
            match oper.index() {
                i if i == shutdown_idx => {
                    let _ = oper.recv(&shutdown);
                    return self;
                }
                i if i == registrations_idx => match oper.recv(&registrations) {
                    Ok(registration) => self.handle_registration(registration),
                    Err(_) => continue,
                },
                i if i == logs_idx => match oper.recv(&logs) {
                    Ok(log_line) => self.handle_log(log_line),
                    Err(_) => continue,
                },
                _ => unreachable!("Select only registered three operations"),
            }
        }
    }

    fn handle_registration(&mut self, registration: Registration) {
        self.publisher.handle_registration(
            &registration.id,
            &registration.config,
            &self.settings.run_path,
            &mut self.registry,
            &self.pipeline,
            &self.events,
        );
    }

    /// Creates a record on demand: producers may race their first log ahead
    /// of registration, so a missing record is not an error, just a first
    /// sighting.
    fn handle_log(&mut self, log_line: LogLine) {
        let LogLine { id, line } = log_line;

        if self.registry.lookup(&id).is_none() {
            let filename = id_to_filename(&id);
            let path = self.settings.run_path.join(&filename);
            match create_or_open(&path) {
                Ok(()) => {
                    self.events.emit_file_created(&id, &path);
                    self.registry.insert(id.clone(), filename, 0, Utc::now());
                }
                Err(error) => {
                    self.events.emit_file_not_writable(&id, &path, &error);
                    return;
                }
            }
        }

        let Some(record) = self.registry.lookup(&id) else {
            return;
        };
        let filename = record.filename.clone();
        let current_size = record.size;
        let path = self.settings.run_path.join(&filename);

        match append_line(
            &self.events,
            &id,
            &path,
            current_size,
            self.settings.file_size_max,
            &line,
        ) {
            Ok(WriteOutcome::Written { new_size }) => {
                self.registry.update_size(&id, new_size);
                evict_until_within_budget(
                    &mut self.registry,
                    &self.settings.run_path,
                    self.settings.combined_usage_max,
                    &self.events,
                );
            }
            Ok(WriteOutcome::NotWritable) => {}
            Err(error) => {
                tracing::error!(
                    message = "Unclassified error writing integration log, dropping this line.",
                    id = %id,
                    path = %path.display(),
                    %error,
                );
            }
        }
    }
}
