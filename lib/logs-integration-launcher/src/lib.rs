//! Fan-in launcher that persists integration log lines to disk and publishes
//! file sources downstream.
//!
//! Receives log lines emitted by in-process "integration" producers,
//! persists them to per-integration files under a configured `run_path`
//! behind a bounded on-disk cache, reconstructs that cache from disk on
//! startup, and publishes a `file`-typed log source for each newly observed
//! integration into a downstream tailing pipeline exactly once. [`Launcher`]
//! drives all of it from a single cooperative event loop.

pub mod codec;
pub mod config;
pub mod eviction;
pub mod internal_events;
pub mod launcher;
pub mod pipeline;
pub mod registry;
pub mod scanner;
pub mod writer;

pub use codec::{filename_to_id, id_to_filename};
pub use config::{ConfigError, LauncherConfig, LauncherSettings};
pub use internal_events::{DefaultLauncherInternalEvents, LauncherInternalEvents};
pub use launcher::{Launcher, LogLine, Registration};
pub use pipeline::{
    parse_integration_config, ChannelPipelineProvider, IntegrationConfig, IntegrationConfigEntry,
    LogSource, PipelineProvider, SourcePublisher,
};
pub use registry::{FileRecord, FileRegistry};
