//! Internal events the launcher emits while it runs.
//!
//! Every notable thing that happens while persisting and evicting integration
//! log files has a corresponding method on [`LauncherInternalEvents`], mirroring
//! `file-source`'s `FileSourceInternalEvents` trait. Keeping one method per
//! event (instead of scattering `tracing` calls through `launcher.rs`,
//! `writer.rs`, and `eviction.rs`) lets tests substitute a recording
//! implementation and assert on exactly which events fired.

use std::io;
use std::path::Path;

/// Every internal event the launcher can emit has a corresponding method in
/// this trait, which should emit the event.
pub trait LauncherInternalEvents: Send + Sync + Clone + 'static {
    fn emit_file_created(&self, id: &str, path: &Path);

    fn emit_file_rotated(&self, id: &str, path: &Path, previous_size: u64);

    fn emit_file_not_writable(&self, id: &str, path: &Path, error: &io::Error);

    fn emit_file_evicted(&self, id: &str, path: &Path);

    fn emit_eviction_delete_error(&self, id: &str, path: &Path, error: &io::Error);

    fn emit_single_file_exceeds_budget(&self, id: &str, size: u64, combined_usage_max: u64);

    fn emit_scan_directory_failed(&self, run_path: &Path, error: &io::Error);

    fn emit_registration_dropped_no_integration_entry(&self, id: &str);

    fn emit_source_published(&self, id: &str, path: &Path);
}

/// The default, `tracing`-backed implementation used outside of tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLauncherInternalEvents;

impl LauncherInternalEvents for DefaultLauncherInternalEvents {
    fn emit_file_created(&self, id: &str, path: &Path) {
        tracing::info!(message = "Created integration log file.", id, path = %path.display());
    }

    fn emit_file_rotated(&self, id: &str, path: &Path, previous_size: u64) {
        tracing::info!(
            message = "Integration log file exceeded its per-file cap and was truncated.",
            id,
            path = %path.display(),
            previous_size,
        );
    }

    fn emit_file_not_writable(&self, id: &str, path: &Path, error: &io::Error) {
        tracing::warn!(
            message = "Integration log file is not writable, dropping the log line.",
            id,
            path = %path.display(),
            %error,
        );
    }

    fn emit_file_evicted(&self, id: &str, path: &Path) {
        tracing::info!(
            message = "Evicted least-recently-modified integration log file to respect the combined usage cap.",
            id,
            path = %path.display(),
        );
    }

    fn emit_eviction_delete_error(&self, id: &str, path: &Path, error: &io::Error) {
        tracing::error!(
            message = "Failed to delete integration log file during eviction, aborting this eviction pass.",
            id,
            path = %path.display(),
            %error,
        );
    }

    fn emit_single_file_exceeds_budget(&self, id: &str, size: u64, combined_usage_max: u64) {
        tracing::warn!(
            message = "A single integration log file exceeds the combined usage cap on its own; retaining it rather than deleting the only evidence of the producer.",
            id,
            size,
            combined_usage_max,
        );
    }

    fn emit_scan_directory_failed(&self, run_path: &Path, error: &io::Error) {
        tracing::error!(
            message = "Failed to scan run_path for existing integration log files, starting with an empty registry.",
            run_path = %run_path.display(),
            %error,
        );
    }

    fn emit_registration_dropped_no_integration_entry(&self, id: &str) {
        tracing::debug!(
            message = "Dropping integration registration with no `integration` typed entry.",
            id,
        );
    }

    fn emit_source_published(&self, id: &str, path: &Path) {
        tracing::info!(message = "Published file log source for integration.", id, path = %path.display());
    }
}
