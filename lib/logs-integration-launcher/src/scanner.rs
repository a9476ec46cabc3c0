//! Reconstructs the registry from `run_path` on launcher startup.
//!
//! Walks the directory, `stat`s each entry, and repopulates in-memory state
//! before the loop starts reading channels. Runs
//! [`evict_until_within_budget`] once afterward so a directory that already
//! exceeds the combined usage cap is brought back under it before the first
//! event is processed.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::codec::filename_to_id;
use crate::eviction::evict_until_within_budget;
use crate::internal_events::LauncherInternalEvents;
use crate::registry::FileRegistry;

const SUFFIX: &str = ".log";

/// Populate `registry` from whatever `.log` files already exist under
/// `run_path`, then evict until the combined usage cap is respected.
///
/// If `run_path` cannot be read (missing, permission denied), logs and
/// returns with an empty registry rather than failing launcher startup.
pub fn scan_initial_files<E: LauncherInternalEvents>(
    run_path: &Path,
    registry: &mut FileRegistry,
    combined_usage_max: u64,
    events: &E,
) {
    let entries = match fs::read_dir(run_path) {
        Ok(entries) => entries,
        Err(error) => {
            events.emit_scan_directory_failed(run_path, &error);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            continue;
        }

        let Some(filename) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !filename.ends_with(SUFFIX) {
            continue;
        }

        let Ok(metadata) = entry.metadata() else {
            continue;
        };

        let id = filename_to_id(filename);
        let size = metadata.len();
        let modified_at = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        registry.insert(id, filename, size, modified_at);
    }

    evict_until_within_budget(registry, run_path, combined_usage_max, events);
}
