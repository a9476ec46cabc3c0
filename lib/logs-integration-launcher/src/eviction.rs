//! Selects and deletes least-recently-modified files to respect the global
//! size cap.
//!
//! Repeatedly asks the registry for its [`FileRegistry::least_recently_modified`]
//! record and removes its file from disk. A missing file (`ENOENT`) is treated
//! as an already-completed eviction rather than an error.

use std::fs;
use std::io;
use std::path::Path;

use crate::internal_events::LauncherInternalEvents;
use crate::registry::FileRegistry;

/// Evict least-recently-modified files until `combined_usage_size` is at or
/// under `combined_usage_max`.
///
/// Stops early, retaining the last remaining record even over budget, rather
/// than deleting the only evidence of a producer that wrote a single
/// oversized file. A non-`ENOENT` removal failure aborts the whole pass; the
/// next write will retry.
pub fn evict_until_within_budget<E: LauncherInternalEvents>(
    registry: &mut FileRegistry,
    run_path: &Path,
    combined_usage_max: u64,
    events: &E,
) {
    loop {
        if registry.combined_usage_size() <= combined_usage_max {
            return;
        }

        let Some((id, record)) = registry.least_recently_modified() else {
            return;
        };

        if registry.len() == 1 {
            events.emit_single_file_exceeds_budget(id, record.size, combined_usage_max);
            return;
        }

        let id = id.to_string();
        let path = run_path.join(&record.filename);

        match fs::remove_file(&path) {
            Ok(()) => {
                registry.remove(&id);
                events.emit_file_evicted(&id, &path);
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                registry.remove(&id);
                events.emit_file_evicted(&id, &path);
            }
            Err(error) => {
                events.emit_eviction_delete_error(&id, &path, &error);
                return;
            }
        }
    }
}
