//! Append-only line writer with per-file truncation.
//!
//! Free functions that open, touch, and classify errors on one file at a
//! time, rather than a struct holding an open handle across calls — the
//! launcher loop reopens the file on every line.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use snafu::Snafu;

use crate::internal_events::LauncherInternalEvents;

/// Errors the writer cannot classify as `not-writable`/`transient` and that
/// must propagate to the launcher loop.
#[derive(Debug, Snafu)]
pub enum WriterError {
    #[snafu(display("failed to truncate {path:?}: {source}"))]
    Truncate { path: std::path::PathBuf, source: io::Error },

    #[snafu(display("failed to write to {path:?}: {source}"))]
    Write { path: std::path::PathBuf, source: io::Error },
}

/// Outcome of a successful call to [`append_line`]. `NotWritable` is not an
/// error: the line was dropped, but the loop should continue as normal and
/// leave the in-memory size untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The line was appended (after truncation, if that happened first).
    /// `new_size` is the file's total size after the write.
    Written { new_size: u64 },
    /// The filesystem rejected the write as read-only/permission-denied, or
    /// a transient error persisted through one retry.
    NotWritable,
}

fn is_not_writable(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem
    )
}

fn is_transient(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::Interrupted
}

/// Append `line` plus a trailing newline to the file at `path`, truncating it
/// first if the write would cross `file_size_max`.
///
/// `current_size` is the registry's last-known size for this file; the
/// writer trusts it rather than re-`stat`ing, since the registry is the
/// single source of truth while the launcher loop owns it.
pub fn append_line<E: LauncherInternalEvents>(
    events: &E,
    id: &str,
    path: &Path,
    current_size: u64,
    file_size_max: u64,
    line: &str,
) -> Result<WriteOutcome, WriterError> {
    let line_len = line.len() as u64 + 1; // +1 for the newline
    let mut size = current_size;

    if size + line_len > file_size_max {
        match truncate(path) {
            Ok(()) => {
                events.emit_file_rotated(id, path, size);
                size = 0;
            }
            Err(error) if is_not_writable(&error) => {
                events.emit_file_not_writable(id, path, &error);
                return Ok(WriteOutcome::NotWritable);
            }
            Err(source) => return Err(WriterError::Truncate { path: path.to_path_buf(), source }),
        }
    }

    match write_once(path, line) {
        Ok(()) => Ok(WriteOutcome::Written { new_size: size + line_len }),
        Err(error) if is_transient(&error) => match write_once(path, line) {
            Ok(()) => Ok(WriteOutcome::Written { new_size: size + line_len }),
            Err(error) => {
                events.emit_file_not_writable(id, path, &error);
                Ok(WriteOutcome::NotWritable)
            }
        },
        Err(error) if is_not_writable(&error) => {
            events.emit_file_not_writable(id, path, &error);
            Ok(WriteOutcome::NotWritable)
        }
        Err(source) => Err(WriterError::Write { path: path.to_path_buf(), source }),
    }
}

fn truncate(path: &Path) -> io::Result<()> {
    OpenOptions::new().write(true).open(path)?.set_len(0)
}

fn write_once(path: &Path, line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().append(true).create(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")
}

/// Create an empty file at `path` with mode `0640`, or open it if it already
/// exists. Used both by the launcher's on-demand file creation and the
/// Source Publisher's "ensure the file exists" step.
pub fn create_or_open(path: &Path) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(false);
    #[cfg(unix)]
    options.mode(0o640);
    options.open(path)?;
    Ok(())
}
