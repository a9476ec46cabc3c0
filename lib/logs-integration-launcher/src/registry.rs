//! In-memory mapping from integration ID to on-disk file state.
//!
//! The registry exclusively owns [`FileRecord`]s; the disk writer and
//! eviction engine mutate them only through the operations below. It is
//! deliberately *not* internally synchronised — per the single-writer
//! discipline, only the launcher loop ever touches it, so there is no lock to
//! take and no ordering to get wrong between an `update_size` and the
//! eviction pass that follows it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Registry entry tracking a single managed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub filename: String,
    pub size: u64,
    pub modified_at: DateTime<Utc>,
}

/// In-memory `integration-id -> FileRecord` map plus the cached sum of sizes.
#[derive(Debug, Default)]
pub struct FileRegistry {
    records: HashMap<String, FileRecord>,
    combined_usage_size: u64,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, id: &str) -> Option<&FileRecord> {
        self.records.get(id)
    }

    /// Total bytes across every tracked file. Kept in lock-step with the
    /// records map by every mutating operation below.
    pub fn combined_usage_size(&self) -> u64 {
        self.combined_usage_size
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert a brand-new record. Panics in debug builds if `id` is already
    /// present; the launcher loop is expected to `lookup` first.
    pub fn insert(&mut self, id: impl Into<String>, filename: impl Into<String>, size: u64, modified_at: DateTime<Utc>) {
        let id = id.into();
        debug_assert!(
            !self.records.contains_key(&id),
            "insert called for an id that already has a record"
        );
        self.combined_usage_size += size;
        self.records.insert(
            id,
            FileRecord {
                filename: filename.into(),
                size,
                modified_at,
            },
        );
    }

    /// Update a record's size, adjusting the combined usage counter by the
    /// delta and bumping `modified_at` to now.
    pub fn update_size(&mut self, id: &str, new_size: u64) {
        if let Some(record) = self.records.get_mut(id) {
            if new_size >= record.size {
                self.combined_usage_size += new_size - record.size;
            } else {
                self.combined_usage_size -= record.size - new_size;
            }
            record.size = new_size;
            record.modified_at = Utc::now();
        }
    }

    /// Touch a record's `modified_at` without changing its size, used when a
    /// re-registration should count as recent activity for LRU purposes.
    pub fn touch(&mut self, id: &str) {
        if let Some(record) = self.records.get_mut(id) {
            record.modified_at = Utc::now();
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<FileRecord> {
        let record = self.records.remove(id)?;
        self.combined_usage_size -= record.size;
        Some(record)
    }

    /// The record with the minimum `modified_at`, ties broken by lexicographic
    /// filename order.
    pub fn least_recently_modified(&self) -> Option<(&str, &FileRecord)> {
        self.records
            .iter()
            .map(|(id, record)| (id.as_str(), record))
            .min_by(|(_, a), (_, b)| {
                a.modified_at
                    .cmp(&b.modified_at)
                    .then_with(|| a.filename.cmp(&b.filename))
            })
    }

    /// An immutable view used by tests.
    pub fn snapshot(&self) -> HashMap<String, FileRecord> {
        self.records.clone()
    }
}
