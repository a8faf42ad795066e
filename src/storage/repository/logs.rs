// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Append-only data log repository.
//!
//! Log entries are immutable once written; the gateway appends one per
//! settled wager and the log query endpoint paginates them newest-first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{Storage, StorageResult};

/// An append-only log entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct StoredLog {
    /// Unique log identifier (UUID).
    pub id: String,
    /// Log message.
    pub message: String,
    /// When the entry was appended.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Repository for append-only data logs.
pub struct LogRepository<'a> {
    storage: &'a Storage,
}

impl<'a> LogRepository<'a> {
    /// Create a new LogRepository.
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Append a new log entry.
    pub fn append(&self, message: impl Into<String>) -> StorageResult<StoredLog> {
        let entry = StoredLog {
            id: uuid::Uuid::new_v4().to_string(),
            message: message.into(),
            created_at: Utc::now(),
        };
        self.storage
            .write_json(self.storage.paths().log(&entry.id), &entry)?;
        Ok(entry)
    }

    /// Total number of log entries.
    pub fn count(&self) -> StorageResult<usize> {
        Ok(self
            .storage
            .list_files(self.storage.paths().logs_dir(), "json")?
            .len())
    }

    /// All log entries, newest first.
    ///
    /// Sort is stable with `(created_at desc, id)` as the key so pages do
    /// not shuffle between requests.
    pub fn list_desc(&self) -> StorageResult<Vec<StoredLog>> {
        let ids = self
            .storage
            .list_files(self.storage.paths().logs_dir(), "json")?;

        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            let entry: StoredLog = self.storage.read_json(self.storage.paths().log(&id))?;
            entries.push(entry);
        }

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(entries)
    }
}
