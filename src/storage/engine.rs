// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Filesystem storage engine for gateway data.
//!
//! Every entity is a JSON file under the data directory. Writes go through
//! a temp-file-then-rename step so a crash mid-write never leaves a
//! half-written record behind.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::{de::DeserializeOwned, Serialize};

use super::StoragePaths;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Entity already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Storage not initialized
    #[error("Storage not initialized")]
    NotInitialized,

    /// Identifier unsafe to use as a file name
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound(e.to_string())
        } else {
            StorageError::Io(e)
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Reject identifiers that could escape the storage directory.
///
/// External identifiers (player operator ids, session ids, gids) become
/// file names, so path separators and parent references are refused.
pub fn validate_id(id: &str) -> StorageResult<()> {
    if id.is_empty()
        || id.contains('/')
        || id.contains('\\')
        || id.contains('\0')
        || id == "."
        || id == ".."
    {
        return Err(StorageError::InvalidIdentifier(id.to_string()));
    }
    Ok(())
}

/// Filesystem storage manager for the gateway.
#[derive(Debug, Clone)]
pub struct Storage {
    paths: StoragePaths,
    initialized: bool,
    player_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl Storage {
    /// Create a new Storage instance.
    ///
    /// Does NOT create the directory structure. Call `initialize()` first.
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths,
            initialized: false,
            player_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get the storage paths.
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Mutex serializing read-modify-write cycles on one player's record.
    ///
    /// All clones of this Storage share the same lock map, so concurrent
    /// handlers contend on the same mutex for a given player while
    /// different players stay independent.
    pub fn player_lock(&self, player_operator_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.player_locks.lock().expect("lock map poisoned");
        locks
            .entry(player_operator_id.to_string())
            .or_default()
            .clone()
    }

    /// Initialize the storage directory structure.
    ///
    /// Creates all required directories. Safe to call multiple times.
    pub fn initialize(&mut self) -> StorageResult<()> {
        let dirs = [
            self.paths.players_dir(),
            self.paths.settlements_dir(),
            self.paths.logs_dir(),
            self.paths.games_dir(),
        ];

        for dir in dirs {
            fs::create_dir_all(&dir)?;
        }

        self.initialized = true;
        Ok(())
    }

    /// Check that the data directory is writable.
    ///
    /// Performs a write-read-delete round trip, used by the readiness probe.
    pub fn health_check(&self) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let test_file = self.paths.root().join(".health_check");
        let test_data = b"health_check_data";

        fs::write(&test_file, test_data)?;
        let read_data = fs::read(&test_file)?;
        fs::remove_file(&test_file)?;

        if read_data != test_data {
            return Err(StorageError::Io(io::Error::other(
                "health check data mismatch",
            )));
        }

        Ok(())
    }

    // ========== Generic JSON Operations ==========

    /// Read a JSON file and deserialize it.
    pub fn read_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> StorageResult<T> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let value = serde_json::from_reader(reader)?;
        Ok(value)
    }

    /// Write a JSON file (atomic write via rename).
    pub fn write_json<T: Serialize>(&self, path: impl AsRef<Path>, value: &T) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
        }

        fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Check if a file exists.
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().is_file()
    }

    /// Delete a file.
    pub fn delete(&self, path: impl AsRef<Path>) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }
        fs::remove_file(path.as_ref())?;
        Ok(())
    }

    /// List the file stems of all files with the given extension in a directory.
    pub fn list_files(&self, dir: impl AsRef<Path>, extension: &str) -> StorageResult<Vec<String>> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext == extension {
                        if let Some(stem) = path.file_stem() {
                            if let Some(id) = stem.to_str() {
                                ids.push(id.to_string());
                            }
                        }
                    }
                }
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        value: u32,
    }

    fn test_storage() -> (Storage, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut storage = Storage::new(StoragePaths::new(dir.path()));
        storage.initialize().unwrap();
        (storage, dir)
    }

    #[test]
    fn write_then_read_round_trips() {
        let (storage, _dir) = test_storage();
        let path = storage.paths().player("100");
        let sample = Sample {
            name: "demo".to_string(),
            value: 7,
        };

        storage.write_json(&path, &sample).unwrap();
        let read: Sample = storage.read_json(&path).unwrap();
        assert_eq!(read, sample);
    }

    #[test]
    fn read_missing_file_is_not_found() {
        let (storage, _dir) = test_storage();
        let result: StorageResult<Sample> = storage.read_json(storage.paths().player("nope"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn uninitialized_storage_refuses_operations() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(StoragePaths::new(dir.path()));
        let result: StorageResult<Sample> = storage.read_json(storage.paths().player("100"));
        assert!(matches!(result, Err(StorageError::NotInitialized)));
    }

    #[test]
    fn list_files_returns_stems() {
        let (storage, _dir) = test_storage();
        for id in ["a1", "b2", "c3"] {
            storage
                .write_json(storage.paths().log(id), &Sample {
                    name: id.to_string(),
                    value: 0,
                })
                .unwrap();
        }
        let mut ids = storage.list_files(storage.paths().logs_dir(), "json").unwrap();
        ids.sort();
        assert_eq!(ids, vec!["a1", "b2", "c3"]);
    }

    #[test]
    fn identifier_validation_rejects_path_escapes() {
        assert!(validate_id("user@example.com").is_ok());
        assert!(validate_id("100").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("..").is_err());
        assert!(validate_id("a/b").is_err());
        assert!(validate_id("a\\b").is_err());
    }

    #[test]
    fn health_check_round_trips() {
        let (storage, _dir) = test_storage();
        storage.health_check().unwrap();
    }

    #[test]
    fn player_lock_is_shared_across_clones() {
        let (storage, _dir) = test_storage();
        let clone = storage.clone();
        assert!(Arc::ptr_eq(
            &storage.player_lock("100"),
            &clone.player_lock("100")
        ));
        assert!(!Arc::ptr_eq(
            &storage.player_lock("100"),
            &storage.player_lock("200")
        ));
    }
}
