// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the gateway storage layout.

use std::path::{Path, PathBuf};

/// Default base directory for all persistent gateway data.
pub const DATA_ROOT: &str = "/data";

/// Storage path utilities for the gateway filesystem layout.
///
/// ```text
/// /data/
///   players/{player_operator_id}.json   # balance per external player id
///   settlements/{session_id}/{game_id}.json  # idempotency records
///   logs/{log_id}.json                  # append-only data logs
///   games/{gid}.json                    # games list entries
/// ```
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all gateway data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Player Paths ==========

    /// Directory containing all player records.
    pub fn players_dir(&self) -> PathBuf {
        self.root.join("players")
    }

    /// Path to a specific player file.
    pub fn player(&self, player_operator_id: &str) -> PathBuf {
        self.players_dir().join(format!("{player_operator_id}.json"))
    }

    // ========== Settlement Paths ==========

    /// Directory containing all settlement idempotency records.
    pub fn settlements_dir(&self) -> PathBuf {
        self.root.join("settlements")
    }

    /// Path to the settlement record for a `(session_id, game_id)` pair.
    ///
    /// Each session gets its own directory. A flat `{a}_{b}.json` scheme
    /// would let two distinct pairs share a file when an id contains the
    /// delimiter; nesting keeps every pair's path unique.
    pub fn settlement(&self, session_id: &str, game_id: &str) -> PathBuf {
        self.settlements_dir()
            .join(session_id)
            .join(format!("{game_id}.json"))
    }

    // ========== Data Log Paths ==========

    /// Directory containing append-only data logs.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Path to a specific log entry file.
    pub fn log(&self, log_id: &str) -> PathBuf {
        self.logs_dir().join(format!("{log_id}.json"))
    }

    // ========== Games List Paths ==========

    /// Directory containing games list entries.
    pub fn games_dir(&self) -> PathBuf {
        self.root.join("games")
    }

    /// Path to a specific game file.
    pub fn game(&self, gid: &str) -> PathBuf {
        self.games_dir().join(format!("{gid}.json"))
    }
}
