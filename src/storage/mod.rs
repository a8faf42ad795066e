// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Gateway Storage Module
//!
//! Persistent storage for the callback gateway: player balances,
//! settlement idempotency records, append-only data logs, and the games
//! list. Every entity is a JSON file under the data directory; writes are
//! atomic (temp file + rename).
//!
//! ## Storage Layout
//!
//! ```text
//! /data/
//!   players/{player_operator_id}.json
//!   settlements/{session_id}/{game_id}.json
//!   logs/{log_id}.json
//!   games/{gid}.json
//! ```

pub mod engine;
pub mod paths;
pub mod repository;

pub use engine::{validate_id, Storage, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use repository::{
    GameProvider, GameRepository, LogRepository, PlayerRepository, SettlementRecord,
    SettlementRepository, StoredGame, StoredLog, StoredPlayer,
};
