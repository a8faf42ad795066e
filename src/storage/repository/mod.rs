// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to gateway storage.
//!
//! Each repository provides operations for a specific entity type, using
//! the Storage engine for all file operations.

pub mod games;
pub mod logs;
pub mod players;
pub mod settlements;

pub use games::{GameProvider, GameRepository, StoredGame};
pub use logs::{LogRepository, StoredLog};
pub use players::{PlayerRepository, StoredPlayer};
pub use settlements::{SettlementRecord, SettlementRepository};
