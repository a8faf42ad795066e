// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Settlement idempotency records.
//!
//! One record per `(session_id, game_id)` pair, written before the player
//! balance update it describes. A replayed game callback finds the record
//! and returns the recorded post-settlement balance instead of applying
//! the bet/win delta a second time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::super::{validate_id, Storage, StorageResult};

/// A recorded wager settlement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettlementRecord {
    /// Session the wager belongs to.
    pub session_id: String,
    /// Game the wager belongs to.
    pub game_id: String,
    /// Player whose balance was settled.
    pub player_operator_id: String,
    /// Bet amount, as settled.
    pub bet: Decimal,
    /// Win amount, as settled.
    pub win: Decimal,
    /// Request currency (pass-through, not validated).
    pub currency: String,
    /// Balance after applying `-bet +win`, rounded to 2 places.
    pub balance_after: Decimal,
    /// When the settlement was recorded.
    pub created_at: DateTime<Utc>,
}

/// Repository for settlement idempotency records.
pub struct SettlementRepository<'a> {
    storage: &'a Storage,
}

impl<'a> SettlementRepository<'a> {
    /// Create a new SettlementRepository.
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Look up the settlement for a `(session_id, game_id)` pair.
    ///
    /// Returns `Ok(None)` when the pair has not been settled yet.
    pub fn find(&self, session_id: &str, game_id: &str) -> StorageResult<Option<SettlementRecord>> {
        validate_id(session_id)?;
        validate_id(game_id)?;
        let path = self.storage.paths().settlement(session_id, game_id);
        if !self.storage.exists(&path) {
            return Ok(None);
        }
        Ok(Some(self.storage.read_json(path)?))
    }

    /// Record a settlement. Overwrites any prior record for the pair;
    /// callers check `find` first, so an overwrite only happens on a
    /// replay that is converging to the same result.
    pub fn record(&self, settlement: &SettlementRecord) -> StorageResult<()> {
        validate_id(&settlement.session_id)?;
        validate_id(&settlement.game_id)?;
        self.storage.write_json(
            self.storage
                .paths()
                .settlement(&settlement.session_id, &settlement.game_id),
            settlement,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn test_storage() -> (Storage, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut storage = Storage::new(StoragePaths::new(dir.path()));
        storage.initialize().unwrap();
        (storage, dir)
    }

    fn sample() -> SettlementRecord {
        SettlementRecord {
            session_id: "session789".to_string(),
            game_id: "game123".to_string(),
            player_operator_id: "100".to_string(),
            bet: Decimal::new(1000, 2),
            win: Decimal::new(500, 2),
            currency: "USD".to_string(),
            balance_after: Decimal::new(9500, 2),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn unrecorded_pair_is_none() {
        let (storage, _dir) = test_storage();
        let repo = SettlementRepository::new(&storage);
        assert!(repo.find("session789", "game123").unwrap().is_none());
    }

    #[test]
    fn record_then_find_round_trips() {
        let (storage, _dir) = test_storage();
        let repo = SettlementRepository::new(&storage);
        let settlement = sample();

        repo.record(&settlement).unwrap();
        let found = repo.find("session789", "game123").unwrap().unwrap();
        assert_eq!(found.balance_after, settlement.balance_after);
        assert_eq!(found.player_operator_id, "100");
    }

    #[test]
    fn pairs_are_independent() {
        let (storage, _dir) = test_storage();
        let repo = SettlementRepository::new(&storage);
        repo.record(&sample()).unwrap();

        assert!(repo.find("session789", "other_game").unwrap().is_none());
        assert!(repo.find("other_session", "game123").unwrap().is_none());
    }

    #[test]
    fn delimiter_in_ids_does_not_collide() {
        let (storage, _dir) = test_storage();
        let repo = SettlementRepository::new(&storage);

        let mut settlement = sample();
        settlement.session_id = "s1__g".to_string();
        settlement.game_id = "x".to_string();
        repo.record(&settlement).unwrap();

        // A different pair whose concatenation reads the same must miss.
        assert!(repo.find("s1", "g__x").unwrap().is_none());
        assert!(repo.find("s1__g", "x").unwrap().is_some());
    }
}
