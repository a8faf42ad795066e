// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Player repository.
//!
//! One record per external player identifier. The balance held here is
//! authoritative for the gateway: wager settlement reads and writes it.
//! Players are never created by callback processing, only looked up.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::super::{validate_id, Storage, StorageError, StorageResult};

/// Player stored on the gateway filesystem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredPlayer {
    /// Opaque external identity key supplied by the operator. Despite the
    /// naming used by some operators this is not guaranteed to be an email.
    pub player_operator_id: String,
    /// Current balance. Currency is not persisted per player; it travels
    /// with each request and is passed through unvalidated.
    pub balance: Decimal,
    /// When the player record was created.
    pub created_at: DateTime<Utc>,
    /// When the balance was last updated.
    pub updated_at: DateTime<Utc>,
}

impl StoredPlayer {
    /// Create a new player record with an opening balance.
    pub fn new(player_operator_id: impl Into<String>, balance: Decimal) -> Self {
        let now = Utc::now();
        Self {
            player_operator_id: player_operator_id.into(),
            balance,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Repository for player records.
pub struct PlayerRepository<'a> {
    storage: &'a Storage,
}

impl<'a> PlayerRepository<'a> {
    /// Create a new PlayerRepository.
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Check if a player exists.
    pub fn exists(&self, player_operator_id: &str) -> bool {
        validate_id(player_operator_id).is_ok()
            && self
                .storage
                .exists(self.storage.paths().player(player_operator_id))
    }

    /// Get a player by external id.
    pub fn get(&self, player_operator_id: &str) -> StorageResult<StoredPlayer> {
        validate_id(player_operator_id)?;
        let path = self.storage.paths().player(player_operator_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!(
                "Player {player_operator_id}"
            )));
        }
        self.storage.read_json(path)
    }

    /// Create a new player.
    pub fn create(&self, player: &StoredPlayer) -> StorageResult<()> {
        validate_id(&player.player_operator_id)?;
        if self.exists(&player.player_operator_id) {
            return Err(StorageError::AlreadyExists(format!(
                "Player {}",
                player.player_operator_id
            )));
        }
        self.storage
            .write_json(self.storage.paths().player(&player.player_operator_id), player)
    }

    /// Overwrite a player's balance.
    pub fn update_balance(
        &self,
        player_operator_id: &str,
        balance: Decimal,
    ) -> StorageResult<StoredPlayer> {
        let mut player = self.get(player_operator_id)?;
        player.balance = balance;
        player.updated_at = Utc::now();
        self.storage
            .write_json(self.storage.paths().player(player_operator_id), &player)?;
        Ok(player)
    }

    /// Number of player records.
    pub fn count(&self) -> StorageResult<usize> {
        Ok(self
            .storage
            .list_files(self.storage.paths().players_dir(), "json")?
            .len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn test_storage() -> (Storage, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut storage = Storage::new(StoragePaths::new(dir.path()));
        storage.initialize().unwrap();
        (storage, dir)
    }

    #[test]
    fn create_and_get_player() {
        let (storage, _dir) = test_storage();
        let repo = PlayerRepository::new(&storage);
        let player = StoredPlayer::new("100", Decimal::new(10000, 2));

        repo.create(&player).unwrap();
        let loaded = repo.get("100").unwrap();
        assert_eq!(loaded.balance, Decimal::new(10000, 2));
        assert_eq!(loaded.player_operator_id, "100");
    }

    #[test]
    fn missing_player_is_not_found() {
        let (storage, _dir) = test_storage();
        let repo = PlayerRepository::new(&storage);
        assert!(matches!(
            repo.get("ghost"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_create_is_rejected() {
        let (storage, _dir) = test_storage();
        let repo = PlayerRepository::new(&storage);
        let player = StoredPlayer::new("100", Decimal::ZERO);
        repo.create(&player).unwrap();
        assert!(matches!(
            repo.create(&player),
            Err(StorageError::AlreadyExists(_))
        ));
    }

    #[test]
    fn update_balance_persists() {
        let (storage, _dir) = test_storage();
        let repo = PlayerRepository::new(&storage);
        repo.create(&StoredPlayer::new("100", Decimal::new(10000, 2)))
            .unwrap();

        let updated = repo.update_balance("100", Decimal::new(9500, 2)).unwrap();
        assert_eq!(updated.balance, Decimal::new(9500, 2));
        assert_eq!(repo.get("100").unwrap().balance, Decimal::new(9500, 2));
    }

    #[test]
    fn path_escaping_id_is_rejected() {
        let (storage, _dir) = test_storage();
        let repo = PlayerRepository::new(&storage);
        assert!(matches!(
            repo.get("../evil"),
            Err(StorageError::InvalidIdentifier(_))
        ));
        assert!(!repo.exists("../evil"));
    }
}
