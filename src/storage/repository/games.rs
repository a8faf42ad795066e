// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Games list repository.
//!
//! Games are keyed by the provider `gid`; lookups fall back to the
//! user-facing `slug` when no file matches the primary key.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{validate_id, Storage, StorageError, StorageResult};

/// Provider info embedded with each game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct GameProvider {
    /// Provider identifier.
    pub id: String,
    /// Provider display name.
    pub name: String,
}

/// A games list entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct StoredGame {
    /// Primary game identifier.
    pub gid: String,
    /// User-facing slug, used as a fallback lookup key.
    pub slug: String,
    /// Game display name.
    pub name: String,
    /// Demo launch link, when the provider publishes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demolink: Option<String>,
    /// Owning provider.
    pub provider: GameProvider,
}

/// Repository for games list entries.
pub struct GameRepository<'a> {
    storage: &'a Storage,
}

impl<'a> GameRepository<'a> {
    /// Create a new GameRepository.
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Get a game by primary gid.
    pub fn get(&self, gid: &str) -> StorageResult<StoredGame> {
        validate_id(gid)?;
        let path = self.storage.paths().game(gid);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Game {gid}")));
        }
        self.storage.read_json(path)
    }

    /// Get a game by slug, scanning all entries.
    pub fn get_by_slug(&self, slug: &str) -> StorageResult<StoredGame> {
        let gids = self
            .storage
            .list_files(self.storage.paths().games_dir(), "json")?;

        for gid in gids {
            if let Ok(game) = self.get(&gid) {
                if game.slug == slug {
                    return Ok(game);
                }
            }
        }

        Err(StorageError::NotFound(format!("Game with slug {slug}")))
    }

    /// Get a game by gid, falling back to slug lookup.
    pub fn get_with_fallback(&self, gid: &str) -> StorageResult<StoredGame> {
        match self.get(gid) {
            Ok(game) => Ok(game),
            Err(StorageError::NotFound(_)) => self.get_by_slug(gid),
            Err(e) => Err(e),
        }
    }

    /// Create a new game entry.
    pub fn create(&self, game: &StoredGame) -> StorageResult<()> {
        validate_id(&game.gid)?;
        if self.storage.exists(self.storage.paths().game(&game.gid)) {
            return Err(StorageError::AlreadyExists(format!("Game {}", game.gid)));
        }
        self.storage
            .write_json(self.storage.paths().game(&game.gid), game)
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

    fn sample_game() -> StoredGame {
        StoredGame {
            gid: "vs20olympgate".to_string(),
            slug: "gates-of-olympus".to_string(),
            name: "Gates of Olympus".to_string(),
            demolink: Some(
                "https://example.net/gs2c/openGame.do?gameSymbol=vs20olympgate&lang=en".to_string(),
            ),
            provider: GameProvider {
                id: "pragmatic".to_string(),
                name: "Pragmatic Play".to_string(),
            },
        }
    }

    #[test]
    fn lookup_by_gid() {
        let (storage, _dir) = test_storage();
        let repo = GameRepository::new(&storage);
        repo.create(&sample_game()).unwrap();

        let game = repo.get_with_fallback("vs20olympgate").unwrap();
        assert_eq!(game.name, "Gates of Olympus");
    }

    #[test]
    fn lookup_falls_back_to_slug() {
        let (storage, _dir) = test_storage();
        let repo = GameRepository::new(&storage);
        repo.create(&sample_game()).unwrap();

        let game = repo.get_with_fallback("gates-of-olympus").unwrap();
        assert_eq!(game.gid, "vs20olympgate");
    }

    #[test]
    fn unknown_gid_and_slug_is_not_found() {
        let (storage, _dir) = test_storage();
        let repo = GameRepository::new(&storage);
        repo.create(&sample_game()).unwrap();

        assert!(matches!(
            repo.get_with_fallback("missing"),
            Err(StorageError::NotFound(_))
        ));
    }
}
