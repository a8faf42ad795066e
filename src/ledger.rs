// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Balance resolution and wager settlement.
//!
//! `BalanceStore` resolves a player's authoritative balance;
//! `TransactionLedger` applies a bet/win pair to it. Settlement is
//! idempotent per `(session_id, game_id)`: the settlement record is
//! written before the balance update, and a replay returns the recorded
//! result while converging the stored balance to it. A crash between the
//! two writes therefore cannot double-settle.
//!
//! Amounts use fixed-point decimals; results are rounded to 2 places with
//! half-up (midpoint away from zero) rounding, never truncated. The wire
//! contract performs no negative-balance check: a bet larger than the
//! current balance yields a negative balance by design.

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::info;

use crate::storage::{
    validate_id, LogRepository, PlayerRepository, SettlementRecord, SettlementRepository, Storage,
    StorageError,
};

/// Zero balance in external representation.
pub const ZERO_BALANCE: &str = "0.00";

/// Errors produced by balance lookup and settlement.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The player does not exist. A normal domain outcome (code 1004),
    /// not a transport failure.
    #[error("player not found")]
    PlayerNotFound,

    /// A session or game identifier cannot be used as a settlement key.
    /// Surfaced to the wire as invalid parameters (code 1003).
    #[error("invalid settlement key: {0}")]
    InvalidKey(String),

    /// Unexpected storage failure.
    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for LedgerError {
    fn from(e: StorageError) -> Self {
        match e {
            // Unknown ids and unsafe ids both read as an absent player.
            StorageError::NotFound(_) | StorageError::InvalidIdentifier(_) => {
                LedgerError::PlayerNotFound
            }
            other => LedgerError::Storage(other),
        }
    }
}

/// Format an amount for the wire: always exactly 2 fractional digits.
pub fn format_amount(amount: Decimal) -> String {
    let mut amount = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    amount.rescale(2);
    amount.to_string()
}

/// Parse a caller-supplied decimal amount string.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    raw.trim().parse().ok()
}

/// A wager to settle: one bet/win pair in the request's currency.
#[derive(Debug, Clone)]
pub struct WagerEvent {
    pub player_operator_id: String,
    pub bet: Decimal,
    pub win: Decimal,
    pub currency: String,
    pub game_id: String,
    pub session_id: String,
}

/// Resolves a player's current balance by external player identifier.
pub struct BalanceStore<'a> {
    storage: &'a Storage,
}

impl<'a> BalanceStore<'a> {
    /// Create a new BalanceStore.
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Look up the current balance for a player.
    pub fn lookup(&self, player_operator_id: &str) -> Result<Decimal, LedgerError> {
        let player = PlayerRepository::new(self.storage).get(player_operator_id)?;
        Ok(player.balance)
    }
}

/// Applies bet/win pairs to player balances.
pub struct TransactionLedger<'a> {
    storage: &'a Storage,
}

impl<'a> TransactionLedger<'a> {
    /// Create a new TransactionLedger.
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Settle a wager and return the resulting balance.
    ///
    /// Replaying the same `(session_id, game_id)` pair returns the balance
    /// recorded by the first application; the delta is never applied twice.
    pub fn settle(&self, event: &WagerEvent) -> Result<Decimal, LedgerError> {
        // Settlement keys become file path components; an unsafe id is a
        // malformed request field, not a missing player.
        validate_id(&event.session_id)
            .map_err(|_| LedgerError::InvalidKey(event.session_id.clone()))?;
        validate_id(&event.game_id)
            .map_err(|_| LedgerError::InvalidKey(event.game_id.clone()))?;

        let players = PlayerRepository::new(self.storage);
        let settlements = SettlementRepository::new(self.storage);

        // Serialize the read-modify-write per player so two concurrent
        // settlements with distinct keys cannot both read the same
        // balance and lose one delta.
        let lock = self.storage.player_lock(&event.player_operator_id);
        let _guard = lock.lock().expect("player lock poisoned");

        if let Some(existing) = settlements.find(&event.session_id, &event.game_id)? {
            // Replay: converge the stored balance to the recorded result
            // in case the original attempt crashed before the update.
            let player = players.get(&event.player_operator_id)?;
            if player.balance != existing.balance_after {
                players.update_balance(&event.player_operator_id, existing.balance_after)?;
            }
            info!(
                player_operator_id = %event.player_operator_id,
                session_id = %event.session_id,
                game_id = %event.game_id,
                balance = %format_amount(existing.balance_after),
                "Settlement replayed, returning recorded balance"
            );
            return Ok(existing.balance_after);
        }

        let current = BalanceStore::new(self.storage).lookup(&event.player_operator_id)?;
        let new_balance = (current - event.bet + event.win)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        settlements.record(&SettlementRecord {
            session_id: event.session_id.clone(),
            game_id: event.game_id.clone(),
            player_operator_id: event.player_operator_id.clone(),
            bet: event.bet,
            win: event.win,
            currency: event.currency.clone(),
            balance_after: new_balance,
            created_at: chrono::Utc::now(),
        })?;
        players.update_balance(&event.player_operator_id, new_balance)?;

        LogRepository::new(self.storage).append(format!(
            "Game transaction: player_operator_id={}, bet={}, win={}, currency={}, game_id={}, new_balance={}, session_id={}",
            event.player_operator_id,
            format_amount(event.bet),
            format_amount(event.win),
            event.currency,
            event.game_id,
            format_amount(new_balance),
            event.session_id,
        ))?;

        info!(
            player_operator_id = %event.player_operator_id,
            bet = %format_amount(event.bet),
            win = %format_amount(event.win),
            currency = %event.currency,
            game_id = %event.game_id,
            session_id = %event.session_id,
            new_balance = %format_amount(new_balance),
            "Game transaction settled"
        );

        Ok(new_balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StoragePaths, StoredPlayer};
    use tempfile::TempDir;

    fn test_storage() -> (Storage, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut storage = Storage::new(StoragePaths::new(dir.path()));
        storage.initialize().unwrap();
        (storage, dir)
    }

    fn seed_player(storage: &Storage, id: &str, balance: &str) {
        PlayerRepository::new(storage)
            .create(&StoredPlayer::new(id, balance.parse().unwrap()))
            .unwrap();
    }

    fn wager(bet: &str, win: &str) -> WagerEvent {
        WagerEvent {
            player_operator_id: "100".to_string(),
            bet: bet.parse().unwrap(),
            win: win.parse().unwrap(),
            currency: "USD".to_string(),
            game_id: "game123".to_string(),
            session_id: "session789".to_string(),
        }
    }

    #[test]
    fn settle_applies_bet_and_win() {
        let (storage, _dir) = test_storage();
        seed_player(&storage, "100", "100.00");

        let balance = TransactionLedger::new(&storage).settle(&wager("10.00", "5.00")).unwrap();
        assert_eq!(format_amount(balance), "95.00");
        assert_eq!(
            BalanceStore::new(&storage).lookup("100").unwrap(),
            balance
        );
    }

    #[test]
    fn settle_is_idempotent_per_session_and_game() {
        let (storage, _dir) = test_storage();
        seed_player(&storage, "100", "100.00");
        let ledger = TransactionLedger::new(&storage);

        let first = ledger.settle(&wager("10.00", "5.00")).unwrap();
        let replay = ledger.settle(&wager("10.00", "5.00")).unwrap();

        assert_eq!(first, replay);
        // Applied exactly once.
        assert_eq!(
            format_amount(BalanceStore::new(&storage).lookup("100").unwrap()),
            "95.00"
        );
    }

    #[test]
    fn distinct_sessions_settle_independently() {
        let (storage, _dir) = test_storage();
        seed_player(&storage, "100", "100.00");
        let ledger = TransactionLedger::new(&storage);

        ledger.settle(&wager("10.00", "5.00")).unwrap();
        let mut second = wager("10.00", "0.00");
        second.session_id = "session790".to_string();
        let balance = ledger.settle(&second).unwrap();

        assert_eq!(format_amount(balance), "85.00");
    }

    #[test]
    fn delimiter_bearing_ids_settle_independently() {
        let (storage, _dir) = test_storage();
        seed_player(&storage, "100", "100.00");
        let ledger = TransactionLedger::new(&storage);

        let mut first = wager("10.00", "0.00");
        first.session_id = "s1__g".to_string();
        first.game_id = "x".to_string();
        let mut second = wager("10.00", "0.00");
        second.session_id = "s1".to_string();
        second.game_id = "g__x".to_string();

        // The pairs concatenate identically but are distinct wagers;
        // the second must settle, not replay the first.
        assert_eq!(format_amount(ledger.settle(&first).unwrap()), "90.00");
        assert_eq!(format_amount(ledger.settle(&second).unwrap()), "80.00");
    }

    #[test]
    fn concurrent_settlements_do_not_lose_deltas() {
        use std::sync::{Arc, Barrier};

        let (storage, _dir) = test_storage();
        seed_player(&storage, "100", "100.00");

        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let mut handles = Vec::with_capacity(threads);
        for i in 0..threads {
            let storage = storage.clone();
            let barrier = barrier.clone();
            handles.push(std::thread::spawn(move || {
                let mut event = wager("1.00", "0.00");
                event.session_id = format!("session{i}");
                barrier.wait();
                TransactionLedger::new(&storage).settle(&event).unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // Every delta applied exactly once.
        assert_eq!(
            format_amount(BalanceStore::new(&storage).lookup("100").unwrap()),
            "92.00"
        );
    }

    #[test]
    fn path_escaping_settlement_ids_are_invalid_keys() {
        let (storage, _dir) = test_storage();
        seed_player(&storage, "100", "100.00");
        let ledger = TransactionLedger::new(&storage);

        let mut event = wager("1.00", "0.00");
        event.game_id = "a/b".to_string();
        assert!(matches!(
            ledger.settle(&event),
            Err(LedgerError::InvalidKey(_))
        ));

        let mut event = wager("1.00", "0.00");
        event.session_id = "../evil".to_string();
        assert!(matches!(
            ledger.settle(&event),
            Err(LedgerError::InvalidKey(_))
        ));

        // Nothing was applied.
        assert_eq!(
            format_amount(BalanceStore::new(&storage).lookup("100").unwrap()),
            "100.00"
        );
    }

    #[test]
    fn negative_results_are_permitted() {
        // No negative-balance check exists in the wire contract.
        let (storage, _dir) = test_storage();
        seed_player(&storage, "100", "5.00");

        let balance = TransactionLedger::new(&storage).settle(&wager("10.00", "0.00")).unwrap();
        assert_eq!(format_amount(balance), "-5.00");
    }

    #[test]
    fn results_round_half_up_to_two_places() {
        let (storage, _dir) = test_storage();
        seed_player(&storage, "100", "100.00");

        let balance = TransactionLedger::new(&storage)
            .settle(&wager("0.005", "0.00"))
            .unwrap();
        // 100.00 - 0.005 = 99.995 -> 100.00 with half-up rounding.
        assert_eq!(format_amount(balance), "100.00");
    }

    #[test]
    fn unknown_player_is_not_found() {
        let (storage, _dir) = test_storage();
        let result = TransactionLedger::new(&storage).settle(&wager("1.00", "0.00"));
        assert!(matches!(result, Err(LedgerError::PlayerNotFound)));

        let lookup = BalanceStore::new(&storage).lookup("ghost");
        assert!(matches!(lookup, Err(LedgerError::PlayerNotFound)));
    }

    #[test]
    fn amount_formatting_is_always_two_digits() {
        assert_eq!(format_amount(Decimal::new(95, 0)), "95.00");
        assert_eq!(format_amount("95".parse().unwrap()), "95.00");
        assert_eq!(format_amount("0.1".parse().unwrap()), "0.10");
        assert_eq!(format_amount("-5".parse().unwrap()), "-5.00");
        assert_eq!(format_amount("10.005".parse().unwrap()), "10.01");
    }

    #[test]
    fn amount_parsing_accepts_decimal_strings() {
        assert_eq!(parse_amount("10.00"), Some(Decimal::new(1000, 2)));
        assert_eq!(parse_amount(" 5.5 "), Some(Decimal::new(55, 1)));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
    }
}
