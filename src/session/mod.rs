// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Spin-session service.
//!
//! Spin-based games report events against an opaque session token rather
//! than through the operator callback endpoints. This service keeps the
//! per-session bookkeeping consistent across repeated callbacks: the spin
//! counter, a running balance mirror, cached init data, and free-spin
//! state all live in the session cache under `{token}:{field}` keys,
//! while the authoritative balance moves through the transaction ledger.
//!
//! Responses are provider-shaped query strings
//! (`balance=..&na=s&stime=..`), not JSON.

pub mod freespin;
pub mod provider;

use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::cache::{session_key, InMemoryCache, SessionCache, PROVIDER_TOKEN_TTL_SECS, SESSION_TTL_SECS};
use crate::config::GatewayConfig;
use crate::ledger::{format_amount, BalanceStore, LedgerError, TransactionLedger, WagerEvent};
use crate::storage::Storage;

pub use freespin::FreeSpinState;
pub use provider::{ProviderClient, ProviderError};

/// Cache key for the short-lived provider token.
const PROVIDER_TOKEN_KEY: &str = "PROVIDER_TOKEN";

/// Errors from spin-session processing.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A spin event arrived before `doInit` established the session.
    #[error("session not initialized: {0}")]
    NotInitialized(String),

    /// The init payload misses a required field.
    #[error("missing field in session payload: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Per-token session context, cached at `{token}:session`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpinSession {
    pub player_operator_id: String,
    pub game_id: String,
    pub currency: String,
}

/// Convert a money string to integer minor units (`"10.00"` -> `1000`).
///
/// Invalid input reads as zero, matching the provider's lenient parsing.
/// Rounds rather than truncates, so `"0.005"` becomes `1`, not `0`.
pub fn to_minor_units(money: &str) -> i64 {
    money
        .trim()
        .parse::<Decimal>()
        .ok()
        .map(|d| (d * Decimal::ONE_HUNDRED).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_i64())
        .unwrap_or(0)
}

/// Build a provider-shaped query-string response.
pub fn build_response_query(params: &[(&str, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

fn payload_str(payload: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match payload.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Spin-session orchestration over the ledger, cache, and provider client.
pub struct SpinSessionService {
    config: Arc<GatewayConfig>,
    storage: Storage,
    cache: Arc<InMemoryCache>,
    provider: ProviderClient,
}

impl SpinSessionService {
    /// Create the service.
    pub fn new(
        config: Arc<GatewayConfig>,
        storage: Storage,
        cache: Arc<InMemoryCache>,
        provider: ProviderClient,
    ) -> Self {
        Self {
            config,
            storage,
            cache,
            provider,
        }
    }

    /// Dispatch a game event by provider action name.
    ///
    /// Unknown actions fall through to the operator-token flow, which is
    /// what the provider expects for the remaining action families.
    pub async fn game_event(
        &self,
        token: &str,
        action: &str,
        payload: &Value,
    ) -> Result<String, SessionError> {
        info!(token, action, "Spin session event");
        match action {
            "reloadBalance.do" => self.reload_balance(token),
            "doInit" => self.do_init(token, payload),
            "doSpin" | "doCollect" | "doWin" | "doDeal" => self.do_spin(token, payload),
            _ => self.operator_token_query(payload).await,
        }
    }

    /// Initialize a spin session: resolve the player balance, cache the
    /// session context and balance mirror, and answer the init response.
    pub fn do_init(&self, token: &str, payload: &Value) -> Result<String, SessionError> {
        let session = SpinSession {
            player_operator_id: payload_str(payload, &["player_operator_id"])
                .ok_or(SessionError::MissingField("player_operator_id"))?,
            game_id: payload_str(payload, &["gameId", "game_id", "gameSymbol"])
                .ok_or(SessionError::MissingField("gameId"))?,
            currency: payload_str(payload, &["currency"])
                .ok_or(SessionError::MissingField("currency"))?,
        };

        let balance = BalanceStore::new(&self.storage).lookup(&session.player_operator_id)?;
        let balance_minor = to_minor_units(&format_amount(balance));

        self.cache.put(
            &session_key(token, "session"),
            serde_json::to_value(&session).unwrap_or(Value::Null),
            Some(SESSION_TTL_SECS),
        );
        self.cache.put(
            &session_key(token, "balance"),
            json!(balance_minor),
            Some(SESSION_TTL_SECS),
        );
        self.cache.put(
            &session_key(token, "init_request_data"),
            payload.clone(),
            Some(SESSION_TTL_SECS),
        );
        self.cache.put(
            &session_key(token, "counter"),
            json!(0),
            Some(SESSION_TTL_SECS),
        );

        Ok(build_response_query(&[
            ("gameId", session.game_id.clone()),
            ("token", token.to_string()),
            ("balance", format_amount(balance)),
            ("balance_cash", format_amount(balance)),
            ("balance_bonus", "0.00".to_string()),
            ("na", "s".to_string()),
            ("stime", unix_now().to_string()),
            ("sver", "5".to_string()),
            ("history", "false".to_string()),
        ]))
    }

    /// Settle one spin: bump the counter, apply the bet/win through the
    /// ledger (bets under an active free-spin grant are not debited),
    /// advance free-spin state, and mirror the new balance in the cache.
    pub fn do_spin(&self, token: &str, payload: &Value) -> Result<String, SessionError> {
        let session = self.session(token)?;

        // A retried spin carries its counter; fresh spins get the next one.
        let counter = payload
            .get("counter")
            .and_then(Value::as_u64)
            .unwrap_or_else(|| self.cached_counter(token) + 1);

        let bet_raw = payload_str(payload, &["bet"]).unwrap_or_else(|| "0".to_string());
        let win_raw = payload_str(payload, &["win", "tw"]).unwrap_or_else(|| "0".to_string());
        let bet: Decimal = bet_raw.trim().parse().unwrap_or(Decimal::ZERO);
        let win: Decimal = win_raw.trim().parse().unwrap_or(Decimal::ZERO);

        let freespins: FreeSpinState = self
            .cache
            .get(&session_key(token, "freespins"))
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();

        let charged_bet = if freespins.is_active() {
            Decimal::ZERO
        } else {
            bet
        };

        // Idempotency key is the session token plus the per-spin counter:
        // a retried spin settles once, distinct spins settle separately.
        let new_balance = TransactionLedger::new(&self.storage).settle(&WagerEvent {
            player_operator_id: session.player_operator_id.clone(),
            bet: charged_bet,
            win,
            currency: session.currency.clone(),
            game_id: format!("{}:{counter}", session.game_id),
            session_id: token.to_string(),
        })?;

        let advanced = freespins.clone().apply_spin(to_minor_units(&win_raw));
        if advanced != FreeSpinState::Inactive {
            self.cache.put(
                &session_key(token, "freespins"),
                serde_json::to_value(&advanced).unwrap_or(Value::Null),
                Some(SESSION_TTL_SECS),
            );
        }

        self.cache.put(
            &session_key(token, "counter"),
            json!(counter),
            Some(SESSION_TTL_SECS),
        );
        self.cache.put(
            &session_key(token, "balance"),
            json!(to_minor_units(&format_amount(new_balance))),
            Some(SESSION_TTL_SECS),
        );

        let mut params = vec![
            ("balance", format_amount(new_balance)),
            ("balance_cash", format_amount(new_balance)),
            ("balance_bonus", "0.00".to_string()),
            ("tw", format_amount(win)),
            ("na", "s".to_string()),
            ("stime", unix_now().to_string()),
            ("sver", "5".to_string()),
            ("counter", counter.to_string()),
        ];
        if advanced.total() > 0 {
            params.push(("fs_total", advanced.total().to_string()));
            params.push(("fs_left", advanced.remaining().to_string()));
        }

        Ok(build_response_query(&params))
    }

    /// Answer the current balance for an established session.
    pub fn reload_balance(&self, token: &str) -> Result<String, SessionError> {
        let session = self.session(token)?;
        let balance = BalanceStore::new(&self.storage).lookup(&session.player_operator_id)?;

        Ok(build_response_query(&[
            ("balance", format_amount(balance)),
            ("balance_cash", format_amount(balance)),
            ("balance_bonus", "0.00".to_string()),
            ("na", "s".to_string()),
            ("stime", unix_now().to_string()),
        ]))
    }

    /// Grant free spins on a session.
    pub fn grant_freespins(&self, token: &str, total: u32) -> Result<FreeSpinState, SessionError> {
        // The grant is only meaningful on an initialized session.
        self.session(token)?;
        let state = FreeSpinState::grant(total);
        self.cache.put(
            &session_key(token, "freespins"),
            serde_json::to_value(&state).unwrap_or(Value::Null),
            Some(SESSION_TTL_SECS),
        );
        Ok(state)
    }

    /// Current free-spin state for a session.
    pub fn freespin_state(&self, token: &str) -> FreeSpinState {
        self.cache
            .get(&session_key(token, "freespins"))
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    /// Resolve a short-lived operator token, cached for 10 seconds.
    ///
    /// Not single-flight: concurrent misses may each fetch a token, which
    /// is harmless since any fresh token is valid.
    pub async fn operator_token(&self) -> Result<String, SessionError> {
        if let Some(cached) = self.cache.get(PROVIDER_TOKEN_KEY).and_then(|v| {
            v.as_str().map(str::to_string)
        }) {
            return Ok(cached);
        }

        let token = self.provider.fetch_token().await?;
        self.cache.put(
            PROVIDER_TOKEN_KEY,
            json!(token),
            Some(PROVIDER_TOKEN_TTL_SECS),
        );
        Ok(token)
    }

    async fn operator_token_query(&self, payload: &Value) -> Result<String, SessionError> {
        let token = self.operator_token().await?;
        let game_id =
            payload_str(payload, &["gameId", "gameSymbol", "game_id"]).unwrap_or_default();
        Ok(build_response_query(&[
            ("token", token),
            ("gameId", game_id.clone()),
            ("symbol", game_id),
        ]))
    }

    /// Whether the gateway services callbacks at all.
    pub fn is_active(&self) -> bool {
        self.config.active
    }

    fn session(&self, token: &str) -> Result<SpinSession, SessionError> {
        self.cache
            .get(&session_key(token, "session"))
            .and_then(|v| serde_json::from_value(v).ok())
            .ok_or_else(|| SessionError::NotInitialized(token.to_string()))
    }

    fn cached_counter(&self, token: &str) -> u64 {
        self.cache
            .get(&session_key(token, "counter"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{PlayerRepository, StoragePaths, StoredPlayer};
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_service() -> (SpinSessionService, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut storage = Storage::new(StoragePaths::new(dir.path()));
        storage.initialize().unwrap();
        PlayerRepository::new(&storage)
            .create(&StoredPlayer::new("100", "100.00".parse().unwrap()))
            .unwrap();

        let config = Arc::new(GatewayConfig {
            operator_secret: "secret".to_string(),
            operator_key: "key".to_string(),
            active: true,
            data_dir: dir.path().to_string_lossy().to_string(),
            cache_sweep_interval: Duration::from_secs(600),
            provider_token_url: None,
            provider_timeout: Duration::from_secs(10),
            seed_demo_data: false,
        });
        let provider = ProviderClient::new(None, config.provider_timeout).unwrap();
        let service = SpinSessionService::new(
            config,
            storage,
            Arc::new(InMemoryCache::new()),
            provider,
        );
        (service, dir)
    }

    fn init_payload() -> Value {
        json!({
            "player_operator_id": "100",
            "gameId": "vs20olympgate",
            "currency": "USD",
        })
    }

    #[test]
    fn minor_unit_conversion_rounds() {
        assert_eq!(to_minor_units("10.00"), 1000);
        assert_eq!(to_minor_units("0.50"), 50);
        assert_eq!(to_minor_units("0.005"), 1);
        assert_eq!(to_minor_units("garbage"), 0);
        assert_eq!(to_minor_units(""), 0);
    }

    #[test]
    fn init_caches_session_state_and_reports_balance() {
        let (service, _dir) = test_service();
        let response = service.do_init("tok1", &init_payload()).unwrap();

        assert!(response.contains("balance=100.00"));
        assert!(response.contains("gameId=vs20olympgate"));
        assert_eq!(
            service.cache.get(&session_key("tok1", "balance")),
            Some(json!(10000))
        );
        assert!(service.cache.has(&session_key("tok1", "init_request_data")));
    }

    #[test]
    fn spin_settles_and_bumps_counter() {
        let (service, _dir) = test_service();
        service.do_init("tok1", &init_payload()).unwrap();

        let response = service
            .do_spin("tok1", &json!({"bet": "10.00", "win": "5.00"}))
            .unwrap();

        assert!(response.contains("balance=95.00"));
        assert!(response.contains("counter=1"));
        assert_eq!(
            service.cache.get(&session_key("tok1", "balance")),
            Some(json!(9500))
        );

        let response = service
            .do_spin("tok1", &json!({"bet": "5.00", "win": "0.00"}))
            .unwrap();
        assert!(response.contains("balance=90.00"));
        assert!(response.contains("counter=2"));
    }

    #[test]
    fn retried_spin_with_same_counter_settles_once() {
        let (service, _dir) = test_service();
        service.do_init("tok1", &init_payload()).unwrap();

        let first = service
            .do_spin("tok1", &json!({"bet": "10.00", "win": "0.00", "counter": 1}))
            .unwrap();
        let retry = service
            .do_spin("tok1", &json!({"bet": "10.00", "win": "0.00", "counter": 1}))
            .unwrap();

        assert!(first.contains("balance=90.00"));
        assert!(retry.contains("balance=90.00"));
    }

    #[test]
    fn spin_without_init_is_rejected() {
        let (service, _dir) = test_service();
        let result = service.do_spin("ghost", &json!({"bet": "1.00"}));
        assert!(matches!(result, Err(SessionError::NotInitialized(_))));
    }

    #[test]
    fn free_spins_suppress_the_bet_debit() {
        let (service, _dir) = test_service();
        service.do_init("tok1", &init_payload()).unwrap();
        service.grant_freespins("tok1", 2).unwrap();

        let response = service
            .do_spin("tok1", &json!({"bet": "10.00", "win": "2.50"}))
            .unwrap();

        // Balance only moves by the win while the grant is active.
        assert!(response.contains("balance=102.50"));
        assert!(response.contains("fs_total=2"));
        assert!(response.contains("fs_left=1"));

        let response = service
            .do_spin("tok1", &json!({"bet": "10.00", "win": "0.00"}))
            .unwrap();
        assert!(response.contains("fs_left=0"));
        assert_eq!(
            service.freespin_state("tok1"),
            FreeSpinState::Completed {
                total: 2,
                win_minor: 250,
            }
        );

        // Grant exhausted: bets debit again.
        let response = service
            .do_spin("tok1", &json!({"bet": "2.50", "win": "0.00"}))
            .unwrap();
        assert!(response.contains("balance=100.00"));
    }

    #[test]
    fn reload_balance_reports_ledger_balance() {
        let (service, _dir) = test_service();
        service.do_init("tok1", &init_payload()).unwrap();
        service
            .do_spin("tok1", &json!({"bet": "10.00", "win": "0.00"}))
            .unwrap();

        let response = service.reload_balance("tok1").unwrap();
        assert!(response.contains("balance=90.00"));
        assert!(response.contains("balance_bonus=0.00"));
    }

    #[tokio::test]
    async fn operator_token_requires_configuration() {
        let (service, _dir) = test_service();
        let result = service.operator_token().await;
        assert!(matches!(
            result,
            Err(SessionError::Provider(ProviderError::NotConfigured))
        ));
    }

    #[test]
    fn response_query_is_url_encoded() {
        let query = build_response_query(&[
            ("balance", "95.00".to_string()),
            ("na", "s".to_string()),
        ]);
        assert_eq!(query, "balance=95.00&na=s");
    }
}
