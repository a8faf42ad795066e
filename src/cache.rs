// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session cache with per-key time-to-live.
//!
//! Holds short-lived per-session counters: spin index, running balance
//! mirror, free-spin state, and provider tokens. Modeled as an injected
//! capability so a shared remote cache can replace the in-process map in
//! multi-instance deployments.
//!
//! TTL granularity is seconds; a TTL of 0 means no expiry. Reads treat
//! logically expired entries as absent even before the background sweeper
//! has removed them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// TTL for session-scoped values (balance mirror, counters, init data).
pub const SESSION_TTL_SECS: u64 = 3600;

/// TTL for short-lived provider tokens.
pub const PROVIDER_TOKEN_TTL_SECS: u64 = 10;

/// Cache key for a session-scoped field: `{session_token}:{field}`.
pub fn session_key(session_token: &str, field: &str) -> String {
    format!("{session_token}:{field}")
}

/// Injected cache capability.
///
/// `remember` is cache-aside, not single-flight: two concurrent callers
/// racing on the same missing key may both invoke their fallback. Values
/// are idempotent re-derivations, so duplicate computation is acceptable;
/// within one call the fallback runs at most once.
pub trait SessionCache: Send + Sync {
    /// Get a value. Expired entries read as absent.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store a value. `ttl_seconds` of `None` uses the cache default;
    /// `Some(0)` means the entry never expires.
    fn put(&self, key: &str, value: Value, ttl_seconds: Option<u64>) -> bool;

    /// Remove a value. Returns whether a live entry was present.
    fn forget(&self, key: &str) -> bool;

    /// Whether a live entry exists for the key.
    fn has(&self, key: &str) -> bool;

    /// Atomic get-then-delete.
    fn take(&self, key: &str) -> Option<Value>;

    /// Return the cached value, or compute, store with the given TTL, and
    /// return it. The fallback is invoked at most once per call.
    fn remember(&self, key: &str, ttl_seconds: u64, fallback: &mut dyn FnMut() -> Value) -> Value {
        if let Some(value) = self.get(key) {
            return value;
        }
        let value = fallback();
        self.put(key, value.clone(), Some(ttl_seconds));
        value
    }
}

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if deadline <= now)
    }
}

/// In-process session cache shared by all concurrent requests.
///
/// A single mutex guards the map, so reads and writes to any key are
/// atomic; entries never observe partial writes.
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    /// Default TTL applied by `put` when no TTL is given. 0 = no expiry.
    std_ttl: u64,
}

impl InMemoryCache {
    /// Create a cache with no default expiry.
    pub fn new() -> Self {
        Self::with_default_ttl(0)
    }

    /// Create a cache whose `put` defaults to the given TTL in seconds.
    pub fn with_default_ttl(std_ttl: u64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            std_ttl,
        }
    }

    fn deadline(ttl_seconds: u64) -> Option<Instant> {
        if ttl_seconds == 0 {
            None
        } else {
            Some(Instant::now() + Duration::from_secs(ttl_seconds))
        }
    }

    /// Remove every expired entry. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Number of live entries (expired-but-unswept excluded).
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().expect("cache mutex poisoned");
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    /// Whether the cache holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCache for InMemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    fn put(&self, key: &str, value: Value, ttl_seconds: Option<u64>) -> bool {
        let ttl = ttl_seconds.unwrap_or(self.std_ttl);
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Self::deadline(ttl),
            },
        );
        true
    }

    fn forget(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.remove(key) {
            Some(entry) => !entry.is_expired(now),
            None => false,
        }
    }

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn take(&self, key: &str) -> Option<Value> {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.remove(key) {
            Some(entry) if entry.is_expired(now) => None,
            Some(entry) => Some(entry.value),
            None => None,
        }
    }
}

/// Background task that removes expired cache entries on an interval.
///
/// Reads already treat expired entries as absent; the sweeper only bounds
/// memory held by abandoned sessions.
pub struct CacheSweeper {
    cache: Arc<InMemoryCache>,
    interval: Duration,
}

impl CacheSweeper {
    /// Create a sweeper for the given cache.
    pub fn new(cache: Arc<InMemoryCache>, interval: Duration) -> Self {
        Self { cache, interval }
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Session cache sweeper starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Session cache sweeper shutting down");
                    return;
                }
            }

            let removed = self.cache.sweep();
            if removed > 0 {
                debug!(removed, "Session cache sweep removed expired entries");
            }
        }
    }
}
