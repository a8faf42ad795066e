// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Operator Callback Gateway
//!
//! Gateway between a third-party gaming platform and an operator's player
//! accounts: it authenticates signed provider callbacks, resolves player
//! balances, settles wagers through an idempotent ledger, and keeps
//! spin-session state in a TTL cache.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `signature` - md5 callback signature verification
//! - `ledger` - balance resolution and idempotent wager settlement
//! - `cache` - TTL session cache and background sweeper
//! - `session` - spin-session event handling
//! - `storage` - JSON-file storage and repositories

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod session;
pub mod signature;
pub mod state;
pub mod storage;
