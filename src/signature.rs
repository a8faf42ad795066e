// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Callback signature verification.
//!
//! The provider protocol authenticates callbacks with an md5 digest over a
//! fixed-order concatenation of request fields. The digest choice and the
//! field order are part of the wire contract: output must be byte-identical
//! to what the provider computes, so fields are hashed exactly as received,
//! with no numeric normalization and no separators.

/// Compute the ping hash: `md5(secret + salt_sign)` as lowercase hex.
pub fn ping_hash(secret: &str, salt_sign: &str) -> String {
    let mut input = String::with_capacity(secret.len() + salt_sign.len());
    input.push_str(secret);
    input.push_str(salt_sign);
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Fields bound into a game-callback signature, in wire order.
#[derive(Debug, Clone, Copy)]
pub struct GameSignFields<'a> {
    pub player_operator_id: &'a str,
    pub bet: &'a str,
    pub win: &'a str,
    pub currency: &'a str,
    pub game_id: &'a str,
    pub salt_sign: &'a str,
}

/// Compute the expected game signature:
/// `md5(key + player_operator_id + bet + win + currency + game_id + salt_sign)`.
pub fn game_sign(key: &str, fields: &GameSignFields<'_>) -> String {
    let mut input = String::new();
    input.push_str(key);
    input.push_str(fields.player_operator_id);
    input.push_str(fields.bet);
    input.push_str(fields.win);
    input.push_str(fields.currency);
    input.push_str(fields.game_id);
    input.push_str(fields.salt_sign);
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Check a caller-supplied signature against the expected one.
///
/// Exact string equality; a mismatch is an authentication failure
/// (error code 1001), not a validation error.
pub fn verify_game_sign(key: &str, fields: &GameSignFields<'_>, sign: &str) -> bool {
    game_sign(key, fields) == sign
}
