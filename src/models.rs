// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wire types for the callback protocol.
//!
//! Request and response bodies here are part of the compatibility surface:
//! field names, the `{data, error, timestamp}` envelope, and the
//! two-fractional-digit money strings must match the provider's protocol
//! exactly.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Structured domain error carried inside the callback envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct CallbackError {
    /// Protocol error code (1000/1001/1003/1004).
    pub code: u32,
    /// Human-readable message.
    pub message: String,
}

impl CallbackError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// The callback response envelope.
///
/// `error` is populated exactly when the request failed at the domain or
/// protocol level; callers never need to branch on HTTP status alone.
/// `timestamp` is Unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackEnvelope<T> {
    pub data: Option<T>,
    pub error: Option<CallbackError>,
    pub timestamp: i64,
}

impl<T> CallbackEnvelope<T> {
    /// Successful envelope: populated data, null error.
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            timestamp: Utc::now().timestamp(),
        }
    }

    /// Failed envelope. `data` may still carry a degraded-but-well-typed
    /// default (e.g. a zero balance).
    pub fn failure(data: Option<T>, error: CallbackError) -> Self {
        Self {
            data,
            error: Some(error),
            timestamp: Utc::now().timestamp(),
        }
    }
}

/// Top-level `{status, message}` shape used by ping/balance validation
/// failures and the service-inactive answer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusMessage {
    pub status: String,
    pub message: String,
}

impl StatusMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

// ========== Ping ==========

/// `POST /ping` request body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PingRequest {
    pub salt_sign: Option<String>,
}

/// `POST /ping` success payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PingData {
    pub status: String,
    pub hash: String,
    pub salt_sign: String,
}

// ========== Balance ==========

/// `POST /balance` request body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BalanceRequest {
    pub player_operator_id: Option<String>,
    pub currency: Option<String>,
}

/// Balance payload shared by the balance and game callbacks.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BalanceData {
    /// Balance as a decimal string with exactly 2 fractional digits.
    pub balance: String,
    pub currency: String,
    pub player_operator_id: String,
}

// ========== Game ==========

/// `POST /game` request body.
///
/// Monetary fields stay strings end to end: the signature binds them as
/// received, so any numeric normalization before verification would
/// change the hash.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GameRequest {
    pub player_operator_id: Option<String>,
    pub bet: Option<String>,
    pub win: Option<String>,
    pub currency: Option<String>,
    pub game_id: Option<String>,
    pub sign: Option<String>,
    pub salt_sign: Option<String>,
    pub session_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_has_null_error() {
        let envelope = CallbackEnvelope::success(PingData {
            status: "success".to_string(),
            hash: "abc".to_string(),
            salt_sign: "salt".to_string(),
        });
        assert!(envelope.error.is_none());
        assert!(envelope.data.is_some());
        assert!(envelope.timestamp > 0);
    }

    #[test]
    fn failure_envelope_serializes_null_data() {
        let envelope: CallbackEnvelope<BalanceData> =
            CallbackEnvelope::failure(None, CallbackError::new(1003, "Invalid parameters"));
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json["data"].is_null());
        assert_eq!(json["error"]["code"], 1003);
        assert_eq!(json["error"]["message"], "Invalid parameters");
    }

    #[test]
    fn failure_envelope_can_carry_degraded_data() {
        let envelope = CallbackEnvelope::failure(
            Some(BalanceData {
                balance: "0.00".to_string(),
                currency: "USD".to_string(),
                player_operator_id: "ghost".to_string(),
            }),
            CallbackError::new(1004, "Player not found"),
        );
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["data"]["balance"], "0.00");
        assert_eq!(json["error"]["code"], 1004);
    }
}
