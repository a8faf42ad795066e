// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Operator callback endpoints: ping, balance, and game.
//!
//! Error convention (documented contract): validation and signature
//! failures answer 400 before any side effect, domain not-found outcomes
//! answer 200 with a populated `error` object, and unexpected failures
//! answer 500 with code 1000 and no internal detail.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info};

use crate::error::codes;
use crate::ledger::{
    format_amount, parse_amount, BalanceStore, LedgerError, TransactionLedger, WagerEvent,
    ZERO_BALANCE,
};
use crate::models::{
    BalanceData, BalanceRequest, CallbackEnvelope, CallbackError, GameRequest, PingData,
    PingRequest, StatusMessage,
};
use crate::signature::{ping_hash, verify_game_sign, GameSignFields};
use crate::state::AppState;

fn service_inactive() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(StatusMessage::error("Service inactive")),
    )
        .into_response()
}

/// Ping callback: prove knowledge of the shared secret.
#[utoipa::path(
    post,
    path = "/ping",
    tag = "Callbacks",
    request_body = PingRequest,
    responses(
        (status = 200, description = "Hash over the shared secret and salt"),
        (status = 400, description = "salt_sign missing", body = StatusMessage),
        (status = 503, description = "Service inactive", body = StatusMessage)
    )
)]
pub async fn ping(State(state): State<AppState>, Json(request): Json<PingRequest>) -> Response {
    if !state.config.active {
        return service_inactive();
    }

    let Some(salt_sign) = request.salt_sign.filter(|s| !s.is_empty()) else {
        info!("Ping: salt_sign missing");
        return (
            StatusCode::BAD_REQUEST,
            Json(StatusMessage::error("salt_sign is required")),
        )
            .into_response();
    };

    let hash = ping_hash(&state.config.operator_secret, &salt_sign);
    info!(salt_sign = %salt_sign, "Ping verified");

    Json(CallbackEnvelope::success(PingData {
        status: "success".to_string(),
        hash,
        salt_sign,
    }))
    .into_response()
}

/// Balance callback: resolve a player's current balance.
///
/// A missing player is a domain outcome, not a transport error: the
/// response is HTTP 200 with a zero balance and error code 1004.
#[utoipa::path(
    post,
    path = "/balance",
    tag = "Callbacks",
    request_body = BalanceRequest,
    responses(
        (status = 200, description = "Balance, or zero balance with error 1004"),
        (status = 400, description = "Required fields missing", body = StatusMessage),
        (status = 503, description = "Service inactive", body = StatusMessage)
    )
)]
pub async fn balance(
    State(state): State<AppState>,
    Json(request): Json<BalanceRequest>,
) -> Response {
    if !state.config.active {
        return service_inactive();
    }

    let (Some(player_operator_id), Some(currency)) = (
        request.player_operator_id.filter(|s| !s.is_empty()),
        request.currency.filter(|s| !s.is_empty()),
    ) else {
        info!("Balance: missing player_operator_id or currency");
        return (
            StatusCode::BAD_REQUEST,
            Json(StatusMessage::error(
                "player_operator_id and currency are required",
            )),
        )
            .into_response();
    };

    let zero = BalanceData {
        balance: ZERO_BALANCE.to_string(),
        currency: currency.clone(),
        player_operator_id: player_operator_id.clone(),
    };

    match BalanceStore::new(&state.storage).lookup(&player_operator_id) {
        Ok(current) => {
            info!(player_operator_id = %player_operator_id, "Balance resolved");
            Json(CallbackEnvelope::success(BalanceData {
                balance: format_amount(current),
                currency,
                player_operator_id,
            }))
            .into_response()
        }
        Err(LedgerError::PlayerNotFound | LedgerError::InvalidKey(_)) => {
            info!(player_operator_id = %player_operator_id, "Balance: player not found");
            Json(CallbackEnvelope::failure(
                Some(zero),
                CallbackError::new(codes::PLAYER_NOT_FOUND, "Player not found"),
            ))
            .into_response()
        }
        Err(LedgerError::Storage(e)) => {
            error!(error = %e, player_operator_id = %player_operator_id, "Balance lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CallbackEnvelope::failure(
                    Some(zero),
                    CallbackError::new(codes::UNKNOWN_ERROR, "Unknown error"),
                )),
            )
                .into_response()
        }
    }
}

/// Validated game callback, with monetary fields kept as received.
struct ValidatedGame {
    player_operator_id: String,
    bet: String,
    win: String,
    currency: String,
    game_id: String,
    sign: String,
    salt_sign: String,
    session_id: String,
}

fn validate_game(request: GameRequest) -> Option<ValidatedGame> {
    Some(ValidatedGame {
        player_operator_id: request.player_operator_id.filter(|s| !s.is_empty())?,
        bet: request.bet.filter(|s| !s.is_empty())?,
        win: request.win.filter(|s| !s.is_empty())?,
        currency: request.currency.filter(|s| !s.is_empty())?,
        game_id: request.game_id.filter(|s| !s.is_empty())?,
        sign: request.sign.filter(|s| !s.is_empty())?,
        salt_sign: request.salt_sign.filter(|s| !s.is_empty())?,
        session_id: request.session_id.filter(|s| !s.is_empty())?,
    })
}

fn game_failure(status: StatusCode, code: u32, message: &str) -> Response {
    (
        status,
        Json(CallbackEnvelope::<BalanceData>::failure(
            None,
            CallbackError::new(code, message),
        )),
    )
        .into_response()
}

/// Game callback: authenticate, then settle a bet/win pair.
#[utoipa::path(
    post,
    path = "/game",
    tag = "Callbacks",
    request_body = GameRequest,
    responses(
        (status = 200, description = "New balance, or error 1004 for a missing player"),
        (status = 400, description = "Invalid parameters (1003) or invalid signature (1001)"),
        (status = 500, description = "Unknown error (1000)"),
        (status = 503, description = "Service inactive", body = StatusMessage)
    )
)]
pub async fn game(State(state): State<AppState>, Json(request): Json<GameRequest>) -> Response {
    if !state.config.active {
        return service_inactive();
    }

    let Some(game) = validate_game(request) else {
        info!("Game: missing required parameters");
        return game_failure(
            StatusCode::BAD_REQUEST,
            codes::INVALID_PARAMETERS,
            "Invalid parameters",
        );
    };

    // Authentication happens before any parsing of the monetary fields:
    // the signature binds them exactly as received.
    let fields = GameSignFields {
        player_operator_id: &game.player_operator_id,
        bet: &game.bet,
        win: &game.win,
        currency: &game.currency,
        game_id: &game.game_id,
        salt_sign: &game.salt_sign,
    };
    if !verify_game_sign(&state.config.operator_key, &fields, &game.sign) {
        info!(
            player_operator_id = %game.player_operator_id,
            game_id = %game.game_id,
            "Game: invalid signature"
        );
        return game_failure(
            StatusCode::BAD_REQUEST,
            codes::INVALID_SIGNATURE,
            "Invalid signature",
        );
    }

    let (Some(bet), Some(win)) = (parse_amount(&game.bet), parse_amount(&game.win)) else {
        info!(bet = %game.bet, win = %game.win, "Game: malformed amounts");
        return game_failure(
            StatusCode::BAD_REQUEST,
            codes::INVALID_PARAMETERS,
            "Invalid parameters",
        );
    };

    let event = WagerEvent {
        player_operator_id: game.player_operator_id.clone(),
        bet,
        win,
        currency: game.currency.clone(),
        game_id: game.game_id.clone(),
        session_id: game.session_id.clone(),
    };

    match TransactionLedger::new(&state.storage).settle(&event) {
        Ok(new_balance) => Json(CallbackEnvelope::success(BalanceData {
            balance: format_amount(new_balance),
            currency: game.currency,
            player_operator_id: game.player_operator_id,
        }))
        .into_response(),
        Err(LedgerError::PlayerNotFound) => {
            info!(player_operator_id = %game.player_operator_id, "Game: player not found");
            game_failure(StatusCode::OK, codes::PLAYER_NOT_FOUND, "Player not found")
        }
        Err(LedgerError::InvalidKey(_)) => {
            info!(
                session_id = %game.session_id,
                game_id = %game.game_id,
                "Game: unsafe settlement identifier"
            );
            game_failure(
                StatusCode::BAD_REQUEST,
                codes::INVALID_PARAMETERS,
                "Invalid parameters",
            )
        }
        Err(LedgerError::Storage(e)) => {
            error!(
                error = %e,
                player_operator_id = %game.player_operator_id,
                session_id = %game.session_id,
                "Game settlement failed"
            );
            game_failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::UNKNOWN_ERROR,
                "Unknown error",
            )
        }
    }
}
