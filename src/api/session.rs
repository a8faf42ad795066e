// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP surface for spin-session events.
//!
//! Event responses are provider-shaped query strings served as plain
//! text; the free-spin grant endpoint answers JSON.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::ledger::LedgerError;
use crate::session::{FreeSpinState, SessionError};
use crate::state::AppState;

/// Free-spin grant request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FreeSpinGrant {
    /// Number of spins to grant. Must be at least 1.
    pub total: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FreeSpinResponse {
    pub code: u16,
    pub status: String,
    pub data: FreeSpinState,
}

fn session_error_response(err: SessionError) -> Response {
    match err {
        SessionError::NotInitialized(token) => {
            info!(token = %token, "Session event rejected: not initialized");
            ApiError::bad_request("Session not initialized").into_response()
        }
        SessionError::MissingField(field) => {
            info!(field, "Session event rejected: missing field");
            ApiError::bad_request(format!("Missing required field: {field}")).into_response()
        }
        SessionError::Ledger(LedgerError::PlayerNotFound) => {
            ApiError::bad_request("Player not found").into_response()
        }
        SessionError::Ledger(LedgerError::InvalidKey(_)) => {
            ApiError::bad_request("Invalid parameters").into_response()
        }
        SessionError::Ledger(LedgerError::Storage(e)) => {
            error!(error = %e, "Session event failed on storage");
            ApiError::internal("Unknown error").into_response()
        }
        SessionError::Provider(e) => {
            error!(error = %e, "Session event failed on provider");
            ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Provider unavailable")
                .into_response()
        }
    }
}

/// Handle a spin-session event for a token.
///
/// The `action` field selects the flow; the rest of the body is the
/// provider payload, passed through untouched.
#[utoipa::path(
    post,
    path = "/session/{token}/event",
    tag = "Sessions",
    params(("token" = String, Path, description = "Opaque session token")),
    responses(
        (status = 200, description = "Provider-shaped query string", content_type = "text/plain"),
        (status = 400, description = "Unknown session or malformed payload"),
        (status = 503, description = "Upstream provider unavailable")
    )
)]
pub async fn event(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<Value>,
) -> Response {
    if !state.sessions.is_active() {
        return ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Service inactive")
            .into_response();
    }

    let Some(action) = payload.get("action").and_then(Value::as_str).map(String::from) else {
        return ApiError::bad_request("Missing required field: action").into_response();
    };

    match state.sessions.game_event(&token, &action, &payload).await {
        Ok(query) => (StatusCode::OK, query).into_response(),
        Err(err) => session_error_response(err),
    }
}

/// Grant free spins on an initialized session.
#[utoipa::path(
    post,
    path = "/session/{token}/freespins",
    tag = "Sessions",
    params(("token" = String, Path, description = "Opaque session token")),
    request_body = FreeSpinGrant,
    responses(
        (status = 200, description = "The new free-spin state", body = FreeSpinResponse),
        (status = 400, description = "Unknown session or zero total")
    )
)]
pub async fn grant_freespins(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(grant): Json<FreeSpinGrant>,
) -> Response {
    if grant.total == 0 {
        return ApiError::bad_request("total must be at least 1").into_response();
    }

    match state.sessions.grant_freespins(&token, grant.total) {
        Ok(fs_state) => {
            info!(token = %token, total = grant.total, "Free spins granted");
            Json(FreeSpinResponse {
                code: 200,
                status: "success".to_string(),
                data: fs_state,
            })
            .into_response()
        }
        Err(err) => session_error_response(err),
    }
}
