// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Game catalog lookup by provider game identifier.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::storage::{GameProvider, GameRepository, StorageError, StoredGame};
use crate::state::AppState;

const MIN_GID_LEN: usize = 2;
const MAX_GID_LEN: usize = 255;

/// Catalog entry split into game and provider halves.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameDetails {
    pub game_info: GameInfo,
    pub provider_info: GameProvider,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GameInfo {
    pub gid: String,
    pub slug: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demolink: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GameResponse {
    pub code: u16,
    pub status: String,
    pub data: GameDetails,
}

#[derive(Debug, Serialize, ToSchema)]
struct GameError {
    code: u16,
    status: String,
    message: String,
}

fn game_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(GameError {
            code: status.as_u16(),
            status: "error".to_string(),
            message: message.into(),
        }),
    )
        .into_response()
}

impl From<StoredGame> for GameDetails {
    fn from(game: StoredGame) -> Self {
        Self {
            game_info: GameInfo {
                gid: game.gid,
                slug: game.slug,
                name: game.name,
                demolink: game.demolink,
            },
            provider_info: game.provider,
        }
    }
}

/// Look up a game by its provider identifier.
///
/// Falls back to a slug match when no record carries the gid directly.
#[utoipa::path(
    get,
    path = "/games/{gid}",
    tag = "Games",
    params(("gid" = String, Path, description = "Provider game identifier")),
    responses(
        (status = 200, description = "Game and provider details", body = GameResponse),
        (status = 400, description = "gid fails the length guard, or no game matches")
    )
)]
pub async fn get_game(State(state): State<AppState>, Path(gid): Path<String>) -> Response {
    // Guard is in characters, not bytes; a single multi-byte character
    // must still fail the minimum.
    let length = gid.chars().count();
    if length < MIN_GID_LEN || length > MAX_GID_LEN {
        info!(gid = %gid, "Game lookup rejected: gid length");
        return game_error(
            StatusCode::BAD_REQUEST,
            "Invalid gid parameter. Must be a string between 2 and 255 characters.",
        );
    }

    match GameRepository::new(&state.storage).get_with_fallback(&gid) {
        Ok(game) => {
            info!(gid = %gid, "Game lookup served");
            Json(GameResponse {
                code: 200,
                status: "success".to_string(),
                data: game.into(),
            })
            .into_response()
        }
        Err(StorageError::NotFound(_) | StorageError::InvalidIdentifier(_)) => {
            info!(gid = %gid, "Game lookup: not found");
            game_error(StatusCode::BAD_REQUEST, "Game with that gid not found.")
        }
        Err(e) => game_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
