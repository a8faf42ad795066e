// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        BalanceData, BalanceRequest, CallbackError, GameRequest, PingData, PingRequest,
        StatusMessage,
    },
    session::FreeSpinState,
    state::AppState,
    storage::{GameProvider, StoredGame, StoredLog},
};

pub mod callback;
pub mod games;
pub mod health;
pub mod logs;
pub mod session;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/ping", post(callback::ping))
        .route("/balance", post(callback::balance))
        .route("/game", post(callback::game))
        .route("/list", get(logs::list))
        .route("/games/{gid}", get(games::get_game))
        .route("/session/{token}/event", post(session::event))
        .route("/session/{token}/freespins", post(session::grant_freespins))
        .route("/health/ready", get(health::readiness))
        .route("/health/live", get(health::liveness))
        .with_state(state);

    routes
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        callback::ping,
        callback::balance,
        callback::game,
        logs::list,
        games::get_game,
        session::event,
        session::grant_freespins,
        health::readiness,
        health::liveness
    ),
    components(
        schemas(
            PingRequest,
            PingData,
            BalanceRequest,
            BalanceData,
            GameRequest,
            CallbackError,
            StatusMessage,
            StoredLog,
            StoredGame,
            GameProvider,
            logs::LogPage,
            games::GameResponse,
            games::GameDetails,
            games::GameInfo,
            session::FreeSpinGrant,
            session::FreeSpinResponse,
            FreeSpinState,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Callbacks", description = "Signed provider callbacks"),
        (name = "Logs", description = "Transaction log queries"),
        (name = "Games", description = "Games list lookups"),
        (name = "Sessions", description = "Spin-session events"),
        (name = "Health", description = "Probes")
    )
)]
struct ApiDoc;
