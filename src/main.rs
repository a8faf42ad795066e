// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::env;
use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use operator_callback_gateway::api::router;
use operator_callback_gateway::cache::CacheSweeper;
use operator_callback_gateway::config::GatewayConfig;
use operator_callback_gateway::ledger::format_amount;
use operator_callback_gateway::state::AppState;
use operator_callback_gateway::storage::{
    LogRepository, PlayerRepository, Storage, StoragePaths, StoredPlayer,
};

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration error");
            std::process::exit(1);
        }
    };

    let mut storage = Storage::new(StoragePaths::new(&config.data_dir));
    if let Err(e) = storage.initialize() {
        error!(error = %e, data_dir = %config.data_dir, "Failed to initialize storage");
        std::process::exit(1);
    }

    if config.seed_demo_data {
        if let Err(e) = seed_demo_data(&storage) {
            error!(error = %e, "Failed to seed demo data");
            std::process::exit(1);
        }
    }

    let state = match AppState::new(config, storage) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Failed to build provider client");
            std::process::exit(1);
        }
    };

    let shutdown = CancellationToken::new();
    let sweeper = CacheSweeper::new(state.cache.clone(), state.config.cache_sweep_interval);
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown.clone()));

    let app = router(state);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);
    let addr: SocketAddr = match format!("{host}:{port}").parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(error = %e, host, port, "Failed to parse bind address");
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, %addr, "Failed to bind");
            std::process::exit(1);
        }
    };

    info!(%addr, "Operator callback gateway listening (docs at /docs)");

    let server_shutdown = shutdown.clone();
    let result = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            server_shutdown.cancel();
        })
        .await;

    if let Err(e) = result {
        error!(error = %e, "Server error");
    }

    shutdown.cancel();
    let _ = sweeper_handle.await;
    info!("Shutdown complete");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let json = env::var("LOG_FORMAT").is_ok_and(|v| v == "json");

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Seed a demo player and a handful of log entries on an empty store.
fn seed_demo_data(
    storage: &Storage,
) -> Result<(), operator_callback_gateway::storage::StorageError> {
    let players = PlayerRepository::new(storage);
    if players.count()? > 0 {
        return Ok(());
    }

    let balance = "100.00".parse().unwrap_or_default();
    players.create(&StoredPlayer::new("100", balance))?;

    let logs = LogRepository::new(storage);
    for i in 1..=5 {
        logs.append(format!("Log entry {i} - Initial seed"))?;
    }

    info!(
        player_operator_id = "100",
        balance = %format_amount(balance),
        "Seeded demo player and log entries"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
