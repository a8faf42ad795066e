// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::cache::InMemoryCache;
use crate::config::GatewayConfig;
use crate::session::{ProviderClient, ProviderError, SpinSessionService};
use crate::storage::Storage;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub storage: Storage,
    pub cache: Arc<InMemoryCache>,
    pub sessions: Arc<SpinSessionService>,
}

impl AppState {
    pub fn new(config: GatewayConfig, storage: Storage) -> Result<Self, ProviderError> {
        let config = Arc::new(config);
        let cache = Arc::new(InMemoryCache::new());
        let provider = ProviderClient::new(
            config.provider_token_url.clone(),
            config.provider_timeout,
        )?;
        let sessions = Arc::new(SpinSessionService::new(
            config.clone(),
            storage.clone(),
            cache.clone(),
            provider,
        ));

        Ok(Self {
            config,
            storage,
            cache,
            sessions,
        })
    }
}
