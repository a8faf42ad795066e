// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Provider HTTP client for spin-session token retrieval.
//!
//! Every outbound call carries an explicit timeout; a timeout is a
//! retryable transient failure surfaced to the caller, never swallowed.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::warn;

/// Errors from the provider client.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider token endpoint not configured")]
    NotConfigured,

    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider response was invalid: {0}")]
    InvalidResponse(String),
}

/// Thin client for the provider's token endpoint.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    token_url: Option<String>,
    http: Client,
}

impl ProviderClient {
    /// Build a client with the given token endpoint and request timeout.
    pub fn new(token_url: Option<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { token_url, http })
    }

    /// Whether a token endpoint is configured.
    pub fn is_configured(&self) -> bool {
        self.token_url.is_some()
    }

    /// Fetch a fresh operator token from the provider.
    pub async fn fetch_token(&self) -> Result<String, ProviderError> {
        let url = self
            .token_url
            .as_deref()
            .ok_or(ProviderError::NotConfigured)?;

        let response = self.http.get(url).send().await.map_err(|e| {
            warn!(error = %e, "Provider token request failed");
            ProviderError::Request(e)
        })?;

        let body: Value = response.error_for_status()?.json().await?;
        body.get("token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::InvalidResponse("missing token field in response".to_string())
            })
    }
}
