// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names and default values used throughout the
//! gateway. Configuration is loaded from the environment at startup; the
//! operator secret and key are never compiled into source.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `OPERATOR_SECRET` | Shared secret used for ping hash verification | Required |
//! | `OPERATOR_KEY` | Operator key used for game signature verification | Required |
//! | `DATA_DIR` | Root directory for gateway storage | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `GATEWAY_ACTIVE` | Whether callbacks are serviced (`true`/`false`) | `true` |
//! | `CACHE_SWEEP_SECS` | Interval between session-cache expiry sweeps | `600` |
//! | `PROVIDER_TOKEN_URL` | Provider token endpoint (spin sessions) | unset |
//! | `PROVIDER_TIMEOUT_SECS` | Timeout for provider HTTP calls | `10` |
//! | `SEED_DEMO_DATA` | Seed a demo player and log entries on first boot | `false` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::time::Duration;

/// Environment variable name for the gateway data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Default root directory for gateway storage.
pub const DEFAULT_DATA_DIR: &str = "/data";

/// Default interval between session-cache expiry sweeps.
pub const DEFAULT_CACHE_SWEEP_SECS: u64 = 600;

/// Default timeout applied to all outbound provider HTTP calls.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;

/// Errors raised while loading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable missing: {0}")]
    MissingVar(String),

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

/// Gateway configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Shared secret bound into the ping hash.
    pub operator_secret: String,
    /// Operator key bound into the game signature.
    pub operator_key: String,
    /// Whether callbacks are serviced. When false every callback endpoint
    /// answers 503 "Service inactive".
    pub active: bool,
    /// Root directory for gateway storage.
    pub data_dir: String,
    /// Interval between session-cache expiry sweeps.
    pub cache_sweep_interval: Duration,
    /// Provider token endpoint, if spin sessions fetch live tokens.
    pub provider_token_url: Option<String>,
    /// Timeout applied to provider HTTP calls.
    pub provider_timeout: Duration,
    /// Seed a demo player and log entries when storage is empty.
    pub seed_demo_data: bool,
}

impl GatewayConfig {
    /// Load configuration from the environment.
    ///
    /// Fails if `OPERATOR_SECRET` or `OPERATOR_KEY` is absent; everything
    /// else falls back to documented defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let operator_secret = env_required("OPERATOR_SECRET")?;
        let operator_key = env_required("OPERATOR_KEY")?;
        let active = parse_bool("GATEWAY_ACTIVE", true)?;
        let data_dir = env_or_default(DATA_DIR_ENV, DEFAULT_DATA_DIR);
        let cache_sweep_interval =
            Duration::from_secs(parse_u64("CACHE_SWEEP_SECS", DEFAULT_CACHE_SWEEP_SECS)?);
        let provider_token_url = env_optional("PROVIDER_TOKEN_URL");
        let provider_timeout = Duration::from_secs(parse_u64(
            "PROVIDER_TIMEOUT_SECS",
            DEFAULT_PROVIDER_TIMEOUT_SECS,
        )?);
        let seed_demo_data = parse_bool("SEED_DEMO_DATA", false)?;

        Ok(Self {
            operator_secret,
            operator_key,
            active,
            data_dir,
            cache_sweep_interval,
            provider_token_url,
            provider_timeout,
            seed_demo_data,
        })
    }
}

fn env_optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_required(name: &str) -> Result<String, ConfigError> {
    env_optional(name).ok_or_else(|| ConfigError::MissingVar(name.to_string()))
}

fn env_or_default(name: &str, default: &str) -> String {
    env_optional(name).unwrap_or_else(|| default.to_string())
}

fn parse_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match env_optional(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw,
        }),
    }
}

fn parse_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match env_optional(name) {
        None => Ok(default),
        Some(raw) => match raw.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                name: name.to_string(),
                value: raw,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_parsing_accepts_common_spellings() {
        std::env::remove_var("GATEWAY_TEST_FLAG_UNSET");
        assert!(parse_bool("GATEWAY_TEST_FLAG_UNSET", true).unwrap());

        std::env::set_var("GATEWAY_TEST_FLAG", "false");
        assert!(!parse_bool("GATEWAY_TEST_FLAG", true).unwrap());
        std::env::set_var("GATEWAY_TEST_FLAG", "1");
        assert!(parse_bool("GATEWAY_TEST_FLAG", false).unwrap());
        std::env::set_var("GATEWAY_TEST_FLAG", "banana");
        assert!(parse_bool("GATEWAY_TEST_FLAG", false).is_err());
        std::env::remove_var("GATEWAY_TEST_FLAG");
    }

    #[test]
    fn required_var_missing_is_an_error() {
        std::env::remove_var("GATEWAY_TEST_REQUIRED_MISSING");
        assert!(env_required("GATEWAY_TEST_REQUIRED_MISSING").is_err());
    }
}
