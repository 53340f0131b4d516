//! Client configuration.
//!
//! The backend origin is fixed per deployment; `from_env` lets a host point
//! the client elsewhere without a rebuild. `bulk_update` selects between the
//! two shapes of the inventory form: with the "old owner / new owner" bulk
//! update and without it.

use std::time::Duration;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const URL_KEY: &str = "CAR_INVENTORY_URL";
const TIMEOUT_KEY: &str = "CAR_INVENTORY_TIMEOUT_SECS";
const BULK_UPDATE_KEY: &str = "CAR_INVENTORY_BULK_UPDATE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryConfig {
    pub base_url: String,
    /// Per-request limit. Read from the environment as whole seconds, never 0.
    pub timeout: Duration,
    pub bulk_update: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            bulk_update: true,
        }
    }
}

impl InventoryConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from a key lookup, falling back to defaults for
    /// missing keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(URL_KEY).filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(TIMEOUT_KEY) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| invalid(TIMEOUT_KEY, &raw))?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup(BULK_UPDATE_KEY) {
            config.bulk_update = parse_flag(&raw).ok_or_else(|| invalid(BULK_UPDATE_KEY, &raw))?;
        }

        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid(key: &str, value: &str) -> ApiError {
    ApiError::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
    }
}
