//! Environment-driven defaults. Every value is read at call time so a
//! long-running server picks up changes between steps.

use crate::constants::{network, polling};

pub const ENV_SUBDOMAIN: &str = "LEGACY_USE_SUBDOMAIN";
pub const ENV_API_KEY: &str = "LEGACY_USE_API_KEY";
pub const ENV_BASE_URL: &str = "LEGACY_USE_BASE_URL";
pub const ENV_DISTINCT_ID: &str = "LEGACY_USE_DISTINCT_ID";
pub const ENV_HTTP_TIMEOUT_MS: &str = "LEGACY_USE_HTTP_TIMEOUT_MS";
pub const ENV_POLL_DELAY_MS: &str = "LEGACY_USE_POLL_DELAY_MS";
pub const ENV_POLL_LIMIT: &str = "LEGACY_USE_POLL_LIMIT";

pub fn read_env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn read_env_u64(key: &str) -> Option<u64> {
    read_env_string(key).and_then(|v| v.parse::<u64>().ok())
}

pub fn http_timeout_ms() -> u64 {
    read_env_u64(ENV_HTTP_TIMEOUT_MS)
        .filter(|v| *v > 0)
        .unwrap_or(network::TIMEOUT_API_REQUEST_MS)
}

pub fn distinct_id() -> String {
    read_env_string(ENV_DISTINCT_ID).unwrap_or_else(|| network::DEFAULT_DISTINCT_ID.to_string())
}

pub fn base_url_override() -> Option<String> {
    read_env_string(ENV_BASE_URL)
}

pub fn default_poll_delay_ms() -> u64 {
    read_env_u64(ENV_POLL_DELAY_MS).unwrap_or(polling::DEFAULT_DELAY_MS)
}

pub fn default_poll_limit() -> u64 {
    read_env_u64(ENV_POLL_LIMIT).unwrap_or(polling::DEFAULT_LIMIT)
}
