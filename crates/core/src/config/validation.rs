//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Upper bound the upstream API accepts for `limit`.
const MAX_PAGE_SIZE: u32 = 25;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `api_base_url` is empty, and
    /// `ConfigError::Invalid` if:
    /// - `api_base_url` is not an absolute http(s) URL
    /// - `page_size` is 0 or exceeds 25
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `search_debounce_ms` exceeds 10 seconds
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "api_base_url".into(),
                hint: "Set ANIMEDEX_API_BASE_URL environment variable".into(),
            });
        }
        match url::Url::parse(self.api_base_url.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(ConfigError::Invalid {
                    field: "api_base_url".into(),
                    reason: format!("unsupported scheme: {}", url.scheme()),
                });
            }
            Err(e) => return Err(ConfigError::Invalid { field: "api_base_url".into(), reason: e.to_string() }),
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid {
                field: "page_size".into(),
                reason: format!("must be between 1 and {MAX_PAGE_SIZE}"),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.search_debounce_ms > 10_000 {
            return Err(ConfigError::Invalid {
                field: "search_debounce_ms".into(),
                reason: "must not exceed 10 seconds (10000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.list_stale_ms == 0 {
            tracing::warn!("list_stale_ms is 0; every list render will refetch from the network");
        }

        Ok(())
    }
}
