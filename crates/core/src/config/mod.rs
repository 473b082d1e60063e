//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (ANIMEDEX_*)
//! 2. TOML config file (if ANIMEDEX_CONFIG_FILE set)
//! 3. Built-in defaults

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

use crate::types::DEFAULT_PAGE_SIZE;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (ANIMEDEX_*)
/// 2. TOML config file (if ANIMEDEX_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin and version prefix of the upstream anime API.
    ///
    /// Set via ANIMEDEX_API_BASE_URL environment variable.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via ANIMEDEX_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via ANIMEDEX_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Items requested per list page.
    ///
    /// Set via ANIMEDEX_PAGE_SIZE environment variable.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// How long a list page is served from cache without refetching.
    ///
    /// Set via ANIMEDEX_LIST_STALE_MS environment variable.
    #[serde(default = "default_list_stale_ms")]
    pub list_stale_ms: u64,

    /// How long a detail record is served from cache without refetching.
    ///
    /// Set via ANIMEDEX_DETAIL_STALE_MS environment variable.
    #[serde(default = "default_detail_stale_ms")]
    pub detail_stale_ms: u64,

    /// Quiet period before search input triggers a fetch.
    ///
    /// Set via ANIMEDEX_SEARCH_DEBOUNCE_MS environment variable.
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
}

fn default_api_base_url() -> String {
    "https://api.jikan.moe/v4".into()
}

fn default_user_agent() -> String {
    "animedex/0.1".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_list_stale_ms() -> u64 {
    5_000
}

fn default_detail_stale_ms() -> u64 {
    600_000 // 10 minutes
}

fn default_search_debounce_ms() -> u64 {
    250
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            page_size: default_page_size(),
            list_stale_ms: default_list_stale_ms(),
            detail_stale_ms: default_detail_stale_ms(),
            search_debounce_ms: default_search_debounce_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn list_stale(&self) -> Duration {
        Duration::from_millis(self.list_stale_ms)
    }

    pub fn detail_stale(&self) -> Duration {
        Duration::from_millis(self.detail_stale_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `ANIMEDEX_`
    /// 2. TOML file from `ANIMEDEX_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("ANIMEDEX_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("ANIMEDEX_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into()),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
