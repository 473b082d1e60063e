//! Core types and shared functionality for animedex.
//!
//! This crate provides:
//! - Domain types and cache query keys
//! - URL state synchronization over an in-memory history
//! - Search debounce
//! - Controller intents
//! - Layered configuration

pub mod config;
pub mod debounce;
pub mod error;
pub mod intent;
pub mod types;
pub mod url_state;

pub use config::{AppConfig, ConfigError};
pub use debounce::Debouncer;
pub use error::Error;
pub use intent::Intent;
pub use types::{AnimeDetail, AnimeSummary, ListPayload, PageState, Pagination, QueryKey, ResourceKind};
pub use url_state::{History, Route, UrlSync};
