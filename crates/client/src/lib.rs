//! Client code for animedex.
//!
//! This crate provides the HTTP adapter for the anime API, the keyed query
//! cache in front of it, and the list/detail screen controllers that read
//! from the cache.

pub mod api;
pub mod query;
pub mod view;

pub use api::{AnimeSource, ApiClient, ApiConfig, ApiError};
pub use query::{CacheEntry, Payload, QueryCache, QueryStatus, StalePolicy};
pub use view::{DetailController, DetailView, ListController, ListView, PageControls};
