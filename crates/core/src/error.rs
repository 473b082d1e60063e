//! Error types for the core crate.

use crate::config::ConfigError;

/// Errors raised while building core state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A location string could not be parsed into an absolute URL.
    #[error("INVALID_LOCATION: {0}")]
    InvalidLocation(String),

    /// Configuration could not be loaded or failed validation.
    #[error("CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),
}
