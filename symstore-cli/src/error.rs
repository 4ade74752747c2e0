//! CLI error type.

use symstore::config::ConfigError;
use symstore::logging::LoggingError;
use symstore::{BuildIdParseError, HttpError, ResolveError, StoreError};
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid build id: {0}")]
    BuildId(#[from] BuildIdParseError),

    #[error("HTTP client error: {0}")]
    Http(#[from] HttpError),

    #[error("Cloud lookup error: {0}")]
    Resolver(#[from] ResolveError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The requested file was not found in any store.
    #[error("'{0}' not found in any symbol store")]
    NotFound(String),

    #[error("Failed to format output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound(_) => 2,
            _ => 1,
        }
    }
}
