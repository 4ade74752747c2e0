//! Error types for symbol store operations.

use std::error::Error as StdError;

use thiserror::Error;

/// Boxed cause carried by [`StoreError::Store`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type for symbol store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while searching or populating symbol stores.
///
/// Lookups recover from almost everything locally and report a miss instead.
/// The variants below surface only from directly invoked operations, or from
/// a server insertion that could not copy the file anywhere.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required argument was empty or invalid.
    #[error("{0}")]
    Usage(String),

    /// The store does not accept new files.
    #[error("{0}")]
    Unsupported(String),

    /// I/O, network, or copy failure.
    #[error("{message}")]
    Store {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Operation reserved for a store that must never receive it.
    #[error("{0}")]
    NotImplemented(String),
}

impl StoreError {
    /// Create a store failure without an underlying cause.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Create a store failure wrapping the error that caused it.
    pub fn store_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Store {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Whether a cascade may log this error and move on to the next store.
    pub(crate) fn is_recoverable(&self) -> bool {
        !matches!(self, Self::NotImplemented(_))
    }
}

/// Messages shown to users when a lookup or copy is rejected.
pub(crate) mod messages {
    pub const FILENAME_EMPTY: &str = "Filename is null or empty.";
    pub const PATH_EMPTY: &str = "Path is null or empty.";
    pub const URL_EMPTY: &str = "URL is null or empty.";
    pub const EMPTY_BUILD_ID: &str = "Build ID is unknown.";
    pub const DESTINATION_EMPTY: &str = "Destination path is null or empty.";
    pub const COPY_TO_FLAT_STORE: &str =
        "Copying files to flat symbol directories is not supported.";
    pub const COPY_TO_HTTP_STORE: &str = "Copying files to http symbol stores is not supported.";
    pub const COPY_TO_CLOUD_STORE: &str = "Copying files to cloud symbol stores is not supported.";
    pub const COPY_TO_SEQUENCE: &str = "Copying files to symbol store sequences is not supported.";
    pub const COPY_TO_NULL_STORE: &str = "Null symbol stores never receive files.";
}
