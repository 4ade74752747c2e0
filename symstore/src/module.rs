//! Module parser abstraction.
//!
//! The stores never look inside symbol files themselves. Reading a file's
//! build id and checking that it is a usable symbol file of the expected
//! format is delegated to a [`ModuleParser`] supplied by the caller.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::build_id::BuildId;
use crate::query::ModuleFormat;

/// Errors reported by a module parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleParseError {
    /// The file could not be read.
    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    /// The file is not a valid module of the expected format.
    #[error("{path} is not a valid symbol file: {reason}")]
    InvalidFile { path: String, reason: String },

    /// The file carries no build id.
    #[error("{0} has no build id")]
    MissingBuildId(String),
}

/// Reads identities from, and validates, symbol files on disk.
///
/// Implementations are called from the blocking thread pool and may perform
/// synchronous I/O.
pub trait ModuleParser: Send + Sync {
    /// Extract the build id of the module at `path`.
    fn read_build_id(
        &self,
        path: &Path,
        is_debug_info_file: bool,
        format: ModuleFormat,
    ) -> Result<BuildId, ModuleParseError>;

    /// Check that `path` is a usable symbol file of `format`.
    ///
    /// When `is_debug_info_file` is set, the file must carry debug info.
    fn verify_symbol_file(
        &self,
        path: &Path,
        is_debug_info_file: bool,
        format: ModuleFormat,
    ) -> Result<(), ModuleParseError>;
}

/// Run [`ModuleParser::read_build_id`] on the blocking pool.
pub(crate) async fn read_build_id(
    parser: &Arc<dyn ModuleParser>,
    path: &Path,
    is_debug_info_file: bool,
    format: ModuleFormat,
) -> Result<BuildId, ModuleParseError> {
    let parser = Arc::clone(parser);
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || parser.read_build_id(&owned, is_debug_info_file, format))
        .await
        .unwrap_or_else(|e| {
            Err(ModuleParseError::ReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        })
}

/// Run [`ModuleParser::verify_symbol_file`] on the blocking pool.
pub(crate) async fn verify_symbol_file(
    parser: &Arc<dyn ModuleParser>,
    path: &Path,
    is_debug_info_file: bool,
    format: ModuleFormat,
) -> Result<(), ModuleParseError> {
    let parser = Arc::clone(parser);
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        parser.verify_symbol_file(&owned, is_debug_info_file, format)
    })
    .await
    .unwrap_or_else(|e| {
        Err(ModuleParseError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    })
}
