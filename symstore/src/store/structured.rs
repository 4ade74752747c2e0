//! Structured symbol store: `root/name/BUILDID/name`.
//!
//! This is the layout symbol servers publish and the only local layout that
//! can take new files, which makes it the usual cache.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use super::{check_filename_component, is_file, require_filename};
use crate::build_id::BuildId;
use crate::error::{messages, StoreError, StoreResult};
use crate::file_ref::FileReference;
use crate::query::ModuleSearchQuery;

/// File whose presence marks a directory as a structured store.
pub const MARKER_FILE_NAME: &str = "pingme.txt";

/// Directory laid out as `name/BUILDID/name`.
#[derive(Debug, Clone, Serialize)]
pub struct StructuredSymbolStore {
    path: PathBuf,
    is_cache: bool,
}

impl StructuredSymbolStore {
    pub fn new(path: impl Into<PathBuf>, is_cache: bool) -> StoreResult<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(StoreError::Usage(messages::PATH_EMPTY.to_string()));
        }
        Ok(Self { path, is_cache })
    }

    /// Returns true if `path` carries the structured store marker.
    pub fn is_structured_store(path: &Path) -> bool {
        path.join(MARKER_FILE_NAME).is_file()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_cache(&self) -> bool {
        self.is_cache
    }

    /// Location a file with this name and build id would occupy.
    pub fn file_path(&self, filename: &str, build_id: &BuildId) -> PathBuf {
        self.path
            .join(filename)
            .join(build_id.to_path_name())
            .join(filename)
    }

    pub(crate) async fn find_file(
        &self,
        query: &ModuleSearchQuery,
    ) -> StoreResult<Option<FileReference>> {
        require_filename(&query.filename)?;

        if query.build_id.is_empty() {
            debug!(
                store = %self.path.display(),
                filename = %query.filename,
                "{}", messages::EMPTY_BUILD_ID
            );
            return Ok(None);
        }

        if let Err(reason) = check_filename_component(&query.filename) {
            debug!(
                store = %self.path.display(),
                filename = %query.filename,
                "Invalid file name: {}", reason
            );
            return Ok(None);
        }

        let filepath = self.file_path(&query.filename, &query.build_id);
        if !is_file(&filepath).await {
            debug!(path = %filepath.display(), "File not found");
            return Ok(None);
        }

        debug!(path = %filepath.display(), "Found file");
        Ok(Some(FileReference::local(filepath)))
    }

    pub(crate) async fn add_file(
        &self,
        source: &FileReference,
        filename: &str,
        build_id: &BuildId,
    ) -> StoreResult<FileReference> {
        require_filename(filename)?;
        if build_id.is_empty() {
            return Err(StoreError::Usage(messages::EMPTY_BUILD_ID.to_string()));
        }

        let copied = async {
            check_filename_component(filename).map_err(StoreError::store)?;
            self.add_marker_file_if_needed().await?;
            let destination = self.file_path(filename, build_id);
            source.copy_to(&destination).await?;
            Ok::<PathBuf, StoreError>(destination)
        }
        .await;

        match copied {
            Ok(destination) => {
                info!(
                    source = %source.location(),
                    destination = %destination.display(),
                    "Copied file to symbol store"
                );
                Ok(FileReference::local(destination))
            }
            Err(e) => Err(StoreError::store_with(
                format!(
                    "Could not copy '{}' to symbol store '{}'. {}",
                    filename,
                    self.path.display(),
                    e
                ),
                e,
            )),
        }
    }

    /// Create the marker file unless it already exists.
    ///
    /// Safe to call concurrently; the marker is opened in create mode and never
    /// truncated.
    pub async fn add_marker_file_if_needed(&self) -> StoreResult<()> {
        let marker = self.path.join(MARKER_FILE_NAME);
        if is_file(&marker).await {
            return Ok(());
        }

        let created = async {
            tokio::fs::create_dir_all(&self.path).await?;
            tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&marker)
                .await?;
            Ok::<(), std::io::Error>(())
        }
        .await;

        created.map_err(|e| {
            StoreError::store_with(
                format!("Could not create marker file '{}'. {}", marker.display(), e),
                e,
            )
        })
    }
}
