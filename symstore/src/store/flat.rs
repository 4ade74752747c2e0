//! Flat directory of symbol files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::{check_filename_component, is_file, require_filename};
use crate::error::{messages, StoreError, StoreResult};
use crate::file_ref::FileReference;
use crate::module::{self, ModuleParser};
use crate::query::ModuleSearchQuery;

/// Directory holding symbol files directly by name.
///
/// Files carry no build id in their path, so when a query has one the file's
/// own identity is read back and compared.
#[derive(Serialize)]
pub struct FlatSymbolStore {
    path: PathBuf,
    #[serde(skip)]
    module_parser: Arc<dyn ModuleParser>,
}

impl FlatSymbolStore {
    pub fn new(
        module_parser: Arc<dyn ModuleParser>,
        path: impl Into<PathBuf>,
    ) -> StoreResult<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(StoreError::Usage(messages::PATH_EMPTY.to_string()));
        }
        Ok(Self {
            path,
            module_parser,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) async fn find_file(
        &self,
        query: &ModuleSearchQuery,
    ) -> StoreResult<Option<FileReference>> {
        require_filename(&query.filename)?;

        if let Err(reason) = check_filename_component(&query.filename) {
            debug!(
                store = %self.path.display(),
                filename = %query.filename,
                "Invalid file name: {}", reason
            );
            return Ok(None);
        }

        let filepath = self.path.join(&query.filename);
        if !is_file(&filepath).await {
            debug!(path = %filepath.display(), "File not found");
            return Ok(None);
        }

        if !query.build_id.is_empty() {
            let actual = match module::read_build_id(
                &self.module_parser,
                &filepath,
                query.is_debug_info_file,
                query.module_format,
            )
            .await
            {
                Ok(id) => id,
                Err(e) => {
                    debug!(path = %filepath.display(), error = %e, "Could not read build id");
                    return Ok(None);
                }
            };

            if actual != query.build_id {
                debug!(
                    path = %filepath.display(),
                    expected = %query.build_id,
                    actual = %actual,
                    "Build id mismatch"
                );
                return Ok(None);
            }
        }

        debug!(path = %filepath.display(), "Found file");
        Ok(Some(FileReference::local(filepath)))
    }
}
