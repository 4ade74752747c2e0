//! Top-level search path.
//!
//! Members are searched in order. A cache member seen before a hit receives
//! one copy of the file, and local hits must pass verification before they
//! are returned.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::{require_filename, SymbolStore};
use crate::error::StoreResult;
use crate::file_ref::FileReference;
use crate::module::{self, ModuleParser};
use crate::query::ModuleSearchQuery;

#[derive(Serialize)]
pub struct SymbolStoreSequence {
    #[serde(skip)]
    module_parser: Arc<dyn ModuleParser>,
    stores: Vec<SymbolStore>,
}

impl SymbolStoreSequence {
    pub fn new(module_parser: Arc<dyn ModuleParser>) -> Self {
        Self {
            module_parser,
            stores: Vec::new(),
        }
    }

    pub fn add_store(&mut self, store: impl Into<SymbolStore>) {
        self.stores.push(store.into());
    }

    pub fn stores(&self) -> &[SymbolStore] {
        &self.stores
    }

    /// Returns true if any direct member is a cache.
    pub fn has_cache(&self) -> bool {
        self.stores.iter().any(SymbolStore::is_cache)
    }

    pub(crate) async fn find_file(
        &self,
        query: &ModuleSearchQuery,
    ) -> StoreResult<Option<FileReference>> {
        require_filename(&query.filename)?;

        // Members look up the plain module; the debug-info flag only applies
        // to verification.
        let member_query = query.clone().with_debug_info(false);
        let mut current_cache: Option<&SymbolStore> = None;

        for store in &self.stores {
            if let Some(mut found) = store.find_file(&member_query).await? {
                if !store.is_cache() {
                    if let Some(cache) = current_cache {
                        found = self.write_back(cache, found, query).await;
                    }
                }

                let accepted = match found.local_path() {
                    Some(path) => self.verify(path, query).await,
                    None => true,
                };
                if accepted {
                    return Ok(Some(found));
                }
            }

            if store.is_cache() {
                current_cache = Some(store);
            }
        }

        Ok(None)
    }

    /// Copy `found` into `cache`, keeping the original reference on failure.
    async fn write_back(
        &self,
        cache: &SymbolStore,
        found: FileReference,
        query: &ModuleSearchQuery,
    ) -> FileReference {
        match cache
            .add_file(&found, &query.filename, &query.build_id)
            .await
        {
            Ok(cached) => cached,
            Err(e) => {
                warn!(
                    filename = %query.filename,
                    build_id = %query.build_id,
                    error = %e,
                    "Could not copy file to cache"
                );
                found
            }
        }
    }

    /// Check that a local hit is a usable symbol file for `query`.
    async fn verify(&self, path: &Path, query: &ModuleSearchQuery) -> bool {
        if let Err(e) = module::verify_symbol_file(
            &self.module_parser,
            path,
            query.is_debug_info_file,
            query.module_format,
        )
        .await
        {
            warn!(path = %path.display(), error = %e, "Symbol file verification failed");
            return false;
        }

        if query.build_id.is_empty() {
            return true;
        }

        match module::read_build_id(
            &self.module_parser,
            path,
            query.is_debug_info_file,
            query.module_format,
        )
        .await
        {
            Ok(actual) if actual == query.build_id => true,
            Ok(actual) => {
                warn!(
                    path = %path.display(),
                    expected = %query.build_id,
                    actual = %actual,
                    "Build id mismatch"
                );
                false
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Could not read build id");
                false
            }
        }
    }
}
