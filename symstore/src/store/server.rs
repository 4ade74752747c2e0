//! Symbol server: an ordered list of stores that fill each other.
//!
//! A hit at position `i` is copied backwards into every earlier member that
//! accepts files, so the next lookup is answered closer to the front. The
//! reference handed back is the copy made furthest forward.

use serde::Serialize;
use tracing::{debug, warn};

use super::{require_filename, SymbolStore};
use crate::build_id::BuildId;
use crate::error::{messages, StoreError, StoreResult};
use crate::file_ref::FileReference;
use crate::query::ModuleSearchQuery;

#[derive(Serialize)]
pub struct SymbolServer {
    is_cache: bool,
    stores: Vec<SymbolStore>,
}

impl SymbolServer {
    pub fn new(is_cache: bool) -> Self {
        Self {
            is_cache,
            stores: Vec::new(),
        }
    }

    /// Append a member; members are searched in insertion order.
    pub fn add_store(&mut self, store: impl Into<SymbolStore>) {
        self.stores.push(store.into());
    }

    pub fn stores(&self) -> &[SymbolStore] {
        &self.stores
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    pub fn is_cache(&self) -> bool {
        self.is_cache
    }

    pub(crate) async fn find_file(
        &self,
        query: &ModuleSearchQuery,
    ) -> StoreResult<Option<FileReference>> {
        require_filename(&query.filename)?;

        for (index, store) in self.stores.iter().enumerate() {
            let Some(found) = store.find_file(query).await? else {
                continue;
            };

            if index == 0 {
                return Ok(Some(found));
            }
            let cascaded = self
                .cascade(&found, &query.filename, &query.build_id, index - 1)
                .await?;
            return Ok(Some(cascaded.unwrap_or(found)));
        }

        Ok(None)
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

        let copied = match self.stores.len() {
            0 => None,
            len => self.cascade(source, filename, build_id, len - 1).await?,
        };

        copied.ok_or_else(|| {
            StoreError::store(format!(
                "Could not copy '{}' to any store in the symbol server.",
                filename
            ))
        })
    }

    /// Copy `source` into members `upper..=0`, each hop reading from the
    /// previous successful copy.
    ///
    /// Returns the reference produced by the last successful hop, if any.
    async fn cascade(
        &self,
        source: &FileReference,
        filename: &str,
        build_id: &BuildId,
        upper: usize,
    ) -> StoreResult<Option<FileReference>> {
        let mut current: Option<FileReference> = None;

        for store in self.stores[..=upper].iter().rev() {
            let from = current.as_ref().unwrap_or(source);
            let result = store.add_file(from, filename, build_id).await;
            match result {
                Ok(copied) => current = Some(copied),
                Err(e) if e.is_recoverable() => {
                    if matches!(e, StoreError::Unsupported(_)) {
                        debug!(store = store.kind(), filename, "Skipping store: {}", e);
                    } else {
                        warn!(store = store.kind(), filename, error = %e, "Could not copy file");
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Ok(current)
    }
}
