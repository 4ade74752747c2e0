//! Cloud symbol store backed by a download-URL lookup service.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::http::probe;
use super::require_filename;
use crate::error::StoreResult;
use crate::file_ref::FileReference;
use crate::http::HttpClient;
use crate::negative_cache::NegativeCache;
use crate::query::ModuleSearchQuery;
use crate::resolver::{ResolveError, SymbolUrlResolver};

/// File whose presence marks a directory as a cloud store configuration.
pub const CLOUD_MARKER_FILE_NAME: &str = "cloud-store.txt";

/// Symbol store whose files are located through a [`SymbolUrlResolver`].
#[derive(Serialize)]
pub struct CloudSymbolStore {
    #[serde(skip)]
    client: Arc<dyn HttpClient>,
    #[serde(skip)]
    resolver: Arc<dyn SymbolUrlResolver>,
    #[serde(skip)]
    negative_cache: NegativeCache<(String, String)>,
}

impl CloudSymbolStore {
    pub fn new(client: Arc<dyn HttpClient>, resolver: Arc<dyn SymbolUrlResolver>) -> Self {
        Self {
            client,
            resolver,
            negative_cache: NegativeCache::new(),
        }
    }

    /// Returns true if `path` carries the cloud store marker.
    pub fn is_cloud_store(path: &Path) -> bool {
        path.join(CLOUD_MARKER_FILE_NAME).is_file()
    }

    /// Keys this store has confirmed absent or present.
    pub fn negative_cache(&self) -> &NegativeCache<(String, String)> {
        &self.negative_cache
    }

    pub(crate) async fn find_file(
        &self,
        query: &ModuleSearchQuery,
    ) -> StoreResult<Option<FileReference>> {
        require_filename(&query.filename)?;

        if query.build_id.is_empty() {
            debug!(filename = %query.filename, "Build ID is unknown; skipping cloud store");
            return Ok(None);
        }

        let hex = query.build_id.to_hex_string();
        let key = (query.filename.clone(), hex.clone());
        if query.force_load {
            self.negative_cache.evict(&key);
        } else if self.negative_cache.is_known_absent(&key) {
            debug!(
                filename = %query.filename,
                build_id = %hex,
                "File previously not found in cloud store; force a load to check again"
            );
            return Ok(None);
        }

        let url = match self.resolver.resolve_download_url(&hex, &query.filename).await {
            Ok(url) => url,
            Err(ResolveError::NotFound) => {
                debug!(filename = %query.filename, build_id = %hex, "Not found in cloud store");
                self.negative_cache.record_absent(key);
                return Ok(None);
            }
            Err(ResolveError::Failed(reason)) => {
                debug!(
                    filename = %query.filename,
                    build_id = %hex,
                    error = %reason,
                    "Cloud store lookup failed"
                );
                self.negative_cache.record_absent(key);
                return Ok(None);
            }
        };

        let response = match probe(self.client.as_ref(), &url).await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %url, error = %e, "Request failed");
                self.negative_cache.record_absent(key);
                return Ok(None);
            }
        };

        if !response.is_encrypted() {
            warn!(host = %response.host(), "Cloud store connection is not encrypted");
        }

        if response.status == 404 {
            debug!(url = %url, "Not found in cloud store");
            self.negative_cache.record_absent(key);
            return Ok(None);
        }
        if !response.is_success() {
            debug!(
                url = %url,
                status = response.status,
                reason = %response.reason,
                "Cloud store download unavailable"
            );
            self.negative_cache.record_absent(key);
            return Ok(None);
        }

        self.negative_cache.record(key, true);
        debug!(url = %url, "Found file in cloud store");
        Ok(Some(FileReference::http(url, Arc::clone(&self.client))))
    }
}
