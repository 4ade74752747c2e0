//! HTTP symbol server using the `url/name/BUILDID/name` layout.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::require_filename;
use crate::build_id::BuildId;
use crate::error::{messages, StoreError, StoreResult};
use crate::file_ref::FileReference;
use crate::http::{HttpClient, HttpError, HttpResponse};
use crate::negative_cache::NegativeCache;
use crate::query::ModuleSearchQuery;

/// Remote symbol server reached over HTTP.
#[derive(Serialize)]
pub struct HttpSymbolStore {
    url: String,
    #[serde(skip)]
    client: Arc<dyn HttpClient>,
    #[serde(skip)]
    negative_cache: NegativeCache<(String, BuildId)>,
}

impl HttpSymbolStore {
    pub fn new(client: Arc<dyn HttpClient>, url: impl Into<String>) -> StoreResult<Self> {
        let url = url.into();
        if url.is_empty() {
            return Err(StoreError::Usage(messages::URL_EMPTY.to_string()));
        }
        Ok(Self {
            url,
            client,
            negative_cache: NegativeCache::new(),
        })
    }

    /// Returns true if `element` is an absolute http or https URL.
    pub fn is_http_store(element: &str) -> bool {
        url::Url::parse(element)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Keys this store has confirmed absent or present.
    pub fn negative_cache(&self) -> &NegativeCache<(String, BuildId)> {
        &self.negative_cache
    }

    /// URL a file with this name and build id is served at.
    pub fn file_url(&self, filename: &str, build_id: &BuildId) -> String {
        let encoded = urlencoding::encode(filename);
        format!(
            "{}/{}/{}/{}",
            self.url.trim_end_matches('/'),
            encoded,
            build_id.to_path_name(),
            encoded
        )
    }

    pub(crate) async fn find_file(
        &self,
        query: &ModuleSearchQuery,
    ) -> StoreResult<Option<FileReference>> {
        require_filename(&query.filename)?;

        if query.build_id.is_empty() {
            debug!(
                store = %self.url,
                filename = %query.filename,
                "{}", messages::EMPTY_BUILD_ID
            );
            return Ok(None);
        }

        let key = (query.filename.clone(), query.build_id.clone());
        if query.force_load {
            self.negative_cache.evict(&key);
        } else if self.negative_cache.is_known_absent(&key) {
            debug!(
                store = %self.url,
                filename = %query.filename,
                build_id = %query.build_id,
                "File previously not found; force a load to check again"
            );
            return Ok(None);
        }

        let file_url = self.file_url(&query.filename, &query.build_id);
        let response = match self.probe(&file_url).await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %file_url, error = %e, "Request failed");
                self.negative_cache.record_absent(key);
                return Ok(None);
            }
        };

        if !response.is_encrypted() {
            warn!(
                host = %response.host(),
                "Symbol server connection is not encrypted"
            );
        }

        if !response.is_success() {
            debug!(
                url = %file_url,
                status = response.status,
                reason = %response.reason,
                "File not found"
            );
            self.negative_cache.record_absent(key);
            return Ok(None);
        }

        self.negative_cache.record(key, true);
        debug!(url = %file_url, "Found file");
        Ok(Some(FileReference::http(file_url, Arc::clone(&self.client))))
    }

    /// HEAD the URL, retrying with a headers-only GET when HEAD is refused.
    async fn probe(&self, url: &str) -> Result<HttpResponse, HttpError> {
        probe(self.client.as_ref(), url).await
    }
}

/// Check whether `url` exists without downloading the body.
pub(super) async fn probe(client: &dyn HttpClient, url: &str) -> Result<HttpResponse, HttpError> {
    let response = client.head(url).await?;
    if response.status == 405 && response.allows("GET") {
        return client.get_headers(url).await;
    }
    Ok(response)
}
