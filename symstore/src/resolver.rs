//! Download URL resolution for cloud symbol stores.
//!
//! A cloud store does not expose a fixed directory layout. Instead a lookup
//! service maps `(build id, filename)` to a short-lived download URL, which is
//! then fetched like any other HTTP symbol file.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::BoxFuture;

/// Errors returned by a [`SymbolUrlResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The service has no symbol file for the requested identity.
    #[error("symbol file not found")]
    NotFound,

    /// The service could not be reached or returned an unusable answer.
    #[error("{0}")]
    Failed(String),
}

/// Maps a build id and filename to a download URL.
pub trait SymbolUrlResolver: Send + Sync {
    /// Ask the lookup service for a download URL.
    ///
    /// `build_id_hex` is the lowercase hex form of the build id.
    fn resolve_download_url<'a>(
        &'a self,
        build_id_hex: &'a str,
        filename: &'a str,
    ) -> BoxFuture<'a, Result<String, ResolveError>>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadUrlResponse {
    download_url: String,
}

/// Resolver talking to a REST lookup service.
///
/// Issues `GET {endpoint}/symbols/{build_id_hex}/{filename}` and expects a
/// JSON body of the form `{"downloadUrl": "..."}`. A 404 maps to
/// [`ResolveError::NotFound`].
#[derive(Debug, Clone)]
pub struct RestUrlResolver {
    client: reqwest::Client,
    endpoint: String,
}

impl RestUrlResolver {
    /// Create a resolver for the service at `endpoint`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ResolveError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResolveError::Failed(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// URL of the lookup request for one symbol file.
    pub fn request_url(&self, build_id_hex: &str, filename: &str) -> String {
        format!(
            "{}/symbols/{}/{}",
            self.endpoint.trim_end_matches('/'),
            build_id_hex,
            urlencoding::encode(filename)
        )
    }
}

impl SymbolUrlResolver for RestUrlResolver {
    fn resolve_download_url<'a>(
        &'a self,
        build_id_hex: &'a str,
        filename: &'a str,
    ) -> BoxFuture<'a, Result<String, ResolveError>> {
        Box::pin(async move {
            let url = self.request_url(build_id_hex, filename);
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| ResolveError::Failed(format!("request to {} failed: {}", url, e)))?;

            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ResolveError::NotFound);
            }
            if !status.is_success() {
                return Err(ResolveError::Failed(format!("HTTP {} from {}", status, url)));
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| ResolveError::Failed(format!("failed to read response: {}", e)))?;
            let parsed: DownloadUrlResponse = serde_json::from_slice(&body)
                .map_err(|e| ResolveError::Failed(format!("invalid lookup response: {}", e)))?;

            Ok(parsed.download_url)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_encodes_filename() {
        let resolver =
            RestUrlResolver::new("https://lookup.example.com/v1/", Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            resolver.request_url("abcd", "lib foo.so"),
            "https://lookup.example.com/v1/symbols/abcd/lib%20foo.so"
        );
    }

    #[test]
    fn test_response_body_shape() {
        let parsed: DownloadUrlResponse =
            serde_json::from_str(r#"{"downloadUrl":"https://cdn.example.com/x"}"#).unwrap();
        assert_eq!(parsed.download_url, "https://cdn.example.com/x");
    }

    #[test]
    fn test_not_found_display() {
        assert_eq!(ResolveError::NotFound.to_string(), "symbol file not found");
    }
}
