//! HTTP client abstraction for testability.
//!
//! HTTP and cloud symbol stores only need three things from the network:
//! an existence probe (HEAD), a headers-only GET for servers that reject
//! HEAD, and a streaming download into a local file. The [`HttpClient`]
//! trait captures exactly that so stores can be exercised with mock clients.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::BoxFuture;

/// Default timeout for HTTP requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors reported by an [`HttpClient`].
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request could not be sent or the response could not be read.
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Writing the downloaded body failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Status line and headers of a probe request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,

    /// Canonical reason phrase for the status.
    pub reason: String,

    /// URL of the final request after redirects.
    pub final_url: String,

    /// Methods listed in the `Allow` header, upper case.
    pub allow: Vec<String>,
}

impl HttpResponse {
    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true if the final connection used https.
    pub fn is_encrypted(&self) -> bool {
        url::Url::parse(&self.final_url)
            .map(|u| u.scheme() == "https")
            .unwrap_or(false)
    }

    /// Host of the final URL, for diagnostics.
    pub fn host(&self) -> String {
        url::Url::parse(&self.final_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| self.final_url.clone())
    }

    /// Returns true if the server advertises `method` in its `Allow` header.
    pub fn allows(&self, method: &str) -> bool {
        self.allow.iter().any(|m| m.eq_ignore_ascii_case(method))
    }
}

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Send a HEAD request and return the status line and headers.
    fn head<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, HttpError>>;

    /// Send a GET request but only read the status line and headers.
    fn get_headers<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, HttpError>>;

    /// Download `url` into the file at `dest`, returning the byte count.
    ///
    /// `dest` is created or truncated. Non-success statuses are errors.
    fn download<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
    ) -> BoxFuture<'a, Result<u64, HttpError>>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("symstore/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Request {
                url: String::new(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }

    fn request_error(url: &str, e: reqwest::Error) -> HttpError {
        HttpError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }

    fn to_response(response: &reqwest::Response) -> HttpResponse {
        let status = response.status();
        let allow = response
            .headers()
            .get_all(reqwest::header::ALLOW)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(|m| m.trim().to_uppercase())
            .filter(|m| !m.is_empty())
            .collect();

        HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            final_url: response.url().to_string(),
            allow,
        }
    }
}

impl HttpClient for ReqwestClient {
    fn head<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, HttpError>> {
        Box::pin(async move {
            let response = self
                .client
                .head(url)
                .send()
                .await
                .map_err(|e| Self::request_error(url, e))?;
            Ok(Self::to_response(&response))
        })
    }

    fn get_headers<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, HttpError>> {
        Box::pin(async move {
            // Dropping the response without reading the body aborts the transfer.
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| Self::request_error(url, e))?;
            Ok(Self::to_response(&response))
        })
    }

    fn download<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
    ) -> BoxFuture<'a, Result<u64, HttpError>> {
        Box::pin(async move {
            let mut response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| Self::request_error(url, e))?;

            if !response.status().is_success() {
                return Err(HttpError::Status {
                    url: url.to_string(),
                    status: response.status().as_u16(),
                });
            }

            let mut file = tokio::fs::File::create(dest).await?;
            let mut written = 0u64;
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|e| Self::request_error(url, e))?
            {
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;

            Ok(written)
        })
    }
}
