//! Test doubles for the store collaborators.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::build_id::BuildId;
use crate::http::{HttpClient, HttpError, HttpResponse};
use crate::module::{ModuleParseError, ModuleParser};
use crate::query::ModuleFormat;
use crate::resolver::{ResolveError, SymbolUrlResolver};
use crate::BoxFuture;

const SYMBOL_PREFIX: &str = "symbols ";

/// Module parser over plain-text fixture files.
///
/// A valid symbol file contains `symbols <BUILDID>`. Anything else fails
/// verification.
#[derive(Default)]
pub struct FakeModuleParser {
    rejected: Mutex<HashSet<BuildId>>,
    debug_info_flags: Mutex<Vec<bool>>,
}

impl FakeModuleParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a symbol file carrying `build_id` to `path`.
    pub fn write_symbol_file(path: &Path, build_id: &BuildId) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, format!("{}{}", SYMBOL_PREFIX, build_id)).unwrap();
    }

    /// Make verification fail for files carrying `build_id`.
    pub fn reject(&self, build_id: BuildId) {
        self.rejected.lock().insert(build_id);
    }

    /// `is_debug_info_file` of every call, in order.
    pub fn debug_info_flags(&self) -> Vec<bool> {
        self.debug_info_flags.lock().clone()
    }

    fn read(path: &Path) -> Result<String, ModuleParseError> {
        std::fs::read_to_string(path).map_err(|e| ModuleParseError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn parse(path: &Path, contents: &str) -> Result<BuildId, ModuleParseError> {
        let hex = contents
            .strip_prefix(SYMBOL_PREFIX)
            .ok_or_else(|| ModuleParseError::InvalidFile {
                path: path.display().to_string(),
                reason: "missing symbol header".to_string(),
            })?;
        BuildId::parse(hex.trim()).map_err(|e| ModuleParseError::InvalidFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

impl ModuleParser for FakeModuleParser {
    fn read_build_id(
        &self,
        path: &Path,
        is_debug_info_file: bool,
        _format: ModuleFormat,
    ) -> Result<BuildId, ModuleParseError> {
        self.debug_info_flags.lock().push(is_debug_info_file);
        let contents = Self::read(path)?;
        Self::parse(path, &contents)
    }

    fn verify_symbol_file(
        &self,
        path: &Path,
        is_debug_info_file: bool,
        _format: ModuleFormat,
    ) -> Result<(), ModuleParseError> {
        self.debug_info_flags.lock().push(is_debug_info_file);
        let contents = Self::read(path)?;
        let build_id = Self::parse(path, &contents)?;
        if self.rejected.lock().contains(&build_id) {
            return Err(ModuleParseError::InvalidFile {
                path: path.display().to_string(),
                reason: "symbol verification error".to_string(),
            });
        }
        Ok(())
    }
}

/// In-memory HTTP server.
#[derive(Default)]
pub struct MockHttpClient {
    files: Mutex<HashMap<String, Vec<u8>>>,
    reject_head: Mutex<bool>,
    unreachable: Mutex<bool>,
    heads: AtomicUsize,
    gets: AtomicUsize,
    downloads: AtomicUsize,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `url`.
    pub fn serve(&self, url: &str, body: &[u8]) {
        self.files.lock().insert(url.to_string(), body.to_vec());
    }

    /// Answer HEAD with 405 and `Allow: GET`.
    pub fn reject_head(&self) {
        *self.reject_head.lock() = true;
    }

    /// Fail every request at the transport level.
    pub fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.lock() = unreachable;
    }

    pub fn head_count(&self) -> usize {
        self.heads.load(Ordering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    fn check_reachable(&self, url: &str) -> Result<(), HttpError> {
        if *self.unreachable.lock() {
            return Err(HttpError::Request {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    fn response(&self, url: &str) -> HttpResponse {
        let (status, reason) = if self.files.lock().contains_key(url) {
            (200, "OK")
        } else {
            (404, "Not Found")
        };
        HttpResponse {
            status,
            reason: reason.to_string(),
            final_url: url.to_string(),
            allow: Vec::new(),
        }
    }
}

impl HttpClient for MockHttpClient {
    fn head<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, HttpError>> {
        Box::pin(async move {
            self.heads.fetch_add(1, Ordering::SeqCst);
            self.check_reachable(url)?;
            if *self.reject_head.lock() {
                return Ok(HttpResponse {
                    status: 405,
                    reason: "Method Not Allowed".to_string(),
                    final_url: url.to_string(),
                    allow: vec!["GET".to_string()],
                });
            }
            Ok(self.response(url))
        })
    }

    fn get_headers<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<HttpResponse, HttpError>> {
        Box::pin(async move {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.check_reachable(url)?;
            Ok(self.response(url))
        })
    }

    fn download<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
    ) -> BoxFuture<'a, Result<u64, HttpError>> {
        Box::pin(async move {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            self.check_reachable(url)?;
            let body = self.files.lock().get(url).cloned();
            match body {
                Some(body) => {
                    tokio::fs::write(dest, &body).await?;
                    Ok(body.len() as u64)
                }
                None => Err(HttpError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        })
    }
}

/// Lookup service with canned answers. Unknown keys are not found.
#[derive(Default)]
pub struct MockUrlResolver {
    answers: Mutex<HashMap<(String, String), Result<String, ResolveError>>>,
    calls: AtomicUsize,
}

impl MockUrlResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(&self, build_id_hex: &str, filename: &str, result: Result<String, ResolveError>) {
        self.answers
            .lock()
            .insert((build_id_hex.to_string(), filename.to_string()), result);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SymbolUrlResolver for MockUrlResolver {
    fn resolve_download_url<'a>(
        &'a self,
        build_id_hex: &'a str,
        filename: &'a str,
    ) -> BoxFuture<'a, Result<String, ResolveError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answers
                .lock()
                .get(&(build_id_hex.to_string(), filename.to_string()))
                .cloned()
                .unwrap_or(Err(ResolveError::NotFound))
        })
    }
}
