//! Symbol search path parsing.
//!
//! A search path is a `;`-separated list of elements in the format used by
//! `_NT_SYMBOL_PATH`:
//!
//! ```text
//! cache*/var/cache/symbols;srv*/mnt/symbols*https://symbols.example.com;/opt/app/debug
//! ```
//!
//! - `srv*a*b` (or the long form `symsrv*symsrv.dll*a*b`) is a symbol server
//!   whose members are searched in order and fill each other.
//! - `cache*a` is a symbol server flagged as a cache.
//! - Anything else is a single store: a cloud store configuration, an HTTP
//!   URL, a structured store, or a flat directory.
//!
//! Remote stores only hand back URLs, so each one needs a local cache
//! downstream. When none exists yet the default cache is inserted in front of
//! it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::http::HttpClient;
use crate::module::ModuleParser;
use crate::resolver::SymbolUrlResolver;
use crate::store::{
    CloudSymbolStore, FlatSymbolStore, HttpSymbolStore, StructuredSymbolStore, SymbolServer,
    SymbolStore, SymbolStoreSequence,
};

const SYMSRV: &str = "symsrv";
const SYMSRV_DLL: &str = "symsrv.dll";
const SRV: &str = "srv";
const CACHE: &str = "cache";

/// Defaults applied while parsing a search path.
#[derive(Debug, Clone, Default)]
pub struct SymbolPathConfig {
    /// Replaces empty `cache*` members and caches remote stores that have none.
    pub default_cache_path: Option<PathBuf>,

    /// Replaces empty `srv*` members.
    pub default_store_path: Option<PathBuf>,

    /// Lowercased hosts whose HTTP stores are skipped.
    excluded_hosts: HashSet<String>,
}

impl SymbolPathConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_cache_path = Some(path.into());
        self
    }

    pub fn with_default_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_store_path = Some(path.into());
        self
    }

    /// Skip HTTP stores on these hosts. Matching ignores ASCII case.
    pub fn with_excluded_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded_hosts
            .extend(hosts.into_iter().map(|h| h.as_ref().to_ascii_lowercase()));
        self
    }

    pub fn is_excluded_host(&self, host: &str) -> bool {
        self.excluded_hosts.contains(&host.to_ascii_lowercase())
    }

    pub fn excluded_hosts(&self) -> impl Iterator<Item = &str> {
        self.excluded_hosts.iter().map(String::as_str)
    }
}

/// Builds store trees from search path strings.
pub struct SymbolPathParser {
    module_parser: Arc<dyn ModuleParser>,
    http_client: Arc<dyn HttpClient>,
    url_resolver: Arc<dyn SymbolUrlResolver>,
    config: SymbolPathConfig,
}

impl SymbolPathParser {
    pub fn new(
        module_parser: Arc<dyn ModuleParser>,
        http_client: Arc<dyn HttpClient>,
        url_resolver: Arc<dyn SymbolUrlResolver>,
        config: SymbolPathConfig,
    ) -> Self {
        Self {
            module_parser,
            http_client,
            url_resolver,
            config,
        }
    }

    pub fn config(&self) -> &SymbolPathConfig {
        &self.config
    }

    /// Parse `spec` into a [`SymbolStore::Sequence`].
    ///
    /// Never fails. Elements that cannot be used are logged and dropped.
    pub fn parse(&self, spec: &str) -> SymbolStore {
        debug!(spec, "Parsing symbol path");

        let mut sequence = SymbolStoreSequence::new(Arc::clone(&self.module_parser));

        for element in spec.split(';').filter(|e| !e.is_empty()) {
            let components: Vec<&str> = element.split('*').collect();
            let keyword = components[0];

            if components.len() > 2 && keyword.eq_ignore_ascii_case(SYMSRV) {
                if components[1].eq_ignore_ascii_case(SYMSRV_DLL) {
                    self.add_symbol_server(
                        &mut sequence,
                        &components[2..],
                        self.config.default_store_path.as_deref(),
                        false,
                    );
                } else {
                    warn!(dll = components[1], "Unsupported symbol server");
                }
            } else if components.len() > 1 && keyword.eq_ignore_ascii_case(SRV) {
                self.add_symbol_server(
                    &mut sequence,
                    &components[1..],
                    self.config.default_store_path.as_deref(),
                    false,
                );
            } else if components.len() > 1 && keyword.eq_ignore_ascii_case(CACHE) {
                self.add_symbol_server(
                    &mut sequence,
                    &components[1..],
                    self.config.default_cache_path.as_deref(),
                    true,
                );
            } else if CloudSymbolStore::is_cloud_store(Path::new(element)) {
                let mut server = SymbolServer::new(false);
                if self.try_add_cloud_store(&mut server, sequence.has_cache()) {
                    sequence.add_store(server);
                }
            } else if HttpSymbolStore::is_http_store(element) {
                let mut server = SymbolServer::new(false);
                if self.try_add_http_store(&mut server, element, sequence.has_cache()) {
                    sequence.add_store(server);
                }
            } else if StructuredSymbolStore::is_structured_store(Path::new(element)) {
                match StructuredSymbolStore::new(element, false) {
                    Ok(store) => sequence.add_store(store),
                    Err(e) => warn!(element, error = %e, "Skipping symbol path element"),
                }
            } else {
                match FlatSymbolStore::new(Arc::clone(&self.module_parser), element) {
                    Ok(store) => sequence.add_store(store),
                    Err(e) => warn!(element, error = %e, "Skipping symbol path element"),
                }
            }
        }

        let store = SymbolStore::Sequence(sequence);
        match serde_json::to_string(&store) {
            Ok(json) => debug!(result = %json, "Symbol path parsed"),
            Err(e) => debug!(error = %e, "Symbol path parsed; description unavailable"),
        }
        store
    }

    fn add_symbol_server(
        &self,
        sequence: &mut SymbolStoreSequence,
        paths: &[&str],
        default_path: Option<&Path>,
        is_cache: bool,
    ) {
        let mut server = SymbolServer::new(is_cache);

        for (index, path) in paths.iter().copied().enumerate() {
            let has_downstream_cache = sequence.has_cache() || !server.is_empty();

            if !path.is_empty() && CloudSymbolStore::is_cloud_store(Path::new(path)) {
                if !self.try_add_cloud_store(&mut server, has_downstream_cache) {
                    continue;
                }
                self.warn_if_not_upstream(path, is_cache, index == paths.len() - 1);
            } else if HttpSymbolStore::is_http_store(path) {
                if !self.try_add_http_store(&mut server, path, has_downstream_cache) {
                    continue;
                }
                self.warn_if_not_upstream(path, is_cache, index == paths.len() - 1);
            } else if !path.is_empty() {
                match StructuredSymbolStore::new(path, false) {
                    Ok(store) => server.add_store(store),
                    Err(e) => warn!(path, error = %e, "Skipping symbol server member"),
                }
            } else if let Some(default_path) = default_path {
                match StructuredSymbolStore::new(default_path, false) {
                    Ok(store) => server.add_store(store),
                    Err(e) => warn!(
                        path = %default_path.display(),
                        error = %e,
                        "Skipping symbol server member"
                    ),
                }
            }
        }

        sequence.add_store(server);
    }

    /// Remote members never receive copies, so they belong at the end of a
    /// plain server and nowhere in a cache.
    fn warn_if_not_upstream(&self, path: &str, is_cache: bool, is_last: bool) {
        if is_cache {
            warn!(
                path,
                "Remote store used as a symbol cache; files cannot be cached in it"
            );
        } else if !is_last {
            warn!(
                path,
                "Remote store used as a downstream store; files cannot be copied to it"
            );
        }
    }

    fn try_add_http_store(
        &self,
        server: &mut SymbolServer,
        url: &str,
        has_downstream_cache: bool,
    ) -> bool {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        if self.config.is_excluded_host(&host) {
            warn!(url, host = %host, "Skipping http store on excluded host");
            return false;
        }

        let store = match HttpSymbolStore::new(Arc::clone(&self.http_client), url) {
            Ok(store) => store,
            Err(e) => {
                warn!(url, error = %e, "Skipping http store");
                return false;
            }
        };

        if !has_downstream_cache && !self.try_add_default_cache(server, url) {
            return false;
        }
        server.add_store(store);
        true
    }

    fn try_add_cloud_store(&self, server: &mut SymbolServer, has_downstream_cache: bool) -> bool {
        if !has_downstream_cache && !self.try_add_default_cache(server, "cloud symbol store") {
            return false;
        }
        server.add_store(CloudSymbolStore::new(
            Arc::clone(&self.http_client),
            Arc::clone(&self.url_resolver),
        ));
        true
    }

    fn try_add_default_cache(&self, server: &mut SymbolServer, upstream: &str) -> bool {
        let Some(cache_path) = self.config.default_cache_path.as_deref() else {
            warn!(
                store = upstream,
                "Remote store must be cached, but there is no downstream cache and no default cache path"
            );
            return false;
        };

        match StructuredSymbolStore::new(cache_path, false) {
            Ok(cache) => {
                server.add_store(cache);
                debug!(
                    store = upstream,
                    cache = %cache_path.display(),
                    "Added default cache for remote store"
                );
                true
            }
            Err(e) => {
                warn!(store = upstream, error = %e, "Could not add default cache");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CLOUD_MARKER_FILE_NAME, MARKER_FILE_NAME};
    use crate::testing::{FakeModuleParser, MockHttpClient, MockUrlResolver};
    use tempfile::TempDir;

    const HTTP_STORE: &str = "https://symbols.example.com/store";
    const DEFAULT_CACHE: &str = "/var/cache/symbols";
    const DEFAULT_STORE: &str = "/srv/symbols";

    struct Fixture {
        parser: Arc<dyn ModuleParser>,
        client: Arc<dyn HttpClient>,
        resolver: Arc<dyn SymbolUrlResolver>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                parser: Arc::new(FakeModuleParser::new()),
                client: Arc::new(MockHttpClient::new()),
                resolver: Arc::new(MockUrlResolver::new()),
            }
        }

        fn path_parser(&self, config: SymbolPathConfig) -> SymbolPathParser {
            SymbolPathParser::new(
                self.parser.clone(),
                self.client.clone(),
                self.resolver.clone(),
                config,
            )
        }

        fn default_config() -> SymbolPathConfig {
            SymbolPathConfig::new()
                .with_default_cache(DEFAULT_CACHE)
                .with_default_store(DEFAULT_STORE)
        }

        fn sequence(&self, stores: Vec<SymbolStore>) -> SymbolStore {
            let mut sequence = SymbolStoreSequence::new(self.parser.clone());
            for store in stores {
                sequence.add_store(store);
            }
            sequence.into()
        }

        fn http(&self, url: &str) -> SymbolStore {
            HttpSymbolStore::new(self.client.clone(), url).unwrap().into()
        }

        fn cloud(&self) -> SymbolStore {
            CloudSymbolStore::new(self.client.clone(), self.resolver.clone()).into()
        }

        fn flat(&self, path: &Path) -> SymbolStore {
            FlatSymbolStore::new(self.parser.clone(), path).unwrap().into()
        }
    }

    fn structured(path: impl Into<PathBuf>) -> SymbolStore {
        StructuredSymbolStore::new(path, false).unwrap().into()
    }

    fn server(is_cache: bool, stores: Vec<SymbolStore>) -> SymbolStore {
        let mut server = SymbolServer::new(is_cache);
        for store in stores {
            server.add_store(store);
        }
        server.into()
    }

    fn assert_tree(actual: &SymbolStore, expected: &SymbolStore) {
        assert!(
            actual.deep_equals(expected),
            "\nactual:   {:?}\nexpected: {:?}",
            actual,
            expected
        );
    }

    #[test]
    fn test_empty_and_blank_elements() {
        let f = Fixture::new();
        let parser = f.path_parser(Fixture::default_config());

        assert_tree(&parser.parse(""), &f.sequence(vec![]));
        assert_tree(&parser.parse(";;"), &f.sequence(vec![]));
    }

    #[test]
    fn test_flat_and_structured_directories() {
        let f = Fixture::new();
        let temp = TempDir::new().unwrap();
        let flat_dir = temp.path().join("flat");
        let structured_dir = temp.path().join("structured");
        std::fs::create_dir_all(&flat_dir).unwrap();
        std::fs::create_dir_all(&structured_dir).unwrap();
        std::fs::write(structured_dir.join(MARKER_FILE_NAME), b"").unwrap();

        let spec = format!("{};{}", flat_dir.display(), structured_dir.display());
        let store = f.path_parser(Fixture::default_config()).parse(&spec);

        assert_tree(
            &store,
            &f.sequence(vec![f.flat(&flat_dir), structured(&structured_dir)]),
        );
    }

    #[test]
    fn test_http_store_with_explicit_cache() {
        let f = Fixture::new();
        let store = f
            .path_parser(Fixture::default_config())
            .parse(&format!("cache*C:\\cache;{}", HTTP_STORE));

        assert_tree(
            &store,
            &f.sequence(vec![
                server(true, vec![structured("C:\\cache")]),
                server(false, vec![f.http(HTTP_STORE)]),
            ]),
        );
    }

    #[test]
    fn test_http_store_gets_default_cache() {
        let f = Fixture::new();
        let store = f.path_parser(Fixture::default_config()).parse(HTTP_STORE);

        assert_tree(
            &store,
            &f.sequence(vec![server(
                false,
                vec![structured(DEFAULT_CACHE), f.http(HTTP_STORE)],
            )]),
        );
    }

    #[test]
    fn test_http_store_dropped_without_default_cache() {
        let f = Fixture::new();
        let store = f.path_parser(SymbolPathConfig::new()).parse(HTTP_STORE);
        assert_tree(&store, &f.sequence(vec![]));
    }

    #[test]
    fn test_excluded_host_is_dropped_before_cache_injection() {
        let f = Fixture::new();
        let config = Fixture::default_config().with_excluded_hosts(["SYMBOLS.example.com"]);
        let parser = f.path_parser(config);

        assert_tree(&parser.parse(HTTP_STORE), &f.sequence(vec![]));

        let store = parser.parse(&format!("srv*{}", HTTP_STORE));
        assert_tree(&store, &f.sequence(vec![server(false, vec![])]));
    }

    #[test]
    fn test_srv_members() {
        let f = Fixture::new();
        let store = f
            .path_parser(Fixture::default_config())
            .parse(&format!("SRV*/mnt/local*{}", HTTP_STORE));

        assert_tree(
            &store,
            &f.sequence(vec![server(
                false,
                vec![structured("/mnt/local"), f.http(HTTP_STORE)],
            )]),
        );
    }

    #[test]
    fn test_empty_members_use_defaults() {
        let f = Fixture::new();
        let parser = f.path_parser(Fixture::default_config());

        assert_tree(
            &parser.parse(&format!("srv**{}", HTTP_STORE)),
            &f.sequence(vec![server(
                false,
                vec![structured(DEFAULT_STORE), f.http(HTTP_STORE)],
            )]),
        );
        assert_tree(
            &parser.parse("cache*"),
            &f.sequence(vec![server(true, vec![structured(DEFAULT_CACHE)])]),
        );

        let no_defaults = f.path_parser(SymbolPathConfig::new());
        assert_tree(
            &no_defaults.parse("srv*"),
            &f.sequence(vec![server(false, vec![])]),
        );
    }

    #[test]
    fn test_remote_first_in_server_gets_default_cache() {
        let f = Fixture::new();
        let store = f
            .path_parser(Fixture::default_config())
            .parse(&format!("srv*{}*/mnt/local", HTTP_STORE));

        assert_tree(
            &store,
            &f.sequence(vec![server(
                false,
                vec![
                    structured(DEFAULT_CACHE),
                    f.http(HTTP_STORE),
                    structured("/mnt/local"),
                ],
            )]),
        );
    }

    #[test]
    fn test_symsrv_forms() {
        let f = Fixture::new();
        let parser = f.path_parser(Fixture::default_config());

        assert_tree(
            &parser.parse("symsrv*SymSrv.dll*/mnt/a"),
            &f.sequence(vec![server(false, vec![structured("/mnt/a")])]),
        );
        assert_tree(&parser.parse("symsrv*other.dll*/mnt/a"), &f.sequence(vec![]));
    }

    #[test]
    fn test_keyword_without_members_is_a_directory() {
        let f = Fixture::new();
        let store = f.path_parser(Fixture::default_config()).parse("srv");
        assert_tree(&store, &f.sequence(vec![f.flat(Path::new("srv"))]));
    }

    #[test]
    fn test_cloud_store() {
        let f = Fixture::new();
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CLOUD_MARKER_FILE_NAME), b"").unwrap();
        let element = temp.path().display().to_string();
        let parser = f.path_parser(Fixture::default_config());

        assert_tree(
            &parser.parse(&element),
            &f.sequence(vec![server(false, vec![structured(DEFAULT_CACHE), f.cloud()])]),
        );

        assert_tree(
            &parser.parse(&format!("cache*/c;{}", element)),
            &f.sequence(vec![
                server(true, vec![structured("/c")]),
                server(false, vec![f.cloud()]),
            ]),
        );

        let uncached = f.path_parser(SymbolPathConfig::new());
        assert_tree(&uncached.parse(&element), &f.sequence(vec![]));
    }

    #[test]
    fn test_mixed_path() {
        let f = Fixture::new();
        let spec = format!("cache*/c;srv*/s*{};/flat", HTTP_STORE);
        let store = f.path_parser(Fixture::default_config()).parse(&spec);

        assert_tree(
            &store,
            &f.sequence(vec![
                server(true, vec![structured("/c")]),
                server(false, vec![structured("/s"), f.http(HTTP_STORE)]),
                f.flat(Path::new("/flat")),
            ]),
        );
        assert_eq!(store.all_stores().len(), 7);
    }

    #[test]
    fn test_excluded_hosts_case_insensitive() {
        let config = SymbolPathConfig::new().with_excluded_hosts(["Internal.Example.com"]);
        assert!(config.is_excluded_host("internal.example.com"));
        assert!(config.is_excluded_host("INTERNAL.EXAMPLE.COM"));
        assert!(!config.is_excluded_host("example.com"));
    }
}
