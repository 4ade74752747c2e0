//! Symbol stores.
//!
//! A symbol store answers "where is `filename` with build id `X`?" for one
//! kind of source, and some stores can also receive copies of files found
//! elsewhere. The set of store kinds is fixed, so stores form a closed enum:
//!
//! | Variant      | Source                               | Accepts files |
//! |--------------|--------------------------------------|---------------|
//! | `Null`       | nothing                              | never called  |
//! | `Flat`       | `dir/name`                           | no            |
//! | `Structured` | `dir/name/BUILDID/name`              | yes           |
//! | `Http`       | `url/name/BUILDID/name`              | no            |
//! | `Cloud`      | URL from a lookup service            | no            |
//! | `Server`     | ordered children, cascading copies   | yes           |
//! | `Sequence`   | ordered children, verified results   | no            |
//!
//! `Server` and `Sequence` hold other stores, so a configured search path is
//! a tree. Lookups recurse through [`BoxFuture`] so the tree can be awaited
//! without knowing its depth.

mod cloud;
mod flat;
mod http;
mod sequence;
mod server;
mod structured;

pub use cloud::{CloudSymbolStore, CLOUD_MARKER_FILE_NAME};
pub use flat::FlatSymbolStore;
pub use http::HttpSymbolStore;
pub use sequence::SymbolStoreSequence;
pub use server::SymbolServer;
pub use structured::{StructuredSymbolStore, MARKER_FILE_NAME};

use std::path::Path;

use serde::Serialize;

use crate::build_id::BuildId;
use crate::error::{messages, StoreError, StoreResult};
use crate::file_ref::FileReference;
use crate::query::ModuleSearchQuery;
use crate::BoxFuture;

/// Any symbol store.
#[derive(Serialize)]
#[serde(tag = "type")]
pub enum SymbolStore {
    /// Store that never finds anything.
    Null,
    /// Flat directory of symbol files.
    Flat(FlatSymbolStore),
    /// Directory tree keyed by name and build id.
    Structured(StructuredSymbolStore),
    /// HTTP symbol server.
    Http(HttpSymbolStore),
    /// Cloud lookup service.
    Cloud(CloudSymbolStore),
    /// Cascading list of stores.
    Server(SymbolServer),
    /// Top-level search path.
    Sequence(SymbolStoreSequence),
}

impl SymbolStore {
    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Flat(_) => "flat",
            Self::Structured(_) => "structured",
            Self::Http(_) => "http",
            Self::Cloud(_) => "cloud",
            Self::Server(_) => "server",
            Self::Sequence(_) => "sequence",
        }
    }

    /// Whether [`add_file`](Self::add_file) can succeed on this store.
    pub fn supports_adding_files(&self) -> bool {
        matches!(self, Self::Structured(_) | Self::Server(_))
    }

    /// Whether this store caches files found by later stores in a sequence.
    pub fn is_cache(&self) -> bool {
        match self {
            Self::Structured(s) => s.is_cache(),
            Self::Server(s) => s.is_cache(),
            _ => false,
        }
    }

    /// Direct children, empty for leaf stores.
    pub fn substores(&self) -> &[SymbolStore] {
        match self {
            Self::Server(s) => s.stores(),
            Self::Sequence(s) => s.stores(),
            _ => &[],
        }
    }

    /// This store followed by every store beneath it, depth first.
    pub fn all_stores(&self) -> Vec<&SymbolStore> {
        let mut stores = vec![self];
        for child in self.substores() {
            stores.extend(child.all_stores());
        }
        stores
    }

    /// Structural equality over the tree shape and each store's configuration.
    ///
    /// Runtime state such as negative caches is ignored, so a freshly parsed
    /// tree compares equal to a warmed one built from the same search path.
    pub fn deep_equals(&self, other: &SymbolStore) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Flat(a), Self::Flat(b)) => a.path() == b.path(),
            (Self::Structured(a), Self::Structured(b)) => {
                a.path() == b.path() && a.is_cache() == b.is_cache()
            }
            (Self::Http(a), Self::Http(b)) => a.url() == b.url(),
            (Self::Cloud(_), Self::Cloud(_)) => true,
            (Self::Server(a), Self::Server(b)) => {
                a.is_cache() == b.is_cache() && children_equal(a.stores(), b.stores())
            }
            (Self::Sequence(a), Self::Sequence(b)) => children_equal(a.stores(), b.stores()),
            _ => false,
        }
    }

    /// Search for the file described by `query`.
    ///
    /// Returns `Ok(None)` on a miss. Failures inside the store are logged and
    /// reported as misses; only invalid arguments produce errors.
    pub fn find_file<'a>(
        &'a self,
        query: &'a ModuleSearchQuery,
    ) -> BoxFuture<'a, StoreResult<Option<FileReference>>> {
        Box::pin(async move {
            match self {
                Self::Null => Ok(None),
                Self::Flat(s) => s.find_file(query).await,
                Self::Structured(s) => s.find_file(query).await,
                Self::Http(s) => s.find_file(query).await,
                Self::Cloud(s) => s.find_file(query).await,
                Self::Server(s) => s.find_file(query).await,
                Self::Sequence(s) => s.find_file(query).await,
            }
        })
    }

    /// Copy `source` into this store under `filename` and `build_id`.
    ///
    /// Returns a reference to the new copy.
    pub fn add_file<'a>(
        &'a self,
        source: &'a FileReference,
        filename: &'a str,
        build_id: &'a BuildId,
    ) -> BoxFuture<'a, StoreResult<FileReference>> {
        Box::pin(async move {
            match self {
                Self::Null => Err(StoreError::NotImplemented(
                    messages::COPY_TO_NULL_STORE.to_string(),
                )),
                Self::Flat(_) => Err(StoreError::Unsupported(
                    messages::COPY_TO_FLAT_STORE.to_string(),
                )),
                Self::Http(_) => Err(StoreError::Unsupported(
                    messages::COPY_TO_HTTP_STORE.to_string(),
                )),
                Self::Cloud(_) => Err(StoreError::Unsupported(
                    messages::COPY_TO_CLOUD_STORE.to_string(),
                )),
                Self::Sequence(_) => Err(StoreError::Unsupported(
                    messages::COPY_TO_SEQUENCE.to_string(),
                )),
                Self::Structured(s) => s.add_file(source, filename, build_id).await,
                Self::Server(s) => s.add_file(source, filename, build_id).await,
            }
        })
    }
}

impl std::fmt::Debug for SymbolStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str(self.kind()),
        }
    }
}

fn children_equal(a: &[SymbolStore], b: &[SymbolStore]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.deep_equals(y))
}

impl From<FlatSymbolStore> for SymbolStore {
    fn from(store: FlatSymbolStore) -> Self {
        Self::Flat(store)
    }
}

impl From<StructuredSymbolStore> for SymbolStore {
    fn from(store: StructuredSymbolStore) -> Self {
        Self::Structured(store)
    }
}

impl From<HttpSymbolStore> for SymbolStore {
    fn from(store: HttpSymbolStore) -> Self {
        Self::Http(store)
    }
}

impl From<CloudSymbolStore> for SymbolStore {
    fn from(store: CloudSymbolStore) -> Self {
        Self::Cloud(store)
    }
}

impl From<SymbolServer> for SymbolStore {
    fn from(store: SymbolServer) -> Self {
        Self::Server(store)
    }
}

impl From<SymbolStoreSequence> for SymbolStore {
    fn from(store: SymbolStoreSequence) -> Self {
        Self::Sequence(store)
    }
}

/// Reject empty filenames on a directly invoked lookup.
pub(crate) fn require_filename(filename: &str) -> StoreResult<()> {
    if filename.is_empty() {
        return Err(StoreError::Usage(messages::FILENAME_EMPTY.to_string()));
    }
    Ok(())
}

/// Check that `filename` names a single path component.
pub(crate) fn check_filename_component(filename: &str) -> Result<(), String> {
    if filename == "." || filename == ".." {
        return Err(format!("'{}' is not a file name.", filename));
    }
    if filename.contains(['/', '\\', '\0']) {
        return Err(format!("'{}' contains invalid path characters.", filename));
    }
    Ok(())
}

/// Returns true if `path` exists and is a regular file.
pub(crate) async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::module::ModuleParser;
    use crate::testing::{FakeModuleParser, MockHttpClient, MockUrlResolver};

    fn parser() -> Arc<dyn ModuleParser> {
        Arc::new(FakeModuleParser::new())
    }

    fn flat(path: &str) -> SymbolStore {
        FlatSymbolStore::new(parser(), path).unwrap().into()
    }

    fn structured(path: &str, is_cache: bool) -> SymbolStore {
        StructuredSymbolStore::new(path, is_cache).unwrap().into()
    }

    fn http(url: &str) -> SymbolStore {
        HttpSymbolStore::new(Arc::new(MockHttpClient::new()), url)
            .unwrap()
            .into()
    }

    fn server(is_cache: bool, stores: Vec<SymbolStore>) -> SymbolStore {
        let mut server = SymbolServer::new(is_cache);
        for store in stores {
            server.add_store(store);
        }
        server.into()
    }

    fn sequence(stores: Vec<SymbolStore>) -> SymbolStore {
        let mut sequence = SymbolStoreSequence::new(parser());
        for store in stores {
            sequence.add_store(store);
        }
        sequence.into()
    }

    #[test]
    fn test_capabilities() {
        assert!(!SymbolStore::Null.supports_adding_files());
        assert!(!flat("/a").supports_adding_files());
        assert!(structured("/a", false).supports_adding_files());
        assert!(!http("https://a").supports_adding_files());
        assert!(server(false, vec![]).supports_adding_files());
        assert!(!sequence(vec![]).supports_adding_files());

        assert!(structured("/a", true).is_cache());
        assert!(server(true, vec![]).is_cache());
        assert!(!flat("/a").is_cache());
    }

    #[test]
    fn test_all_stores_is_preorder() {
        let tree = sequence(vec![
            flat("/a"),
            server(false, vec![structured("/b", false), http("https://c")]),
            structured("/d", true),
        ]);

        let kinds: Vec<&str> = tree.all_stores().iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec!["sequence", "flat", "server", "structured", "http", "structured"]
        );
    }

    #[test]
    fn test_deep_equals_reflexive() {
        let tree = sequence(vec![
            flat("/a"),
            server(true, vec![structured("/b", false), http("https://c")]),
        ]);
        assert!(tree.deep_equals(&tree));
        assert!(SymbolStore::Null.deep_equals(&SymbolStore::Null));
    }

    #[test]
    fn test_deep_equals_compares_leaf_configuration() {
        assert!(flat("/a").deep_equals(&flat("/a")));
        assert!(!flat("/a").deep_equals(&flat("/b")));
        assert!(!structured("/a", false).deep_equals(&structured("/a", true)));
        assert!(!http("https://a").deep_equals(&http("https://b")));
        assert!(!flat("/a").deep_equals(&structured("/a", false)));

        let cloud = || -> SymbolStore {
            CloudSymbolStore::new(
                Arc::new(MockHttpClient::new()),
                Arc::new(MockUrlResolver::new()),
            )
            .into()
        };
        assert!(cloud().deep_equals(&cloud()));
    }

    #[test]
    fn test_deep_equals_compares_shape() {
        let a = sequence(vec![flat("/a"), flat("/b")]);
        let b = sequence(vec![flat("/a")]);
        assert!(!a.deep_equals(&b));
        assert!(!b.deep_equals(&a));

        let ordered = server(false, vec![flat("/a"), flat("/b")]);
        let reversed = server(false, vec![flat("/b"), flat("/a")]);
        assert!(!ordered.deep_equals(&reversed));

        assert!(!server(false, vec![]).deep_equals(&server(true, vec![])));
        assert!(!server(false, vec![]).deep_equals(&sequence(vec![])));
    }

    #[tokio::test]
    async fn test_null_store() {
        let store = SymbolStore::Null;
        let query = ModuleSearchQuery::new("a.debug", BuildId::empty());
        assert!(store.find_file(&query).await.unwrap().is_none());

        let source = FileReference::local("/tmp/a.debug");
        let err = store
            .add_file(&source, "a.debug", &BuildId::from_bytes(vec![1]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotImplemented(_)));
    }

    #[tokio::test]
    async fn test_unsupported_insertion() {
        let source = FileReference::local("/tmp/a.debug");
        let id = BuildId::from_bytes(vec![1]);
        for store in [flat("/a"), http("https://a"), sequence(vec![])] {
            let err = store.add_file(&source, "a.debug", &id).await.unwrap_err();
            assert!(matches!(err, StoreError::Unsupported(_)), "{}", store.kind());
        }
    }

    #[test]
    fn test_serialized_description() {
        let tree = sequence(vec![server(true, vec![structured("/cache", false)])]);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["type"], "Sequence");
        assert_eq!(json["stores"][0]["type"], "Server");
        assert_eq!(json["stores"][0]["is_cache"], true);
        assert_eq!(json["stores"][0]["stores"][0]["path"], "/cache");
    }

    #[test]
    fn test_filename_component_check() {
        assert!(check_filename_component("libc.so.6").is_ok());
        assert!(check_filename_component("..").is_err());
        assert!(check_filename_component("a/b").is_err());
        assert!(check_filename_component("a\\b").is_err());
    }
}
