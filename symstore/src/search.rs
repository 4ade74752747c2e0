//! Reloadable symbol search.
//!
//! Holds the store tree for the current search path. Reloading with a path
//! that parses to an equivalent tree keeps the existing one, so negative
//! caches stay warm across configuration refreshes.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::StoreResult;
use crate::file_ref::FileReference;
use crate::query::ModuleSearchQuery;
use crate::store::SymbolStore;
use crate::symbol_path::SymbolPathParser;

pub struct SymbolSearch {
    parser: SymbolPathParser,
    spec: RwLock<String>,
    store: RwLock<Arc<SymbolStore>>,
}

impl SymbolSearch {
    /// Parse `spec` and build the initial store tree.
    pub fn new(parser: SymbolPathParser, spec: impl Into<String>) -> Self {
        let spec = spec.into();
        let store = Arc::new(parser.parse(&spec));
        Self {
            parser,
            spec: RwLock::new(spec),
            store: RwLock::new(store),
        }
    }

    /// Search path the current tree was built from.
    pub fn spec(&self) -> String {
        self.spec.read().clone()
    }

    /// Snapshot of the current tree.
    pub fn store(&self) -> Arc<SymbolStore> {
        self.store.read().clone()
    }

    /// Rebuild the tree from `spec`.
    ///
    /// Returns true if the tree changed. Lookups already running finish
    /// against the tree they started with.
    pub fn reload(&self, spec: &str) -> bool {
        let candidate = self.parser.parse(spec);

        let mut store = self.store.write();
        *self.spec.write() = spec.to_string();
        if store.deep_equals(&candidate) {
            debug!(spec, "Symbol path unchanged");
            return false;
        }

        *store = Arc::new(candidate);
        info!(spec, "Symbol path reloaded");
        true
    }

    /// Search the current tree.
    pub async fn find(&self, query: &ModuleSearchQuery) -> StoreResult<Option<FileReference>> {
        let store = self.store();
        store.find_file(query).await
    }
}
