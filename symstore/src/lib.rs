//! symstore - Cascading debug-symbol lookup
//!
//! Locates debug symbol files by name and build id across an ordered search
//! path of local directories, HTTP symbol servers and a cloud lookup service.
//! Files found remotely are copied into local caches on the way back so later
//! lookups stay local.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use symstore::{
//!     BuildId, ModuleParser, ModuleSearchQuery, ReqwestClient, RestUrlResolver,
//!     SymbolPathConfig, SymbolPathParser,
//! };
//!
//! # async fn run(module_parser: Arc<dyn ModuleParser>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = SymbolPathConfig::new().with_default_cache("/var/cache/symbols");
//! let parser = SymbolPathParser::new(
//!     module_parser,
//!     Arc::new(ReqwestClient::new()?),
//!     Arc::new(RestUrlResolver::new("https://lookup.example.com", Duration::from_secs(30))?),
//!     config,
//! );
//!
//! let store = parser.parse("cache*;srv*https://symbols.example.com");
//! let query = ModuleSearchQuery::new("libfoo.so.debug", BuildId::parse("8f3a01")?);
//! if let Some(file) = store.find_file(&query).await? {
//!     println!("{}", file.location());
//! }
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;

pub mod build_id;
pub mod config;
pub mod error;
pub mod file_ref;
pub mod http;
pub mod logging;
pub mod module;
pub mod negative_cache;
pub mod query;
pub mod resolver;
pub mod search;
pub mod store;
pub mod symbol_path;

#[cfg(test)]
mod testing;

pub use build_id::{BuildId, BuildIdParseError};
pub use config::{ConfigError, ConfigFile};
pub use error::{StoreError, StoreResult};
pub use file_ref::FileReference;
pub use http::{HttpClient, HttpError, HttpResponse, ReqwestClient};
pub use module::{ModuleParseError, ModuleParser};
pub use query::{ModuleFormat, ModuleSearchQuery};
pub use resolver::{ResolveError, RestUrlResolver, SymbolUrlResolver};
pub use search::SymbolSearch;
pub use store::SymbolStore;
pub use symbol_path::{SymbolPathConfig, SymbolPathParser};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Boxed future returned by object-safe async trait methods and by the
/// recursive store lookups.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
