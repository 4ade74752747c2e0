//! Configuration file.
//!
//! Settings live in `<config_dir>/symstore/config.ini`:
//!
//! ```ini
//! [symbols]
//! search_path = cache*;srv*https://symbols.example.com
//! cache_dir = ~/.cache/symstore
//! default_store =
//! excluded_hosts = internal.example.com, legacy.example.com
//!
//! [network]
//! timeout_secs = 30
//! cloud_endpoint =
//!
//! [logging]
//! file =
//! ```
//!
//! A missing file yields the defaults. Empty values count as unset.

use std::path::{Path, PathBuf};

use ini::{EscapePolicy, Ini, ParseOption};
use thiserror::Error;

use crate::http::DEFAULT_TIMEOUT_SECS;
use crate::symbol_path::SymbolPathConfig;

const APP_DIR: &str = "symstore";
const CONFIG_FILE_NAME: &str = "config.ini";

const SECTION_SYMBOLS: &str = "symbols";
const SECTION_NETWORK: &str = "network";
const SECTION_LOGGING: &str = "logging";

/// Errors reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the user configuration directory")]
    NoConfigDir,

    #[error("failed to read config file {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value for {section}.{key}: '{value}'")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
    },
}

/// `[symbols]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolsSettings {
    /// Search path in `_NT_SYMBOL_PATH` format.
    pub search_path: Option<String>,
    /// Default cache for `cache*` and uncached remote stores.
    pub cache_dir: Option<PathBuf>,
    /// Default member for empty `srv*` entries.
    pub default_store: Option<PathBuf>,
    pub excluded_hosts: Vec<String>,
}

impl Default for SymbolsSettings {
    fn default() -> Self {
        Self {
            search_path: None,
            cache_dir: dirs::cache_dir().map(|d| d.join(APP_DIR)),
            default_store: None,
            excluded_hosts: Vec::new(),
        }
    }
}

/// `[network]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSettings {
    pub timeout_secs: u64,
    /// Lookup service for cloud stores.
    pub cloud_endpoint: Option<String>,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cloud_endpoint: None,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file; console only when unset.
    pub file: Option<PathBuf>,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub symbols: SymbolsSettings,
    pub network: NetworkSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Default location of the configuration file.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`, returning defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        // Backslashes are path separators here, not escapes.
        let option = ParseOption {
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_file_opt(path, option).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::default_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save to `path`, creating its directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini()
            .write_to_file_policy(path, EscapePolicy::Nothing)
            .map_err(write_err)
    }

    /// Parser defaults derived from this configuration.
    pub fn to_path_config(&self) -> SymbolPathConfig {
        let mut config =
            SymbolPathConfig::new().with_excluded_hosts(&self.symbols.excluded_hosts);
        if let Some(cache) = &self.symbols.cache_dir {
            config = config.with_default_cache(cache);
        }
        if let Some(store) = &self.symbols.default_store {
            config = config.with_default_store(store);
        }
        config
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some(SECTION_SYMBOLS)) {
            if let Some(v) = non_empty(section.get("search_path")) {
                config.symbols.search_path = Some(v.to_string());
            }
            if let Some(v) = section.get("cache_dir") {
                config.symbols.cache_dir = non_empty(Some(v)).map(expand_tilde);
            }
            if let Some(v) = non_empty(section.get("default_store")) {
                config.symbols.default_store = Some(expand_tilde(v));
            }
            if let Some(v) = section.get("excluded_hosts") {
                config.symbols.excluded_hosts = v
                    .split(',')
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(str::to_string)
                    .collect();
            }
        }

        if let Some(section) = ini.section(Some(SECTION_NETWORK)) {
            if let Some(v) = non_empty(section.get("timeout_secs")) {
                config.network.timeout_secs =
                    v.parse().map_err(|_| ConfigError::InvalidValue {
                        section: SECTION_NETWORK,
                        key: "timeout_secs",
                        value: v.to_string(),
                    })?;
            }
            if let Some(v) = non_empty(section.get("cloud_endpoint")) {
                config.network.cloud_endpoint = Some(v.to_string());
            }
        }

        if let Some(section) = ini.section(Some(SECTION_LOGGING)) {
            if let Some(v) = non_empty(section.get("file")) {
                config.logging.file = Some(expand_tilde(v));
            }
        }

        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let path_str = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        };

        let mut ini = Ini::new();
        ini.with_section(Some(SECTION_SYMBOLS))
            .set(
                "search_path",
                self.symbols.search_path.clone().unwrap_or_default(),
            )
            .set("cache_dir", path_str(&self.symbols.cache_dir))
            .set("default_store", path_str(&self.symbols.default_store))
            .set("excluded_hosts", self.symbols.excluded_hosts.join(", "));
        ini.with_section(Some(SECTION_NETWORK))
            .set("timeout_secs", self.network.timeout_secs.to_string())
            .set(
                "cloud_endpoint",
                self.network.cloud_endpoint.clone().unwrap_or_default(),
            );
        ini.with_section(Some(SECTION_LOGGING))
            .set("file", path_str(&self.logging.file));
        ini
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn expand_tilde(value: &str) -> PathBuf {
    if let Some(rest) = value.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(value)
}
