//! Lookup requests.

use std::fmt;

use serde::Serialize;

use crate::build_id::BuildId;

/// Binary format of the module whose symbols are requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    /// ELF executables and separate `.debug` files.
    #[default]
    Elf,
    /// Windows PE images.
    Pe,
    /// Windows program databases.
    Pdb,
}

impl ModuleFormat {
    /// Parse from a configuration or command-line string.
    pub fn from_config_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "elf" => Some(Self::Elf),
            "pe" => Some(Self::Pe),
            "pdb" => Some(Self::Pdb),
            _ => None,
        }
    }
}

impl fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Elf => "elf",
            Self::Pe => "pe",
            Self::Pdb => "pdb",
        };
        f.write_str(name)
    }
}

/// A request to locate one symbol file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSearchQuery {
    /// File name to search for, without any directory component.
    pub filename: String,

    /// Expected identity; empty accepts the first file found.
    pub build_id: BuildId,

    /// Whether the caller needs the debug-info variant of the module.
    pub is_debug_info_file: bool,

    /// Bypass negative-result caches and check every remote store live.
    pub force_load: bool,

    /// Format of the module, passed through to the module parser.
    pub module_format: ModuleFormat,
}

impl ModuleSearchQuery {
    /// Create a query for `filename` with the given build id.
    pub fn new(filename: impl Into<String>, build_id: BuildId) -> Self {
        Self {
            filename: filename.into(),
            build_id,
            is_debug_info_file: false,
            force_load: false,
            module_format: ModuleFormat::default(),
        }
    }

    /// Request the debug-info variant of the module.
    pub fn with_debug_info(mut self, is_debug_info_file: bool) -> Self {
        self.is_debug_info_file = is_debug_info_file;
        self
    }

    /// Bypass negative-result caches.
    pub fn with_force_load(mut self, force_load: bool) -> Self {
        self.force_load = force_load;
        self
    }

    /// Set the module format.
    pub fn with_format(mut self, module_format: ModuleFormat) -> Self {
        self.module_format = module_format;
        self
    }
}
