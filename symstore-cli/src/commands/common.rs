//! Common types and utilities shared across CLI commands.

use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use symstore::config::ConfigFile;
use symstore::{
    BoxFuture, ModuleFormat, ReqwestClient, ResolveError, RestUrlResolver, SymbolPathParser,
    SymbolUrlResolver,
};

use crate::error::CliError;
use crate::parser::ObjectModuleParser;

/// Environment variable holding a search path.
pub const SYMBOL_PATH_ENV: &str = "_NT_SYMBOL_PATH";

/// Module format selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FormatArg {
    /// ELF executables and separate debug files
    Elf,
    /// Windows PE images
    Pe,
    /// Windows program databases
    Pdb,
}

impl From<FormatArg> for ModuleFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Elf => ModuleFormat::Elf,
            FormatArg::Pe => ModuleFormat::Pe,
            FormatArg::Pdb => ModuleFormat::Pdb,
        }
    }
}

/// Resolve the search path from CLI args, the environment and config.
pub fn resolve_search_path(
    cli_path: Option<String>,
    config: &ConfigFile,
) -> Result<String, CliError> {
    search_path_from(cli_path, std::env::var(SYMBOL_PATH_ENV).ok(), config)
}

fn search_path_from(
    cli_path: Option<String>,
    env_path: Option<String>,
    config: &ConfigFile,
) -> Result<String, CliError> {
    // CLI takes precedence, then environment, then config
    cli_path
        .or_else(|| env_path.filter(|p| !p.trim().is_empty()))
        .or_else(|| config.symbols.search_path.clone())
        .ok_or_else(|| {
            CliError::Config(format!(
                "No symbol search path. Use --path, set {}, or set symbols.search_path in config.ini",
                SYMBOL_PATH_ENV
            ))
        })
}

/// Build a search path parser wired to real network clients.
pub fn build_parser(config: &ConfigFile) -> Result<SymbolPathParser, CliError> {
    let timeout = config.network.timeout_secs;
    let http_client = Arc::new(ReqwestClient::with_timeout(timeout)?);

    let resolver: Arc<dyn SymbolUrlResolver> = match &config.network.cloud_endpoint {
        Some(endpoint) => Arc::new(RestUrlResolver::new(
            endpoint.clone(),
            Duration::from_secs(timeout),
        )?),
        None => Arc::new(NoCloudEndpoint),
    };

    Ok(SymbolPathParser::new(
        Arc::new(ObjectModuleParser),
        http_client,
        resolver,
        config.to_path_config(),
    ))
}

/// Resolver used when no cloud endpoint is configured.
struct NoCloudEndpoint;

impl SymbolUrlResolver for NoCloudEndpoint {
    fn resolve_download_url<'a>(
        &'a self,
        _build_id_hex: &'a str,
        _filename: &'a str,
    ) -> BoxFuture<'a, Result<String, ResolveError>> {
        Box::pin(async {
            Err(ResolveError::Failed(
                "network.cloud_endpoint is not set in config.ini".to_string(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_path(path: Option<&str>) -> ConfigFile {
        let mut config = ConfigFile::default();
        config.symbols.search_path = path.map(str::to_string);
        config
    }

    #[test]
    fn test_cli_path_wins() {
        let config = config_with_path(Some("from-config"));
        let path = search_path_from(
            Some("from-cli".to_string()),
            Some("from-env".to_string()),
            &config,
        )
        .unwrap();
        assert_eq!(path, "from-cli");
    }

    #[test]
    fn test_env_before_config() {
        let config = config_with_path(Some("from-config"));
        assert_eq!(
            search_path_from(None, Some("from-env".to_string()), &config).unwrap(),
            "from-env"
        );
        assert_eq!(
            search_path_from(None, Some("  ".to_string()), &config).unwrap(),
            "from-config"
        );
    }

    #[test]
    fn test_missing_path_is_config_error() {
        let err = search_path_from(None, None, &config_with_path(None)).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_format_conversion() {
        assert_eq!(ModuleFormat::from(FormatArg::Elf), ModuleFormat::Elf);
        assert_eq!(ModuleFormat::from(FormatArg::Pdb), ModuleFormat::Pdb);
    }
}
