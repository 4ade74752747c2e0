//! Configuration CLI commands.
//!
//! Provides `config path` and `config show` for inspecting the settings the
//! other commands run with.

use clap::Subcommand;
use symstore::config::ConfigFile;

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// List all configuration settings
    Show,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config: &ConfigFile) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => {
            run_show(config);
            Ok(())
        }
    }
}

fn run_path() -> Result<(), CliError> {
    println!("{}", ConfigFile::default_path()?.display());
    Ok(())
}

fn run_show(config: &ConfigFile) {
    println!("Configuration Settings");
    println!("======================");
    println!();

    let mut current_section = "";
    for (section, key, value) in settings(config) {
        // Print section header when section changes
        if section != current_section {
            if !current_section.is_empty() {
                println!();
            }
            println!("[{}]", section);
            current_section = section;
        }

        if value.is_empty() {
            println!("  {} = (not set)", key);
        } else {
            println!("  {} = {}", key, value);
        }
    }
}

fn settings(config: &ConfigFile) -> Vec<(&'static str, &'static str, String)> {
    let path = |p: &Option<std::path::PathBuf>| {
        p.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    };

    vec![
        (
            "symbols",
            "search_path",
            config.symbols.search_path.clone().unwrap_or_default(),
        ),
        ("symbols", "cache_dir", path(&config.symbols.cache_dir)),
        ("symbols", "default_store", path(&config.symbols.default_store)),
        (
            "symbols",
            "excluded_hosts",
            config.symbols.excluded_hosts.join(", "),
        ),
        (
            "network",
            "timeout_secs",
            config.network.timeout_secs.to_string(),
        ),
        (
            "network",
            "cloud_endpoint",
            config.network.cloud_endpoint.clone().unwrap_or_default(),
        ),
        ("logging", "file", path(&config.logging.file)),
    ]
}
