//! `symstore parse` - show how a search path is interpreted.

use clap::Args;
use symstore::config::ConfigFile;

use super::common::{build_parser, resolve_search_path};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Search path to parse (defaults to the configured search path)
    pub spec: Option<String>,
}

/// Print the parsed store tree as JSON.
pub fn run(args: ParseArgs, config: &ConfigFile) -> Result<(), CliError> {
    let spec = resolve_search_path(args.spec, config)?;
    let store = build_parser(config)?.parse(&spec);
    println!("{}", serde_json::to_string_pretty(&store)?);
    Ok(())
}
