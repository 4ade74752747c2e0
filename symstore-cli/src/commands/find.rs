//! `symstore find` - locate a symbol file.

use clap::Args;
use symstore::config::ConfigFile;
use symstore::{BuildId, ModuleSearchQuery};
use tracing::debug;

use super::common::{build_parser, resolve_search_path, FormatArg};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct FindArgs {
    /// File name to search for
    pub filename: String,

    /// Expected build id in hex (any file with the name matches when omitted)
    #[arg(long)]
    pub build_id: Option<String>,

    /// Look for the separate debug-info file
    #[arg(long)]
    pub debug_info: bool,

    /// Ignore cached negative results from remote stores
    #[arg(long)]
    pub force: bool,

    /// Module format
    #[arg(long, value_enum, default_value_t = FormatArg::Elf)]
    pub format: FormatArg,

    /// Search path (overrides _NT_SYMBOL_PATH and config.ini)
    #[arg(long)]
    pub path: Option<String>,
}

/// Search for the file and print where it was found.
pub async fn run(args: FindArgs, config: &ConfigFile) -> Result<(), CliError> {
    let build_id = match args.build_id.as_deref() {
        Some(hex) => BuildId::parse(hex)?,
        None => BuildId::empty(),
    };
    let query = ModuleSearchQuery::new(args.filename.clone(), build_id)
        .with_debug_info(args.debug_info)
        .with_force_load(args.force)
        .with_format(args.format.into());

    let spec = resolve_search_path(args.path, config)?;
    debug!(spec = %spec, "Using symbol search path");
    let store = build_parser(config)?.parse(&spec);

    match store.find_file(&query).await? {
        Some(file) => {
            println!("{}", file.location());
            Ok(())
        }
        None => Err(CliError::NotFound(args.filename)),
    }
}
