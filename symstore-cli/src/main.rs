//! symstore CLI - find and cache debug symbol files
//!
//! This binary provides a command-line interface to the symstore library.

mod commands;
mod error;
mod parser;

use clap::{Parser, Subcommand};
use symstore::config::ConfigFile;
use symstore::logging::{init_logging, LogConfig};

use commands::add::AddArgs;
use commands::config::ConfigCommands;
use commands::find::FindArgs;
use commands::parse::ParseArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "symstore")]
#[command(version = symstore::VERSION)]
#[command(about = "Find and cache debug symbol files across symbol servers", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a search path and print the resulting store tree
    Parse(ParseArgs),

    /// Find a symbol file by name and build id
    Find(FindArgs),

    /// Add a file to a structured symbol store
    Add(AddArgs),

    /// View configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = ConfigFile::load()?;

    let mut log_config = LogConfig::default();
    if cli.verbose {
        log_config = log_config.with_filter("symstore=debug");
    }
    if let Some(file) = &config.logging.file {
        log_config = log_config.with_file(file);
    }
    let _guard = init_logging(&log_config)?;

    match cli.command {
        Commands::Parse(args) => commands::parse::run(args, &config),
        Commands::Find(args) => commands::find::run(args, &config).await,
        Commands::Add(args) => commands::add::run(args).await,
        Commands::Config { command } => commands::config::run(command, &config),
    }
}
