//! Shelfguard CLI entry point.
//!
//! Parses arguments, loads configuration, initializes logging, and
//! dispatches to the subcommand handlers. Errors are printed to stderr
//! and mapped to exit codes via [`error::CliError::exit_code`].

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // CLI flags take precedence over the config file for logging. A broken
    // config file is not fatal here so `config validate` can still report it.
    let mut general = match commands::load_config(&cli.config).await {
        Ok(config) => config.general,
        Err(_) => shelfguard_core::config::GeneralConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        general.log_level = level.clone();
    }
    logging::init_tracing(&general).map_err(|e| CliError::Config(e.to_string()))?;
    shelfguard_core::metrics::describe_all();

    debug!(config = %cli.config.display(), "shelfguard starting");

    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Scan(args) => commands::scan::execute(args, &cli.config, &writer).await,
        Commands::Lookup(args) => commands::lookup::execute(args, &cli.config, &writer).await,
        Commands::Watch(args) => commands::watch::execute(args, &cli.config, &writer).await,
        Commands::Catalog(args) => commands::catalog::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}
