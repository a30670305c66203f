//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Shelfguard -- barcode scan and product safety lookup tool.
///
/// Use `shelfguard <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "shelfguard", version, about, long_about = None)]
pub struct Cli {
    /// Path to the shelfguard.toml configuration file.
    #[arg(short, long, default_value = "shelfguard.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a single decoded payload (barcode digits or QR JSON).
    Scan(ScanArgs),

    /// Look up a barcode in the product catalog.
    Lookup(LookupArgs),

    /// Replay decoded frames through full capture sessions.
    Watch(WatchArgs),

    /// Inspect the product catalog.
    Catalog(CatalogArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- scan ----

/// Resolve one decoded payload without a capture session.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Decoded text: barcode digits or a structured QR JSON object.
    pub payload: String,

    /// Catalog JSON file (overrides the configured catalog).
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

// ---- lookup ----

/// Look up a barcode by exact match.
#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Barcode to look up.
    pub barcode: String,

    /// Catalog JSON file (overrides the configured catalog).
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

// ---- watch ----

/// Replay decoded frames, one capture session per frame.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// File with one decoded frame per line (default: stdin).
    pub input: Option<PathBuf>,

    /// Catalog JSON file (overrides the configured catalog).
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

// ---- catalog ----

/// Inspect the product catalog.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub action: CatalogAction,
}

#[derive(Subcommand, Debug)]
pub enum CatalogAction {
    /// List every product in the catalog.
    List {
        /// Catalog JSON file (overrides the configured catalog).
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

// ---- config ----

/// Manage shelfguard configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, capture, directory, history).
        #[arg(long)]
        section: Option<String>,
    },
}
