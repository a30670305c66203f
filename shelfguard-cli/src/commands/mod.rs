//! Command handlers -- one module per subcommand

pub mod catalog;
pub mod config;
pub mod lookup;
pub mod scan;
pub mod watch;

use std::path::{Path, PathBuf};

use tracing::info;

use shelfguard_core::config::ShelfguardConfig;
use shelfguard_resolver::StaticProductDirectory;

use crate::error::CliError;

/// Default config file name used when `-c` is not given.
const DEFAULT_CONFIG_PATH: &str = "shelfguard.toml";

/// Load the effective configuration for a command.
///
/// A missing file at the default path falls back to defaults plus env
/// overrides; a missing file at an explicitly given path is an error.
pub async fn load_config(config_path: &Path) -> Result<ShelfguardConfig, CliError> {
    match ShelfguardConfig::load(config_path).await {
        Ok(config) => Ok(config),
        Err(shelfguard_core::ShelfguardError::Config(
            shelfguard_core::ConfigError::FileNotFound { .. },
        )) if config_path == Path::new(DEFAULT_CONFIG_PATH) => {
            info!("no shelfguard.toml found, using defaults");
            let mut config = ShelfguardConfig::default();
            config.apply_env_overrides();
            config.validate().map_err(|e| CliError::Config(e.to_string()))?;
            Ok(config)
        }
        Err(e) => Err(CliError::Config(e.to_string())),
    }
}

/// Build the product directory for a command.
///
/// Priority: `--catalog` flag, then `directory.catalog_path` from the
/// config, then the built-in demo catalog.
pub async fn build_directory(
    catalog_flag: Option<&PathBuf>,
    config: &ShelfguardConfig,
) -> Result<StaticProductDirectory, CliError> {
    if let Some(path) = catalog_flag {
        return Ok(StaticProductDirectory::from_json_file(path).await?);
    }
    if !config.directory.catalog_path.is_empty() {
        return Ok(StaticProductDirectory::from_json_file(&config.directory.catalog_path).await?);
    }
    info!("no catalog configured, using the built-in demo catalog");
    Ok(StaticProductDirectory::demo())
}
