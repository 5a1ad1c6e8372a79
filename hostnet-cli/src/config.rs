//! Configuration management for the hostnet CLI.
//!
//! Sources, lowest precedence first: built-in defaults, the YAML file,
//! `HOSTNET__*` environment variables (`HOSTNET__INVENTORY__DEFAULT_NETWORK`),
//! then command-line flags.

use anyhow::{bail, Context, Result};
use hostnet_common::{is_valid_level, LogFormat};
use hostnet_inventory::InventoryConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cli::Args;

/// Configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/hostnet/hostnet.yaml";

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Host inventory fixture served by the mock session
    pub fixture: Option<PathBuf>,
    /// Inventory settings
    pub inventory: InventoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            fixture: None,
            inventory: InventoryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path` (required) or the default location (optional).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => ::config::File::from(path).required(true),
            None => ::config::File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false),
        };

        let config: Config = ::config::Config::builder()
            .add_source(file)
            .add_source(
                ::config::Environment::with_prefix("HOSTNET")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("inventory.benign_faults"),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        Ok(config)
    }

    /// Apply CLI argument overrides to the configuration.
    pub fn with_cli_overrides(mut self, args: &Args) -> Self {
        if let Some(ref level) = args.log_level {
            self.log_level = level.clone();
        }

        if args.json_logs {
            self.log_format = LogFormat::Json;
        }

        if let Some(ref fixture) = args.fixture {
            self.fixture = Some(fixture.clone());
        }

        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_level(&self.log_level) {
            bail!("Invalid log level: {}", self.log_level);
        }

        self.inventory
            .validate()
            .context("Invalid inventory configuration")?;

        Ok(())
    }
}
