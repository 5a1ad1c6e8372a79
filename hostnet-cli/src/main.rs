//! # hostnet
//!
//! Command-line front end to the host network inventory. Operations run
//! against a host inventory fixture served by the mock session, which makes
//! the tool usable for rehearsing port group changes and checking lookups
//! offline.
//!
//! ## Usage
//! ```bash
//! hostnet --fixture host.yaml find-vswitch vmnic0
//! hostnet --fixture host.yaml create-portgroup br100 vSwitch0 --vlan 100
//! ```

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{error, info};

use hostnet_inventory::{HostFixture, HostNetworkInventory, MockSession};

mod cli;
mod commands;
mod config;

use crate::cli::Args;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_deref())?.with_cli_overrides(&args);
    config.validate()?;

    // Initialize logging
    hostnet_common::init_logging_with_format(&config.log_level, config.log_format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        command = ?args.command,
        "Starting hostnet"
    );

    let fixture_path = config
        .fixture
        .as_ref()
        .ok_or_else(|| anyhow!("No host fixture configured (use --fixture or `fixture:` in the config file)"))?;

    let fixture = HostFixture::load(fixture_path)
        .with_context(|| format!("Failed to load host fixture {}", fixture_path.display()))?;

    let session = MockSession::from_fixture(fixture);
    let inventory = HostNetworkInventory::with_config(&session, config.inventory.clone());

    let output = match commands::run(&args.command, &inventory).await {
        Ok(output) => output,
        Err(e) => {
            error!(error = %e, "Command failed");
            return Err(e);
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
