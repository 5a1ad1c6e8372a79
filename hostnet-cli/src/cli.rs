//! Command-line argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hostnet - Host network inventory for VIM-managed hypervisors
#[derive(Parser, Debug)]
#[command(name = "hostnet")]
#[command(about = "hostnet - Host network inventory for VIM-managed hypervisors")]
#[command(version)]
pub struct Args {
    /// Path to configuration file (optional, defaults used if not found)
    #[arg(short, long, env = "HOSTNET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Host inventory fixture (YAML) served by the mock session
    #[arg(short, long)]
    pub fixture: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Inventory operations.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Find a network by exact name (defaults to the configured default network)
    FindNetwork {
        name: Option<String>,
    },

    /// Find the vSwitch whose uplinks include a physical interface
    FindVswitch {
        interface: String,
    },

    /// Check whether a physical interface exists on the host
    InterfaceExists {
        interface: String,
    },

    /// Show the VLAN id and vSwitch of a port group
    ResolvePortgroup {
        name: String,
    },

    /// Create a port group (succeeds if it already exists)
    CreatePortgroup {
        name: String,
        vswitch: String,

        /// VLAN id, 0 for untagged
        #[arg(long, default_value_t = 0)]
        vlan: u16,
    },
}
