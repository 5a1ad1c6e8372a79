//! Dispatch of CLI commands to inventory operations.

use anyhow::{Context, Result};
use hostnet_inventory::HostNetworkInventory;
use serde_json::{json, Value};
use tracing::info;

use crate::cli::Command;

/// Run `command` and return its result as JSON.
pub async fn run(command: &Command, inventory: &HostNetworkInventory<'_>) -> Result<Value> {
    let output = match command {
        Command::FindNetwork { name } => {
            let name = name
                .as_deref()
                .unwrap_or(&inventory.config().default_network);
            let network = inventory
                .find_network_by_name(name)
                .await
                .with_context(|| format!("Failed to look up network {name}"))?;
            json!({ "name": name, "network": network })
        }
        Command::FindVswitch { interface } => {
            let vswitch = inventory
                .find_vswitch_for_interface(interface)
                .await
                .with_context(|| format!("Failed to look up vSwitch for {interface}"))?;
            json!({ "interface": interface, "vswitch": vswitch })
        }
        Command::InterfaceExists { interface } => {
            let exists = inventory
                .interface_exists(interface)
                .await
                .with_context(|| format!("Failed to look up interface {interface}"))?;
            json!({ "interface": interface, "exists": exists })
        }
        Command::ResolvePortgroup { name } => {
            let binding = inventory
                .resolve_portgroup(name)
                .await
                .with_context(|| format!("Failed to resolve port group {name}"))?;
            json!({ "portgroup": name, "binding": binding })
        }
        Command::CreatePortgroup { name, vswitch, vlan } => {
            let outcome = inventory
                .create_portgroup(name, vswitch, *vlan)
                .await
                .with_context(|| format!("Failed to create port group {name} on {vswitch}"))?;
            info!(portgroup = %name, outcome = ?outcome, "Port group ready");
            json!({ "portgroup": name, "vswitch": vswitch, "vlan_id": vlan, "outcome": outcome })
        }
    };

    Ok(output)
}
