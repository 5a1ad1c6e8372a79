//! Port group specification builder.

use crate::error::{InventoryError, Result};
use crate::types::{HostNetworkPolicy, HostNicTeamingPolicy, HostPortGroupSpec};

/// VLAN id meaning "no VLAN tagging".
pub const VLAN_ID_NONE: u16 = 0;

/// Highest VLAN id accepted by a standard vSwitch (4095 trunks all VLANs).
pub const VLAN_ID_MAX: u16 = 4095;

/// Reject VLAN ids a standard vSwitch cannot carry.
pub fn validate_vlan_id(vlan_id: u16) -> Result<()> {
    if vlan_id > VLAN_ID_MAX {
        return Err(InventoryError::InvalidConfig(format!(
            "VLAN id {vlan_id} out of range 0-{VLAN_ID_MAX}"
        )));
    }
    Ok(())
}

/// Build the `AddPortGroup` payload for a port group on `vswitch_name`.
///
/// Switches are notified on failover so upstream MAC tables follow the
/// active uplink.
pub fn add_port_group_spec(vswitch_name: &str, name: &str, vlan_id: u16) -> HostPortGroupSpec {
    HostPortGroupSpec {
        name: name.to_string(),
        vlan_id,
        vswitch_name: vswitch_name.to_string(),
        policy: HostNetworkPolicy {
            nic_teaming: Some(HostNicTeamingPolicy {
                policy: None,
                notify_switches: Some(true),
            }),
        },
    }
}
