//! Type definitions for managed objects and host network configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A loosely typed property value as returned by the management server.
pub type PropertyValue = serde_json::Value;

// =============================================================================
// MANAGED OBJECTS
// =============================================================================

/// Managed object types queried by the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Datacenter,
    Network,
    HostSystem,
    HostNetworkSystem,
}

impl ObjectType {
    /// Type name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Datacenter => "Datacenter",
            Self::Network => "Network",
            Self::HostSystem => "HostSystem",
            Self::HostNetworkSystem => "HostNetworkSystem",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque handle identifying a remote inventory object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManagedObjectRef {
    /// Object type name (e.g. "HostSystem")
    #[serde(rename = "type")]
    pub kind: String,
    /// Server-assigned identifier (e.g. "ha-host")
    pub value: String,
}

impl ManagedObjectRef {
    pub fn new(kind: ObjectType, value: impl Into<String>) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            value: value.into(),
        }
    }

    /// Whether this reference points at an object of `kind`.
    pub fn is(&self, kind: ObjectType) -> bool {
        self.kind == kind.as_str()
    }
}

impl fmt::Display for ManagedObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

/// A single named property of a managed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicProperty {
    pub name: String,
    pub val: PropertyValue,
}

/// An object reference together with the properties fetched for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectContent {
    pub obj: ManagedObjectRef,
    #[serde(default)]
    pub prop_set: Vec<DynamicProperty>,
}

impl ObjectContent {
    pub fn new(obj: ManagedObjectRef) -> Self {
        Self {
            obj,
            prop_set: Vec::new(),
        }
    }

    /// Add a property.
    pub fn with_property(mut self, name: impl Into<String>, val: PropertyValue) -> Self {
        self.prop_set.push(DynamicProperty {
            name: name.into(),
            val,
        });
        self
    }

    /// Borrow a property value by name.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.prop_set.iter().find(|p| p.name == name).map(|p| &p.val)
    }

    /// Remove a property value by name and return it.
    pub fn take_property(&mut self, name: &str) -> Option<PropertyValue> {
        let index = self.prop_set.iter().position(|p| p.name == name)?;
        Some(self.prop_set.swap_remove(index).val)
    }
}

/// Property paths read by the inventory.
pub mod props {
    /// Datacenter: networks in the datacenter
    pub const DATACENTER_NETWORK: &str = "network";
    /// Network: display name
    pub const NETWORK_SUMMARY_NAME: &str = "summary.name";
    /// HostSystem: virtual switches
    pub const HOST_VSWITCH: &str = "config.network.vswitch";
    /// HostSystem: port groups
    pub const HOST_PORTGROUP: &str = "config.network.portgroup";
    /// HostSystem: network system manager
    pub const HOST_NETWORK_SYSTEM: &str = "configManager.networkSystem";
    /// HostNetworkSystem: physical NICs
    pub const NETWORK_INFO_PNIC: &str = "networkInfo.pnic";
}

/// Element names of the `ArrayOf…` wrappers around collection properties.
pub mod wrapper {
    pub const MANAGED_OBJECT_REFERENCE: &str = "ManagedObjectReference";
    pub const HOST_VIRTUAL_SWITCH: &str = "HostVirtualSwitch";
    pub const HOST_PORT_GROUP: &str = "HostPortGroup";
    pub const PHYSICAL_NIC: &str = "PhysicalNic";
    pub const STRING: &str = "string";
}

// =============================================================================
// HOST NETWORK CONFIGURATION
// =============================================================================

/// A host-local virtual switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostVirtualSwitch {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_ports: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    /// Physical NIC keys, left raw so a malformed list only affects this switch
    #[serde(default)]
    pub pnic: PropertyValue,
}

/// A physical network adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalNic {
    /// Device identifier (e.g. "vmnic0")
    pub device: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
}

/// NIC teaming policy of a port group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostNicTeamingPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_switches: Option<bool>,
}

/// Network policy of a port group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostNetworkPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nic_teaming: Option<HostNicTeamingPolicy>,
}

/// Port group specification: the payload of `AddPortGroup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostPortGroupSpec {
    pub name: String,
    /// VLAN id; 0 means untagged
    #[serde(default)]
    pub vlan_id: u16,
    #[serde(default)]
    pub vswitch_name: String,
    #[serde(default)]
    pub policy: HostNetworkPolicy,
}

/// A port group as reported in the host's network configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostPortGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub spec: HostPortGroupSpec,
    /// Key of the owning vSwitch (e.g. "key-vim.host.VirtualSwitch-vSwitch0")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vswitch: Option<String>,
}

// =============================================================================
// OPERATION RESULTS
// =============================================================================

/// VLAN and vSwitch a port group is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortGroupBinding {
    pub vlan_id: u16,
    pub vswitch_name: String,
}

/// Outcome of a port group creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortGroupCreation {
    /// This call created the port group
    Created,
    /// The port group was already present (possibly created concurrently)
    AlreadyExisted,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_managed_object_ref_wire_shape() {
        let mor: ManagedObjectRef =
            serde_json::from_value(json!({"type": "HostSystem", "value": "ha-host"})).unwrap();
        assert!(mor.is(ObjectType::HostSystem));
        assert!(!mor.is(ObjectType::Network));
        assert_eq!(mor.to_string(), "HostSystem:ha-host");
    }

    #[test]
    fn test_object_content_properties() {
        let mut content = ObjectContent::new(ManagedObjectRef::new(ObjectType::Network, "network-7"))
            .with_property(props::NETWORK_SUMMARY_NAME, json!("VM Network"));

        assert_eq!(content.property(props::NETWORK_SUMMARY_NAME), Some(&json!("VM Network")));
        assert!(content.property("name").is_none());

        assert_eq!(content.take_property(props::NETWORK_SUMMARY_NAME), Some(json!("VM Network")));
        assert!(content.take_property(props::NETWORK_SUMMARY_NAME).is_none());
    }

    #[test]
    fn test_port_group_parses_camel_case() {
        let pg: HostPortGroup = serde_json::from_value(json!({
            "key": "key-vim.host.PortGroup-VM Network",
            "spec": {
                "name": "VM Network",
                "vlanId": 100,
                "vswitchName": "vSwitch0",
                "policy": {}
            },
            "vswitch": "key-vim.host.VirtualSwitch-vSwitch0"
        }))
        .unwrap();

        assert_eq!(pg.spec.vlan_id, 100);
        assert_eq!(pg.spec.vswitch_name, "vSwitch0");
        assert_eq!(pg.vswitch.as_deref(), Some("key-vim.host.VirtualSwitch-vSwitch0"));
    }
}
