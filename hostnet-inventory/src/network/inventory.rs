//! Network queries and port group creation against the first host in the inventory.
//!
//! Every call fetches fresh data from the session; nothing is cached between
//! calls. Standalone hosts and single-datacenter deployments are assumed: only
//! the first Datacenter and the first HostSystem returned are consulted.

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, info, instrument, warn};

use crate::collection;
use crate::config::InventoryConfig;
use crate::error::{InventoryError, Result};
use crate::spec::{add_port_group_spec, validate_vlan_id, VLAN_ID_NONE};
use crate::traits::VimSession;
use crate::types::{
    props, wrapper, HostPortGroup, HostVirtualSwitch, ManagedObjectRef, ObjectContent,
    ObjectType, PhysicalNic, PortGroupBinding, PortGroupCreation, PropertyValue,
};

use super::matching::{nic_key_matches_interface, vswitch_name_from_key};

/// Method invoked on the host network system to create a port group.
pub const ADD_PORT_GROUP: &str = "AddPortGroup";

/// Stateless network inventory over a borrowed session.
pub struct HostNetworkInventory<'a> {
    session: &'a dyn VimSession,
    config: InventoryConfig,
}

impl<'a> HostNetworkInventory<'a> {
    /// Create an inventory with default settings.
    pub fn new(session: &'a dyn VimSession) -> Self {
        Self::with_config(session, InventoryConfig::default())
    }

    /// Create an inventory with custom settings.
    pub fn with_config(session: &'a dyn VimSession, config: InventoryConfig) -> Self {
        Self { session, config }
    }

    /// Current settings.
    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    // =========================================================================
    // Networks
    // =========================================================================

    /// Find the network whose name is exactly `name`.
    ///
    /// Returns `None` when the datacenter has no networks or none matches.
    #[instrument(skip(self))]
    pub async fn find_network_by_name(&self, name: &str) -> Result<Option<ManagedObjectRef>> {
        let datacenters = self
            .session
            .query_objects(ObjectType::Datacenter, &[props::DATACENTER_NETWORK])
            .await?;

        let Some(mut datacenter) = datacenters.into_iter().next() else {
            debug!("No datacenter in inventory");
            return Ok(None);
        };

        let network_refs: Vec<ManagedObjectRef> = collection::typed_items(
            datacenter.take_property(props::DATACENTER_NETWORK),
            wrapper::MANAGED_OBJECT_REFERENCE,
            props::DATACENTER_NETWORK,
        )?;

        if network_refs.is_empty() {
            debug!(datacenter = %datacenter.obj, "Datacenter has no networks");
            return Ok(None);
        }

        let networks = self
            .session
            .query_objects_by_ref(
                ObjectType::Network,
                &network_refs,
                &[props::NETWORK_SUMMARY_NAME],
            )
            .await?;

        let found = networks
            .into_iter()
            .find(|network| {
                network
                    .property(props::NETWORK_SUMMARY_NAME)
                    .and_then(PropertyValue::as_str)
                    == Some(name)
            })
            .map(|network| network.obj);

        match &found {
            Some(network) => debug!(network = %network, "Network found"),
            None => debug!(candidates = network_refs.len(), "Network not found"),
        }

        Ok(found)
    }

    /// Find the network named by `default_network` in the settings.
    pub async fn find_default_network(&self) -> Result<Option<ManagedObjectRef>> {
        self.find_network_by_name(&self.config.default_network).await
    }

    // =========================================================================
    // vSwitches and physical NICs
    // =========================================================================

    /// Find the vSwitch that has `interface_name` among its uplinks.
    ///
    /// NIC association is by key text (see [`nic_key_matches_interface`]).
    /// A vSwitch whose NIC list cannot be read is skipped.
    #[instrument(skip(self))]
    pub async fn find_vswitch_for_interface(&self, interface_name: &str) -> Result<Option<String>> {
        let host = self.host_ref().await?;
        let value = self
            .session
            .get_property(&host, ObjectType::HostSystem, props::HOST_VSWITCH)
            .await?;

        let vswitches = collection::items(value, wrapper::HOST_VIRTUAL_SWITCH, props::HOST_VSWITCH)?;
        if vswitches.is_empty() {
            debug!(host = %host, "Host reports no vSwitches");
            return Ok(None);
        }

        for (index, element) in vswitches.into_iter().enumerate() {
            match vswitch_with_interface(element, interface_name) {
                Ok(Some(name)) => {
                    debug!(vswitch = %name, "vSwitch found for interface");
                    return Ok(Some(name));
                }
                Ok(None) => {}
                Err(e) => debug!(index, error = %e, "Skipping vSwitch with unreadable NIC list"),
            }
        }

        debug!("No vSwitch uses the interface");
        Ok(None)
    }

    /// Check whether the host has a physical NIC whose device is exactly `interface_name`.
    ///
    /// NICs are scanned in server order and the scan stops at the first
    /// match; an element that cannot be decoded is skipped.
    #[instrument(skip(self))]
    pub async fn interface_exists(&self, interface_name: &str) -> Result<bool> {
        let network_system = self.network_system_ref().await?;
        let value = self
            .session
            .get_property(&network_system, ObjectType::HostNetworkSystem, props::NETWORK_INFO_PNIC)
            .await?;

        let nics = collection::items(value, wrapper::PHYSICAL_NIC, props::NETWORK_INFO_PNIC)?;
        let count = nics.len();

        let exists = nics
            .into_iter()
            .enumerate()
            .filter_map(|(index, element)| {
                decode_element::<PhysicalNic>(element, props::NETWORK_INFO_PNIC, index)
            })
            .any(|nic| nic.device == interface_name);

        debug!(nics = count, exists, "Physical NIC lookup complete");
        Ok(exists)
    }

    // =========================================================================
    // Port groups
    // =========================================================================

    /// Get the VLAN id and vSwitch of the port group named `portgroup_name`.
    ///
    /// A host without any port group is reported as
    /// [`InventoryError::ServerContractViolation`]; a host that has port
    /// groups but not this one yields `None`. Port groups are scanned in
    /// server order, skipping elements that cannot be decoded.
    #[instrument(skip(self))]
    pub async fn resolve_portgroup(&self, portgroup_name: &str) -> Result<Option<PortGroupBinding>> {
        let host = self.host_ref().await?;
        let value = self
            .session
            .get_property(&host, ObjectType::HostSystem, props::HOST_PORTGROUP)
            .await?;

        let port_groups = collection::items(value, wrapper::HOST_PORT_GROUP, props::HOST_PORTGROUP)?;

        if port_groups.is_empty() {
            let message = "server returned an empty port group list for the host system";
            error!(host = %host, "{}", message);
            return Err(InventoryError::ServerContractViolation(message.to_string()));
        }

        let binding = port_groups
            .into_iter()
            .enumerate()
            .filter_map(|(index, element)| {
                decode_element::<HostPortGroup>(element, props::HOST_PORTGROUP, index)
            })
            .find(|pg| pg.spec.name == portgroup_name)
            .map(|pg| {
                let vswitch_name = match pg.vswitch.as_deref() {
                    Some(key) => vswitch_name_from_key(key).to_string(),
                    None => pg.spec.vswitch_name,
                };
                PortGroupBinding {
                    vlan_id: pg.spec.vlan_id,
                    vswitch_name,
                }
            });

        match &binding {
            Some(b) => debug!(vlan_id = b.vlan_id, vswitch = %b.vswitch_name, "Port group resolved"),
            None => debug!("Port group not found"),
        }

        Ok(binding)
    }

    /// Create a port group on `vswitch_name` tagged with `vlan_id` (0 = untagged).
    ///
    /// Safe to call concurrently with the same arguments: if the server
    /// reports the group already exists, the call succeeds with
    /// [`PortGroupCreation::AlreadyExisted`]. Any other failure is returned
    /// unchanged.
    #[instrument(skip(self))]
    pub async fn create_portgroup(
        &self,
        name: &str,
        vswitch_name: &str,
        vlan_id: u16,
    ) -> Result<PortGroupCreation> {
        validate_vlan_id(vlan_id)?;

        let spec = add_port_group_spec(vswitch_name, name, vlan_id);
        let args = json!({ "portgrp": spec });

        let network_system = self.network_system_ref().await?;

        debug!(network_system = %network_system, "Creating port group on the host");

        match self.session.invoke(&network_system, ADD_PORT_GROUP, args).await {
            Ok(_) => {
                info!("Created port group on the host");
                Ok(PortGroupCreation::Created)
            }
            Err(InventoryError::RemoteFault { fault, .. })
                if fault.matches_any(&self.config.benign_faults) =>
            {
                info!(fault = %fault, "Port group already exists, conflict ignored");
                Ok(PortGroupCreation::AlreadyExisted)
            }
            Err(e) => {
                warn!(error = %e, "Port group creation failed");
                Err(e)
            }
        }
    }

    /// Create an untagged port group on `vswitch_name`.
    pub async fn create_untagged_portgroup(
        &self,
        name: &str,
        vswitch_name: &str,
    ) -> Result<PortGroupCreation> {
        self.create_portgroup(name, vswitch_name, VLAN_ID_NONE).await
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    async fn first_host(&self, properties: &[&str]) -> Result<ObjectContent> {
        self.session
            .query_objects(ObjectType::HostSystem, properties)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                error!("No host system in inventory");
                InventoryError::ServerContractViolation(
                    "server returned no host system".to_string(),
                )
            })
    }

    async fn host_ref(&self) -> Result<ManagedObjectRef> {
        Ok(self.first_host(&[]).await?.obj)
    }

    async fn network_system_ref(&self) -> Result<ManagedObjectRef> {
        let mut host = self.first_host(&[props::HOST_NETWORK_SYSTEM]).await?;

        let value = host
            .take_property(props::HOST_NETWORK_SYSTEM)
            .filter(|v| !collection::is_absent(Some(v)))
            .ok_or_else(|| {
                error!(host = %host.obj, "Host has no network system");
                InventoryError::ServerContractViolation(format!(
                    "host {} reported no network system",
                    host.obj
                ))
            })?;

        serde_json::from_value(value)
            .map_err(|e| InventoryError::malformed(props::HOST_NETWORK_SYSTEM, e.to_string()))
    }
}

/// Decode one collection element, or skip it at debug level.
fn decode_element<T: DeserializeOwned>(element: PropertyValue, property: &str, index: usize) -> Option<T> {
    match serde_json::from_value(element) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            debug!(property, index, error = %e, "Skipping undecodable element");
            None
        }
    }
}

/// Name of the vSwitch in `element` if one of its NIC keys matches `interface_name`.
fn vswitch_with_interface(element: PropertyValue, interface_name: &str) -> Result<Option<String>> {
    let vswitch: HostVirtualSwitch = serde_json::from_value(element)
        .map_err(|e| InventoryError::malformed(props::HOST_VSWITCH, e.to_string()))?;

    let nic_keys: Vec<String> =
        collection::typed_items(Some(vswitch.pnic), wrapper::STRING, "pnic")?;

    Ok(nic_keys
        .iter()
        .any(|key| nic_key_matches_interface(key, interface_name))
        .then_some(vswitch.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VimFault;
    use crate::mock::MockSession;
    use async_trait::async_trait;

    /// Session whose transport never reaches the endpoint.
    struct UnreachableSession;

    #[async_trait]
    impl VimSession for UnreachableSession {
        async fn query_objects(
            &self,
            _object_type: ObjectType,
            _properties: &[&str],
        ) -> Result<Vec<ObjectContent>> {
            Err(InventoryError::ConnectionFailed("https://esx-01/sdk: connection refused".to_string()))
        }

        async fn query_objects_by_ref(
            &self,
            _object_type: ObjectType,
            _objects: &[ManagedObjectRef],
            _properties: &[&str],
        ) -> Result<Vec<ObjectContent>> {
            Err(InventoryError::QueryFailed("RetrieveProperties timed out".to_string()))
        }

        async fn get_property(
            &self,
            _object: &ManagedObjectRef,
            _object_type: ObjectType,
            _property: &str,
        ) -> Result<Option<PropertyValue>> {
            Err(InventoryError::QueryFailed("RetrieveProperties timed out".to_string()))
        }

        async fn invoke(
            &self,
            _target: &ManagedObjectRef,
            _method: &str,
            _args: PropertyValue,
        ) -> Result<Option<PropertyValue>> {
            Err(InventoryError::QueryFailed("AddPortGroup timed out".to_string()))
        }
    }

    #[tokio::test]
    async fn test_transport_errors_pass_through() {
        let session = UnreachableSession;
        let inventory = HostNetworkInventory::new(&session);

        assert!(matches!(
            inventory.find_network_by_name("vmnet0").await,
            Err(InventoryError::ConnectionFailed(_))
        ));
        assert!(matches!(
            inventory.resolve_portgroup("br100").await,
            Err(InventoryError::ConnectionFailed(_))
        ));
        assert!(matches!(
            inventory.create_portgroup("br100", "vSwitch0", 100).await,
            Err(InventoryError::ConnectionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_nic_list_skips_only_that_vswitch() {
        let session = MockSession::new();
        session.set_raw_property(
            ObjectType::HostSystem,
            props::HOST_VSWITCH,
            json!({"HostVirtualSwitch": [
                {"name": "vSwitch0", "pnic": 17},
                {"name": "vSwitch1", "pnic": {"string": [42]}},
                {"pnic": ["key-vim.host.PhysicalNic-vmnic1"]},
                {"name": "vSwitch3", "pnic": ["key-vim.host.PhysicalNic-vmnic1"]}
            ]}),
        );

        let inventory = HostNetworkInventory::new(&session);
        let found = inventory.find_vswitch_for_interface("vmnic1").await.unwrap();
        assert_eq!(found.as_deref(), Some("vSwitch3"));
    }

    #[tokio::test]
    async fn test_vswitch_collection_wrapper_must_match() {
        let session = MockSession::new();
        session.set_raw_property(
            ObjectType::HostSystem,
            props::HOST_VSWITCH,
            json!({"HostPortGroup": []}),
        );
        let inventory = HostNetworkInventory::new(&session);
        assert!(inventory.find_vswitch_for_interface("vmnic0").await.unwrap().is_none());

        session.set_raw_property(
            ObjectType::HostSystem,
            props::HOST_VSWITCH,
            json!({"HostPortGroup": [{"spec": {"name": "x"}}]}),
        );
        assert!(matches!(
            inventory.find_vswitch_for_interface("vmnic0").await,
            Err(InventoryError::MalformedProperty { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_network_system_is_contract_violation() {
        let session = MockSession::new();
        session.set_raw_property(ObjectType::HostSystem, props::HOST_NETWORK_SYSTEM, json!(""));

        let inventory = HostNetworkInventory::new(&session);
        assert!(matches!(
            inventory.interface_exists("vmnic0").await,
            Err(InventoryError::ServerContractViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_custom_benign_faults() {
        let session = MockSession::new().with_vswitch("vSwitch0", &[]);
        let config = InventoryConfig {
            benign_faults: vec!["DuplicateName".to_string()],
            ..InventoryConfig::default()
        };
        let inventory = HostNetworkInventory::with_config(&session, config);

        session.fail_next_invoke(VimFault::new("DuplicateName", "pg exists"));
        let outcome = inventory.create_portgroup("pg", "vSwitch0", 10).await.unwrap();
        assert_eq!(outcome, PortGroupCreation::AlreadyExisted);

        // AlreadyExists is no longer benign with this configuration
        session.fail_next_invoke(VimFault::new("AlreadyExists", "pg exists"));
        let err = inventory.create_portgroup("pg", "vSwitch0", 10).await.unwrap_err();
        assert_eq!(err.fault().unwrap().fault_list, vec!["AlreadyExists".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_vlan_rejected_before_remote_call() {
        let session = MockSession::new().with_vswitch("vSwitch0", &[]);
        let inventory = HostNetworkInventory::new(&session);

        let err = inventory.create_portgroup("pg", "vSwitch0", 5000).await.unwrap_err();
        assert!(matches!(err, InventoryError::InvalidConfig(_)));
        assert_eq!(session.calls().invoke, 0);
        assert_eq!(session.calls().query_objects, 0);
    }
}
