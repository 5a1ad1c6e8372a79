//! Mock VIM session for testing and development.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use tracing::{debug, info, instrument};

use crate::error::{InventoryError, Result, VimFault, FAULT_ALREADY_EXISTS};
use crate::network::ADD_PORT_GROUP;
use crate::traits::VimSession;
use crate::types::*;

/// Prefix of host network system reference values.
const NETWORK_SYSTEM_PREFIX: &str = "networkSystem-";

// =============================================================================
// FIXTURE
// =============================================================================

/// Host network layout served by [`MockSession`].
///
/// Loadable from YAML:
///
/// ```yaml
/// networks: [VM Network, vmnet0]
/// physical_nics: [vmnic0, vmnic1]
/// vswitches:
///   - name: vSwitch0
///     pnics: [vmnic0]
/// port_groups:
///   - name: VM Network
///     vswitch: vSwitch0
///     vlan_id: 0
/// other_datacenters:
///   - id: dc-2
///     networks: [vmnet1]
/// other_hosts:
///   - id: host-2
///     physical_nics: [vmnic4]
/// ```
///
/// The top-level fields describe the first datacenter and the first host.
/// `other_datacenters` and `other_hosts` follow them in server order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostFixture {
    /// Datacenter id (None = inventory without datacenter)
    pub datacenter: Option<String>,
    /// Host id (None = inventory without host)
    pub host: Option<String>,
    /// Network names in datacenter order
    pub networks: Vec<String>,
    /// Physical NIC device names
    pub physical_nics: Vec<String>,
    /// Virtual switches
    pub vswitches: Vec<VswitchFixture>,
    /// Port groups
    pub port_groups: Vec<PortGroupFixture>,
    /// Datacenters listed after the first one
    pub other_datacenters: Vec<DatacenterFixture>,
    /// Hosts listed after the first one
    pub other_hosts: Vec<HostSystemFixture>,
}

impl Default for HostFixture {
    fn default() -> Self {
        Self {
            datacenter: Some("ha-datacenter".to_string()),
            host: Some("ha-host".to_string()),
            networks: Vec::new(),
            physical_nics: Vec::new(),
            vswitches: Vec::new(),
            port_groups: Vec::new(),
            other_datacenters: Vec::new(),
            other_hosts: Vec::new(),
        }
    }
}

/// A datacenter after the first one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatacenterFixture {
    pub id: String,
    #[serde(default)]
    pub networks: Vec<String>,
}

/// A host after the first one, with its own network configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSystemFixture {
    pub id: String,
    pub physical_nics: Vec<String>,
    pub vswitches: Vec<VswitchFixture>,
    pub port_groups: Vec<PortGroupFixture>,
}

/// A vSwitch and the devices of its uplinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VswitchFixture {
    pub name: String,
    #[serde(default)]
    pub pnics: Vec<String>,
}

/// A port group on a vSwitch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortGroupFixture {
    pub name: String,
    pub vswitch: String,
    #[serde(default)]
    pub vlan_id: u16,
}

impl HostFixture {
    /// Load a fixture from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            InventoryError::InvalidConfig(format!("Failed to read fixture {}: {e}", path.display()))
        })?;
        serde_yaml::from_str(&contents).map_err(|e| {
            InventoryError::InvalidConfig(format!("Failed to parse fixture {}: {e}", path.display()))
        })
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Number of calls received per session method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockCallStats {
    pub query_objects: usize,
    pub query_objects_by_ref: usize,
    pub get_property: usize,
    pub invoke: usize,
}

#[derive(Default)]
struct CallCounters {
    query_objects: AtomicUsize,
    query_objects_by_ref: AtomicUsize,
    get_property: AtomicUsize,
    invoke: AtomicUsize,
}

struct MockState {
    fixture: HostFixture,
    overrides: HashMap<(ObjectType, String), PropertyValue>,
}

/// Mock session backed by an in-memory [`HostFixture`].
///
/// Encodes results the way the management server does: empty collections
/// come back as an empty string and lists are wrapped in `ArrayOf…`
/// objects. Duplicate `AddPortGroup` calls fail with `AlreadyExists`.
/// Useful for:
/// - Unit and integration testing
/// - Rehearsing operations without a management endpoint
pub struct MockSession {
    state: RwLock<MockState>,
    pending_fault: Mutex<Option<VimFault>>,
    calls: CallCounters,
}

impl MockSession {
    /// Create a session with one datacenter and one host and no network configuration.
    pub fn new() -> Self {
        Self::from_fixture(HostFixture::default())
    }

    /// Create a session serving `fixture`.
    pub fn from_fixture(fixture: HostFixture) -> Self {
        info!(
            networks = fixture.networks.len(),
            vswitches = fixture.vswitches.len(),
            port_groups = fixture.port_groups.len(),
            "Creating mock VIM session"
        );
        Self {
            state: RwLock::new(MockState {
                fixture,
                overrides: HashMap::new(),
            }),
            pending_fault: Mutex::new(None),
            calls: CallCounters::default(),
        }
    }

    /// Add a network to the datacenter.
    pub fn with_network(mut self, name: &str) -> Self {
        self.fixture_mut().networks.push(name.to_string());
        self
    }

    /// Add a vSwitch with uplinks on the given devices.
    pub fn with_vswitch(mut self, name: &str, pnics: &[&str]) -> Self {
        self.fixture_mut().vswitches.push(VswitchFixture {
            name: name.to_string(),
            pnics: pnics.iter().map(|d| d.to_string()).collect(),
        });
        self
    }

    /// Add a physical NIC.
    pub fn with_physical_nic(mut self, device: &str) -> Self {
        self.fixture_mut().physical_nics.push(device.to_string());
        self
    }

    /// Add a port group.
    pub fn with_port_group(mut self, name: &str, vswitch: &str, vlan_id: u16) -> Self {
        self.fixture_mut().port_groups.push(PortGroupFixture {
            name: name.to_string(),
            vswitch: vswitch.to_string(),
            vlan_id,
        });
        self
    }

    /// Add a datacenter after the existing ones.
    pub fn with_other_datacenter(mut self, id: &str, networks: &[&str]) -> Self {
        self.fixture_mut().other_datacenters.push(DatacenterFixture {
            id: id.to_string(),
            networks: networks.iter().map(|n| n.to_string()).collect(),
        });
        self
    }

    /// Add a host after the existing ones.
    pub fn with_other_host(mut self, host: HostSystemFixture) -> Self {
        self.fixture_mut().other_hosts.push(host);
        self
    }

    /// Serve `value` verbatim for `property` of every object of `object_type`.
    pub fn set_raw_property(&self, object_type: ObjectType, property: &str, value: PropertyValue) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .overrides
            .insert((object_type, property.to_string()), value);
    }

    /// Fail the next `invoke` with `fault` without touching the fixture.
    pub fn fail_next_invoke(&self, fault: VimFault) {
        *self.pending_fault.lock().unwrap_or_else(PoisonError::into_inner) = Some(fault);
    }

    /// Snapshot of the current fixture, including created port groups.
    pub fn fixture(&self) -> HostFixture {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .fixture
            .clone()
    }

    /// Calls received so far.
    pub fn calls(&self) -> MockCallStats {
        MockCallStats {
            query_objects: self.calls.query_objects.load(Ordering::SeqCst),
            query_objects_by_ref: self.calls.query_objects_by_ref.load(Ordering::SeqCst),
            get_property: self.calls.get_property.load(Ordering::SeqCst),
            invoke: self.calls.invoke.load(Ordering::SeqCst),
        }
    }

    fn fixture_mut(&mut self) -> &mut HostFixture {
        &mut self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .fixture
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, MockState>> {
        self.state
            .read()
            .map_err(|_| InventoryError::Internal("Lock poisoned".to_string()))
    }

    fn take_pending_fault(&self) -> Result<Option<VimFault>> {
        let mut pending = self
            .pending_fault
            .lock()
            .map_err(|_| InventoryError::Internal("Lock poisoned".to_string()))?;
        Ok(pending.take())
    }

    fn add_port_group(&self, target: &ManagedObjectRef, args: PropertyValue) -> Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| InventoryError::Internal("Lock poisoned".to_string()))?;

        let spec: HostPortGroupSpec = args
            .get("portgrp")
            .cloned()
            .ok_or_else(|| remote_fault(ADD_PORT_GROUP, "InvalidArgument", "missing portgrp"))
            .and_then(|v| {
                serde_json::from_value(v).map_err(|e| {
                    remote_fault(ADD_PORT_GROUP, "InvalidArgument", format!("portgrp: {e}"))
                })
            })?;

        let Some((vswitches, port_groups)) = host_network_mut(&mut state.fixture, target) else {
            return Err(remote_fault(
                ADD_PORT_GROUP,
                "ManagedObjectNotFound",
                format!("{target} is not a host network system"),
            ));
        };

        if !vswitches.iter().any(|v| v.name == spec.vswitch_name) {
            return Err(remote_fault(
                ADD_PORT_GROUP,
                "NotFound",
                format!("vSwitch {} not found", spec.vswitch_name),
            ));
        }

        if port_groups.iter().any(|pg| pg.name == spec.name) {
            return Err(remote_fault(
                ADD_PORT_GROUP,
                FAULT_ALREADY_EXISTS,
                format!("port group {} already exists", spec.name),
            ));
        }

        port_groups.push(PortGroupFixture {
            name: spec.name.clone(),
            vswitch: spec.vswitch_name.clone(),
            vlan_id: spec.vlan_id,
        });

        info!(portgroup = %spec.name, vswitch = %spec.vswitch_name, vlan_id = spec.vlan_id, "Mock port group added");
        Ok(())
    }
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VimSession for MockSession {
    #[instrument(skip(self, properties))]
    async fn query_objects(
        &self,
        object_type: ObjectType,
        properties: &[&str],
    ) -> Result<Vec<ObjectContent>> {
        self.calls.query_objects.fetch_add(1, Ordering::SeqCst);

        let state = self.read_state()?;
        object_refs(&state.fixture, object_type)
            .into_iter()
            .map(|obj| object_content(&state, object_type, obj, properties))
            .collect()
    }

    #[instrument(skip(self, objects, properties), fields(count = objects.len()))]
    async fn query_objects_by_ref(
        &self,
        object_type: ObjectType,
        objects: &[ManagedObjectRef],
        properties: &[&str],
    ) -> Result<Vec<ObjectContent>> {
        self.calls.query_objects_by_ref.fetch_add(1, Ordering::SeqCst);

        let state = self.read_state()?;
        let known = object_refs(&state.fixture, object_type);
        objects
            .iter()
            .filter(|obj| known.contains(obj))
            .map(|obj| object_content(&state, object_type, obj.clone(), properties))
            .collect()
    }

    #[instrument(skip(self, object), fields(object = %object))]
    async fn get_property(
        &self,
        object: &ManagedObjectRef,
        object_type: ObjectType,
        property: &str,
    ) -> Result<Option<PropertyValue>> {
        self.calls.get_property.fetch_add(1, Ordering::SeqCst);

        let state = self.read_state()?;
        if !object_refs(&state.fixture, object_type).contains(object) {
            return Err(remote_fault(
                "RetrieveProperties",
                "ManagedObjectNotFound",
                format!("{object} not found"),
            ));
        }
        property_value(&state, object_type, object, property)
    }

    #[instrument(skip(self, target, args), fields(target = %target))]
    async fn invoke(
        &self,
        target: &ManagedObjectRef,
        method: &str,
        args: PropertyValue,
    ) -> Result<Option<PropertyValue>> {
        self.calls.invoke.fetch_add(1, Ordering::SeqCst);

        // Let concurrent callers reach the server before any of them commits.
        tokio::task::yield_now().await;

        if let Some(fault) = self.take_pending_fault()? {
            debug!(fault = %fault, "Injected fault");
            return Err(InventoryError::RemoteFault {
                operation: method.to_string(),
                fault,
            });
        }

        match method {
            ADD_PORT_GROUP => {
                self.add_port_group(target, args)?;
                Ok(None)
            }
            other => Err(remote_fault(other, "MethodNotFound", format!("unknown method {other}"))),
        }
    }
}

// =============================================================================
// ENCODING
// =============================================================================

fn remote_fault(operation: &str, kind: &str, message: impl Into<String>) -> InventoryError {
    InventoryError::RemoteFault {
        operation: operation.to_string(),
        fault: VimFault::new(kind, message),
    }
}

/// Network configuration of one host, borrowed from the fixture.
struct HostView<'a> {
    id: &'a str,
    physical_nics: &'a [String],
    vswitches: &'a [VswitchFixture],
    port_groups: &'a [PortGroupFixture],
}

fn network_system_id(host_id: &str) -> String {
    format!("{NETWORK_SYSTEM_PREFIX}{host_id}")
}

/// Datacenter ids and their network names, in server order.
fn datacenters(fixture: &HostFixture) -> Vec<(&str, &[String])> {
    fixture
        .datacenter
        .iter()
        .map(|id| (id.as_str(), fixture.networks.as_slice()))
        .chain(
            fixture
                .other_datacenters
                .iter()
                .map(|dc| (dc.id.as_str(), dc.networks.as_slice())),
        )
        .collect()
}

/// Every network as (reference, owning datacenter, name), numbered across datacenters.
fn networks(fixture: &HostFixture) -> Vec<(ManagedObjectRef, &str, &str)> {
    datacenters(fixture)
        .into_iter()
        .flat_map(|(dc, names)| names.iter().map(move |name| (dc, name.as_str())))
        .enumerate()
        .map(|(i, (dc, name))| {
            let obj = ManagedObjectRef::new(ObjectType::Network, format!("network-{}", i + 1));
            (obj, dc, name)
        })
        .collect()
}

/// Hosts in server order.
fn hosts(fixture: &HostFixture) -> Vec<HostView<'_>> {
    fixture
        .host
        .iter()
        .map(|id| HostView {
            id: id.as_str(),
            physical_nics: &fixture.physical_nics,
            vswitches: &fixture.vswitches,
            port_groups: &fixture.port_groups,
        })
        .chain(fixture.other_hosts.iter().map(|h| HostView {
            id: h.id.as_str(),
            physical_nics: &h.physical_nics,
            vswitches: &h.vswitches,
            port_groups: &h.port_groups,
        }))
        .collect()
}

/// vSwitches and port groups of the host owning the network system `target`.
fn host_network_mut<'a>(
    fixture: &'a mut HostFixture,
    target: &ManagedObjectRef,
) -> Option<(&'a [VswitchFixture], &'a mut Vec<PortGroupFixture>)> {
    if !target.is(ObjectType::HostNetworkSystem) {
        return None;
    }

    let is_first = fixture
        .host
        .as_deref()
        .is_some_and(|id| network_system_id(id) == target.value);
    if is_first {
        return Some((fixture.vswitches.as_slice(), &mut fixture.port_groups));
    }

    fixture
        .other_hosts
        .iter_mut()
        .find(|h| network_system_id(&h.id) == target.value)
        .map(|h| (h.vswitches.as_slice(), &mut h.port_groups))
}

fn object_refs(fixture: &HostFixture, object_type: ObjectType) -> Vec<ManagedObjectRef> {
    match object_type {
        ObjectType::Datacenter => datacenters(fixture)
            .into_iter()
            .map(|(id, _)| ManagedObjectRef::new(object_type, id))
            .collect(),
        ObjectType::Network => networks(fixture).into_iter().map(|(obj, _, _)| obj).collect(),
        ObjectType::HostSystem => hosts(fixture)
            .into_iter()
            .map(|h| ManagedObjectRef::new(object_type, h.id))
            .collect(),
        ObjectType::HostNetworkSystem => hosts(fixture)
            .into_iter()
            .map(|h| ManagedObjectRef::new(object_type, network_system_id(h.id)))
            .collect(),
    }
}

fn object_content(
    state: &MockState,
    object_type: ObjectType,
    obj: ManagedObjectRef,
    properties: &[&str],
) -> Result<ObjectContent> {
    let mut content = ObjectContent::new(obj);
    for property in properties {
        if let Some(val) = property_value(state, object_type, &content.obj, property)? {
            content = content.with_property(*property, val);
        }
    }
    Ok(content)
}

/// Wrap `elements` as an `ArrayOf…` value, or the empty-string sentinel.
fn wrap(element_type: &str, elements: Vec<Value>) -> Value {
    if elements.is_empty() {
        Value::String(String::new())
    } else {
        let mut array = serde_json::Map::new();
        array.insert(element_type.to_string(), Value::Array(elements));
        Value::Object(array)
    }
}

fn property_value(
    state: &MockState,
    object_type: ObjectType,
    obj: &ManagedObjectRef,
    property: &str,
) -> Result<Option<PropertyValue>> {
    if let Some(value) = state.overrides.get(&(object_type, property.to_string())) {
        return Ok(Some(value.clone()));
    }

    let fixture = &state.fixture;
    let host_by_id = || hosts(fixture).into_iter().find(|h| h.id == obj.value);

    let value = match (object_type, property) {
        (ObjectType::Datacenter, props::DATACENTER_NETWORK) => {
            let refs = networks(fixture)
                .into_iter()
                .filter(|(_, dc, _)| *dc == obj.value)
                .map(|(network, _, _)| json!(network))
                .collect();
            wrap(wrapper::MANAGED_OBJECT_REFERENCE, refs)
        }
        (ObjectType::Network, props::NETWORK_SUMMARY_NAME) | (ObjectType::Network, "name") => {
            let name = networks(fixture)
                .into_iter()
                .find(|(network, _, _)| network == obj)
                .map(|(_, _, name)| Value::String(name.to_string()));
            return Ok(name);
        }
        (ObjectType::HostSystem, props::HOST_VSWITCH) => {
            let vswitches: Vec<Value> = host_by_id()
                .map(|h| h.vswitches.iter().map(encode_vswitch).collect())
                .unwrap_or_default();
            wrap(wrapper::HOST_VIRTUAL_SWITCH, vswitches)
        }
        (ObjectType::HostSystem, props::HOST_PORTGROUP) => {
            let groups: Vec<Value> = host_by_id()
                .map(|h| h.port_groups.iter().map(encode_port_group).collect())
                .unwrap_or_default();
            wrap(wrapper::HOST_PORT_GROUP, groups)
        }
        (ObjectType::HostSystem, props::HOST_NETWORK_SYSTEM) => json!(ManagedObjectRef::new(
            ObjectType::HostNetworkSystem,
            network_system_id(&obj.value)
        )),
        (ObjectType::HostNetworkSystem, props::NETWORK_INFO_PNIC) => {
            let nics: Vec<Value> = hosts(fixture)
                .into_iter()
                .find(|h| network_system_id(h.id) == obj.value)
                .map(|h| h.physical_nics.iter().map(|d| encode_physical_nic(d)).collect())
                .unwrap_or_default();
            wrap(wrapper::PHYSICAL_NIC, nics)
        }
        _ => {
            return Err(remote_fault(
                "RetrieveProperties",
                "InvalidProperty",
                format!("{object_type} has no property {property}"),
            ))
        }
    };

    Ok(Some(value))
}

fn encode_vswitch(vswitch: &VswitchFixture) -> Value {
    let keys = vswitch
        .pnics
        .iter()
        .map(|device| json!(format!("key-vim.host.PhysicalNic-{device}")))
        .collect();
    json!(HostVirtualSwitch {
        name: vswitch.name.clone(),
        key: Some(format!("key-vim.host.VirtualSwitch-{}", vswitch.name)),
        num_ports: Some(128),
        mtu: Some(1500),
        pnic: wrap(wrapper::STRING, keys),
    })
}

fn encode_port_group(pg: &PortGroupFixture) -> Value {
    json!(HostPortGroup {
        key: Some(format!("key-vim.host.PortGroup-{}", pg.name)),
        spec: HostPortGroupSpec {
            name: pg.name.clone(),
            vlan_id: pg.vlan_id,
            vswitch_name: pg.vswitch.clone(),
            policy: HostNetworkPolicy::default(),
        },
        vswitch: Some(format!("key-vim.host.VirtualSwitch-{}", pg.vswitch)),
    })
}

fn encode_physical_nic(device: &str) -> Value {
    json!(PhysicalNic {
        device: device.to_string(),
        key: Some(format!("key-vim.host.PhysicalNic-{device}")),
        mac: None,
        driver: None,
    })
}
