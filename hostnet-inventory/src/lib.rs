//! # hostnet Inventory
//!
//! Host network discovery and configuration over a VIM management session.
//!
//! The inventory answers questions about the first host behind a session
//! (which vSwitch carries a NIC, which VLAN a port group uses, whether a
//! physical adapter exists) and creates port groups idempotently.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         HostNetworkInventory            │
//! │ (find_network_by_name, resolve_portgroup│
//! │  create_portgroup, ...)                 │
//! └─────────────────────┬───────────────────┘
//!                       │ &dyn VimSession
//!         ┌─────────────┴─────────────┐
//!         ▼                           ▼
//! ┌───────────────────┐     ┌───────────────────┐
//! │   MockSession     │     │  SOAP transport   │
//! │ (fixture-backed)  │     │   (external)      │
//! └───────────────────┘     └───────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hostnet_inventory::{HostNetworkInventory, MockSession};
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = MockSession::new()
//!         .with_vswitch("vSwitch0", &["vmnic0"])
//!         .with_physical_nic("vmnic0");
//!
//!     let inventory = HostNetworkInventory::new(&session);
//!     let vswitch = inventory.find_vswitch_for_interface("vmnic0").await.unwrap();
//!     assert_eq!(vswitch.as_deref(), Some("vSwitch0"));
//!
//!     inventory.create_portgroup("br100", "vSwitch0", 100).await.unwrap();
//! }
//! ```

pub mod collection;
pub mod config;
pub mod error;
pub mod mock;
pub mod network;
pub mod spec;
pub mod traits;
pub mod types;

pub use config::{ConfigError, InventoryConfig, DEFAULT_NETWORK_NAME};
pub use error::{InventoryError, Result, VimFault, FAULT_ALREADY_EXISTS};
pub use mock::{
    DatacenterFixture,
    HostFixture,
    HostSystemFixture,
    MockCallStats,
    MockSession,
    PortGroupFixture,
    VswitchFixture,
};
pub use network::{
    nic_key_matches_interface,
    vswitch_name_from_key,
    HostNetworkInventory,
    ADD_PORT_GROUP,
};
pub use spec::{add_port_group_spec, validate_vlan_id, VLAN_ID_MAX, VLAN_ID_NONE};
pub use traits::VimSession;
pub use types::*;
