//! Host network inventory over a VIM session.
//!
//! This module provides:
//! - Network lookup by name in the datacenter
//! - vSwitch and physical NIC discovery on the host
//! - Port group resolution and idempotent creation

mod inventory;
mod matching;

pub use inventory::{HostNetworkInventory, ADD_PORT_GROUP};
pub use matching::{nic_key_matches_interface, vswitch_name_from_key};
