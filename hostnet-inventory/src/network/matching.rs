//! Key-string heuristics for associating NICs and port groups with vSwitches.
//!
//! Physical NIC and vSwitch keys are opaque strings such as
//! `key-vim.host.PhysicalNic-vmnic0`. The association is inferred from the
//! text after the last `-`, not from any structural relationship.

/// Whether a physical NIC key belongs to `interface_name`.
///
/// Matches when the trailing `-` segment of the key *contains*
/// `interface_name`, so `vmnic1` also matches a key ending in `vmnic10`.
pub fn nic_key_matches_interface(nic_key: &str, interface_name: &str) -> bool {
    trailing_segment(nic_key).contains(interface_name)
}

/// vSwitch name from a stored vSwitch key (everything after the last `-`).
pub fn vswitch_name_from_key(vswitch_key: &str) -> &str {
    trailing_segment(vswitch_key)
}

fn trailing_segment(key: &str) -> &str {
    key.rsplit('-').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_device_matches() {
        assert!(nic_key_matches_interface("key-vim.host.PhysicalNic-vmnic0", "vmnic0"));
        assert!(!nic_key_matches_interface("key-vim.host.PhysicalNic-vmnic0", "vmnic9"));
    }

    #[test]
    fn test_substring_of_trailing_segment_matches() {
        assert!(nic_key_matches_interface("key-vim.host.PhysicalNic-vmnic10", "vmnic1"));
        assert!(nic_key_matches_interface("key-vim.host.PhysicalNic-vmnic0", "nic"));
        assert!(nic_key_matches_interface("key-vim.host.PhysicalNic-vmnic0", ""));
    }

    #[test]
    fn test_only_trailing_segment_is_considered() {
        // "key" and "vim.host.PhysicalNic" precede the last dash
        assert!(!nic_key_matches_interface("key-vim.host.PhysicalNic-vmnic0", "PhysicalNic"));
        assert!(!nic_key_matches_interface("key-vim.host.PhysicalNic-vmnic0", "key"));
    }

    #[test]
    fn test_key_without_dash() {
        assert!(nic_key_matches_interface("vmnic2", "vmnic2"));
        assert_eq!(vswitch_name_from_key("vSwitch0"), "vSwitch0");
    }

    #[test]
    fn test_vswitch_name_from_key() {
        assert_eq!(vswitch_name_from_key("key-vim.host.VirtualSwitch-vSwitch0"), "vSwitch0");
        // A dash inside the switch name is lost
        assert_eq!(vswitch_name_from_key("key-vim.host.VirtualSwitch-lab-net"), "net");
        assert_eq!(vswitch_name_from_key("key-vim.host.VirtualSwitch-"), "");
    }
}
