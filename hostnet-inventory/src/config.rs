//! Inventory settings.

use serde::{Deserialize, Serialize};

use crate::error::FAULT_ALREADY_EXISTS;

/// Network looked up when no name is given.
pub const DEFAULT_NETWORK_NAME: &str = "vmnet0";

/// Settings of [`crate::HostNetworkInventory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Network name used by `find_default_network`
    pub default_network: String,

    /// Fault kinds that mean a port group creation lost a race and the
    /// group is already in place
    pub benign_faults: Vec<String>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            default_network: DEFAULT_NETWORK_NAME.to_string(),
            benign_faults: vec![FAULT_ALREADY_EXISTS.to_string()],
        }
    }
}

impl InventoryConfig {
    /// Validate the settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_network.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "default_network".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if self.benign_faults.iter().any(|f| f.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "benign_faults".to_string(),
                message: "fault names must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InventoryConfig::default();
        assert_eq!(config.default_network, "vmnet0");
        assert_eq!(config.benign_faults, vec!["AlreadyExists".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = InventoryConfig::default();

        config.default_network = "  ".to_string();
        assert!(config.validate().is_err());
        config.default_network = "VM Network".to_string();

        config.benign_faults.push(String::new());
        assert!(config.validate().is_err());
        config.benign_faults.pop();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: InventoryConfig = serde_yaml::from_str("default_network: VM Network").unwrap();
        assert_eq!(config.default_network, "VM Network");
        assert_eq!(config.benign_faults, vec![FAULT_ALREADY_EXISTS.to_string()]);
        assert!(config.validate().is_ok());
    }
}
