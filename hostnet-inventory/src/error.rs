//! Error types for the host network inventory.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fault name the management server reports when an object being added
/// is already present.
pub const FAULT_ALREADY_EXISTS: &str = "AlreadyExists";

/// A fault returned by the management server for a remote invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VimFault {
    /// Machine-checkable fault kinds (e.g. "AlreadyExists")
    pub fault_list: Vec<String>,
    /// Server-provided message
    pub message: String,
}

impl VimFault {
    /// Create a fault with a single fault kind.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            fault_list: vec![kind.into()],
            message: message.into(),
        }
    }

    /// Whether any of the listed fault kinds is in `kinds`.
    pub fn matches_any<S: AsRef<str>>(&self, kinds: &[S]) -> bool {
        self.fault_list
            .iter()
            .any(|f| kinds.iter().any(|k| k.as_ref() == f))
    }
}

impl fmt::Display for VimFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.fault_list.join(", "), self.message)
    }
}

/// Errors that can occur during inventory operations.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// The session could not reach the management endpoint. Raised by
    /// [`crate::VimSession`] implementations; the inventory passes it through.
    #[error("Failed to connect to management endpoint: {0}")]
    ConnectionFailed(String),

    /// A property query failed in the transport (timeout, lost session,
    /// undecodable response). Raised by [`crate::VimSession`] implementations.
    #[error("Failed to query: {0}")]
    QueryFailed(String),

    /// The server answered with an empty result where at least one item
    /// is always expected.
    #[error("Unexpected server response: {0}")]
    ServerContractViolation(String),

    /// A remote invocation failed with a server fault.
    #[error("Remote fault during {operation}: {fault}")]
    RemoteFault {
        operation: String,
        fault: VimFault,
    },

    /// A property value did not have the expected shape.
    #[error("Malformed property {property}: {reason}")]
    MalformedProperty { property: String, reason: String },

    /// Invalid configuration or argument.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl InventoryError {
    /// Build a malformed-property error.
    pub fn malformed(property: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedProperty {
            property: property.into(),
            reason: reason.into(),
        }
    }

    /// The server fault carried by this error, if any.
    pub fn fault(&self) -> Option<&VimFault> {
        match self {
            Self::RemoteFault { fault, .. } => Some(fault),
            _ => None,
        }
    }
}

/// Result type alias for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_matching() {
        let fault = VimFault {
            fault_list: vec!["PlatformConfigFault".to_string(), FAULT_ALREADY_EXISTS.to_string()],
            message: "port group exists".to_string(),
        };
        assert!(fault.matches_any(&[FAULT_ALREADY_EXISTS]));
        assert!(fault.matches_any(&["PlatformConfigFault"]));
        assert!(!fault.matches_any(&["NotFound"]));

        let other = VimFault::new("NotFound", "no such vswitch");
        assert!(!other.matches_any(&[FAULT_ALREADY_EXISTS]));
    }

    #[test]
    fn test_error_exposes_fault() {
        let err = InventoryError::RemoteFault {
            operation: "AddPortGroup".to_string(),
            fault: VimFault::new(FAULT_ALREADY_EXISTS, "exists"),
        };
        assert_eq!(err.fault().unwrap().fault_list, vec![FAULT_ALREADY_EXISTS.to_string()]);
        assert!(err.to_string().contains("AddPortGroup"));
        assert!(InventoryError::Internal("x".into()).fault().is_none());
    }
}
