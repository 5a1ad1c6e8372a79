//! Normalization of collection-valued properties.
//!
//! The management server encodes "no items" in several ways: a missing
//! property, `null`, an empty string, an empty array, or an empty
//! `ArrayOf…` wrapper object. Non-empty collections arrive either as a bare
//! array or wrapped as `{"<ElementType>": [...]}`, and a wrapper holding a
//! single element may carry it without the array. Every collection read
//! goes through [`items`] so callers only ever see a plain `Vec`.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{InventoryError, Result};
use crate::types::PropertyValue;

/// Whether `value` encodes an empty collection.
///
/// An object counts as empty only at the `ArrayOf…` wrapper level: every
/// value it holds must itself be an empty scalar, list or object. A wrapper
/// carrying a single element object is never absent, whatever that
/// element's fields hold.
pub fn is_absent(value: Option<&PropertyValue>) -> bool {
    match value {
        None => true,
        Some(Value::Object(wrapper)) => wrapper.values().all(is_empty_value),
        Some(other) => is_empty_value(other),
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(m) => m.is_empty(),
        Value::Number(_) | Value::Bool(true) => false,
    }
}

/// Flatten a collection property into its raw elements.
///
/// `element_type` is the wrapper key (e.g. "HostVirtualSwitch") and
/// `property` is only used for error messages.
pub fn items(
    value: Option<PropertyValue>,
    element_type: &str,
    property: &str,
) -> Result<Vec<PropertyValue>> {
    if is_absent(value.as_ref()) {
        return Ok(Vec::new());
    }

    match value {
        Some(Value::Array(elements)) => Ok(elements),
        Some(Value::Object(mut wrapper)) => match wrapper.remove(element_type) {
            Some(inner) if is_empty_value(&inner) => Ok(Vec::new()),
            Some(Value::Array(elements)) => Ok(elements),
            Some(single) => Ok(vec![single]),
            None => Err(InventoryError::malformed(
                property,
                format!(
                    "expected ArrayOf{element_type} wrapper, got keys [{}]",
                    wrapper.keys().cloned().collect::<Vec<_>>().join(", ")
                ),
            )),
        },
        Some(other) => Err(InventoryError::malformed(
            property,
            format!("expected a collection of {element_type}, got {other}"),
        )),
        None => Ok(Vec::new()),
    }
}

/// Flatten a collection property and deserialize every element as `T`.
pub fn typed_items<T: DeserializeOwned>(
    value: Option<PropertyValue>,
    element_type: &str,
    property: &str,
) -> Result<Vec<T>> {
    items(value, element_type, property)?
        .into_iter()
        .map(|element| {
            serde_json::from_value(element).map_err(|e| {
                InventoryError::malformed(property, format!("invalid {element_type}: {e}"))
            })
        })
        .collect()
}
