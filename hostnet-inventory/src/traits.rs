//! Session abstraction over the management endpoint.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ManagedObjectRef, ObjectContent, ObjectType, PropertyValue};

/// Authenticated session to a hypervisor management endpoint.
///
/// This trait is the only seam between the inventory and the transport.
/// Authentication, retries, connection pooling and timeouts are the
/// implementor's concern; the inventory issues one call at a time and
/// propagates whatever error comes back.
#[async_trait]
pub trait VimSession: Send + Sync {
    /// Fetch `properties` for every object of `object_type` in the inventory.
    ///
    /// Objects are returned in server order. Pass an empty slice to fetch
    /// only the object references.
    async fn query_objects(
        &self,
        object_type: ObjectType,
        properties: &[&str],
    ) -> Result<Vec<ObjectContent>>;

    /// Fetch `properties` for the given objects in one batched call.
    async fn query_objects_by_ref(
        &self,
        object_type: ObjectType,
        objects: &[ManagedObjectRef],
        properties: &[&str],
    ) -> Result<Vec<ObjectContent>>;

    /// Fetch a single property of one object.
    ///
    /// Returns `None` when the server reports no value for the property.
    async fn get_property(
        &self,
        object: &ManagedObjectRef,
        object_type: ObjectType,
        property: &str,
    ) -> Result<Option<PropertyValue>>;

    /// Invoke a method on a managed object.
    ///
    /// Server faults are reported as [`crate::InventoryError::RemoteFault`].
    async fn invoke(
        &self,
        target: &ManagedObjectRef,
        method: &str,
        args: PropertyValue,
    ) -> Result<Option<PropertyValue>>;
}
