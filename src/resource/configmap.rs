//! # ConfigMap Adapter
//!
//! A ConfigMap's payload is the union of `data` (UTF-8 values) and
//! `binaryData` (raw bytes); both must match for two ConfigMaps to be equal.

use super::{optional_maps_eq, Replicable, ResourceKind};
use k8s_openapi::api::core::v1::ConfigMap;

impl Replicable for ConfigMap {
    const KIND: ResourceKind = ResourceKind::ConfigMap;

    fn payload_eq(&self, other: &Self) -> bool {
        optional_maps_eq(self.data.as_ref(), other.data.as_ref())
            && optional_maps_eq(self.binary_data.as_ref(), other.binary_data.as_ref())
    }

    fn copy_payload_from(&mut self, other: &Self) {
        self.data.clone_from(&other.data);
        self.binary_data.clone_from(&other.binary_data);
    }
}
