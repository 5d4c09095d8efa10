//! # Secret Adapter

use super::{optional_maps_eq, Replicable, ResourceKind};
use k8s_openapi::api::core::v1::Secret;

impl Replicable for Secret {
    const KIND: ResourceKind = ResourceKind::Secret;

    fn payload_eq(&self, other: &Self) -> bool {
        optional_maps_eq(self.data.as_ref(), other.data.as_ref())
    }

    fn copy_payload_from(&mut self, other: &Self) {
        self.data.clone_from(&other.data);
    }
}
