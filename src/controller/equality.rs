//! # Equality Checker
//!
//! Decides whether an existing replica already matches the candidate built
//! from its source. Payload, labels and non-control annotations are compared;
//! name, namespace and resourceVersion are not.

use crate::controller::annotations::strip_control_annotations;
use crate::resource::{optional_maps_eq, Replicable};

pub fn replicas_equal<K: Replicable>(candidate: &K, existing: &K) -> bool {
    let candidate_meta = candidate.meta();
    let existing_meta = existing.meta();

    candidate.payload_eq(existing)
        && strip_control_annotations(candidate_meta.annotations.as_ref())
            == strip_control_annotations(existing_meta.annotations.as_ref())
        && optional_maps_eq(candidate_meta.labels.as_ref(), existing_meta.labels.as_ref())
}
