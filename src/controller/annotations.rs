//! # Annotation Helpers
//!
//! Small helpers over `ObjectMeta` annotations shared by the classifier,
//! resolver, equality checker and planner.

use crate::constants::{CONTROL_ANNOTATIONS, REPLICATED_FROM_ANNOTATION, STRIPPED_ON_REPLICATION};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

/// Value of an annotation, if present
pub fn annotation<'a>(meta: &'a ObjectMeta, key: &str) -> Option<&'a str> {
    meta.annotations
        .as_ref()
        .and_then(|annotations| annotations.get(key))
        .map(String::as_str)
}

/// Whether an annotation key is present (its value is irrelevant)
pub fn has_annotation(meta: &ObjectMeta, key: &str) -> bool {
    annotation(meta, key).is_some()
}

/// Copy of `annotations` without any control annotation, for equality checks
pub fn strip_control_annotations(
    annotations: Option<&BTreeMap<String, String>>,
) -> BTreeMap<String, String> {
    annotations
        .into_iter()
        .flatten()
        .filter(|(key, _)| !CONTROL_ANNOTATIONS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Annotation set written on a replica of a source living in `source_namespace`
///
/// Intent annotations and `last-applied-configuration` are dropped and the
/// provenance annotation is set.
pub fn replica_annotations(
    source_annotations: Option<&BTreeMap<String, String>>,
    source_namespace: &str,
) -> BTreeMap<String, String> {
    let mut annotations: BTreeMap<String, String> = source_annotations
        .into_iter()
        .flatten()
        .filter(|(key, _)| !STRIPPED_ON_REPLICATION.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    annotations.insert(
        REPLICATED_FROM_ANNOTATION.to_string(),
        source_namespace.to_string(),
    );
    annotations
}
