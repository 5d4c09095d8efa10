//! # Namespace Resolver
//!
//! Expands a source's intent annotation into the concrete list of namespaces
//! it must be replicated into.
//!
//! - `replicate-to`: comma-separated regex patterns; a namespace is a target if
//!   any pattern matches anywhere in its name
//! - `all-namespaces`: every namespace
//!
//! The source's own namespace is never a target. Output follows the order of
//! the namespace list and contains no duplicates.

use crate::constants::{ALL_NAMESPACES_ANNOTATION, REPLICATE_TO_ANNOTATION};
use crate::controller::annotations::{annotation, has_annotation};
use crate::controller::error::{InvalidPattern, ReplicatorError};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use regex::Regex;
use std::collections::HashSet;
use tracing::warn;

/// Resolved targets of one source, plus any patterns that failed to compile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetResolution {
    pub namespaces: Vec<String>,
    pub invalid_patterns: Vec<InvalidPattern>,
}

/// Resolve the target namespaces of the object described by `meta`
///
/// `all_namespaces` is the namespace snapshot shared by the whole pass.
/// Fails with [`ReplicatorError::MissingAnnotation`] if `meta` carries neither
/// intent annotation.
pub fn resolve_target_namespaces(
    meta: &ObjectMeta,
    all_namespaces: &[String],
) -> Result<TargetResolution, ReplicatorError> {
    let own_namespace = meta.namespace.as_deref().unwrap_or_default();
    let name = meta.name.as_deref().unwrap_or_default();

    if let Some(value) = annotation(meta, REPLICATE_TO_ANNOTATION) {
        let (patterns, invalid_patterns) = compile_patterns(value, own_namespace, name);
        let namespaces = select_namespaces(all_namespaces, own_namespace, |namespace| {
            patterns.iter().any(|pattern| pattern.is_match(namespace))
        });
        Ok(TargetResolution {
            namespaces,
            invalid_patterns,
        })
    } else if has_annotation(meta, ALL_NAMESPACES_ANNOTATION) {
        Ok(TargetResolution {
            namespaces: select_namespaces(all_namespaces, own_namespace, |_| true),
            invalid_patterns: Vec::new(),
        })
    } else {
        Err(ReplicatorError::MissingAnnotation {
            namespace: own_namespace.to_string(),
            name: name.to_string(),
        })
    }
}

/// Compile every non-empty element of a `replicate-to` value
///
/// Elements are trimmed. A pattern that fails to compile is logged and
/// returned separately instead of failing the whole source.
fn compile_patterns(value: &str, namespace: &str, name: &str) -> (Vec<Regex>, Vec<InvalidPattern>) {
    let mut patterns = Vec::new();
    let mut invalid = Vec::new();

    for raw in value.split(',') {
        let pattern = raw.trim();
        if pattern.is_empty() {
            continue;
        }
        match Regex::new(pattern) {
            Ok(regex) => patterns.push(regex),
            Err(e) => {
                let error = InvalidPattern {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                };
                warn!(
                    source.namespace = namespace,
                    source.name = name,
                    pattern = pattern,
                    "Skipping invalid replicate-to pattern: {}",
                    error.message
                );
                invalid.push(error);
            }
        }
    }

    (patterns, invalid)
}

fn select_namespaces(
    all_namespaces: &[String],
    own_namespace: &str,
    matches: impl Fn(&str) -> bool,
) -> Vec<String> {
    let mut seen = HashSet::new();
    all_namespaces
        .iter()
        .map(String::as_str)
        .filter(|namespace| *namespace != own_namespace && matches(namespace))
        .filter(|namespace| seen.insert(*namespace))
        .map(str::to_string)
        .collect()
}
