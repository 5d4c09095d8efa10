//! # Resource Classifier
//!
//! Splits a snapshot of one kind into sources, replicas and plain objects.
//! Plain objects are dropped. Each source carries its resolved targets,
//! computed from the single namespace list shared by the pass.

use crate::constants::{ALL_NAMESPACES_ANNOTATION, REPLICATED_FROM_ANNOTATION, REPLICATE_TO_ANNOTATION};
use crate::controller::annotations::{annotation, has_annotation};
use crate::controller::error::InvalidPattern;
use crate::controller::resolver::resolve_target_namespaces;
use crate::resource::Replicable;
use tracing::{debug, error, warn};

/// An object carrying replication intent, with its resolved targets
#[derive(Debug, Clone)]
pub struct SourceResource<K> {
    pub resource: K,
    pub target_namespaces: Vec<String>,
}

impl<K: Replicable> SourceResource<K> {
    pub fn name(&self) -> &str {
        self.resource.meta().name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.resource.meta().namespace.as_deref().unwrap_or_default()
    }

    /// Whether `namespace` is in this source's current target set
    pub fn targets(&self, namespace: &str) -> bool {
        self.target_namespaces.iter().any(|target| target == namespace)
    }
}

/// An object previously written by the replicator
#[derive(Debug, Clone)]
pub struct ReplicaResource<K> {
    pub resource: K,
    /// Value of the provenance annotation
    pub source_namespace: String,
}

impl<K: Replicable> ReplicaResource<K> {
    pub fn name(&self) -> &str {
        self.resource.meta().name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.resource.meta().namespace.as_deref().unwrap_or_default()
    }
}

/// Result of classifying one snapshot
#[derive(Debug)]
pub struct Classification<K> {
    pub sources: Vec<SourceResource<K>>,
    pub replicas: Vec<ReplicaResource<K>>,
    /// Patterns skipped while resolving sources
    pub invalid_patterns: Vec<InvalidPattern>,
}

pub fn is_source<K: Replicable>(resource: &K) -> bool {
    has_annotation(resource.meta(), REPLICATE_TO_ANNOTATION)
        || has_annotation(resource.meta(), ALL_NAMESPACES_ANNOTATION)
}

pub fn is_replica<K: Replicable>(resource: &K) -> bool {
    has_annotation(resource.meta(), REPLICATED_FROM_ANNOTATION)
}

/// Partition `resources` into sources and replicas
///
/// An object carrying both intent and provenance annotations is treated as a
/// source and a warning is logged.
pub fn classify<K: Replicable>(resources: Vec<K>, namespaces: &[String]) -> Classification<K> {
    let mut sources = Vec::new();
    let mut replicas = Vec::new();
    let mut invalid_patterns = Vec::new();
    let mut plain = 0usize;

    for resource in resources {
        if is_source(&resource) {
            let meta = resource.meta();
            if is_replica(&resource) {
                warn!(
                    resource = %K::KIND,
                    namespace = meta.namespace.as_deref().unwrap_or_default(),
                    name = meta.name.as_deref().unwrap_or_default(),
                    "Object carries both replication intent and provenance annotations, treating it as a source"
                );
            }
            match resolve_target_namespaces(meta, namespaces) {
                Ok(resolution) => {
                    invalid_patterns.extend(resolution.invalid_patterns);
                    sources.push(SourceResource {
                        resource,
                        target_namespaces: resolution.namespaces,
                    });
                }
                Err(e) => {
                    error!(resource = %K::KIND, "Skipping source: {}", e);
                }
            }
        } else if let Some(source_namespace) =
            annotation(resource.meta(), REPLICATED_FROM_ANNOTATION).map(str::to_string)
        {
            replicas.push(ReplicaResource {
                resource,
                source_namespace,
            });
        } else {
            plain += 1;
        }
    }

    debug!(
        resource = %K::KIND,
        sources = sources.len(),
        replicas = replicas.len(),
        plain,
        "Classified snapshot"
    );

    Classification {
        sources,
        replicas,
        invalid_patterns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::ConfigMap;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn configmap(namespace: &str, name: &str, annotations: &[(&str, &str)]) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                annotations: Some(
                    annotations
                        .iter()
                        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                        .collect(),
                ),
                ..ObjectMeta::default()
            },
            ..ConfigMap::default()
        }
    }

    fn namespaces() -> Vec<String> {
        ["team-a", "team-b", "team-c"]
            .iter()
            .map(|n| (*n).to_string())
            .collect()
    }

    #[test]
    fn test_partitions_sources_replicas_and_plain() {
        let snapshot = vec![
            configmap("team-a", "settings", &[(REPLICATE_TO_ANNOTATION, "team-b")]),
            configmap("team-b", "settings", &[(REPLICATED_FROM_ANNOTATION, "team-a")]),
            configmap("team-c", "unrelated", &[]),
        ];
        let classification = classify(snapshot, &namespaces());

        assert_eq!(classification.sources.len(), 1);
        assert_eq!(classification.sources[0].namespace(), "team-a");
        assert_eq!(classification.sources[0].target_namespaces, vec!["team-b"]);
        assert_eq!(classification.replicas.len(), 1);
        assert_eq!(classification.replicas[0].source_namespace, "team-a");
        assert_eq!(classification.replicas[0].namespace(), "team-b");
    }

    #[test]
    fn test_both_annotations_classify_as_source() {
        let snapshot = vec![configmap(
            "team-a",
            "settings",
            &[
                (ALL_NAMESPACES_ANNOTATION, ""),
                (REPLICATED_FROM_ANNOTATION, "team-c"),
            ],
        )];
        let classification = classify(snapshot, &namespaces());

        assert_eq!(classification.sources.len(), 1);
        assert!(classification.replicas.is_empty());
        assert_eq!(
            classification.sources[0].target_namespaces,
            vec!["team-b", "team-c"]
        );
    }

    #[test]
    fn test_invalid_patterns_are_collected() {
        let snapshot = vec![
            configmap("team-a", "one", &[(REPLICATE_TO_ANNOTATION, "[,team-b")]),
            configmap("team-a", "two", &[(REPLICATE_TO_ANNOTATION, "(")]),
        ];
        let classification = classify(snapshot, &namespaces());

        assert_eq!(classification.sources.len(), 2);
        assert_eq!(classification.sources[0].target_namespaces, vec!["team-b"]);
        assert!(classification.sources[1].target_namespaces.is_empty());
        assert_eq!(classification.invalid_patterns.len(), 2);
    }

    #[test]
    fn test_source_targets_membership() {
        let source = SourceResource {
            resource: configmap("team-a", "settings", &[]),
            target_namespaces: vec!["team-b".to_string()],
        };
        assert!(source.targets("team-b"));
        assert!(!source.targets("team-c"));
        assert_eq!(source.name(), "settings");
    }
}
