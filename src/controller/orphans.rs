//! # Orphan Detector
//!
//! A replica is live only while a source with the same name, living in the
//! replica's provenance namespace, still lists the replica's namespace among
//! its targets. Every other replica is scheduled for deletion. Source removal,
//! a narrowed `replicate-to` pattern and a revoked `all-namespaces` all end up
//! here through the same lookup.

use crate::controller::classifier::{ReplicaResource, SourceResource};
use crate::controller::planner::SyncOperation;
use crate::resource::Replicable;
use kube::api::Preconditions;
use tracing::debug;

/// The source currently claiming `replica`, if any
pub fn claiming_source<'a, K: Replicable>(
    replica: &ReplicaResource<K>,
    sources: &'a [SourceResource<K>],
) -> Option<&'a SourceResource<K>> {
    sources.iter().find(|source| {
        source.name() == replica.name()
            && source.namespace() == replica.source_namespace
            && source.targets(replica.namespace())
    })
}

/// Delete operations for every replica without a live claiming source
pub fn detect_orphans<K: Replicable>(
    sources: &[SourceResource<K>],
    replicas: &[ReplicaResource<K>],
) -> Vec<SyncOperation<K>> {
    replicas
        .iter()
        .filter(|replica| {
            let live = claiming_source(replica, sources).is_some();
            if !live {
                debug!(
                    resource = %K::KIND,
                    namespace = replica.namespace(),
                    name = replica.name(),
                    source_namespace = %replica.source_namespace,
                    "Replica has no live source claim"
                );
            }
            !live
        })
        .map(|replica| SyncOperation::Delete {
            source_namespace: replica.source_namespace.clone(),
            namespace: replica.namespace().to_string(),
            name: replica.name().to_string(),
            preconditions: Preconditions {
                uid: replica.resource.meta().uid.clone(),
                resource_version: replica.resource.meta().resource_version.clone(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::planner::SyncAction;
    use k8s_openapi::api::core::v1::ConfigMap;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn configmap(namespace: &str, name: &str) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..ObjectMeta::default()
            },
            ..ConfigMap::default()
        }
    }

    fn source(namespace: &str, name: &str, targets: &[&str]) -> SourceResource<ConfigMap> {
        SourceResource {
            resource: configmap(namespace, name),
            target_namespaces: targets.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    fn replica(namespace: &str, name: &str, from: &str) -> ReplicaResource<ConfigMap> {
        ReplicaResource {
            resource: configmap(namespace, name),
            source_namespace: from.to_string(),
        }
    }

    fn deleted(ops: &[SyncOperation<ConfigMap>]) -> Vec<(String, String)> {
        ops.iter()
            .inspect(|op| assert_eq!(op.action(), SyncAction::Delete))
            .map(|op| (op.namespace().to_string(), op.name().to_string()))
            .collect()
    }

    #[test]
    fn test_claimed_replica_is_live() {
        let sources = vec![source("team-a", "settings", &["team-b"])];
        let replicas = vec![replica("team-b", "settings", "team-a")];
        assert!(detect_orphans(&sources, &replicas).is_empty());
        assert!(claiming_source(&replicas[0], &sources).is_some());
    }

    #[test]
    fn test_replica_of_deleted_source_is_orphaned() {
        let replicas = vec![replica("team-b", "settings", "team-a")];
        assert_eq!(
            deleted(&detect_orphans(&[], &replicas)),
            vec![("team-b".to_string(), "settings".to_string())]
        );
    }

    #[test]
    fn test_delete_is_pinned_to_the_listed_object() {
        let mut orphan = replica("team-b", "settings", "team-a");
        orphan.resource.metadata.uid = Some("uid-1".to_string());
        orphan.resource.metadata.resource_version = Some("42".to_string());

        match detect_orphans(&[], &[orphan]).pop() {
            Some(SyncOperation::Delete { preconditions, .. }) => {
                assert_eq!(preconditions.uid.as_deref(), Some("uid-1"));
                assert_eq!(preconditions.resource_version.as_deref(), Some("42"));
            }
            other => panic!("expected a delete, got {other:?}"),
        }
    }

    #[test]
    fn test_replica_outside_narrowed_targets_is_orphaned() {
        let sources = vec![source("team-a", "settings", &["team-c"])];
        let replicas = vec![
            replica("team-b", "settings", "team-a"),
            replica("team-c", "settings", "team-a"),
        ];
        assert_eq!(
            deleted(&detect_orphans(&sources, &replicas)),
            vec![("team-b".to_string(), "settings".to_string())]
        );
    }

    #[test]
    fn test_provenance_must_match_source_namespace() {
        let sources = vec![source("team-a", "settings", &["team-b"])];
        let replicas = vec![replica("team-b", "settings", "team-z")];
        assert_eq!(detect_orphans(&sources, &replicas).len(), 1);
        assert!(claiming_source(&replicas[0], &sources).is_none());
    }

    #[test]
    fn test_name_must_match_source_name() {
        let sources = vec![source("team-a", "settings", &["team-b"])];
        let replicas = vec![replica("team-b", "other", "team-a")];
        assert_eq!(detect_orphans(&sources, &replicas).len(), 1);
    }
}
