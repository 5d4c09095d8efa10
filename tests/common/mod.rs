//! Common test utilities for replication tests
//!
//! Provides an in-memory [`ResourceStore`] with failure injection and fixture
//! builders for annotated Secrets and ConfigMaps.

#![allow(dead_code, reason = "each test binary uses a subset of the helpers")]

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::api::Preconditions;
use kube::ResourceExt;
use resource_replicator::controller::ExecutorSettings;
use resource_replicator::resource::{Replicable, ResourceKind};
use resource_replicator::store::{NamespaceLister, ResourceStore, StoreError};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::time::Duration;

type Key = (ResourceKind, String, String);

fn key<K: Replicable>(namespace: &str, name: &str) -> Key {
    (K::KIND, namespace.to_string(), name.to_string())
}

/// A store call as seen by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub kind: ResourceKind,
    pub operation: &'static str,
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Default)]
struct State {
    namespaces: Vec<String>,
    objects: BTreeMap<Key, Value>,
    next_version: u64,
    calls: Vec<Call>,
    fail_namespaces: bool,
    fail_list: BTreeSet<ResourceKind>,
    fail_writes_in: BTreeSet<String>,
    /// Objects another writer creates just before our create lands
    racing_creates: BTreeMap<Key, Value>,
    /// Objects another writer deletes right after our list
    deleted_after_list: BTreeSet<Key>,
    /// Objects another writer replaces right after our list
    replaced_after_list: BTreeMap<Key, Value>,
}

/// In-memory object store shared by both kinds
///
/// Objects are kept as JSON so one store serves every [`Replicable`] kind.
/// Each write bumps the object's resourceVersion; updates with a stale
/// resourceVersion are rejected the way the API server would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    write_delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new(namespaces: &[&str]) -> Self {
        let store = Self::default();
        store.state.lock().unwrap().namespaces =
            namespaces.iter().map(|n| (*n).to_string()).collect();
        store
    }

    /// Delay every write, for timeout tests
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    pub fn add_namespace(&self, namespace: &str) {
        self.state
            .lock()
            .unwrap()
            .namespaces
            .push(namespace.to_string());
    }

    /// Store `resource` as-is, assigning a fresh resourceVersion
    pub fn insert<K: Replicable>(&self, mut resource: K) {
        let mut state = self.state.lock().unwrap();
        let k = key::<K>(&namespace_of(&resource), &resource.name_any());
        state.next_version += 1;
        resource.meta_mut().resource_version = Some(state.next_version.to_string());
        let value = serde_json::to_value(&resource).unwrap();
        state.objects.insert(k, value);
    }

    pub fn remove<K: Replicable>(&self, namespace: &str, name: &str) {
        self.state
            .lock()
            .unwrap()
            .objects
            .remove(&key::<K>(namespace, name));
    }

    pub fn object<K: Replicable>(&self, namespace: &str, name: &str) -> Option<K> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(&key::<K>(namespace, name))
            .map(|value| serde_json::from_value(value.clone()).unwrap())
    }

    /// Every stored object of kind `K`, ordered by (namespace, name)
    pub fn objects<K: Replicable>(&self) -> Vec<K> {
        self.state
            .lock()
            .unwrap()
            .objects
            .iter()
            .filter(|((kind, _, _), _)| *kind == K::KIND)
            .map(|(_, value)| serde_json::from_value(value.clone()).unwrap())
            .collect()
    }

    /// (namespace, name) of every stored object of kind `K`
    pub fn keys<K: Replicable>(&self) -> Vec<(String, String)> {
        self.state
            .lock()
            .unwrap()
            .objects
            .keys()
            .filter(|(kind, _, _)| *kind == K::KIND)
            .map(|(_, namespace, name)| (namespace.clone(), name.clone()))
            .collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls other than list/get
    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call.operation, "create" | "update" | "delete"))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn fail_namespace_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_namespaces = fail;
    }

    pub fn fail_list(&self, kind: ResourceKind) {
        self.state.lock().unwrap().fail_list.insert(kind);
    }

    pub fn fail_writes_in(&self, namespace: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_writes_in
            .insert(namespace.to_string());
    }

    /// Make `resource` appear in the store right before our create for its key
    pub fn race_create<K: Replicable>(&self, resource: K) {
        let k = key::<K>(&namespace_of(&resource), &resource.name_any());
        self.state
            .lock()
            .unwrap()
            .racing_creates
            .insert(k, serde_json::to_value(&resource).unwrap());
    }

    /// Remove the object right after the next list, before our delete lands
    pub fn delete_after_list<K: Replicable>(&self, namespace: &str, name: &str) {
        self.state
            .lock()
            .unwrap()
            .deleted_after_list
            .insert(key::<K>(namespace, name));
    }

    /// Replace the stored object with `resource` right after the next list
    pub fn replace_after_list<K: Replicable>(&self, resource: K) {
        let k = key::<K>(&namespace_of(&resource), &resource.name_any());
        self.state
            .lock()
            .unwrap()
            .replaced_after_list
            .insert(k, serde_json::to_value(&resource).unwrap());
    }

    fn record(&self, kind: ResourceKind, operation: &'static str, namespace: &str, name: &str) {
        self.state.lock().unwrap().calls.push(Call {
            kind,
            operation,
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
    }

    async fn before_write(&self, namespace: &str) -> Result<(), StoreError> {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if self.state.lock().unwrap().fail_writes_in.contains(namespace) {
            return Err(StoreError::Other(anyhow::anyhow!(
                "injected write failure in {namespace}"
            )));
        }
        Ok(())
    }
}

fn namespace_of<K: Replicable>(resource: &K) -> String {
    resource.meta().namespace.clone().unwrap_or_default()
}

#[async_trait]
impl<K: Replicable> ResourceStore<K> for MemoryStore {
    async fn list_all(&self) -> Result<Vec<K>, StoreError> {
        self.record(K::KIND, "list", "", "");
        let mut state = self.state.lock().unwrap();
        if state.fail_list.contains(&K::KIND) {
            return Err(StoreError::Other(anyhow::anyhow!(
                "injected list failure for {}",
                K::KIND
            )));
        }
        let listed: Vec<K> = state
            .objects
            .iter()
            .filter(|((kind, _, _), _)| *kind == K::KIND)
            .map(|(_, value)| serde_json::from_value(value.clone()).unwrap())
            .collect();

        let vanished: Vec<Key> = state
            .deleted_after_list
            .iter()
            .filter(|(kind, _, _)| *kind == K::KIND)
            .cloned()
            .collect();
        for k in vanished {
            state.deleted_after_list.remove(&k);
            state.objects.remove(&k);
        }

        let replaced: Vec<Key> = state
            .replaced_after_list
            .keys()
            .filter(|(kind, _, _)| *kind == K::KIND)
            .cloned()
            .collect();
        for k in replaced {
            if let Some(mut value) = state.replaced_after_list.remove(&k) {
                state.next_version += 1;
                value["metadata"]["resourceVersion"] = Value::String(state.next_version.to_string());
                state.objects.insert(k, value);
            }
        }
        Ok(listed)
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<K, StoreError> {
        self.record(K::KIND, "get", namespace, name);
        self.object::<K>(namespace, name)
            .ok_or_else(|| StoreError::NotFound {
                kind: K::KIND,
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn create(&self, namespace: &str, resource: &K) -> Result<K, StoreError> {
        let name = resource.name_any();
        self.record(K::KIND, "create", namespace, &name);
        self.before_write(namespace).await?;

        let k = key::<K>(namespace, &name);
        let racing = self.state.lock().unwrap().racing_creates.remove(&k);
        if let Some(value) = racing {
            let racing: K = serde_json::from_value(value).unwrap();
            self.insert(racing);
        }

        if self.state.lock().unwrap().objects.contains_key(&k) {
            return Err(StoreError::AlreadyExists {
                kind: K::KIND,
                namespace: namespace.to_string(),
                name,
            });
        }
        let mut created = resource.clone();
        created.meta_mut().namespace = Some(namespace.to_string());
        self.insert(created);
        self.get_stored(namespace, &name)
    }

    async fn update(&self, namespace: &str, resource: &K) -> Result<K, StoreError> {
        let name = resource.name_any();
        self.record(K::KIND, "update", namespace, &name);
        self.before_write(namespace).await?;

        let stored: K = self.get_stored(namespace, &name)?;
        if let Some(version) = &resource.meta().resource_version {
            if stored.meta().resource_version.as_ref() != Some(version) {
                return Err(StoreError::Other(anyhow::anyhow!(
                    "conflict: {namespace}/{name} was modified"
                )));
            }
        }
        self.insert(resource.clone());
        self.get_stored(namespace, &name)
    }

    async fn delete(
        &self,
        namespace: &str,
        name: &str,
        preconditions: &Preconditions,
    ) -> Result<(), StoreError> {
        self.record(K::KIND, "delete", namespace, name);
        self.before_write(namespace).await?;

        let mut state = self.state.lock().unwrap();
        let k = key::<K>(namespace, name);
        let Some(stored) = state.objects.get(&k) else {
            return Err(StoreError::NotFound {
                kind: K::KIND,
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        };
        let stored: K = serde_json::from_value(stored.clone()).unwrap();
        let uid_matches = preconditions.uid.is_none() || preconditions.uid == stored.meta().uid;
        let version_matches = preconditions.resource_version.is_none()
            || preconditions.resource_version == stored.meta().resource_version;
        if !(uid_matches && version_matches) {
            return Err(StoreError::Other(anyhow::anyhow!(
                "precondition failed: {namespace}/{name} was replaced"
            )));
        }
        state.objects.remove(&k);
        Ok(())
    }
}

impl MemoryStore {
    fn get_stored<K: Replicable>(&self, namespace: &str, name: &str) -> Result<K, StoreError> {
        self.object::<K>(namespace, name)
            .ok_or_else(|| StoreError::NotFound {
                kind: K::KIND,
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }
}

#[async_trait]
impl NamespaceLister for MemoryStore {
    async fn list_namespaces(&self) -> Result<Vec<String>, StoreError> {
        let state = self.state.lock().unwrap();
        if state.fail_namespaces {
            return Err(StoreError::Other(anyhow::anyhow!(
                "injected namespace list failure"
            )));
        }
        Ok(state.namespaces.clone())
    }
}

pub fn settings() -> ExecutorSettings {
    ExecutorSettings {
        max_concurrent_operations: 4,
        operation_timeout: Duration::from_secs(5),
    }
}

pub fn meta(namespace: &str, name: &str, annotations: &[(&str, &str)]) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        annotations: Some(
            annotations
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        ),
        ..ObjectMeta::default()
    }
}

pub fn secret(
    namespace: &str,
    name: &str,
    annotations: &[(&str, &str)],
    data: &[(&str, &str)],
) -> Secret {
    Secret {
        metadata: meta(namespace, name, annotations),
        data: Some(
            data.iter()
                .map(|(k, v)| ((*k).to_string(), ByteString(v.as_bytes().to_vec())))
                .collect(),
        ),
        type_: Some("Opaque".to_string()),
        ..Secret::default()
    }
}

pub fn configmap(
    namespace: &str,
    name: &str,
    annotations: &[(&str, &str)],
    data: &[(&str, &str)],
) -> ConfigMap {
    ConfigMap {
        metadata: meta(namespace, name, annotations),
        data: Some(
            data.iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        ),
        ..ConfigMap::default()
    }
}

/// Value of `key` in a Secret's payload, as UTF-8
pub fn secret_value(secret: &Secret, key: &str) -> Option<String> {
    secret
        .data
        .as_ref()?
        .get(key)
        .map(|bytes| String::from_utf8_lossy(&bytes.0).into_owned())
}

pub fn annotation<K: Replicable>(resource: &K, key: &str) -> Option<String> {
    resource.meta().annotations.as_ref()?.get(key).cloned()
}
