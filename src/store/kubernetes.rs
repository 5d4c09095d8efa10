//! # Kubernetes Store
//!
//! [`ResourceStore`] and [`NamespaceLister`] backed by the Kubernetes API.

use super::{NamespaceLister, ResourceStore, StoreError};
use crate::resource::Replicable;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use kube::api::{Api, DeleteParams, ListParams, PostParams, Preconditions};
use kube::{Client, ResourceExt};
use tracing::debug;

/// Cluster-backed store shared by every kind's pass
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore").finish_non_exhaustive()
    }
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn namespaced<K: Replicable>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl<K: Replicable> ResourceStore<K> for KubeStore {
    async fn list_all(&self) -> Result<Vec<K>, StoreError> {
        let api: Api<K> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(StoreError::Kube)?;
        debug!(resource = %K::KIND, count = list.items.len(), "store.list_all");
        Ok(list.items)
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<K, StoreError> {
        self.namespaced::<K>(namespace)
            .get(name)
            .await
            .map_err(|e| StoreError::from_kube(e, K::KIND, namespace, name))
    }

    async fn create(&self, namespace: &str, resource: &K) -> Result<K, StoreError> {
        let name = resource.name_any();
        self.namespaced::<K>(namespace)
            .create(&PostParams::default(), resource)
            .await
            .map_err(|e| StoreError::from_kube(e, K::KIND, namespace, &name))
    }

    async fn update(&self, namespace: &str, resource: &K) -> Result<K, StoreError> {
        let name = resource.name_any();
        self.namespaced::<K>(namespace)
            .replace(&name, &PostParams::default(), resource)
            .await
            .map_err(|e| StoreError::from_kube(e, K::KIND, namespace, &name))
    }

    async fn delete(
        &self,
        namespace: &str,
        name: &str,
        preconditions: &Preconditions,
    ) -> Result<(), StoreError> {
        let params = DeleteParams {
            preconditions: Some(preconditions.clone()),
            ..DeleteParams::default()
        };
        self.namespaced::<K>(namespace)
            .delete(name, &params)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::from_kube(e, K::KIND, namespace, name))
    }
}

#[async_trait]
impl NamespaceLister for KubeStore {
    async fn list_namespaces(&self) -> Result<Vec<String>, StoreError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(StoreError::Kube)?;
        Ok(list.items.iter().map(ResourceExt::name_any).collect())
    }
}
