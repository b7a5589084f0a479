//! Kubernetes backend for the overlay cluster capability
//!
//! Implements [`ClusterOps`] against the core v1 API: configuration texts
//! live in ConfigMaps (one file key per map), the domain keypair in a
//! Secret, and a workload restart is a label-selected pod deletion that
//! lets the owning controller reschedule with the updated volumes.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Pod, Secret};
use kube::api::{Api, DeleteParams, ListParams, ObjectMeta, PostParams};
use kube::Client;

use meshgate_overlay::cluster::{ClusterError, ClusterOps, ClusterResult};

/// [`ClusterOps`] implementation over the Kubernetes core v1 API
///
/// All objects are addressed within a single namespace fixed at
/// construction. Each managed ConfigMap carries its text under one file
/// key (the filename the daemon container mounts), configured up front.
pub struct KubeCluster {
    configmaps: Api<ConfigMap>,
    secrets: Api<Secret>,
    pods: Api<Pod>,
    file_keys: BTreeMap<String, String>,
}

impl KubeCluster {
    /// Build a backend from an existing client
    pub fn new(client: Client, namespace: &str, file_keys: BTreeMap<String, String>) -> Self {
        Self {
            configmaps: Api::namespaced(client.clone(), namespace),
            secrets: Api::namespaced(client.clone(), namespace),
            pods: Api::namespaced(client, namespace),
            file_keys,
        }
    }

    /// Connect using the ambient configuration (in-cluster or kubeconfig)
    pub async fn connect(
        namespace: &str,
        file_keys: BTreeMap<String, String>,
    ) -> ClusterResult<Self> {
        let client = Client::try_default().await.map_err(api_error)?;
        Ok(Self::new(client, namespace, file_keys))
    }

    fn file_key(&self, configmap: &str) -> ClusterResult<&str> {
        self.file_keys
            .get(configmap)
            .map(String::as_str)
            .ok_or_else(|| {
                ClusterError::Api(format!("no file key configured for ConfigMap '{configmap}'"))
            })
    }
}

#[async_trait]
impl ClusterOps for KubeCluster {
    async fn get_config(&self, name: &str) -> ClusterResult<Option<String>> {
        let key = self.file_key(name)?;
        let Some(configmap) = self.configmaps.get_opt(name).await.map_err(api_error)? else {
            tracing::debug!(configmap = name, "ConfigMap not found");
            return Ok(None);
        };
        Ok(configmap.data.and_then(|data| data.get(key).cloned()))
    }

    async fn put_config(&self, name: &str, content: &str) -> ClusterResult<()> {
        let key = self.file_key(name)?.to_string();
        let body = ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            data: Some(BTreeMap::from([(key, content.to_string())])),
            ..Default::default()
        };

        match self.configmaps.replace(name, &PostParams::default(), &body).await {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => {
                tracing::info!(configmap = name, "ConfigMap absent, creating");
                self.configmaps
                    .create(&PostParams::default(), &body)
                    .await
                    .map_err(api_error)?;
                Ok(())
            }
            Err(e) => Err(api_error(e)),
        }
    }

    async fn get_secret(&self, name: &str) -> ClusterResult<Option<BTreeMap<String, String>>> {
        let Some(secret) = self.secrets.get_opt(name).await.map_err(api_error)? else {
            return Ok(None);
        };
        let Some(data) = secret.data else {
            return Ok(Some(BTreeMap::new()));
        };

        let mut decoded = BTreeMap::new();
        for (field, bytes) in data {
            let value = String::from_utf8(bytes.0).map_err(|e| {
                ClusterError::Api(format!("secret '{name}' field '{field}' is not UTF-8: {e}"))
            })?;
            decoded.insert(field, value);
        }
        Ok(Some(decoded))
    }

    async fn put_secret(&self, name: &str, data: &BTreeMap<String, String>) -> ClusterResult<()> {
        let body = Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            string_data: Some(data.clone()),
            ..Default::default()
        };

        match self.secrets.replace(name, &PostParams::default(), &body).await {
            Ok(_) => Ok(()),
            Err(e) if is_not_found(&e) => {
                tracing::info!(secret = name, "Secret absent, creating");
                self.secrets
                    .create(&PostParams::default(), &body)
                    .await
                    .map_err(api_error)?;
                Ok(())
            }
            Err(e) => Err(api_error(e)),
        }
    }

    async fn restart_workload(&self, selector: &str) -> ClusterResult<usize> {
        let params = ListParams::default().labels(selector);
        let pods = self.pods.list(&params).await.map_err(api_error)?;
        if pods.items.is_empty() {
            return Err(ClusterError::NoMatchingWorkload(selector.to_string()));
        }

        let mut deleted = 0;
        for pod in &pods.items {
            let Some(name) = pod.metadata.name.as_deref() else {
                continue;
            };
            tracing::info!(pod = name, "Deleting pod to trigger restart");
            self.pods
                .delete(name, &DeleteParams::default())
                .await
                .map_err(api_error)?;
            deleted += 1;
        }
        Ok(deleted)
    }
}

fn api_error(e: kube::Error) -> ClusterError {
    ClusterError::Api(e.to_string())
}

fn is_not_found(e: &kube::Error) -> bool {
    matches!(e, kube::Error::Api(ae) if ae.code == 404)
}
