//! Cluster capability trait
//!
//! Abstracts the handful of cluster operations the orchestrator and key
//! manager need: named configuration texts, opaque secret maps, and a
//! workload restart. The production backend lives in `meshgate-cluster`;
//! tests substitute an in-memory implementation.

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from the cluster backend
#[derive(Debug, Error)]
pub enum ClusterError {
    /// No running workload matched the restart selector
    #[error("No workload matched selector '{0}'")]
    NoMatchingWorkload(String),

    /// The backend rejected or failed a request
    #[error("Cluster API request failed: {0}")]
    Api(String),
}

/// Result type alias for cluster operations
pub type ClusterResult<T> = std::result::Result<T, ClusterError>;

/// Access to cluster-held overlay state
///
/// Configuration objects and secrets are addressed by name within a
/// namespace fixed at construction. Reads of absent objects return
/// `Ok(None)` rather than an error; only transport and API failures
/// surface as [`ClusterError`].
#[async_trait]
pub trait ClusterOps: Send + Sync {
    /// Fetch a named configuration text, `None` if the object is absent
    async fn get_config(&self, name: &str) -> ClusterResult<Option<String>>;

    /// Store a configuration text under a name, creating or replacing it
    async fn put_config(&self, name: &str, content: &str) -> ClusterResult<()>;

    /// Fetch a named secret as a string map, `None` if absent
    async fn get_secret(&self, name: &str) -> ClusterResult<Option<BTreeMap<String, String>>>;

    /// Store a secret map under a name, creating or replacing it
    async fn put_secret(&self, name: &str, data: &BTreeMap<String, String>) -> ClusterResult<()>;

    /// Restart the workload matching a label selector
    ///
    /// Returns the number of instances restarted. Matching nothing is a
    /// [`ClusterError::NoMatchingWorkload`] failure: a restart that cannot
    /// reach the mesh daemon means the pushed configuration never loads.
    async fn restart_workload(&self, selector: &str) -> ClusterResult<usize>;
}
