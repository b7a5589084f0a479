//! Error types for overlay lifecycle operations

use thiserror::Error;

use crate::cluster::ClusterError;
use crate::registry::RegistryError;

/// Errors that can occur while managing service overlays
#[derive(Debug, Error)]
pub enum OverlayError {
    /// Invalid CIDR notation for the overlay base network
    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    /// No /24 subnets left in the pool
    #[error("Subnet pool exhausted: no /24 blocks available")]
    PoolExhausted,

    /// The service has no subnet allocated
    #[error("Service '{0}' has no allocated subnet")]
    NotAllocated(String),

    /// Request carried an empty service id
    #[error("Service id must not be empty")]
    EmptyServiceId,

    /// Creation request carried no peers
    #[error("Overlay creation requires at least one peer")]
    EmptyPeerList,

    /// Creation request had no peer flagged as the mesh server
    #[error("No peer in the request is flagged as the overlay master")]
    MissingMasterPeer,

    /// Creation request flagged more than one peer as the mesh server
    #[error("Request flags {0} peers as overlay master, expected exactly one")]
    MultipleMasterPeers(usize),

    /// A configuration object the orchestrator expected was not in the cluster
    #[error("Configuration object '{0}' not found in the cluster")]
    ConfigObjectMissing(String),

    /// The domain key secret was not found
    #[error("Key secret '{0}' not found in the cluster")]
    KeySecretMissing(String),

    /// The key secret exists but lacks the expected field
    #[error("Key secret is missing field '{0}'")]
    KeyFieldMissing(String),

    /// The entity registry holds no local domain entity to publish to
    #[error("No local domain entity found in the registry")]
    LocalDomainMissing,

    /// One or more resource updates failed during an apply sequence
    #[error("Failed to apply overlay resources: {}", resources.join(", "))]
    ApplyFailed {
        /// Names of the resources that failed to update
        resources: Vec<String>,
    },

    /// Cluster capability error
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    /// Entity registry error
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result type alias for overlay operations
pub type Result<T> = std::result::Result<T, OverlayError>;
