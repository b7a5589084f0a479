//! MeshGate Overlay - Per-service WireGuard overlay lifecycle
//!
//! Manages the domain-level substrate for service overlays: a pool of /24
//! subnets carved from a configured /16 base, marker-delimited service
//! blocks inside the shared WireGuard and dnsmasq configuration texts, and
//! the orchestration sequence that pushes updated texts to the cluster and
//! restarts the mesh daemon so they load.
//!
//! Cluster and registry access sit behind capability traits so the core
//! stays testable without a live cluster; production backends live in
//! `meshgate-cluster` and `meshgate-registry`.
//!
//! # Modules
//!
//! - [`allocator`] - /24 subnet pool keyed by service id
//! - [`cluster`] - Cluster capability trait (configs, secrets, restart)
//! - [`error`] - Error types for overlay operations
//! - [`keys`] - Domain keypair generation, storage, and publication
//! - [`orchestrator`] - Create / delete / reset sequences
//! - [`registry`] - Entity registry capability trait
//! - [`render`] - Pure configuration text transforms
//! - [`request`] - Validated request value types
//!
//! # Example
//!
//! ```ignore
//! use meshgate_overlay::allocator::SubnetPool;
//!
//! let mut pool = SubnetPool::new("10.13.0.0/16")?;
//! let subnet = pool.assign("urn:service:example")?;
//! assert_eq!(subnet.to_string(), "10.13.0.0/24");
//! ```

pub mod allocator;
pub mod cluster;
pub mod error;
pub mod keys;
pub mod orchestrator;
pub mod registry;
pub mod render;
pub mod request;

pub use allocator::{first_host, SubnetPool, BLOCK_PREFIX_LEN};
pub use cluster::{ClusterError, ClusterOps, ClusterResult};
pub use error::{OverlayError, Result};
pub use keys::{generate_keypair, KeyManager, KeyPair};
pub use orchestrator::{OverlayOrchestrator, OverlayTargets};
pub use registry::{Entity, EntityRegistry, RegistryError, RegistryResult};
pub use request::{Peer, ServiceOverlayRequest};
