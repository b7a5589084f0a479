//! Overlay request value types
//!
//! Immutable records describing one service's overlay membership, validated
//! at the boundary before the orchestrator touches any cluster resource.

use crate::error::{OverlayError, Result};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// One member of a service's mesh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Peer hostname, also used for DNS aliasing
    pub name: String,

    /// Peer's WireGuard public key (base64)
    pub public_key: String,

    /// Peer's address inside the service overlay
    pub overlay_ip: Ipv4Addr,

    /// Whether this peer is the mesh server for the overlay
    #[serde(default)]
    pub is_master: bool,
}

/// Request to create or delete one service's overlay
///
/// A non-empty peer list drives creation; an empty list drives deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOverlayRequest {
    /// Service owning the overlay
    pub service_id: String,

    /// Mesh members; exactly one must be flagged as master on creation
    #[serde(default)]
    pub peers: Vec<Peer>,
}

impl ServiceOverlayRequest {
    /// Whether this request drives overlay creation
    pub fn is_create(&self) -> bool {
        !self.peers.is_empty()
    }

    /// The single master peer of a creation request
    ///
    /// Fails when zero or more than one peer carries the master flag.
    pub fn master_peer(&self) -> Result<&Peer> {
        let mut masters = self.peers.iter().filter(|p| p.is_master);
        let first = masters.next().ok_or(OverlayError::MissingMasterPeer)?;
        let extra = masters.count();
        if extra > 0 {
            return Err(OverlayError::MultipleMasterPeers(extra + 1));
        }
        Ok(first)
    }

    /// All non-master peers, in request order
    pub fn client_peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.iter().filter(|p| !p.is_master)
    }

    /// Validate a creation request before any external effect
    pub fn validate_create(&self) -> Result<()> {
        if self.service_id.is_empty() {
            return Err(OverlayError::EmptyServiceId);
        }
        if self.peers.is_empty() {
            return Err(OverlayError::EmptyPeerList);
        }
        self.master_peer()?;
        Ok(())
    }
}
