//! Service overlay endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use meshgate_overlay::{Peer, ServiceOverlayRequest};

use crate::error::{ApiError, Result};
use crate::state::ApiState;

/// One mesh member in an overlay request
#[derive(Debug, Deserialize, ToSchema)]
pub struct PeerBody {
    /// Peer hostname, also used for DNS aliasing
    pub name: String,
    /// Peer's WireGuard public key (base64)
    pub public_key: String,
    /// Peer's address inside the service overlay
    pub overlay_ip: String,
    /// Whether this peer is the mesh server
    #[serde(default)]
    pub is_master: bool,
}

/// Request to create a service overlay
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOverlayBody {
    /// Service owning the overlay
    pub service_id: String,
    /// Mesh members; exactly one must be flagged as master
    pub peers: Vec<PeerBody>,
}

/// Request to delete a service overlay
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteOverlayBody {
    /// Service whose overlay should be removed
    pub service_id: String,
}

/// Plain outcome message
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub detail: String,
}

impl PeerBody {
    fn into_peer(self) -> Result<Peer> {
        let overlay_ip = self.overlay_ip.parse().map_err(|_| {
            ApiError::Validation(format!(
                "peer '{}': '{}' is not a valid IPv4 address",
                self.name, self.overlay_ip
            ))
        })?;
        Ok(Peer {
            name: self.name,
            public_key: self.public_key,
            overlay_ip,
            is_master: self.is_master,
        })
    }
}

/// Create a service overlay
///
/// Rewrites the WireGuard and dnsmasq configurations with the service's
/// peer block and restarts the mesh daemon.
#[utoipa::path(
    post,
    path = "/service-network-overlay",
    request_body = CreateOverlayBody,
    responses(
        (status = 200, description = "Overlay configured and daemon restarted", body = MessageResponse),
        (status = 422, description = "Invalid peer set"),
        (status = 502, description = "Cluster update failed"),
    ),
    tag = "Overlay"
)]
pub async fn create_overlay(
    State(state): State<ApiState>,
    Json(body): Json<CreateOverlayBody>,
) -> Result<Json<MessageResponse>> {
    tracing::info!(service_id = %body.service_id, peers = body.peers.len(), "Overlay creation requested");
    let peers = body
        .peers
        .into_iter()
        .map(PeerBody::into_peer)
        .collect::<Result<Vec<_>>>()?;
    let request = ServiceOverlayRequest {
        service_id: body.service_id,
        peers,
    };

    state.orchestrator.create(&request).await?;
    Ok(Json(MessageResponse {
        detail: "Overlay configuration updated and mesh daemon restarted".to_string(),
    }))
}

/// Delete a service overlay
///
/// Strips the service's block from both configurations, restarts the mesh
/// daemon, and releases the service's subnet back into the pool.
#[utoipa::path(
    delete,
    path = "/service-network-overlay",
    request_body = DeleteOverlayBody,
    responses(
        (status = 200, description = "Overlay removed and subnet released", body = MessageResponse),
        (status = 404, description = "Service has no assigned subnet"),
        (status = 502, description = "Cluster update failed"),
    ),
    tag = "Overlay"
)]
pub async fn delete_overlay(
    State(state): State<ApiState>,
    Json(body): Json<DeleteOverlayBody>,
) -> Result<Json<MessageResponse>> {
    tracing::info!(service_id = %body.service_id, "Overlay deletion requested");
    state.orchestrator.delete(&body.service_id).await?;
    let released = state.pool.lock().await.release(&body.service_id)?;
    Ok(Json(MessageResponse {
        detail: format!(
            "Overlay configuration updated, mesh daemon restarted, subnet {released} released"
        ),
    }))
}

/// Reset both configurations to their baselines
#[utoipa::path(
    post,
    path = "/service-network-overlay/reset",
    responses(
        (status = 200, description = "Baselines pushed and daemon restarted", body = MessageResponse),
        (status = 502, description = "Cluster update failed"),
    ),
    tag = "Overlay"
)]
pub async fn reset_overlay(State(state): State<ApiState>) -> Result<Json<MessageResponse>> {
    state.orchestrator.reset().await?;
    Ok(Json(MessageResponse {
        detail: "Overlay configuration reset to baseline".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_body_parses_address() {
        let body = PeerBody {
            name: "client-a".to_string(),
            public_key: "pk".to_string(),
            overlay_ip: "10.13.13.2".to_string(),
            is_master: false,
        };
        let peer = body.into_peer().unwrap();
        assert_eq!(peer.overlay_ip.to_string(), "10.13.13.2");
    }

    #[test]
    fn test_peer_body_rejects_bad_address() {
        let body = PeerBody {
            name: "client-a".to_string(),
            public_key: "pk".to_string(),
            overlay_ip: "10.13.13".to_string(),
            is_master: false,
        };
        assert!(matches!(
            body.into_peer().unwrap_err(),
            ApiError::Validation(_)
        ));
    }

    #[test]
    fn test_is_master_defaults_to_false() {
        let body: PeerBody = serde_json::from_str(
            r#"{"name":"a","public_key":"pk","overlay_ip":"10.13.13.2"}"#,
        )
        .unwrap();
        assert!(!body.is_master);
    }
}
