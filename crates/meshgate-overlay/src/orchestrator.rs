//! Overlay lifecycle orchestration
//!
//! Drives the create / delete / reset sequences: pull current configuration
//! texts from the cluster, rewrite them, push both back, then restart the
//! mesh workload so the daemons reload. Both pushes are always attempted so
//! a single failure cannot leave one text silently stale without being
//! reported; the restart only runs once both pushes have landed.

use std::net::Ipv4Addr;
use std::sync::Arc;

use crate::cluster::ClusterOps;
use crate::error::{OverlayError, Result};
use crate::keys::KeyManager;
use crate::render;
use crate::request::ServiceOverlayRequest;

/// Names of the cluster objects an overlay apply touches
#[derive(Debug, Clone)]
pub struct OverlayTargets {
    /// Configuration object holding the WireGuard interface text
    pub wireguard_configmap: String,

    /// Configuration object holding the dnsmasq aliasing text
    pub dnsmasq_configmap: String,

    /// Label selector of the mesh daemon workload to restart
    pub workload_selector: String,
}

/// Coordinator for service overlay changes against the cluster
pub struct OverlayOrchestrator {
    cluster: Arc<dyn ClusterOps>,
    keys: Arc<KeyManager>,
    targets: OverlayTargets,
    /// Address the mesh server binds in the baseline configuration
    server_addr: Ipv4Addr,
}

impl OverlayOrchestrator {
    pub fn new(
        cluster: Arc<dyn ClusterOps>,
        keys: Arc<KeyManager>,
        targets: OverlayTargets,
        server_addr: Ipv4Addr,
    ) -> Self {
        Self {
            cluster,
            keys,
            targets,
            server_addr,
        }
    }

    /// Route a request to creation or deletion based on its peer list
    pub async fn handle(&self, request: &ServiceOverlayRequest) -> Result<()> {
        if request.is_create() {
            self.create(request).await
        } else {
            self.delete(&request.service_id).await
        }
    }

    /// Create a service overlay
    ///
    /// Validates the request before any external call, merges the master
    /// peer's address into the interface `Address` line, appends one marked
    /// block per text for the client peers, then applies.
    pub async fn create(&self, request: &ServiceOverlayRequest) -> Result<()> {
        request.validate_create()?;
        let master = request.master_peer()?;
        tracing::info!(
            service_id = %request.service_id,
            peers = request.peers.len(),
            master = %master.name,
            "Creating service overlay"
        );

        let wg_text = self.fetch_config(&self.targets.wireguard_configmap).await?;
        let dns_text = self.fetch_config(&self.targets.dnsmasq_configmap).await?;

        let wg_text = render::append_master_address(&wg_text, master.overlay_ip);
        let wg_text = render::add_service_block(
            &wg_text,
            &request.service_id,
            &request.peers,
            render::render_wireguard_peer,
        );
        let dns_text = render::add_service_block(
            &dns_text,
            &request.service_id,
            &request.peers,
            render::render_dns_alias,
        );

        self.apply(&wg_text, &dns_text).await
    }

    /// Delete a service overlay
    ///
    /// Strips the service's marked block from both texts. Absent blocks make
    /// this a no-op rewrite, so retrying a delete is safe.
    pub async fn delete(&self, service_id: &str) -> Result<()> {
        if service_id.is_empty() {
            return Err(OverlayError::EmptyServiceId);
        }
        tracing::info!(service_id, "Deleting service overlay");

        let wg_text = self.fetch_config(&self.targets.wireguard_configmap).await?;
        let dns_text = self.fetch_config(&self.targets.dnsmasq_configmap).await?;

        let wg_text = render::remove_service_block(&wg_text, service_id);
        let dns_text = render::remove_service_block(&dns_text, service_id);

        self.apply(&wg_text, &dns_text).await
    }

    /// Reset both configurations to their baselines
    ///
    /// Discards all service history from the texts. The in-memory subnet
    /// pool is a separate lifecycle and is not touched here.
    pub async fn reset(&self) -> Result<()> {
        tracing::info!(server_addr = %self.server_addr, "Resetting overlay configuration");
        let private_key = self.keys.private_key().await?;

        let wg_text = render::baseline_interface(self.server_addr, &private_key);
        let dns_text = render::baseline_dns();

        self.apply(&wg_text, &dns_text).await
    }

    async fn fetch_config(&self, name: &str) -> Result<String> {
        self.cluster
            .get_config(name)
            .await?
            .ok_or_else(|| OverlayError::ConfigObjectMissing(name.to_string()))
    }

    /// Push both texts, then restart the mesh workload
    ///
    /// Both pushes run even when the first fails; failures are aggregated
    /// by resource name. The restart is skipped when any push failed, since
    /// reloading half-updated state would be worse than staying stale.
    async fn apply(&self, wg_text: &str, dns_text: &str) -> Result<()> {
        let mut failed = Vec::new();

        if let Err(e) = self
            .cluster
            .put_config(&self.targets.wireguard_configmap, wg_text)
            .await
        {
            tracing::error!(configmap = %self.targets.wireguard_configmap, error = %e, "Push failed");
            failed.push(self.targets.wireguard_configmap.clone());
        }
        if let Err(e) = self
            .cluster
            .put_config(&self.targets.dnsmasq_configmap, dns_text)
            .await
        {
            tracing::error!(configmap = %self.targets.dnsmasq_configmap, error = %e, "Push failed");
            failed.push(self.targets.dnsmasq_configmap.clone());
        }

        if !failed.is_empty() {
            return Err(OverlayError::ApplyFailed { resources: failed });
        }

        let restarted = self
            .cluster
            .restart_workload(&self.targets.workload_selector)
            .await?;
        tracing::info!(
            selector = %self.targets.workload_selector,
            instances = restarted,
            "Mesh workload restarted"
        );
        Ok(())
    }
}
