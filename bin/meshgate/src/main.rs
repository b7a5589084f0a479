//! MeshGate service entry point
//!
//! Wires the Kubernetes backend, the context broker client, and the key
//! manager into the REST API and serves it.

mod settings;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use meshgate_api::{build_router, ApiState};
use meshgate_cluster::KubeCluster;
use meshgate_overlay::{
    first_host, KeyManager, OverlayOrchestrator, OverlayTargets, SubnetPool,
};
use meshgate_registry::{token::TokenConfig, ContextBrokerClient, TokenManager};

use settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = Settings::parse();
    info!(namespace = %settings.namespace, subnet = %settings.overlay_subnet, "Starting meshgate");

    let pool = SubnetPool::new(&settings.overlay_subnet)
        .with_context(|| format!("invalid overlay subnet '{}'", settings.overlay_subnet))?;
    let server_addr = first_host(pool.base()).context("overlay subnet has no usable hosts")?;

    let file_keys = BTreeMap::from([
        (
            settings.wireguard_configmap.clone(),
            settings.wireguard_file_key.clone(),
        ),
        (
            settings.dnsmasq_configmap.clone(),
            settings.dnsmasq_file_key.clone(),
        ),
    ]);
    let cluster = Arc::new(
        KubeCluster::connect(&settings.namespace, file_keys)
            .await
            .context("connecting to the cluster")?,
    );

    let tokens = settings.idp_url.as_ref().map(|idp_url| {
        Arc::new(TokenManager::new(
            cluster.clone(),
            TokenConfig {
                idp_url: idp_url.clone(),
                realm: settings.idp_realm.clone(),
                client_id: settings.client_id.clone(),
                client_secret: settings.client_secret.clone(),
                secret_name: settings.token_secret.clone(),
            },
        ))
    });

    let mut broker = ContextBrokerClient::new(&settings.broker_url);
    if let Some(tokens) = &tokens {
        broker = broker.with_tokens(tokens.clone());
    }
    let registry = Arc::new(broker);

    let keys = Arc::new(KeyManager::new(
        cluster.clone(),
        registry,
        settings.key_secret.clone(),
    ));

    // The substrate works without a published key; a broker outage at boot
    // should not keep the API down.
    match keys.ensure().await {
        Ok(_) => info!("Domain keypair ready"),
        Err(e) => warn!(error = %e, "Could not ensure domain keypair at startup"),
    }

    let orchestrator = Arc::new(OverlayOrchestrator::new(
        cluster,
        keys.clone(),
        OverlayTargets {
            wireguard_configmap: settings.wireguard_configmap.clone(),
            dnsmasq_configmap: settings.dnsmasq_configmap.clone(),
            workload_selector: settings.wireguard_pod_label.clone(),
        },
        server_addr,
    ));

    let state = ApiState {
        pool: Arc::new(Mutex::new(pool)),
        orchestrator,
        keys,
        tokens,
    };

    let listener = tokio::net::TcpListener::bind(&settings.bind)
        .await
        .with_context(|| format!("binding {}", settings.bind))?;
    info!(bind = %settings.bind, "Listening");
    axum::serve(listener, build_router(state))
        .await
        .context("serving the API")?;
    Ok(())
}
