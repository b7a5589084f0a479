//! Domain key material management
//!
//! Generates the domain's WireGuard keypair with native x25519 crypto,
//! persists both halves in a cluster secret, and publishes the public half
//! to the local domain entity in the registry so remote domains can peer.

use std::collections::BTreeMap;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::cluster::ClusterOps;
use crate::error::{OverlayError, Result};
use crate::registry::{self, EntityRegistry, DOMAIN_ENTITY_TYPE};

/// Secret field holding the base64 private key
pub const PRIVATE_KEY_FIELD: &str = "private-key";

/// Secret field holding the base64 public key
pub const PUBLIC_KEY_FIELD: &str = "public-key";

/// A WireGuard keypair, both halves base64 encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// Base64 x25519 private key
    pub private_key: String,
    /// Base64 x25519 public key
    pub public_key: String,
}

/// Generate a fresh x25519 keypair
pub fn generate_keypair() -> KeyPair {
    let secret = StaticSecret::random_from_rng(OsRng);
    let public = PublicKey::from(&secret);
    KeyPair {
        private_key: STANDARD.encode(secret.to_bytes()),
        public_key: STANDARD.encode(public.as_bytes()),
    }
}

/// Lifecycle manager for the domain keypair
///
/// The secret is the source of truth for the private key; the registry's
/// local domain entity mirrors the public key.
pub struct KeyManager {
    cluster: Arc<dyn ClusterOps>,
    registry: Arc<dyn EntityRegistry>,
    secret_name: String,
}

impl KeyManager {
    pub fn new(
        cluster: Arc<dyn ClusterOps>,
        registry: Arc<dyn EntityRegistry>,
        secret_name: impl Into<String>,
    ) -> Self {
        Self {
            cluster,
            registry,
            secret_name: secret_name.into(),
        }
    }

    /// Ensure a domain keypair exists
    ///
    /// When the secret already holds both halves they are returned as-is
    /// and nothing is published. Otherwise a fresh keypair is generated,
    /// stored, and its public half pushed to the local domain entity.
    pub async fn ensure(&self) -> Result<KeyPair> {
        if let Some(data) = self.cluster.get_secret(&self.secret_name).await? {
            tracing::info!(secret = %self.secret_name, "Domain keypair already present");
            return keypair_from_secret(&data);
        }
        tracing::info!(secret = %self.secret_name, "Domain keypair missing, generating");
        self.store_and_publish(generate_keypair()).await
    }

    /// Replace the domain keypair unconditionally
    pub async fn rotate(&self) -> Result<KeyPair> {
        tracing::info!(secret = %self.secret_name, "Rotating domain keypair");
        self.store_and_publish(generate_keypair()).await
    }

    /// Read the current keypair from the secret
    pub async fn current(&self) -> Result<KeyPair> {
        let data = self
            .cluster
            .get_secret(&self.secret_name)
            .await?
            .ok_or_else(|| OverlayError::KeySecretMissing(self.secret_name.clone()))?;
        keypair_from_secret(&data)
    }

    /// Read only the private key, for rendering the interface baseline
    pub async fn private_key(&self) -> Result<String> {
        Ok(self.current().await?.private_key)
    }

    async fn store_and_publish(&self, pair: KeyPair) -> Result<KeyPair> {
        let mut data = BTreeMap::new();
        data.insert(PRIVATE_KEY_FIELD.to_string(), pair.private_key.clone());
        data.insert(PUBLIC_KEY_FIELD.to_string(), pair.public_key.clone());
        self.cluster.put_secret(&self.secret_name, &data).await?;

        self.publish_public_key(&pair.public_key).await?;
        Ok(pair)
    }

    /// Patch the public key onto the local domain entity
    ///
    /// The local scope holds exactly one domain entity; none at all means
    /// the registry is not bootstrapped for this domain yet.
    async fn publish_public_key(&self, public_key: &str) -> Result<()> {
        let domains = self
            .registry
            .query_entities(DOMAIN_ENTITY_TYPE, true)
            .await?;
        let domain = domains.first().ok_or(OverlayError::LocalDomainMissing)?;

        self.registry
            .patch_entity(&domain.id, &registry::public_key_patch(public_key))
            .await?;
        tracing::info!(entity = %domain.id, "Published domain public key");
        Ok(())
    }
}

fn keypair_from_secret(data: &BTreeMap<String, String>) -> Result<KeyPair> {
    let private_key = data
        .get(PRIVATE_KEY_FIELD)
        .ok_or_else(|| OverlayError::KeyFieldMissing(PRIVATE_KEY_FIELD.to_string()))?;
    let public_key = data
        .get(PUBLIC_KEY_FIELD)
        .ok_or_else(|| OverlayError::KeyFieldMissing(PUBLIC_KEY_FIELD.to_string()))?;
    Ok(KeyPair {
        private_key: private_key.clone(),
        public_key: public_key.clone(),
    })
}
