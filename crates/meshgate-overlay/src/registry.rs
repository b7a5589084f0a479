//! Entity registry capability trait
//!
//! Abstracts the NGSI-LD context broker the key manager publishes to. The
//! production client lives in `meshgate-registry`; tests substitute an
//! in-memory implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Entity type of the domain records the key manager publishes to
pub const DOMAIN_ENTITY_TYPE: &str = "Domain";

/// Attribute name carrying the domain's WireGuard public key
pub const PUBLIC_KEY_ATTRIBUTE: &str = "publicKey";

/// Errors from the entity registry backend
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The request could not be sent or the response not read
    #[error("Registry request failed: {0}")]
    Request(String),

    /// The registry answered with a non-success status
    #[error("Registry returned status {status} for {operation}")]
    Status {
        /// HTTP status code of the response
        status: u16,
        /// Short description of the attempted operation
        operation: String,
    },

    /// Access token acquisition failed
    #[error("Token acquisition failed: {0}")]
    Token(String),
}

/// Result type alias for registry operations
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// One NGSI-LD entity in simplified representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Entity URN
    pub id: String,

    /// Entity type
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Remaining attributes, keyed by attribute name
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, Value>,
}

/// Access to the continuum's entity registry
#[async_trait]
pub trait EntityRegistry: Send + Sync {
    /// Query entities of a type, optionally restricted to the local scope
    async fn query_entities(
        &self,
        entity_type: &str,
        local_only: bool,
    ) -> RegistryResult<Vec<Entity>>;

    /// Create an entity
    ///
    /// Creating an entity that already exists is not an error; the existing
    /// record wins.
    async fn create_entity(&self, entity: &Entity) -> RegistryResult<()>;

    /// Patch attributes of an entity in the local scope
    async fn patch_entity(
        &self,
        entity_id: &str,
        attributes: &serde_json::Map<String, Value>,
    ) -> RegistryResult<()>;

    /// Delete an entity
    async fn delete_entity(&self, entity_id: &str) -> RegistryResult<()>;
}

/// Build the NGSI-LD property payload for a public key patch
pub fn public_key_patch(public_key: &str) -> serde_json::Map<String, Value> {
    let mut attributes = serde_json::Map::new();
    attributes.insert(
        PUBLIC_KEY_ATTRIBUTE.to_string(),
        serde_json::json!({ "type": "Property", "value": public_key }),
    );
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_key_patch_shape() {
        let patch = public_key_patch("abc123=");
        let prop = patch.get("publicKey").unwrap();
        assert_eq!(prop["type"], "Property");
        assert_eq!(prop["value"], "abc123=");
    }

    #[test]
    fn test_entity_flattens_attributes() {
        let entity: Entity = serde_json::from_str(
            r#"{"id":"urn:ngsi-ld:Domain:d1","type":"Domain","publicKey":"pk"}"#,
        )
        .unwrap();
        assert_eq!(entity.id, "urn:ngsi-ld:Domain:d1");
        assert_eq!(entity.entity_type, "Domain");
        assert_eq!(entity.attributes["publicKey"], "pk");
    }
}
