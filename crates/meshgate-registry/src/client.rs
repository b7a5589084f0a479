//! NGSI-LD context broker client

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use meshgate_overlay::registry::{Entity, EntityRegistry, RegistryError, RegistryResult};

use crate::token::TokenManager;

/// Timeout for entity queries
const QUERY_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for entity patches
const PATCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for entity creation and deletion
const MUTATE_TIMEOUT: Duration = Duration::from_secs(1);

/// [`EntityRegistry`] implementation over an NGSI-LD broker's REST API
///
/// Requests against the local broker need no credentials; a token manager
/// can be attached for brokers fronted by the continuum's identity
/// provider, in which case every request carries a bearer token.
pub struct ContextBrokerClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Option<Arc<TokenManager>>,
}

impl ContextBrokerClient {
    /// Build a client for a broker endpoint
    ///
    /// `base_url` is scheme, host and port; the NGSI-LD path prefix is
    /// appended here.
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("{}/ngsi-ld/v1", base_url.trim_end_matches('/')),
            tokens: None,
        }
    }

    /// Attach a token manager; subsequent requests carry its bearer token
    pub fn with_tokens(mut self, tokens: Arc<TokenManager>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    async fn authorize(&self, request: reqwest::RequestBuilder) -> RegistryResult<reqwest::RequestBuilder> {
        match &self.tokens {
            Some(tokens) => Ok(request.bearer_auth(tokens.bearer_token().await?)),
            None => Ok(request),
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> RegistryResult<reqwest::Response> {
        let response = self
            .authorize(request)
            .await?
            .send()
            .await
            .map_err(|e| RegistryError::Request(format!("{operation}: {e}")))?;
        if !response.status().is_success() {
            return Err(RegistryError::Status {
                status: response.status().as_u16(),
                operation: operation.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl EntityRegistry for ContextBrokerClient {
    async fn query_entities(
        &self,
        entity_type: &str,
        local_only: bool,
    ) -> RegistryResult<Vec<Entity>> {
        let url = format!("{}/entities", self.base_url);
        let mut query = vec![
            ("type", entity_type.to_string()),
            ("format", "simplified".to_string()),
        ];
        if local_only {
            query.push(("local", "true".to_string()));
        }

        let response = self
            .send(
                self.http.get(&url).query(&query).timeout(QUERY_TIMEOUT),
                "query entities",
            )
            .await?;
        response
            .json()
            .await
            .map_err(|e| RegistryError::Request(format!("query entities: {e}")))
    }

    async fn create_entity(&self, entity: &Entity) -> RegistryResult<()> {
        let url = format!("{}/entities", self.base_url);
        let response = self
            .authorize(self.http.post(&url).json(entity).timeout(MUTATE_TIMEOUT))
            .await?
            .send()
            .await
            .map_err(|e| RegistryError::Request(format!("create entity: {e}")))?;

        // An already-registered entity is left as-is
        if response.status() == StatusCode::CONFLICT {
            tracing::warn!(entity = %entity.id, "Entity already exists, keeping existing record");
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(RegistryError::Status {
                status: response.status().as_u16(),
                operation: "create entity".to_string(),
            });
        }
        Ok(())
    }

    async fn patch_entity(
        &self,
        entity_id: &str,
        attributes: &serde_json::Map<String, Value>,
    ) -> RegistryResult<()> {
        let url = format!("{}/entities/{}", self.base_url, entity_id);
        self.send(
            self.http
                .patch(&url)
                .query(&[("local", "true")])
                .json(attributes)
                .timeout(PATCH_TIMEOUT),
            "patch entity",
        )
        .await?;
        Ok(())
    }

    async fn delete_entity(&self, entity_id: &str) -> RegistryResult<()> {
        let url = format!("{}/entities/{}", self.base_url, entity_id);
        self.send(
            self.http.delete(&url).timeout(MUTATE_TIMEOUT),
            "delete entity",
        )
        .await?;
        Ok(())
    }
}
