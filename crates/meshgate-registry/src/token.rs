//! Machine-to-machine token management
//!
//! Fetches client-credentials tokens from Keycloak and caches them in a
//! cluster secret so restarts and replicas reuse a still-valid token
//! instead of hammering the identity provider.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use meshgate_overlay::cluster::ClusterOps;
use meshgate_overlay::registry::{RegistryError, RegistryResult};

/// Secret field holding the cached access token
const TOKEN_FIELD: &str = "token";

/// Secret field holding the token expiry as RFC 3339
const EXPIRES_AT_FIELD: &str = "expires-at";

/// Tokens this close to expiry are refreshed early
const EXPIRY_SKEW_SECS: i64 = 30;

/// Timeout for identity provider requests
const TOKEN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Identity provider endpoint and credentials
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Keycloak base URL
    pub idp_url: String,
    /// Keycloak realm
    pub realm: String,
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Cluster secret caching the token between processes
    pub secret_name: String,
}

/// Cached client-credentials token source
pub struct TokenManager {
    http: reqwest::Client,
    cluster: Arc<dyn ClusterOps>,
    config: TokenConfig,
}

impl TokenManager {
    pub fn new(cluster: Arc<dyn ClusterOps>, config: TokenConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            cluster,
            config,
        }
    }

    /// A currently valid bearer token, refreshed from Keycloak if needed
    pub async fn bearer_token(&self) -> RegistryResult<String> {
        let cached = self
            .cluster
            .get_secret(&self.config.secret_name)
            .await
            .map_err(|e| RegistryError::Token(e.to_string()))?;

        if let Some(data) = &cached {
            if let Some(token) = cached_token(data, Utc::now()) {
                return Ok(token);
            }
        }

        let (token, expires_at) = self.fetch_token().await?;
        let mut data = BTreeMap::new();
        data.insert(TOKEN_FIELD.to_string(), token.clone());
        data.insert(EXPIRES_AT_FIELD.to_string(), expires_at.to_rfc3339());
        self.cluster
            .put_secret(&self.config.secret_name, &data)
            .await
            .map_err(|e| RegistryError::Token(e.to_string()))?;
        tracing::info!(secret = %self.config.secret_name, expires_at = %expires_at, "Cached fresh token");
        Ok(token)
    }

    async fn fetch_token(&self) -> RegistryResult<(String, DateTime<Utc>)> {
        let url = format!(
            "{}/auth/realms/{}/protocol/openid-connect/token",
            self.config.idp_url.trim_end_matches('/'),
            self.config.realm
        );
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&url)
            .form(&params)
            .timeout(TOKEN_TIMEOUT)
            .send()
            .await
            .map_err(|e| RegistryError::Token(format!("token request: {e}")))?;
        if !response.status().is_success() {
            return Err(RegistryError::Token(format!(
                "identity provider returned status {}",
                response.status().as_u16()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::Token(format!("token response: {e}")))?;
        let expires_at = Utc::now() + chrono::Duration::seconds(body.expires_in);
        Ok((body.access_token, expires_at))
    }
}

/// The cached token, if present and not within the expiry skew
fn cached_token(data: &BTreeMap<String, String>, now: DateTime<Utc>) -> Option<String> {
    let token = data.get(TOKEN_FIELD)?;
    let expires_at = DateTime::parse_from_rfc3339(data.get(EXPIRES_AT_FIELD)?).ok()?;
    if now + chrono::Duration::seconds(EXPIRY_SKEW_SECS) >= expires_at {
        return None;
    }
    Some(token.clone())
}
