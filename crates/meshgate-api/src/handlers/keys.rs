//! Domain key and token endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, Result};
use crate::state::ApiState;

/// Public half of the domain keypair
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicKeyResponse {
    /// Base64 WireGuard public key
    pub public_key: String,
}

/// A machine-to-machine bearer token
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// Bearer token for continuum access
    pub token: String,
}

/// Current domain public key
#[utoipa::path(
    get,
    path = "/domain-key",
    responses(
        (status = 200, description = "Current public key", body = PublicKeyResponse),
        (status = 404, description = "Key secret not found"),
    ),
    tag = "Domain"
)]
pub async fn get_domain_key(State(state): State<ApiState>) -> Result<Json<PublicKeyResponse>> {
    let pair = state.keys.current().await?;
    Ok(Json(PublicKeyResponse {
        public_key: pair.public_key,
    }))
}

/// Rotate the domain keypair
///
/// Generates a fresh keypair, replaces the cluster secret, and publishes
/// the new public key to the local domain entity.
#[utoipa::path(
    patch,
    path = "/domain-key",
    responses(
        (status = 200, description = "Keypair rotated", body = PublicKeyResponse),
        (status = 502, description = "Registry publication failed"),
    ),
    tag = "Domain"
)]
pub async fn rotate_domain_key(State(state): State<ApiState>) -> Result<Json<PublicKeyResponse>> {
    tracing::info!("Domain key rotation requested");
    let pair = state.keys.rotate().await?;
    Ok(Json(PublicKeyResponse {
        public_key: pair.public_key,
    }))
}

/// Machine-to-machine token for continuum access
#[utoipa::path(
    get,
    path = "/token",
    responses(
        (status = 200, description = "Valid bearer token", body = TokenResponse),
        (status = 502, description = "Identity provider unreachable"),
        (status = 503, description = "No identity provider configured"),
    ),
    tag = "Tokens"
)]
pub async fn get_token(State(state): State<ApiState>) -> Result<Json<TokenResponse>> {
    let tokens = state.tokens.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("no identity provider configured".to_string())
    })?;
    let token = tokens
        .bearer_token()
        .await
        .map_err(|e| ApiError::UpstreamFailed(e.to_string()))?;
    Ok(Json(TokenResponse { token }))
}
