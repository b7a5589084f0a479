//! API error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use meshgate_overlay::{ClusterError, OverlayError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream failure: {0}")]
    UpstreamFailed(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            ApiError::UpstreamFailed(_) => (StatusCode::BAD_GATEWAY, "upstream_failure"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<OverlayError> for ApiError {
    fn from(err: OverlayError) -> Self {
        match &err {
            OverlayError::InvalidCidr(_)
            | OverlayError::EmptyServiceId
            | OverlayError::EmptyPeerList
            | OverlayError::MissingMasterPeer
            | OverlayError::MultipleMasterPeers(_) => ApiError::Validation(err.to_string()),
            OverlayError::PoolExhausted => ApiError::Conflict(err.to_string()),
            OverlayError::NotAllocated(_)
            | OverlayError::ConfigObjectMissing(_)
            | OverlayError::KeySecretMissing(_)
            | OverlayError::LocalDomainMissing => ApiError::NotFound(err.to_string()),
            OverlayError::Cluster(ClusterError::NoMatchingWorkload(_)) => {
                ApiError::NotFound(err.to_string())
            }
            OverlayError::KeyFieldMissing(_) => ApiError::Internal(err.to_string()),
            OverlayError::ApplyFailed { .. }
            | OverlayError::Cluster(_)
            | OverlayError::Registry(_) => ApiError::UpstreamFailed(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_map_to_422() {
        let err: ApiError = OverlayError::MissingMasterPeer.into();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_exhaustion_maps_to_conflict() {
        let err: ApiError = OverlayError::PoolExhausted.into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn test_missing_allocation_maps_to_not_found() {
        let err: ApiError = OverlayError::NotAllocated("s1".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_missing_workload_maps_to_not_found() {
        let err: ApiError =
            OverlayError::Cluster(ClusterError::NoMatchingWorkload("app=wg".to_string())).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_apply_failure_maps_to_bad_gateway() {
        let err: ApiError = OverlayError::ApplyFailed {
            resources: vec!["wg-config".to_string()],
        }
        .into();
        assert!(matches!(err, ApiError::UpstreamFailed(_)));
    }
}
