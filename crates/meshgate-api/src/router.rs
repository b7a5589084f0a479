//! API router construction

use axum::{
    routing::{delete, get, patch, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::handlers;
use crate::openapi::ApiDoc;
use crate::state::ApiState;

/// Build the API router
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/subnet", post(handlers::subnets::assign_subnet))
        .route("/subnet", delete(handlers::subnets::release_subnet))
        .route("/subnet/{service_id}", get(handlers::subnets::get_subnet))
        .route("/subnets", get(handlers::subnets::list_subnets))
        .route("/subnets", delete(handlers::subnets::reset_subnets))
        .route(
            "/service-network-overlay",
            post(handlers::overlay::create_overlay),
        )
        .route(
            "/service-network-overlay",
            delete(handlers::overlay::delete_overlay),
        )
        .route(
            "/service-network-overlay/reset",
            post(handlers::overlay::reset_overlay),
        )
        .route("/domain-key", get(handlers::keys::get_domain_key))
        .route("/domain-key", patch(handlers::keys::rotate_domain_key))
        .route("/token", get(handlers::keys::get_token))
        .route("/openapi.json", get(serve_openapi))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
