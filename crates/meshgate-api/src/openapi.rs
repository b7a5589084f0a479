//! OpenAPI documentation generation

use utoipa::OpenApi;

use crate::handlers::health::HealthResponse;
use crate::handlers::keys::{PublicKeyResponse, TokenResponse};
use crate::handlers::overlay::{
    CreateOverlayBody, DeleteOverlayBody, MessageResponse, PeerBody,
};
use crate::handlers::subnets::{
    SubnetAssignment, SubnetInventory, SubnetRelease, SubnetRequest,
};

use crate::handlers::health::__path_health;
use crate::handlers::keys::{__path_get_domain_key, __path_get_token, __path_rotate_domain_key};
use crate::handlers::overlay::{__path_create_overlay, __path_delete_overlay, __path_reset_overlay};
use crate::handlers::subnets::{
    __path_assign_subnet, __path_get_subnet, __path_list_subnets, __path_release_subnet,
    __path_reset_subnets,
};

/// MeshGate API documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "MeshGate API",
        description = "Per-service WireGuard overlay lifecycle: subnet pool, overlay configuration, domain keys",
        version = "0.1.0",
    ),
    paths(
        health,
        assign_subnet,
        release_subnet,
        get_subnet,
        list_subnets,
        reset_subnets,
        create_overlay,
        delete_overlay,
        reset_overlay,
        get_domain_key,
        rotate_domain_key,
        get_token,
    ),
    components(schemas(
        HealthResponse,
        SubnetRequest,
        SubnetAssignment,
        SubnetRelease,
        SubnetInventory,
        PeerBody,
        CreateOverlayBody,
        DeleteOverlayBody,
        MessageResponse,
        PublicKeyResponse,
        TokenResponse,
    )),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Subnets", description = "Overlay subnet pool"),
        (name = "Overlay", description = "Service overlay lifecycle"),
        (name = "Domain", description = "Domain key material"),
        (name = "Tokens", description = "Machine-to-machine tokens"),
    )
)]
pub struct ApiDoc;
