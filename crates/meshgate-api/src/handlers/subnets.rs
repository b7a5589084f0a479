//! Subnet pool endpoints

use axum::{extract::Path, extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::error::Result;
use crate::state::ApiState;

/// Request carrying a service id
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubnetRequest {
    /// Service owning the subnet
    pub service_id: String,
}

/// An assigned subnet
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubnetAssignment {
    /// Service owning the subnet
    pub service_id: String,
    /// The /24 block in CIDR notation
    pub assigned_subnet: String,
}

/// A released subnet
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubnetRelease {
    /// Service that held the subnet
    pub service_id: String,
    /// The /24 block returned to the pool
    pub released_subnet: String,
}

/// Full state of the pool
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubnetInventory {
    /// Unassigned blocks in ascending order
    pub available_subnets: Vec<String>,
    /// Assigned blocks keyed by service id
    pub assigned_subnets: BTreeMap<String, String>,
}

/// Assign a /24 subnet to a service
#[utoipa::path(
    post,
    path = "/subnet",
    request_body = SubnetRequest,
    responses(
        (status = 200, description = "Subnet assigned", body = SubnetAssignment),
        (status = 409, description = "Pool exhausted"),
    ),
    tag = "Subnets"
)]
pub async fn assign_subnet(
    State(state): State<ApiState>,
    Json(request): Json<SubnetRequest>,
) -> Result<Json<SubnetAssignment>> {
    let subnet = state.pool.lock().await.assign(&request.service_id)?;
    tracing::info!(service_id = %request.service_id, subnet = %subnet, "Subnet assigned");
    Ok(Json(SubnetAssignment {
        service_id: request.service_id,
        assigned_subnet: subnet.to_string(),
    }))
}

/// Release a service's subnet back into the pool
#[utoipa::path(
    delete,
    path = "/subnet",
    request_body = SubnetRequest,
    responses(
        (status = 200, description = "Subnet released", body = SubnetRelease),
        (status = 404, description = "Service has no assigned subnet"),
    ),
    tag = "Subnets"
)]
pub async fn release_subnet(
    State(state): State<ApiState>,
    Json(request): Json<SubnetRequest>,
) -> Result<Json<SubnetRelease>> {
    let subnet = state.pool.lock().await.release(&request.service_id)?;
    tracing::info!(service_id = %request.service_id, subnet = %subnet, "Subnet released");
    Ok(Json(SubnetRelease {
        service_id: request.service_id,
        released_subnet: subnet.to_string(),
    }))
}

/// Look up a service's subnet
#[utoipa::path(
    get,
    path = "/subnet/{service_id}",
    params(
        ("service_id" = String, Path, description = "Service id"),
    ),
    responses(
        (status = 200, description = "Assigned subnet", body = SubnetAssignment),
        (status = 404, description = "Service has no assigned subnet"),
    ),
    tag = "Subnets"
)]
pub async fn get_subnet(
    State(state): State<ApiState>,
    Path(service_id): Path<String>,
) -> Result<Json<SubnetAssignment>> {
    let subnet = state.pool.lock().await.get(&service_id)?;
    Ok(Json(SubnetAssignment {
        service_id,
        assigned_subnet: subnet.to_string(),
    }))
}

/// List both sides of the pool
#[utoipa::path(
    get,
    path = "/subnets",
    responses(
        (status = 200, description = "Pool inventory", body = SubnetInventory),
    ),
    tag = "Subnets"
)]
pub async fn list_subnets(State(state): State<ApiState>) -> Json<SubnetInventory> {
    tracing::debug!("Listing subnet pool inventory");
    let (available, allocated) = state.pool.lock().await.list();
    Json(inventory(available, allocated))
}

/// Reset the pool to its initial state
#[utoipa::path(
    delete,
    path = "/subnets",
    responses(
        (status = 200, description = "Pool reset", body = SubnetInventory),
    ),
    tag = "Subnets"
)]
pub async fn reset_subnets(State(state): State<ApiState>) -> Json<SubnetInventory> {
    tracing::info!("Resetting subnet pool");
    let mut pool = state.pool.lock().await;
    pool.reset();
    let (available, allocated) = pool.list();
    Json(inventory(available, allocated))
}

fn inventory(
    available: Vec<ipnet::Ipv4Net>,
    allocated: BTreeMap<String, ipnet::Ipv4Net>,
) -> SubnetInventory {
    SubnetInventory {
        available_subnets: available.iter().map(ToString::to_string).collect(),
        assigned_subnets: allocated
            .into_iter()
            .map(|(service, subnet)| (service, subnet.to_string()))
            .collect(),
    }
}
