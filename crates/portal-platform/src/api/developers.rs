//! Developers Admin API
//!
//! Developer detail plus the approve/revoke transitions and consumer
//! creation. Registration lives under the owning portal's router.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use portal_common::{Page, PageRequest};

use crate::api::common::ApiResponse;
use crate::api::consumers::ConsumerResponse;
use crate::domain::Developer;
use crate::error::PortalError;
use crate::service::ApprovalWorkflow;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConsumerRequest {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperResponse {
    pub developer_id: String,
    pub portal_id: String,
    pub username: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Developer> for DeveloperResponse {
    fn from(d: Developer) -> Self {
        Self {
            developer_id: d.developer_id,
            portal_id: d.portal_id,
            username: d.username,
            status: d.status.as_str().to_string(),
            created_at: d.created_at.to_rfc3339(),
            updated_at: d.updated_at.to_rfc3339(),
        }
    }
}

/// Developers service state
#[derive(Clone)]
pub struct DevelopersState {
    pub approvals: Arc<ApprovalWorkflow>,
}

/// Get developer by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "developers",
    responses(
        (status = 200, description = "Developer found"),
        (status = 404, description = "Developer not found")
    )
)]
pub async fn get_developer(
    State(state): State<DevelopersState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeveloperResponse>>, PortalError> {
    let developer = state.approvals.get_developer(&id).await?;
    Ok(Json(ApiResponse::ok(developer.into())))
}

/// Approve a pending developer
#[utoipa::path(
    post,
    path = "/{id}/approve",
    tag = "developers",
    responses(
        (status = 200, description = "Developer approved"),
        (status = 404, description = "Developer not found"),
        (status = 409, description = "Developer not pending")
    )
)]
pub async fn approve_developer(
    State(state): State<DevelopersState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, PortalError> {
    state.approvals.approve_developer(&id).await?;
    Ok(Json(ApiResponse::ok_empty()))
}

/// Revoke an approved developer back to pending
#[utoipa::path(
    post,
    path = "/{id}/revoke",
    tag = "developers",
    responses(
        (status = 200, description = "Approval revoked"),
        (status = 404, description = "Developer not found"),
        (status = 409, description = "Developer not approved")
    )
)]
pub async fn revoke_developer(
    State(state): State<DevelopersState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, PortalError> {
    state.approvals.revoke_developer(&id).await?;
    Ok(Json(ApiResponse::ok_empty()))
}

/// Delete developer
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "developers",
    responses(
        (status = 200, description = "Developer deleted"),
        (status = 404, description = "Developer not found")
    )
)]
pub async fn delete_developer(
    State(state): State<DevelopersState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, PortalError> {
    state.approvals.delete_developer(&id).await?;
    Ok(Json(ApiResponse::ok_empty()))
}

/// Create a consumer owned by the developer
#[utoipa::path(
    post,
    path = "/{id}/consumers",
    tag = "developers",
    responses(
        (status = 200, description = "Consumer created"),
        (status = 404, description = "Developer not found")
    )
)]
pub async fn create_consumer(
    State(state): State<DevelopersState>,
    Path(id): Path<String>,
    Json(req): Json<CreateConsumerRequest>,
) -> Result<Json<ApiResponse<ConsumerResponse>>, PortalError> {
    let consumer = state.approvals.create_consumer(&id, &req.name).await?;
    Ok(Json(ApiResponse::ok(consumer.into())))
}

/// List the developer's consumers
#[utoipa::path(
    get,
    path = "/{id}/consumers",
    tag = "developers",
    params(PageRequest),
    responses((status = 200, description = "Page of consumers"))
)]
pub async fn list_consumers(
    State(state): State<DevelopersState>,
    Path(id): Path<String>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Page<ConsumerResponse>>>, PortalError> {
    let consumers = state.approvals.list_consumers(&id, page).await?;
    Ok(Json(ApiResponse::ok(consumers.map(Into::into))))
}

/// Create developers router
pub fn developers_router(state: DevelopersState) -> Router {
    Router::new()
        .route("/:id", get(get_developer).delete(delete_developer))
        .route("/:id/approve", post(approve_developer))
        .route("/:id/revoke", post(revoke_developer))
        .route("/:id/consumers", get(list_consumers).post(create_consumer))
        .with_state(state)
}
