//! Portals Admin API

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use portal_common::{Page, PageRequest};

use crate::api::common::ApiResponse;
use crate::api::developers::DeveloperResponse;
use crate::domain::{Portal, PortalSettings};
use crate::error::PortalError;
use crate::repository::PortalRepository;
use crate::service::ApprovalWorkflow;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePortalRequest {
    pub name: String,
    #[serde(default)]
    pub settings: Option<PortalSettings>,
    #[serde(default)]
    pub domains: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePortalRequest {
    pub name: Option<String>,
    pub settings: Option<PortalSettings>,
    pub domains: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeveloperRequest {
    pub username: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortalResponse {
    pub portal_id: String,
    pub name: String,
    pub settings: PortalSettings,
    pub domains: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Portal> for PortalResponse {
    fn from(p: Portal) -> Self {
        Self {
            portal_id: p.portal_id,
            name: p.name,
            settings: p.settings,
            domains: p.domains,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

/// Portals service state
#[derive(Clone)]
pub struct PortalsState {
    pub portals: Arc<PortalRepository>,
    pub approvals: Arc<ApprovalWorkflow>,
}

/// Create a portal
#[utoipa::path(
    post,
    path = "",
    tag = "portals",
    responses((status = 200, description = "Portal created"))
)]
pub async fn create_portal(
    State(state): State<PortalsState>,
    Json(req): Json<CreatePortalRequest>,
) -> Result<Json<ApiResponse<PortalResponse>>, PortalError> {
    let mut portal = Portal::new(req.name);
    if let Some(settings) = req.settings {
        portal = portal.with_settings(settings);
    }
    if let Some(domains) = req.domains {
        portal = portal.with_domains(domains);
    }
    state.portals.insert(&portal).await?;
    Ok(Json(ApiResponse::ok(portal.into())))
}

/// List portals
#[utoipa::path(
    get,
    path = "",
    tag = "portals",
    params(PageRequest),
    responses((status = 200, description = "Page of portals"))
)]
pub async fn list_portals(
    State(state): State<PortalsState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Page<PortalResponse>>>, PortalError> {
    let portals = state.portals.list(page).await?;
    Ok(Json(ApiResponse::ok(portals.map(Into::into))))
}

/// Get portal by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "portals",
    responses(
        (status = 200, description = "Portal found"),
        (status = 404, description = "Portal not found")
    )
)]
pub async fn get_portal(
    State(state): State<PortalsState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PortalResponse>>, PortalError> {
    let portal = state
        .portals
        .find_by_id(&id)
        .await?
        .ok_or_else(|| PortalError::not_found("Portal", &id))?;
    Ok(Json(ApiResponse::ok(portal.into())))
}

/// Update portal name, settings or domains
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "portals",
    responses(
        (status = 200, description = "Portal updated"),
        (status = 404, description = "Portal not found")
    )
)]
pub async fn update_portal(
    State(state): State<PortalsState>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePortalRequest>,
) -> Result<Json<ApiResponse<PortalResponse>>, PortalError> {
    state
        .portals
        .update(
            &id,
            req.name.as_deref(),
            req.settings.as_ref(),
            req.domains.as_deref(),
        )
        .await?;
    let portal = state
        .portals
        .find_by_id(&id)
        .await?
        .ok_or_else(|| PortalError::not_found("Portal", &id))?;
    Ok(Json(ApiResponse::ok(portal.into())))
}

/// Delete portal
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "portals",
    responses(
        (status = 200, description = "Portal deleted"),
        (status = 404, description = "Portal not found")
    )
)]
pub async fn delete_portal(
    State(state): State<PortalsState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, PortalError> {
    state.portals.delete(&id).await?;
    Ok(Json(ApiResponse::ok_empty()))
}

/// Register a developer against the portal. The portal's
/// `autoApproveDevelopers` flag decides the initial status.
#[utoipa::path(
    post,
    path = "/{id}/developers",
    tag = "portals",
    responses(
        (status = 200, description = "Developer registered"),
        (status = 404, description = "Portal not found")
    )
)]
pub async fn register_developer(
    State(state): State<PortalsState>,
    Path(id): Path<String>,
    Json(req): Json<RegisterDeveloperRequest>,
) -> Result<Json<ApiResponse<DeveloperResponse>>, PortalError> {
    let developer = state.approvals.register_developer(&id, &req.username).await?;
    Ok(Json(ApiResponse::ok(developer.into())))
}

/// List the portal's developers
#[utoipa::path(
    get,
    path = "/{id}/developers",
    tag = "portals",
    params(PageRequest),
    responses((status = 200, description = "Page of developers"))
)]
pub async fn list_developers(
    State(state): State<PortalsState>,
    Path(id): Path<String>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Page<DeveloperResponse>>>, PortalError> {
    let developers = state.approvals.list_developers(&id, page).await?;
    Ok(Json(ApiResponse::ok(developers.map(Into::into))))
}

/// Create portals router
pub fn portals_router(state: PortalsState) -> Router {
    Router::new()
        .route("/", get(list_portals).post(create_portal))
        .route(
            "/:id",
            get(get_portal).put(update_portal).delete(delete_portal),
        )
        .route(
            "/:id/developers",
            get(list_developers).post(register_developer),
        )
        .with_state(state)
}
