//! Gateways Admin API
//!
//! Import, discovery and lifecycle of gateway instances. Credentials are
//! accepted on import/update and never echoed back.

use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use portal_common::{Page, PageRequest};

use crate::api::common::ApiResponse;
use crate::domain::{Gateway, GatewayType};
use crate::error::PortalError;
use crate::providers::ResourceItem;
use crate::service::GatewayRegistry;

/// Import gateway request; `authConfig` is validated against `gatewayType`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportGatewayRequest {
    pub gateway_type: GatewayType,
    pub auth_config: serde_json::Value,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAuthConfigRequest {
    pub auth_config: serde_json::Value,
}

/// Gateway response DTO. Carries a non-secret endpoint hint instead of the
/// stored credentials.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub gateway_id: String,
    pub gateway_type: String,
    pub endpoint: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Gateway> for GatewayResponse {
    fn from(g: Gateway) -> Self {
        Self {
            gateway_id: g.gateway_id,
            gateway_type: g.gateway_type.as_str().to_string(),
            endpoint: g.auth_config.endpoint_hint(),
            created_at: g.created_at.to_rfc3339(),
            updated_at: g.updated_at.to_rfc3339(),
        }
    }
}

/// Gateways service state
#[derive(Clone)]
pub struct GatewaysState {
    pub registry: Arc<GatewayRegistry>,
}

/// Import a gateway
#[utoipa::path(
    post,
    path = "",
    tag = "gateways",
    responses(
        (status = 200, description = "Gateway imported"),
        (status = 400, description = "Auth config does not match the gateway type")
    )
)]
pub async fn import_gateway(
    State(state): State<GatewaysState>,
    Json(req): Json<ImportGatewayRequest>,
) -> Result<Json<ApiResponse<GatewayResponse>>, PortalError> {
    let gateway = state
        .registry
        .import_gateway(req.gateway_type, req.auth_config)
        .await?;
    Ok(Json(ApiResponse::ok(gateway.into())))
}

/// List gateways
#[utoipa::path(
    get,
    path = "",
    tag = "gateways",
    params(PageRequest),
    responses((status = 200, description = "Page of gateways"))
)]
pub async fn list_gateways(
    State(state): State<GatewaysState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Page<GatewayResponse>>>, PortalError> {
    let gateways = state.registry.list_gateways(page).await?;
    Ok(Json(ApiResponse::ok(gateways.map(Into::into))))
}

/// Get gateway by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "gateways",
    responses(
        (status = 200, description = "Gateway found"),
        (status = 404, description = "Gateway not found")
    )
)]
pub async fn get_gateway(
    State(state): State<GatewaysState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<GatewayResponse>>, PortalError> {
    let gateway = state.registry.get_gateway(&id).await?;
    Ok(Json(ApiResponse::ok(gateway.into())))
}

/// Update gateway credentials
#[utoipa::path(
    put,
    path = "/{id}/auth-config",
    tag = "gateways",
    responses(
        (status = 200, description = "Credentials updated"),
        (status = 400, description = "Auth config does not match the gateway type"),
        (status = 404, description = "Gateway not found")
    )
)]
pub async fn update_auth_config(
    State(state): State<GatewaysState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAuthConfigRequest>,
) -> Result<Json<ApiResponse<GatewayResponse>>, PortalError> {
    let gateway = state.registry.update_auth_config(&id, req.auth_config).await?;
    Ok(Json(ApiResponse::ok(gateway.into())))
}

/// Delete a gateway (refused while products still reference it)
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "gateways",
    responses(
        (status = 200, description = "Gateway deleted"),
        (status = 404, description = "Gateway not found"),
        (status = 409, description = "Gateway still referenced by products")
    )
)]
pub async fn delete_gateway(
    State(state): State<GatewaysState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, PortalError> {
    state.registry.delete_gateway(&id).await?;
    Ok(Json(ApiResponse::ok_empty()))
}

/// List linkable resources on a gateway
#[utoipa::path(
    get,
    path = "/{id}/resources",
    tag = "gateways",
    params(PageRequest),
    responses(
        (status = 200, description = "Page of provider resources"),
        (status = 502, description = "Provider unreachable or rejected the call")
    )
)]
pub async fn list_resources(
    State(state): State<GatewaysState>,
    Path(id): Path<String>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Page<ResourceItem>>>, PortalError> {
    let resources = state.registry.list_resources(&id, page).await?;
    Ok(Json(ApiResponse::ok(resources)))
}

/// Create gateways router
pub fn gateways_router(state: GatewaysState) -> Router {
    Router::new()
        .route("/", get(list_gateways).post(import_gateway))
        .route("/:id", get(get_gateway).delete(delete_gateway))
        .route("/:id/auth-config", put(update_auth_config))
        .route("/:id/resources", get(list_resources))
        .with_state(state)
}
