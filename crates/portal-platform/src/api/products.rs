//! API Products Admin API
//!
//! Product CRUD plus the relationship operations hanging off a product:
//! the gateway ref (link/replace/unlink), portal publications, and the
//! pending-subscription listing used by approval screens.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use portal_common::{Page, PageRequest};

use crate::api::common::ApiResponse;
use crate::api::portals::PortalResponse;
use crate::domain::{
    ApiProduct, ApiProductType, GatewayResourceRef, PortalPublication, Subscription,
};
use crate::error::PortalError;
use crate::repository::ProductRepository;
use crate::service::{ApprovalWorkflow, LinkageManager, PublicationManager};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub product_type: ApiProductType,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Link / replace request: the selector payload is interpreted against the
/// target gateway's type.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequest {
    pub gateway_id: String,
    pub resource_selector: serde_json::Value,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub portal_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub product_id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub product_type: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ApiProduct> for ProductResponse {
    fn from(p: ApiProduct) -> Self {
        Self {
            product_id: p.product_id,
            name: p.name,
            description: p.description,
            product_type: p.product_type.as_str().to_string(),
            status: p.status.as_str().to_string(),
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}

/// Products service state
#[derive(Clone)]
pub struct ProductsState {
    pub products: Arc<ProductRepository>,
    pub linkage: Arc<LinkageManager>,
    pub publications: Arc<PublicationManager>,
    pub approvals: Arc<ApprovalWorkflow>,
}

/// Create a product
#[utoipa::path(
    post,
    path = "",
    tag = "products",
    responses((status = 200, description = "Product created"))
)]
pub async fn create_product(
    State(state): State<ProductsState>,
    Json(req): Json<CreateProductRequest>,
) -> Result<Json<ApiResponse<ProductResponse>>, PortalError> {
    let mut product = ApiProduct::new(req.name, req.product_type);
    if let Some(description) = req.description {
        product = product.with_description(description);
    }
    state.products.insert(&product).await?;
    Ok(Json(ApiResponse::ok(product.into())))
}

/// List products
#[utoipa::path(
    get,
    path = "",
    tag = "products",
    params(PageRequest),
    responses((status = 200, description = "Page of products"))
)]
pub async fn list_products(
    State(state): State<ProductsState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Page<ProductResponse>>>, PortalError> {
    let products = state.products.list(page).await?;
    Ok(Json(ApiResponse::ok(products.map(Into::into))))
}

/// Get product by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "products",
    responses(
        (status = 200, description = "Product found"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn get_product(
    State(state): State<ProductsState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductResponse>>, PortalError> {
    let product = state
        .products
        .find_by_id(&id)
        .await?
        .ok_or_else(|| PortalError::not_found("ApiProduct", &id))?;
    Ok(Json(ApiResponse::ok(product.into())))
}

/// Update product
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "products",
    responses(
        (status = 200, description = "Product updated"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn update_product(
    State(state): State<ProductsState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductResponse>>, PortalError> {
    state
        .products
        .update(&id, req.name.as_deref(), req.description.as_deref())
        .await?;
    let product = state
        .products
        .find_by_id(&id)
        .await?
        .ok_or_else(|| PortalError::not_found("ApiProduct", &id))?;
    Ok(Json(ApiResponse::ok(product.into())))
}

/// Delete product
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "products",
    responses(
        (status = 200, description = "Product deleted"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn delete_product(
    State(state): State<ProductsState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, PortalError> {
    state.products.delete(&id).await?;
    Ok(Json(ApiResponse::ok_empty()))
}

/// Get the product's gateway ref
#[utoipa::path(
    get,
    path = "/{id}/ref",
    tag = "products",
    responses((status = 200, description = "The active ref, or null"))
)]
pub async fn get_ref(
    State(state): State<ProductsState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Option<GatewayResourceRef>>>, PortalError> {
    let re = state.linkage.get_ref(&id).await?;
    Ok(Json(ApiResponse::ok(re)))
}

/// Link the product to a gateway resource
#[utoipa::path(
    post,
    path = "/{id}/ref",
    tag = "products",
    responses(
        (status = 200, description = "Product linked"),
        (status = 400, description = "Selector does not match the gateway type"),
        (status = 409, description = "Product already linked")
    )
)]
pub async fn link(
    State(state): State<ProductsState>,
    Path(id): Path<String>,
    Json(req): Json<LinkRequest>,
) -> Result<Json<ApiResponse<GatewayResourceRef>>, PortalError> {
    let re = state
        .linkage
        .link(&id, &req.gateway_id, req.resource_selector)
        .await?;
    Ok(Json(ApiResponse::ok(re)))
}

/// Replace the product's gateway ref atomically
#[utoipa::path(
    put,
    path = "/{id}/ref",
    tag = "products",
    responses(
        (status = 200, description = "Ref replaced"),
        (status = 400, description = "Selector does not match the gateway type")
    )
)]
pub async fn replace(
    State(state): State<ProductsState>,
    Path(id): Path<String>,
    Json(req): Json<LinkRequest>,
) -> Result<Json<ApiResponse<GatewayResourceRef>>, PortalError> {
    let re = state
        .linkage
        .replace(&id, &req.gateway_id, req.resource_selector)
        .await?;
    Ok(Json(ApiResponse::ok(re)))
}

/// Unlink the product (no-op when not linked)
#[utoipa::path(
    delete,
    path = "/{id}/ref",
    tag = "products",
    responses((status = 200, description = "Product unlinked"))
)]
pub async fn unlink(
    State(state): State<ProductsState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, PortalError> {
    state.linkage.unlink(&id).await?;
    Ok(Json(ApiResponse::ok_empty()))
}

/// List the product's publications
#[utoipa::path(
    get,
    path = "/{id}/publications",
    tag = "products",
    params(PageRequest),
    responses((status = 200, description = "Page of publications"))
)]
pub async fn list_publications(
    State(state): State<ProductsState>,
    Path(id): Path<String>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Page<PortalPublication>>>, PortalError> {
    let publications = state.publications.list_publications(&id, page).await?;
    Ok(Json(ApiResponse::ok(publications)))
}

/// Publish the product to a portal
#[utoipa::path(
    post,
    path = "/{id}/publications",
    tag = "products",
    responses(
        (status = 200, description = "Product published"),
        (status = 409, description = "Already published to this portal")
    )
)]
pub async fn publish(
    State(state): State<ProductsState>,
    Path(id): Path<String>,
    Json(req): Json<PublishRequest>,
) -> Result<Json<ApiResponse<PortalPublication>>, PortalError> {
    let publication = state.publications.publish(&id, &req.portal_id).await?;
    Ok(Json(ApiResponse::ok(publication)))
}

/// Unpublish the product from a portal (idempotent; subscriptions survive)
#[utoipa::path(
    delete,
    path = "/{id}/publications/{portal_id}",
    tag = "products",
    responses((status = 200, description = "Product unpublished"))
)]
pub async fn unpublish(
    State(state): State<ProductsState>,
    Path((id, portal_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<()>>, PortalError> {
    state.publications.unpublish(&id, &portal_id).await?;
    Ok(Json(ApiResponse::ok_empty()))
}

/// List portals the product can still be published to
#[utoipa::path(
    get,
    path = "/{id}/eligible-portals",
    tag = "products",
    params(PageRequest),
    responses((status = 200, description = "Page of eligible portals"))
)]
pub async fn list_eligible_portals(
    State(state): State<ProductsState>,
    Path(id): Path<String>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Page<PortalResponse>>>, PortalError> {
    let portals = state.publications.list_eligible_portals(&id, page).await?;
    Ok(Json(ApiResponse::ok(portals.map(Into::into))))
}

/// List subscriptions against the product
#[utoipa::path(
    get,
    path = "/{id}/subscriptions",
    tag = "products",
    params(PageRequest),
    responses((status = 200, description = "Page of subscriptions"))
)]
pub async fn list_subscriptions(
    State(state): State<ProductsState>,
    Path(id): Path<String>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Page<Subscription>>>, PortalError> {
    let subscriptions = state
        .approvals
        .list_subscriptions_by_product(&id, page)
        .await?;
    Ok(Json(ApiResponse::ok(subscriptions)))
}

/// Create products router
pub fn products_router(state: ProductsState) -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/:id/ref", get(get_ref).post(link).put(replace).delete(unlink))
        .route("/:id/publications", get(list_publications).post(publish))
        .route("/:id/publications/:portal_id", delete(unpublish))
        .route("/:id/eligible-portals", get(list_eligible_portals))
        .route("/:id/subscriptions", get(list_subscriptions))
        .with_state(state)
}
