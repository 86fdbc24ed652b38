//! Consumers & Subscriptions Admin API
//!
//! Consumer lifecycle and the subscription workflow. Subscriptions are
//! created under a consumer and then addressed by their own ID for the
//! approve/delete transitions.

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
use crate::domain::{Consumer, Subscription};
use crate::error::PortalError;
use crate::service::ApprovalWorkflow;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub product_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerResponse {
    pub consumer_id: String,
    pub developer_id: String,
    pub name: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Consumer> for ConsumerResponse {
    fn from(c: Consumer) -> Self {
        Self {
            consumer_id: c.consumer_id,
            developer_id: c.developer_id,
            name: c.name,
            status: c.status.as_str().to_string(),
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

/// Consumers service state
#[derive(Clone)]
pub struct ConsumersState {
    pub approvals: Arc<ApprovalWorkflow>,
}

/// Get consumer by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "consumers",
    responses(
        (status = 200, description = "Consumer found"),
        (status = 404, description = "Consumer not found")
    )
)]
pub async fn get_consumer(
    State(state): State<ConsumersState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ConsumerResponse>>, PortalError> {
    let consumer = state.approvals.get_consumer(&id).await?;
    Ok(Json(ApiResponse::ok(consumer.into())))
}

/// Approve a pending consumer
#[utoipa::path(
    post,
    path = "/{id}/approve",
    tag = "consumers",
    responses(
        (status = 200, description = "Consumer approved"),
        (status = 404, description = "Consumer not found"),
        (status = 409, description = "Consumer not pending")
    )
)]
pub async fn approve_consumer(
    State(state): State<ConsumersState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, PortalError> {
    state.approvals.approve_consumer(&id).await?;
    Ok(Json(ApiResponse::ok_empty()))
}

/// Delete consumer
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "consumers",
    responses(
        (status = 200, description = "Consumer deleted"),
        (status = 404, description = "Consumer not found")
    )
)]
pub async fn delete_consumer(
    State(state): State<ConsumersState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, PortalError> {
    state.approvals.delete_consumer(&id).await?;
    Ok(Json(ApiResponse::ok_empty()))
}

/// Subscribe the consumer to a product
#[utoipa::path(
    post,
    path = "/{id}/subscriptions",
    tag = "consumers",
    responses(
        (status = 200, description = "Subscription created"),
        (status = 404, description = "Consumer or product not found"),
        (status = 409, description = "Consumer already subscribed to the product")
    )
)]
pub async fn create_subscription(
    State(state): State<ConsumersState>,
    Path(id): Path<String>,
    Json(req): Json<CreateSubscriptionRequest>,
) -> Result<Json<ApiResponse<Subscription>>, PortalError> {
    let subscription = state
        .approvals
        .create_subscription(&id, &req.product_id)
        .await?;
    Ok(Json(ApiResponse::ok(subscription)))
}

/// List the consumer's subscriptions
#[utoipa::path(
    get,
    path = "/{id}/subscriptions",
    tag = "consumers",
    params(PageRequest),
    responses((status = 200, description = "Page of subscriptions"))
)]
pub async fn list_subscriptions(
    State(state): State<ConsumersState>,
    Path(id): Path<String>,
    Query(page): Query<PageRequest>,
) -> Result<Json<ApiResponse<Page<Subscription>>>, PortalError> {
    let subscriptions = state
        .approvals
        .list_subscriptions_by_consumer(&id, page)
        .await?;
    Ok(Json(ApiResponse::ok(subscriptions)))
}

/// Get subscription by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "subscriptions",
    responses(
        (status = 200, description = "Subscription found"),
        (status = 404, description = "Subscription not found")
    )
)]
pub async fn get_subscription(
    State(state): State<ConsumersState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Subscription>>, PortalError> {
    let subscription = state.approvals.get_subscription(&id).await?;
    Ok(Json(ApiResponse::ok(subscription)))
}

/// Approve a pending subscription
#[utoipa::path(
    post,
    path = "/{id}/approve",
    tag = "subscriptions",
    responses(
        (status = 200, description = "Subscription approved"),
        (status = 404, description = "Subscription not found"),
        (status = 409, description = "Subscription not pending")
    )
)]
pub async fn approve_subscription(
    State(state): State<ConsumersState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, PortalError> {
    state.approvals.approve_subscription(&id).await?;
    Ok(Json(ApiResponse::ok_empty()))
}

/// Delete subscription
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "subscriptions",
    responses(
        (status = 200, description = "Subscription deleted"),
        (status = 404, description = "Subscription not found")
    )
)]
pub async fn delete_subscription(
    State(state): State<ConsumersState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, PortalError> {
    state.approvals.delete_subscription(&id).await?;
    Ok(Json(ApiResponse::ok_empty()))
}

/// Create consumers router
pub fn consumers_router(state: ConsumersState) -> Router {
    Router::new()
        .route("/:id", get(get_consumer).delete(delete_consumer))
        .route("/:id/approve", post(approve_consumer))
        .route(
            "/:id/subscriptions",
            get(list_subscriptions).post(create_subscription),
        )
        .with_state(state)
}

/// Create subscriptions router
pub fn subscriptions_router(state: ConsumersState) -> Router {
    Router::new()
        .route("/:id", get(get_subscription).delete(delete_subscription))
        .route("/:id/approve", post(approve_subscription))
        .with_state(state)
}
