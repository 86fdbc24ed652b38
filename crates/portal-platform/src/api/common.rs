//! Common API types
//!
//! Every endpoint answers with the `{code, message, data}` envelope;
//! `code` is `"SUCCESS"` or an error code from the platform taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::PortalError;

/// Response envelope for all admin endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: "SUCCESS".to_string(),
            message: None,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn ok_empty() -> Self {
        Self {
            code: "SUCCESS".to_string(),
            message: None,
            data: None,
        }
    }

    pub fn fail(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: Some(message.into()),
            data: None,
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = match &self {
            PortalError::Validation { .. } => StatusCode::BAD_REQUEST,
            PortalError::NotFound { .. } => StatusCode::NOT_FOUND,
            PortalError::Conflict { .. } => StatusCode::CONFLICT,
            PortalError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            PortalError::Database(_) | PortalError::Json(_) | PortalError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            // Give callers the blocking keys so they can decide on a retry.
            PortalError::Conflict { message, blocking } if !blocking.is_empty() => {
                format!("{} (blocking: {})", message, blocking.join(", "))
            }
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        (status, Json(ApiResponse::fail(self.code(), message))).into_response()
    }
}
