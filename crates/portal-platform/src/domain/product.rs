//! API Product Entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{PortalError, Result};

/// What kind of resource a product wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiProductType {
    RestApi,
    McpServer,
    ModelApi,
}

impl ApiProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RestApi => "REST_API",
            Self::McpServer => "MCP_SERVER",
            Self::ModelApi => "MODEL_API",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "REST_API" => Ok(Self::RestApi),
            "MCP_SERVER" => Ok(Self::McpServer),
            "MODEL_API" => Ok(Self::ModelApi),
            other => Err(PortalError::validation(format!(
                "Unknown product type: {}",
                other
            ))),
        }
    }
}

/// Lifecycle status, derived from the product's relations rather than
/// stored: no gateway ref yet is PENDING, a ref without a publication is
/// READY, and at least one publication is PUBLISHED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiProductStatus {
    Pending,
    Ready,
    Published,
}

impl ApiProductStatus {
    pub fn derive(has_ref: bool, has_publication: bool) -> Self {
        match (has_ref, has_publication) {
            (_, true) => Self::Published,
            (true, false) => Self::Ready,
            (false, false) => Self::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Ready => "READY",
            Self::Published => "PUBLISHED",
        }
    }
}

/// The unit published to developers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProduct {
    pub product_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub product_type: ApiProductType,
    pub status: ApiProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApiProduct {
    pub fn new(name: impl Into<String>, product_type: ApiProductType) -> Self {
        let now = Utc::now();
        Self {
            product_id: portal_common::id::product_id(),
            name: name.into(),
            description: None,
            product_type,
            status: ApiProductStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_derivation() {
        assert_eq!(ApiProductStatus::derive(false, false), ApiProductStatus::Pending);
        assert_eq!(ApiProductStatus::derive(true, false), ApiProductStatus::Ready);
        assert_eq!(ApiProductStatus::derive(true, true), ApiProductStatus::Published);
        // A publication implies PUBLISHED even if the ref was since removed.
        assert_eq!(ApiProductStatus::derive(false, true), ApiProductStatus::Published);
    }
}
