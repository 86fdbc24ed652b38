//! Developer, Consumer and Subscription Entities
//!
//! Developer accounts are scoped to one portal; consumers are application
//! identities owned by a developer; subscriptions permit a consumer to use
//! an API product. All three share the same two-state approval model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PortalError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            other => Err(PortalError::internal(format!(
                "Unknown approval status: {}",
                other
            ))),
        }
    }

    /// Initial status given an effective auto-approve policy.
    pub fn initial(auto_approve: bool) -> Self {
        if auto_approve {
            Self::Approved
        } else {
            Self::Pending
        }
    }
}

/// An account registered against a specific portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Developer {
    pub developer_id: String,
    pub portal_id: String,
    pub username: String,
    pub status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Developer {
    pub fn new(
        portal_id: impl Into<String>,
        username: impl Into<String>,
        status: ApprovalStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            developer_id: portal_common::id::developer_id(),
            portal_id: portal_id.into(),
            username: username.into(),
            status,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An application identity owned by a developer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consumer {
    pub consumer_id: String,
    pub developer_id: String,
    pub name: String,
    pub status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Consumer {
    pub fn new(developer_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            consumer_id: portal_common::id::consumer_id(),
            developer_id: developer_id.into(),
            name: name.into(),
            status: ApprovalStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The approval record permitting a consumer to use a product. One per
/// `(product_id, consumer_id)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub subscription_id: String,
    pub consumer_id: String,
    pub product_id: String,
    pub status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(
        consumer_id: impl Into<String>,
        product_id: impl Into<String>,
        status: ApprovalStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            subscription_id: portal_common::id::subscription_id(),
            consumer_id: consumer_id.into(),
            product_id: product_id.into(),
            status,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_status_from_policy() {
        assert_eq!(ApprovalStatus::initial(true), ApprovalStatus::Approved);
        assert_eq!(ApprovalStatus::initial(false), ApprovalStatus::Pending);
    }

    #[test]
    fn test_status_serializes_screaming() {
        let s = serde_json::to_string(&ApprovalStatus::Pending).unwrap();
        assert_eq!(s, "\"PENDING\"");
    }
}
