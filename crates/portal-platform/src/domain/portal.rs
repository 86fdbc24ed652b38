//! Portal Entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-portal workflow settings. Defaults mirror the shipped portal
/// configuration: developers need manual approval, subscriptions do not.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortalSettings {
    #[serde(default)]
    pub auto_approve_developers: bool,
    #[serde(default = "default_true")]
    pub auto_approve_subscriptions: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            auto_approve_developers: false,
            auto_approve_subscriptions: true,
        }
    }
}

/// A developer portal. Products become visible to developers by being
/// published into a portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portal {
    pub portal_id: String,
    pub name: String,
    pub settings: PortalSettings,
    #[serde(default)]
    pub domains: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Portal {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            portal_id: portal_common::id::portal_id(),
            name: name.into(),
            settings: PortalSettings::default(),
            domains: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_settings(mut self, settings: PortalSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_domains(mut self, domains: Vec<String>) -> Self {
        self.domains = domains;
        self
    }
}

/// Junction row binding a product to a portal. Unique per
/// `(product_id, portal_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalPublication {
    pub product_id: String,
    pub portal_id: String,
    /// Per-publication override for subscription auto-approval; seeded from
    /// the portal's `autoApproveSubscriptions` at publish time.
    pub auto_approve_subscription: bool,
    pub created_at: DateTime<Utc>,
}

impl PortalPublication {
    pub fn new(
        product_id: impl Into<String>,
        portal_id: impl Into<String>,
        auto_approve_subscription: bool,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            portal_id: portal_id.into(),
            auto_approve_subscription,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = PortalSettings::default();
        assert!(!settings.auto_approve_developers);
        assert!(settings.auto_approve_subscriptions);
    }

    #[test]
    fn test_settings_deserialize_defaults() {
        let settings: PortalSettings = serde_json::from_str("{}").unwrap();
        assert!(!settings.auto_approve_developers);
        assert!(settings.auto_approve_subscriptions);
    }
}
