//! Gateway Registry
//!
//! Imports gateway instances, stores their provider credentials, and
//! answers resource discovery by dispatching to the provider client for
//! the gateway's type.

use std::sync::Arc;

use portal_common::{Page, PageRequest};
use tracing::info;

use crate::domain::{Gateway, GatewayAuthConfig, GatewayType};
use crate::error::{PortalError, Result};
use crate::providers::{ResourceDiscovery, ResourceItem};
use crate::repository::GatewayRepository;

pub struct GatewayRegistry {
    repo: Arc<GatewayRepository>,
    discovery: Arc<dyn ResourceDiscovery>,
}

impl GatewayRegistry {
    pub fn new(repo: Arc<GatewayRepository>, discovery: Arc<dyn ResourceDiscovery>) -> Self {
        Self { repo, discovery }
    }

    /// Validate the credential payload for the declared type, then persist.
    /// Nothing is written when validation fails.
    pub async fn import_gateway(
        &self,
        gateway_type: GatewayType,
        auth_config: serde_json::Value,
    ) -> Result<Gateway> {
        let auth_config = GatewayAuthConfig::for_gateway_type(gateway_type, auth_config)?;
        let gateway = Gateway::new(gateway_type, auth_config);
        self.repo.insert(&gateway).await?;
        info!(gateway_id = %gateway.gateway_id, gateway_type = %gateway_type, "Imported gateway");
        Ok(gateway)
    }

    pub async fn get_gateway(&self, gateway_id: &str) -> Result<Gateway> {
        self.repo
            .find_by_id(gateway_id)
            .await?
            .ok_or_else(|| PortalError::not_found("Gateway", gateway_id))
    }

    pub async fn list_gateways(&self, page: PageRequest) -> Result<Page<Gateway>> {
        self.repo.list(page).await
    }

    /// Explicit credential update; same per-type validation as import.
    pub async fn update_auth_config(
        &self,
        gateway_id: &str,
        auth_config: serde_json::Value,
    ) -> Result<Gateway> {
        let gateway = self.get_gateway(gateway_id).await?;
        let auth_config = GatewayAuthConfig::for_gateway_type(gateway.gateway_type, auth_config)?;
        self.repo.update_auth_config(gateway_id, &auth_config).await?;
        info!(gateway_id = %gateway_id, "Updated gateway credentials");
        self.get_gateway(gateway_id).await
    }

    /// Enumerate linkable resources on the gateway. Provider failures
    /// surface as Upstream errors; an empty page means the provider
    /// genuinely has nothing to link.
    pub async fn list_resources(
        &self,
        gateway_id: &str,
        page: PageRequest,
    ) -> Result<Page<ResourceItem>> {
        let gateway = self.get_gateway(gateway_id).await?;
        self.discovery.list_resources(&gateway, page).await
    }

    /// Refuses while any product ref still targets the gateway; the
    /// conflict carries the blocking product ids.
    pub async fn delete_gateway(&self, gateway_id: &str) -> Result<()> {
        self.repo.delete_if_unreferenced(gateway_id).await?;
        info!(gateway_id = %gateway_id, "Deleted gateway");
        Ok(())
    }
}
