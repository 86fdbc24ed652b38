//! Gateway Provider Clients
//!
//! Outbound discovery against the backing gateway admin APIs. Every
//! provider answers the same question — "which linkable resources does this
//! gateway expose?" — with its own wire protocol and item shape. Failures
//! reaching a provider surface as `Upstream` errors; a provider that
//! answers with zero items yields an empty page, which is a different
//! outcome.

use async_trait::async_trait;
use portal_common::{Page, PageRequest};
use serde::{Deserialize, Serialize};

use crate::domain::{ApigAiMcpItem, Gateway, GatewayType, HigressMcpItem, RestApiItem};
use crate::error::{PortalError, Result};

pub mod adp;
pub mod apig;
pub mod higress;

pub use adp::AdpDiscovery;
pub use apig::ApigDiscovery;
pub use higress::HigressDiscovery;

/// A linkable resource reported by a gateway, in the shape the linkage
/// selector for that gateway type expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceItem {
    RestApi(RestApiItem),
    ApigAiMcp(ApigAiMcpItem),
    HigressMcp(HigressMcpItem),
}

/// Resource discovery seam. The registry service calls through this trait
/// so tests can substitute a stub provider.
#[async_trait]
pub trait ResourceDiscovery: Send + Sync {
    async fn list_resources(
        &self,
        gateway: &Gateway,
        page: PageRequest,
    ) -> Result<Page<ResourceItem>>;
}

/// Dispatches discovery to the provider client matching the gateway's type.
pub struct DiscoveryRouter {
    apig: ApigDiscovery,
    adp: AdpDiscovery,
    higress: HigressDiscovery,
}

impl DiscoveryRouter {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            apig: ApigDiscovery::new(http.clone()),
            adp: AdpDiscovery::new(http.clone()),
            higress: HigressDiscovery::new(http),
        }
    }
}

impl Default for DiscoveryRouter {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl ResourceDiscovery for DiscoveryRouter {
    async fn list_resources(
        &self,
        gateway: &Gateway,
        page: PageRequest,
    ) -> Result<Page<ResourceItem>> {
        match gateway.gateway_type {
            GatewayType::ApigApi | GatewayType::ApigAi => {
                self.apig.list_resources(gateway, page).await
            }
            GatewayType::AdpAiGateway => self.adp.list_resources(gateway, page).await,
            GatewayType::Higress => self.higress.list_resources(gateway, page).await,
        }
    }
}

pub(crate) fn upstream_from_reqwest(context: &str, err: reqwest::Error) -> PortalError {
    PortalError::upstream(format!("{}: {}", context, err))
}

pub(crate) fn check_status(context: &str, status: reqwest::StatusCode) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(PortalError::upstream(format!(
            "{}: provider returned HTTP {}",
            context, status
        )))
    }
}
