//! Linkage Manager
//!
//! Maintains the single active reference from an API product to a gateway
//! resource. Selector payloads are decoded by the target gateway's type
//! before any write; `replace` swaps the ref transactionally.

use std::sync::Arc;

use tracing::info;

use crate::domain::{GatewayResourceRef, ResourceSelector};
use crate::error::{PortalError, Result};
use crate::repository::{GatewayRepository, LinkageRepository, ProductRepository};

pub struct LinkageManager {
    refs: Arc<LinkageRepository>,
    gateways: Arc<GatewayRepository>,
    products: Arc<ProductRepository>,
}

impl LinkageManager {
    pub fn new(
        refs: Arc<LinkageRepository>,
        gateways: Arc<GatewayRepository>,
        products: Arc<ProductRepository>,
    ) -> Self {
        Self {
            refs,
            gateways,
            products,
        }
    }

    /// Bind a product to a gateway resource. Fails with Conflict when the
    /// product already holds a ref; callers replace explicitly.
    pub async fn link(
        &self,
        product_id: &str,
        gateway_id: &str,
        selector: serde_json::Value,
    ) -> Result<GatewayResourceRef> {
        let re = self.validate(product_id, gateway_id, selector).await?;
        self.refs.insert(&re).await?;
        info!(product_id = %product_id, gateway_id = %gateway_id, "Linked product to gateway resource");
        Ok(re)
    }

    /// Swap the product's ref for a new one in a single transaction: the
    /// product ends up with exactly the old ref or exactly the new one,
    /// never zero or two.
    pub async fn replace(
        &self,
        product_id: &str,
        gateway_id: &str,
        selector: serde_json::Value,
    ) -> Result<GatewayResourceRef> {
        let re = self.validate(product_id, gateway_id, selector).await?;
        self.refs.replace(&re).await?;
        info!(product_id = %product_id, gateway_id = %gateway_id, "Replaced product gateway ref");
        Ok(re)
    }

    /// Idempotent; unlinking a product without a ref is a no-op.
    pub async fn unlink(&self, product_id: &str) -> Result<()> {
        if self.refs.delete(product_id).await? {
            info!(product_id = %product_id, "Unlinked product");
        }
        Ok(())
    }

    pub async fn get_ref(&self, product_id: &str) -> Result<Option<GatewayResourceRef>> {
        self.refs.find_by_product(product_id).await
    }

    /// All validation happens here, before any mutation: the product and
    /// gateway must exist and the selector must decode as the variant the
    /// gateway's type implies.
    async fn validate(
        &self,
        product_id: &str,
        gateway_id: &str,
        selector: serde_json::Value,
    ) -> Result<GatewayResourceRef> {
        if !self.products.exists(product_id).await? {
            return Err(PortalError::not_found("ApiProduct", product_id));
        }
        let gateway = self
            .gateways
            .find_by_id(gateway_id)
            .await?
            .ok_or_else(|| PortalError::not_found("Gateway", gateway_id))?;

        let selector = ResourceSelector::for_gateway_type(gateway.gateway_type, selector)?;
        Ok(GatewayResourceRef::new(product_id, gateway_id, selector))
    }
}
