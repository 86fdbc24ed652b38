//! Publication Manager
//!
//! The many-to-many relation between products and portals. Publishing
//! snapshots the portal's subscription auto-approve flag onto the junction
//! row; unpublishing never cascades into subscriptions.

use std::sync::Arc;

use portal_common::{Page, PageRequest};
use tracing::info;

use crate::domain::{Portal, PortalPublication};
use crate::error::{PortalError, Result};
use crate::repository::{PortalRepository, ProductRepository};

pub struct PublicationManager {
    portals: Arc<PortalRepository>,
    products: Arc<ProductRepository>,
}

impl PublicationManager {
    pub fn new(portals: Arc<PortalRepository>, products: Arc<ProductRepository>) -> Self {
        Self { portals, products }
    }

    /// Publish a product into a portal. A duplicate pair is a Conflict;
    /// under concurrent duplicate calls the primary key picks one winner.
    pub async fn publish(&self, product_id: &str, portal_id: &str) -> Result<PortalPublication> {
        if !self.products.exists(product_id).await? {
            return Err(PortalError::not_found("ApiProduct", product_id));
        }
        let portal = self
            .portals
            .find_by_id(portal_id)
            .await?
            .ok_or_else(|| PortalError::not_found("Portal", portal_id))?;

        let publication = PortalPublication::new(
            product_id,
            portal_id,
            portal.settings.auto_approve_subscriptions,
        );
        self.portals.insert_publication(&publication).await?;
        info!(product_id = %product_id, portal_id = %portal_id, "Published product to portal");
        Ok(publication)
    }

    /// Idempotent delete of the junction row only (subscriptions survive).
    pub async fn unpublish(&self, product_id: &str, portal_id: &str) -> Result<()> {
        if self.portals.delete_publication(product_id, portal_id).await? {
            info!(product_id = %product_id, portal_id = %portal_id, "Unpublished product from portal");
        }
        Ok(())
    }

    pub async fn list_publications(
        &self,
        product_id: &str,
        page: PageRequest,
    ) -> Result<Page<PortalPublication>> {
        self.portals.list_publications(product_id, page).await
    }

    /// Portals the product could still be published to; disjoint from
    /// `list_publications` by construction (anti-join in the store).
    pub async fn list_eligible_portals(
        &self,
        product_id: &str,
        page: PageRequest,
    ) -> Result<Page<Portal>> {
        if !self.products.exists(product_id).await? {
            return Err(PortalError::not_found("ApiProduct", product_id));
        }
        self.portals.list_eligible_portals(product_id, page).await
    }
}
