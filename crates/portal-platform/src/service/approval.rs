//! Approval Workflow
//!
//! The developer → consumer → subscription onboarding state machines.
//! Every transition is a single conditional update: it either moves the
//! entity from the expected state or fails outright with NotFound/Conflict.
//! Portal-level auto-approve flags only influence the status entities are
//! created in; they never move existing entities.

use std::sync::Arc;

use portal_common::{Page, PageRequest};
use tracing::info;

use crate::domain::{ApprovalStatus, Consumer, Developer, Subscription};
use crate::error::{PortalError, Result};
use crate::repository::{ConsumerRepository, PortalRepository, ProductRepository};

pub struct ApprovalWorkflow {
    consumers: Arc<ConsumerRepository>,
    portals: Arc<PortalRepository>,
    products: Arc<ProductRepository>,
}

impl ApprovalWorkflow {
    pub fn new(
        consumers: Arc<ConsumerRepository>,
        portals: Arc<PortalRepository>,
        products: Arc<ProductRepository>,
    ) -> Self {
        Self {
            consumers,
            portals,
            products,
        }
    }

    // ------------------------------------------------------------------
    // Developers
    // ------------------------------------------------------------------

    /// Register a developer against a portal. With the portal's
    /// `autoApproveDevelopers` set, the account starts APPROVED.
    pub async fn register_developer(&self, portal_id: &str, username: &str) -> Result<Developer> {
        let portal = self
            .portals
            .find_by_id(portal_id)
            .await?
            .ok_or_else(|| PortalError::not_found("Portal", portal_id))?;

        let status = ApprovalStatus::initial(portal.settings.auto_approve_developers);
        let developer = Developer::new(portal_id, username, status);
        self.consumers.insert_developer(&developer).await?;
        info!(developer_id = %developer.developer_id, portal_id = %portal_id, status = status.as_str(), "Registered developer");
        Ok(developer)
    }

    pub async fn get_developer(&self, developer_id: &str) -> Result<Developer> {
        self.consumers
            .find_developer(developer_id)
            .await?
            .ok_or_else(|| PortalError::not_found("Developer", developer_id))
    }

    pub async fn list_developers(
        &self,
        portal_id: &str,
        page: PageRequest,
    ) -> Result<Page<Developer>> {
        self.consumers.list_developers(portal_id, page).await
    }

    pub async fn approve_developer(&self, developer_id: &str) -> Result<()> {
        self.consumers
            .transition_developer(developer_id, ApprovalStatus::Pending, ApprovalStatus::Approved)
            .await?;
        info!(developer_id = %developer_id, "Approved developer");
        Ok(())
    }

    pub async fn revoke_developer(&self, developer_id: &str) -> Result<()> {
        self.consumers
            .transition_developer(developer_id, ApprovalStatus::Approved, ApprovalStatus::Pending)
            .await?;
        info!(developer_id = %developer_id, "Revoked developer approval");
        Ok(())
    }

    pub async fn delete_developer(&self, developer_id: &str) -> Result<()> {
        self.consumers.delete_developer(developer_id).await
    }

    // ------------------------------------------------------------------
    // Consumers
    // ------------------------------------------------------------------

    /// Consumers start PENDING regardless of portal flags; approval is an
    /// explicit transition. There is no revoke path for consumers.
    pub async fn create_consumer(&self, developer_id: &str, name: &str) -> Result<Consumer> {
        if self.consumers.find_developer(developer_id).await?.is_none() {
            return Err(PortalError::not_found("Developer", developer_id));
        }
        let consumer = Consumer::new(developer_id, name);
        self.consumers.insert_consumer(&consumer).await?;
        info!(consumer_id = %consumer.consumer_id, developer_id = %developer_id, "Created consumer");
        Ok(consumer)
    }

    pub async fn get_consumer(&self, consumer_id: &str) -> Result<Consumer> {
        self.consumers
            .find_consumer(consumer_id)
            .await?
            .ok_or_else(|| PortalError::not_found("Consumer", consumer_id))
    }

    pub async fn list_consumers(
        &self,
        developer_id: &str,
        page: PageRequest,
    ) -> Result<Page<Consumer>> {
        self.consumers.list_consumers(developer_id, page).await
    }

    pub async fn approve_consumer(&self, consumer_id: &str) -> Result<()> {
        self.consumers.approve_consumer(consumer_id).await?;
        info!(consumer_id = %consumer_id, "Approved consumer");
        Ok(())
    }

    pub async fn delete_consumer(&self, consumer_id: &str) -> Result<()> {
        self.consumers.delete_consumer(consumer_id).await
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Subscribe a consumer to a product. The subscription starts APPROVED
    /// when the consumer's portal auto-approves subscriptions or the
    /// matching publication carries the per-publication flag; otherwise it
    /// starts PENDING. Subscriptions do not require an active publication
    /// to exist or to survive (publications removed later leave them
    /// untouched).
    pub async fn create_subscription(
        &self,
        consumer_id: &str,
        product_id: &str,
    ) -> Result<Subscription> {
        let consumer = self.get_consumer(consumer_id).await?;
        if !self.products.exists(product_id).await? {
            return Err(PortalError::not_found("ApiProduct", product_id));
        }

        let developer = self
            .consumers
            .find_developer(&consumer.developer_id)
            .await?
            .ok_or_else(|| PortalError::not_found("Developer", &consumer.developer_id))?;

        let auto_approve = self
            .effective_auto_approve(product_id, &developer.portal_id)
            .await?;

        let subscription =
            Subscription::new(consumer_id, product_id, ApprovalStatus::initial(auto_approve));
        self.consumers.insert_subscription(&subscription).await?;
        info!(
            subscription_id = %subscription.subscription_id,
            consumer_id = %consumer_id,
            product_id = %product_id,
            status = subscription.status.as_str(),
            "Created subscription"
        );
        Ok(subscription)
    }

    pub async fn get_subscription(&self, subscription_id: &str) -> Result<Subscription> {
        self.consumers
            .find_subscription(subscription_id)
            .await?
            .ok_or_else(|| PortalError::not_found("Subscription", subscription_id))
    }

    pub async fn list_subscriptions_by_consumer(
        &self,
        consumer_id: &str,
        page: PageRequest,
    ) -> Result<Page<Subscription>> {
        self.consumers
            .list_subscriptions_by_consumer(consumer_id, page)
            .await
    }

    pub async fn list_subscriptions_by_product(
        &self,
        product_id: &str,
        page: PageRequest,
    ) -> Result<Page<Subscription>> {
        self.consumers
            .list_subscriptions_by_product(product_id, page)
            .await
    }

    /// PENDING → APPROVED. Re-approving is a Conflict and leaves the row
    /// untouched.
    pub async fn approve_subscription(&self, subscription_id: &str) -> Result<()> {
        self.consumers.approve_subscription(subscription_id).await?;
        info!(subscription_id = %subscription_id, "Approved subscription");
        Ok(())
    }

    pub async fn delete_subscription(&self, subscription_id: &str) -> Result<()> {
        self.consumers.delete_subscription(subscription_id).await?;
        info!(subscription_id = %subscription_id, "Deleted subscription");
        Ok(())
    }

    async fn effective_auto_approve(&self, product_id: &str, portal_id: &str) -> Result<bool> {
        let portal = self
            .portals
            .find_by_id(portal_id)
            .await?
            .ok_or_else(|| PortalError::not_found("Portal", portal_id))?;

        if portal.settings.auto_approve_subscriptions {
            return Ok(true);
        }
        let publication = self.portals.find_publication(product_id, portal_id).await?;
        Ok(publication.map(|p| p.auto_approve_subscription).unwrap_or(false))
    }
}
