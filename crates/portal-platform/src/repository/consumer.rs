//! Developer / Consumer / Subscription Repository
//!
//! Status transitions are single conditional UPDATE statements
//! (`WHERE status = <from>`): the row either moves or the statement affects
//! nothing, so a transition can never half-apply. Zero affected rows is
//! resolved to NotFound (row missing) or Conflict (already past the source
//! state) by the caller-facing methods here.

use portal_common::{Page, PageRequest};
use sqlx::{Row, SqlitePool};

use super::{from_millis, to_millis};
use crate::domain::{ApprovalStatus, Consumer, Developer, Subscription};
use crate::error::{is_unique_violation, PortalError, Result};

pub struct ConsumerRepository {
    pool: SqlitePool,
}

impl ConsumerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ------------------------------------------------------------------
    // Developers
    // ------------------------------------------------------------------

    pub async fn insert_developer(&self, developer: &Developer) -> Result<()> {
        sqlx::query(
            "INSERT INTO developers (developer_id, portal_id, username, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&developer.developer_id)
        .bind(&developer.portal_id)
        .bind(&developer.username)
        .bind(developer.status.as_str())
        .bind(to_millis(developer.created_at))
        .bind(to_millis(developer.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_developer(&self, developer_id: &str) -> Result<Option<Developer>> {
        let row = sqlx::query(
            "SELECT developer_id, portal_id, username, status, created_at, updated_at \
             FROM developers WHERE developer_id = ?",
        )
        .bind(developer_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_developer).transpose()
    }

    pub async fn list_developers(
        &self,
        portal_id: &str,
        page: PageRequest,
    ) -> Result<Page<Developer>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM developers WHERE portal_id = ?")
            .bind(portal_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(
            "SELECT developer_id, portal_id, username, status, created_at, updated_at \
             FROM developers WHERE portal_id = ? \
             ORDER BY created_at, developer_id LIMIT ? OFFSET ?",
        )
        .bind(portal_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let developers = rows.into_iter().map(map_developer).collect::<Result<_>>()?;
        Ok(Page::new(developers, total as u64))
    }

    pub async fn transition_developer(
        &self,
        developer_id: &str,
        from: ApprovalStatus,
        to: ApprovalStatus,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE developers SET status = ?, updated_at = ? \
             WHERE developer_id = ? AND status = ?",
        )
        .bind(to.as_str())
        .bind(to_millis(chrono::Utc::now()))
        .bind(developer_id)
        .bind(from.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.find_developer(developer_id).await? {
                None => Err(PortalError::not_found("Developer", developer_id)),
                Some(d) => Err(PortalError::conflict(format!(
                    "Developer {} is {}, expected {}",
                    developer_id,
                    d.status.as_str(),
                    from.as_str()
                ))),
            };
        }
        Ok(())
    }

    pub async fn delete_developer(&self, developer_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM developers WHERE developer_id = ?")
            .bind(developer_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PortalError::not_found("Developer", developer_id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Consumers
    // ------------------------------------------------------------------

    pub async fn insert_consumer(&self, consumer: &Consumer) -> Result<()> {
        sqlx::query(
            "INSERT INTO consumers (consumer_id, developer_id, name, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&consumer.consumer_id)
        .bind(&consumer.developer_id)
        .bind(&consumer.name)
        .bind(consumer.status.as_str())
        .bind(to_millis(consumer.created_at))
        .bind(to_millis(consumer.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_consumer(&self, consumer_id: &str) -> Result<Option<Consumer>> {
        let row = sqlx::query(
            "SELECT consumer_id, developer_id, name, status, created_at, updated_at \
             FROM consumers WHERE consumer_id = ?",
        )
        .bind(consumer_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_consumer).transpose()
    }

    pub async fn list_consumers(
        &self,
        developer_id: &str,
        page: PageRequest,
    ) -> Result<Page<Consumer>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM consumers WHERE developer_id = ?")
            .bind(developer_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(
            "SELECT consumer_id, developer_id, name, status, created_at, updated_at \
             FROM consumers WHERE developer_id = ? \
             ORDER BY created_at, consumer_id LIMIT ? OFFSET ?",
        )
        .bind(developer_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let consumers = rows.into_iter().map(map_consumer).collect::<Result<_>>()?;
        Ok(Page::new(consumers, total as u64))
    }

    pub async fn approve_consumer(&self, consumer_id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE consumers SET status = ?, updated_at = ? \
             WHERE consumer_id = ? AND status = ?",
        )
        .bind(ApprovalStatus::Approved.as_str())
        .bind(to_millis(chrono::Utc::now()))
        .bind(consumer_id)
        .bind(ApprovalStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.find_consumer(consumer_id).await? {
                None => Err(PortalError::not_found("Consumer", consumer_id)),
                Some(_) => Err(PortalError::conflict(format!(
                    "Consumer {} is already approved",
                    consumer_id
                ))),
            };
        }
        Ok(())
    }

    pub async fn delete_consumer(&self, consumer_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM consumers WHERE consumer_id = ?")
            .bind(consumer_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PortalError::not_found("Consumer", consumer_id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// One subscription per (product, consumer); duplicates map to Conflict
    /// via the unique index.
    pub async fn insert_subscription(&self, subscription: &Subscription) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO subscriptions (subscription_id, consumer_id, product_id, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&subscription.subscription_id)
        .bind(&subscription.consumer_id)
        .bind(&subscription.product_id)
        .bind(subscription.status.as_str())
        .bind(to_millis(subscription.created_at))
        .bind(to_millis(subscription.updated_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(PortalError::conflict(format!(
                "Consumer {} already has a subscription for product {}",
                subscription.consumer_id, subscription.product_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_subscription(&self, subscription_id: &str) -> Result<Option<Subscription>> {
        let row = sqlx::query(
            "SELECT subscription_id, consumer_id, product_id, status, created_at, updated_at \
             FROM subscriptions WHERE subscription_id = ?",
        )
        .bind(subscription_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_subscription).transpose()
    }

    pub async fn list_subscriptions_by_consumer(
        &self,
        consumer_id: &str,
        page: PageRequest,
    ) -> Result<Page<Subscription>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE consumer_id = ?")
                .bind(consumer_id)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query(
            "SELECT subscription_id, consumer_id, product_id, status, created_at, updated_at \
             FROM subscriptions WHERE consumer_id = ? \
             ORDER BY created_at, subscription_id LIMIT ? OFFSET ?",
        )
        .bind(consumer_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let subscriptions = rows
            .into_iter()
            .map(map_subscription)
            .collect::<Result<_>>()?;
        Ok(Page::new(subscriptions, total as u64))
    }

    pub async fn list_subscriptions_by_product(
        &self,
        product_id: &str,
        page: PageRequest,
    ) -> Result<Page<Subscription>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE product_id = ?")
                .bind(product_id)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query(
            "SELECT subscription_id, consumer_id, product_id, status, created_at, updated_at \
             FROM subscriptions WHERE product_id = ? \
             ORDER BY created_at, subscription_id LIMIT ? OFFSET ?",
        )
        .bind(product_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let subscriptions = rows
            .into_iter()
            .map(map_subscription)
            .collect::<Result<_>>()?;
        Ok(Page::new(subscriptions, total as u64))
    }

    pub async fn approve_subscription(&self, subscription_id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE subscriptions SET status = ?, updated_at = ? \
             WHERE subscription_id = ? AND status = ?",
        )
        .bind(ApprovalStatus::Approved.as_str())
        .bind(to_millis(chrono::Utc::now()))
        .bind(subscription_id)
        .bind(ApprovalStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.find_subscription(subscription_id).await? {
                None => Err(PortalError::not_found("Subscription", subscription_id)),
                Some(_) => Err(PortalError::conflict(format!(
                    "Subscription {} is already approved",
                    subscription_id
                ))),
            };
        }
        Ok(())
    }

    /// APPROVED is terminal except for deletion.
    pub async fn delete_subscription(&self, subscription_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE subscription_id = ?")
            .bind(subscription_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PortalError::not_found("Subscription", subscription_id));
        }
        Ok(())
    }
}

fn map_developer(row: sqlx::sqlite::SqliteRow) -> Result<Developer> {
    Ok(Developer {
        developer_id: row.get("developer_id"),
        portal_id: row.get("portal_id"),
        username: row.get("username"),
        status: ApprovalStatus::parse(row.get("status"))?,
        created_at: from_millis(row.get("created_at"))?,
        updated_at: from_millis(row.get("updated_at"))?,
    })
}

fn map_consumer(row: sqlx::sqlite::SqliteRow) -> Result<Consumer> {
    Ok(Consumer {
        consumer_id: row.get("consumer_id"),
        developer_id: row.get("developer_id"),
        name: row.get("name"),
        status: ApprovalStatus::parse(row.get("status"))?,
        created_at: from_millis(row.get("created_at"))?,
        updated_at: from_millis(row.get("updated_at"))?,
    })
}

fn map_subscription(row: sqlx::sqlite::SqliteRow) -> Result<Subscription> {
    Ok(Subscription {
        subscription_id: row.get("subscription_id"),
        consumer_id: row.get("consumer_id"),
        product_id: row.get("product_id"),
        status: ApprovalStatus::parse(row.get("status"))?,
        created_at: from_millis(row.get("created_at"))?,
        updated_at: from_millis(row.get("updated_at"))?,
    })
}
