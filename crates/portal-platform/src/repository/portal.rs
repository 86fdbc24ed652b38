//! Portal and Publication Repository

use portal_common::{Page, PageRequest};
use sqlx::{Row, SqlitePool};

use super::{from_millis, to_millis};
use crate::domain::{Portal, PortalPublication, PortalSettings};
use crate::error::{is_unique_violation, PortalError, Result};

pub struct PortalRepository {
    pool: SqlitePool,
}

impl PortalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, portal: &Portal) -> Result<()> {
        sqlx::query(
            "INSERT INTO portals (portal_id, name, auto_approve_developers, auto_approve_subscriptions, domains, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&portal.portal_id)
        .bind(&portal.name)
        .bind(portal.settings.auto_approve_developers)
        .bind(portal.settings.auto_approve_subscriptions)
        .bind(serde_json::to_string(&portal.domains)?)
        .bind(to_millis(portal.created_at))
        .bind(to_millis(portal.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(&self, portal_id: &str) -> Result<Option<Portal>> {
        let row = sqlx::query(
            "SELECT portal_id, name, auto_approve_developers, auto_approve_subscriptions, domains, created_at, updated_at \
             FROM portals WHERE portal_id = ?",
        )
        .bind(portal_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_portal).transpose()
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<Portal>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM portals")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(
            "SELECT portal_id, name, auto_approve_developers, auto_approve_subscriptions, domains, created_at, updated_at \
             FROM portals ORDER BY created_at, portal_id LIMIT ? OFFSET ?",
        )
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let portals = rows.into_iter().map(map_portal).collect::<Result<_>>()?;
        Ok(Page::new(portals, total as u64))
    }

    pub async fn update(
        &self,
        portal_id: &str,
        name: Option<&str>,
        settings: Option<&PortalSettings>,
        domains: Option<&[String]>,
    ) -> Result<()> {
        let domains_json = domains.map(serde_json::to_string).transpose()?;
        let result = sqlx::query(
            "UPDATE portals SET \
             name = COALESCE(?, name), \
             auto_approve_developers = COALESCE(?, auto_approve_developers), \
             auto_approve_subscriptions = COALESCE(?, auto_approve_subscriptions), \
             domains = COALESCE(?, domains), \
             updated_at = ? \
             WHERE portal_id = ?",
        )
        .bind(name)
        .bind(settings.map(|s| s.auto_approve_developers))
        .bind(settings.map(|s| s.auto_approve_subscriptions))
        .bind(domains_json)
        .bind(to_millis(chrono::Utc::now()))
        .bind(portal_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PortalError::not_found("Portal", portal_id));
        }
        Ok(())
    }

    pub async fn delete(&self, portal_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM portals WHERE portal_id = ?")
            .bind(portal_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PortalError::not_found("Portal", portal_id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Publications
    // ------------------------------------------------------------------

    /// Insert backed by the (product_id, portal_id) primary key; under
    /// simultaneous duplicate publishes exactly one row results and the
    /// loser gets Conflict.
    pub async fn insert_publication(&self, publication: &PortalPublication) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO product_publications (product_id, portal_id, auto_approve_subscription, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&publication.product_id)
        .bind(&publication.portal_id)
        .bind(publication.auto_approve_subscription)
        .bind(to_millis(publication.created_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(PortalError::conflict_with(
                format!(
                    "Product {} is already published to portal {}",
                    publication.product_id, publication.portal_id
                ),
                vec![publication.portal_id.clone()],
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Idempotent; returns whether a publication was removed. Never touches
    /// subscriptions.
    pub async fn delete_publication(&self, product_id: &str, portal_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM product_publications WHERE product_id = ? AND portal_id = ?",
        )
        .bind(product_id)
        .bind(portal_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_publication(
        &self,
        product_id: &str,
        portal_id: &str,
    ) -> Result<Option<PortalPublication>> {
        let row = sqlx::query(
            "SELECT product_id, portal_id, auto_approve_subscription, created_at \
             FROM product_publications WHERE product_id = ? AND portal_id = ?",
        )
        .bind(product_id)
        .bind(portal_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_publication).transpose()
    }

    pub async fn list_publications(
        &self,
        product_id: &str,
        page: PageRequest,
    ) -> Result<Page<PortalPublication>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM product_publications WHERE product_id = ?")
                .bind(product_id)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query(
            "SELECT product_id, portal_id, auto_approve_subscription, created_at \
             FROM product_publications WHERE product_id = ? \
             ORDER BY created_at, portal_id LIMIT ? OFFSET ?",
        )
        .bind(product_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let publications = rows
            .into_iter()
            .map(map_publication)
            .collect::<Result<_>>()?;
        Ok(Page::new(publications, total as u64))
    }

    /// Portals the product is not yet published to, as a single anti-join
    /// query so the result is correct under pagination.
    pub async fn list_eligible_portals(
        &self,
        product_id: &str,
        page: PageRequest,
    ) -> Result<Page<Portal>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM portals p \
             WHERE NOT EXISTS (SELECT 1 FROM product_publications pub \
                               WHERE pub.portal_id = p.portal_id AND pub.product_id = ?)",
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            "SELECT p.portal_id, p.name, p.auto_approve_developers, p.auto_approve_subscriptions, p.domains, p.created_at, p.updated_at \
             FROM portals p \
             WHERE NOT EXISTS (SELECT 1 FROM product_publications pub \
                               WHERE pub.portal_id = p.portal_id AND pub.product_id = ?) \
             ORDER BY p.created_at, p.portal_id LIMIT ? OFFSET ?",
        )
        .bind(product_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let portals = rows.into_iter().map(map_portal).collect::<Result<_>>()?;
        Ok(Page::new(portals, total as u64))
    }
}

fn map_portal(row: sqlx::sqlite::SqliteRow) -> Result<Portal> {
    let domains: Vec<String> = serde_json::from_str(row.get("domains"))?;
    Ok(Portal {
        portal_id: row.get("portal_id"),
        name: row.get("name"),
        settings: PortalSettings {
            auto_approve_developers: row.get("auto_approve_developers"),
            auto_approve_subscriptions: row.get("auto_approve_subscriptions"),
        },
        domains,
        created_at: from_millis(row.get("created_at"))?,
        updated_at: from_millis(row.get("updated_at"))?,
    })
}

fn map_publication(row: sqlx::sqlite::SqliteRow) -> Result<PortalPublication> {
    Ok(PortalPublication {
        product_id: row.get("product_id"),
        portal_id: row.get("portal_id"),
        auto_approve_subscription: row.get("auto_approve_subscription"),
        created_at: from_millis(row.get("created_at"))?,
    })
}
