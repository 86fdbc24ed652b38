//! Gateway Resource Ref Repository
//!
//! One active ref per product, enforced by the primary key. `replace` runs
//! delete+insert inside a single transaction so a product is never observed
//! with zero or two refs across a failure.

use sqlx::{Row, SqlitePool};

use super::{from_millis, to_millis};
use crate::domain::{GatewayResourceRef, GatewayType, ResourceSelector, SourceType};
use crate::error::{PortalError, Result};

pub struct LinkageRepository {
    pool: SqlitePool,
}

impl LinkageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Guarded insert: the primary key decides the winner under concurrent
    /// link calls. Returns Conflict with the existing gateway id when the
    /// product is already linked. The gateway is re-checked inside the same
    /// transaction as the insert, so a ref can never land on a gateway that
    /// a concurrent delete already removed.
    pub async fn insert(&self, re: &GatewayResourceRef) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        Self::require_gateway(&mut tx, &re.gateway_id).await?;

        let result = sqlx::query(
            "INSERT INTO product_refs (product_id, gateway_id, source_type, ref_config, created_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (product_id) DO NOTHING",
        )
        .bind(&re.product_id)
        .bind(&re.gateway_id)
        .bind(re.source_type.as_str())
        .bind(re.resource_selector.to_json()?)
        .bind(to_millis(re.created_at))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let existing: Option<String> =
                sqlx::query_scalar("SELECT gateway_id FROM product_refs WHERE product_id = ?")
                    .bind(&re.product_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(PortalError::conflict_with(
                format!(
                    "Product {} is already linked; unlink or replace first",
                    re.product_id
                ),
                existing.into_iter().collect(),
            ));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Swap the product's ref in one transaction, with the same in-transaction
    /// gateway check as `insert`.
    pub async fn replace(&self, re: &GatewayResourceRef) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        Self::require_gateway(&mut tx, &re.gateway_id).await?;

        sqlx::query("DELETE FROM product_refs WHERE product_id = ?")
            .bind(&re.product_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO product_refs (product_id, gateway_id, source_type, ref_config, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&re.product_id)
        .bind(&re.gateway_id)
        .bind(re.source_type.as_str())
        .bind(re.resource_selector.to_json()?)
        .bind(to_millis(re.created_at))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn require_gateway(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        gateway_id: &str,
    ) -> Result<()> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM gateways WHERE gateway_id = ?")
            .bind(gateway_id)
            .fetch_optional(&mut **tx)
            .await?;
        if exists.is_none() {
            return Err(PortalError::not_found("Gateway", gateway_id));
        }
        Ok(())
    }

    /// Idempotent; returns whether a ref was removed.
    pub async fn delete(&self, product_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM product_refs WHERE product_id = ?")
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_product(&self, product_id: &str) -> Result<Option<GatewayResourceRef>> {
        let row = sqlx::query(
            "SELECT r.product_id, r.gateway_id, r.source_type, r.ref_config, r.created_at, \
                    g.gateway_type \
             FROM product_refs r JOIN gateways g ON g.gateway_id = r.gateway_id \
             WHERE r.product_id = ?",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let gateway_type = GatewayType::parse(row.get("gateway_type"))?;
            Ok(GatewayResourceRef {
                product_id: row.get("product_id"),
                gateway_id: row.get("gateway_id"),
                source_type: SourceType::parse(row.get("source_type"))?,
                resource_selector: ResourceSelector::from_stored(
                    gateway_type,
                    row.get("ref_config"),
                )?,
                created_at: from_millis(row.get("created_at"))?,
            })
        })
        .transpose()
    }
}
