//! Gateway Repository

use portal_common::{Page, PageRequest};
use sqlx::{Row, SqlitePool};

use super::{from_millis, to_millis};
use crate::domain::{Gateway, GatewayAuthConfig, GatewayType};
use crate::error::{PortalError, Result};

pub struct GatewayRepository {
    pool: SqlitePool,
}

impl GatewayRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, gateway: &Gateway) -> Result<()> {
        sqlx::query(
            "INSERT INTO gateways (gateway_id, gateway_type, auth_config, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&gateway.gateway_id)
        .bind(gateway.gateway_type.as_str())
        .bind(gateway.auth_config.to_json()?)
        .bind(to_millis(gateway.created_at))
        .bind(to_millis(gateway.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(&self, gateway_id: &str) -> Result<Option<Gateway>> {
        let row = sqlx::query(
            "SELECT gateway_id, gateway_type, auth_config, created_at, updated_at \
             FROM gateways WHERE gateway_id = ?",
        )
        .bind(gateway_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_gateway).transpose()
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<Gateway>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM gateways")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(
            "SELECT gateway_id, gateway_type, auth_config, created_at, updated_at \
             FROM gateways ORDER BY created_at, gateway_id LIMIT ? OFFSET ?",
        )
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let gateways = rows.into_iter().map(map_gateway).collect::<Result<_>>()?;
        Ok(Page::new(gateways, total as u64))
    }

    pub async fn update_auth_config(
        &self,
        gateway_id: &str,
        auth_config: &GatewayAuthConfig,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE gateways SET auth_config = ?, updated_at = ? WHERE gateway_id = ?",
        )
        .bind(auth_config.to_json()?)
        .bind(to_millis(chrono::Utc::now()))
        .bind(gateway_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PortalError::not_found("Gateway", gateway_id));
        }
        Ok(())
    }

    /// Check-and-delete in one transaction: the gateway is removed only if
    /// no product ref targets it, and a concurrent `link` cannot slip in
    /// between the check and the delete.
    pub async fn delete_if_unreferenced(&self, gateway_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let blocking: Vec<String> =
            sqlx::query_scalar("SELECT product_id FROM product_refs WHERE gateway_id = ?")
                .bind(gateway_id)
                .fetch_all(&mut *tx)
                .await?;

        if !blocking.is_empty() {
            return Err(PortalError::conflict_with(
                format!(
                    "Gateway {} is still referenced by {} product(s)",
                    gateway_id,
                    blocking.len()
                ),
                blocking,
            ));
        }

        let result = sqlx::query("DELETE FROM gateways WHERE gateway_id = ?")
            .bind(gateway_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PortalError::not_found("Gateway", gateway_id));
        }

        tx.commit().await?;
        Ok(())
    }
}

fn map_gateway(row: sqlx::sqlite::SqliteRow) -> Result<Gateway> {
    let gateway_type = GatewayType::parse(row.get("gateway_type"))?;
    let auth_config = GatewayAuthConfig::from_stored(gateway_type, row.get("auth_config"))?;
    Ok(Gateway {
        gateway_id: row.get("gateway_id"),
        gateway_type,
        auth_config,
        created_at: from_millis(row.get("created_at"))?,
        updated_at: from_millis(row.get("updated_at"))?,
    })
}
