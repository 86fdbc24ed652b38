//! API Product Repository
//!
//! Product status is not a column; it is derived per read from the
//! presence of a gateway ref and of publications.

use portal_common::{Page, PageRequest};
use sqlx::{Row, SqlitePool};

use super::{from_millis, to_millis};
use crate::domain::{ApiProduct, ApiProductStatus, ApiProductType};
use crate::error::{PortalError, Result};

pub struct ProductRepository {
    pool: SqlitePool,
}

const SELECT_WITH_STATUS: &str = "SELECT p.product_id, p.name, p.description, p.product_type, p.created_at, p.updated_at, \
     EXISTS (SELECT 1 FROM product_refs r WHERE r.product_id = p.product_id) AS has_ref, \
     EXISTS (SELECT 1 FROM product_publications pub WHERE pub.product_id = p.product_id) AS has_publication \
     FROM api_products p";

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, product: &ApiProduct) -> Result<()> {
        sqlx::query(
            "INSERT INTO api_products (product_id, name, description, product_type, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&product.product_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.product_type.as_str())
        .bind(to_millis(product.created_at))
        .bind(to_millis(product.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(&self, product_id: &str) -> Result<Option<ApiProduct>> {
        let row = sqlx::query(&format!("{} WHERE p.product_id = ?", SELECT_WITH_STATUS))
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(map_product).transpose()
    }

    pub async fn exists(&self, product_id: &str) -> Result<bool> {
        let found: Option<String> =
            sqlx::query_scalar("SELECT product_id FROM api_products WHERE product_id = ?")
                .bind(product_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<ApiProduct>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM api_products")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(&format!(
            "{} ORDER BY p.created_at, p.product_id LIMIT ? OFFSET ?",
            SELECT_WITH_STATUS
        ))
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let products = rows.into_iter().map(map_product).collect::<Result<_>>()?;
        Ok(Page::new(products, total as u64))
    }

    pub async fn update(
        &self,
        product_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE api_products SET \
             name = COALESCE(?, name), \
             description = COALESCE(?, description), \
             updated_at = ? \
             WHERE product_id = ?",
        )
        .bind(name)
        .bind(description)
        .bind(to_millis(chrono::Utc::now()))
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PortalError::not_found("ApiProduct", product_id));
        }
        Ok(())
    }

    pub async fn delete(&self, product_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM api_products WHERE product_id = ?")
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PortalError::not_found("ApiProduct", product_id));
        }
        Ok(())
    }
}

fn map_product(row: sqlx::sqlite::SqliteRow) -> Result<ApiProduct> {
    let has_ref: bool = row.get("has_ref");
    let has_publication: bool = row.get("has_publication");
    Ok(ApiProduct {
        product_id: row.get("product_id"),
        name: row.get("name"),
        description: row.get("description"),
        product_type: ApiProductType::parse(row.get("product_type"))?,
        status: ApiProductStatus::derive(has_ref, has_publication),
        created_at: from_millis(row.get("created_at"))?,
        updated_at: from_millis(row.get("updated_at"))?,
    })
}
