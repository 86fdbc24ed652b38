//! Repository Layer
//!
//! SQLite repositories for all control-plane entities. Uniqueness
//! invariants live in the schema (primary keys and unique indexes) so that
//! concurrent writers race on the constraint, not on a read-then-write
//! check. Timestamps are stored as epoch millis.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{PortalError, Result};

pub mod consumer;
pub mod gateway;
pub mod linkage;
pub mod portal;
pub mod product;

pub use consumer::ConsumerRepository;
pub use gateway::GatewayRepository;
pub use linkage::LinkageRepository;
pub use portal::PortalRepository;
pub use product::ProductRepository;

/// Create all tables and indexes. Idempotent.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(
        r#"
        CREATE TABLE IF NOT EXISTS gateways (
            gateway_id TEXT PRIMARY KEY,
            gateway_type TEXT NOT NULL,
            auth_config TEXT NOT NULL,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS api_products (
            product_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            product_type TEXT NOT NULL,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS product_refs (
            product_id TEXT PRIMARY KEY,
            gateway_id TEXT NOT NULL,
            source_type TEXT NOT NULL,
            ref_config TEXT NOT NULL,
            created_at BIGINT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_product_refs_gateway ON product_refs(gateway_id);

        CREATE TABLE IF NOT EXISTS portals (
            portal_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            auto_approve_developers INTEGER NOT NULL DEFAULT 0,
            auto_approve_subscriptions INTEGER NOT NULL DEFAULT 1,
            domains TEXT NOT NULL DEFAULT '[]',
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS product_publications (
            product_id TEXT NOT NULL,
            portal_id TEXT NOT NULL,
            auto_approve_subscription INTEGER NOT NULL,
            created_at BIGINT NOT NULL,
            PRIMARY KEY (product_id, portal_id)
        );
        CREATE INDEX IF NOT EXISTS idx_publications_portal ON product_publications(portal_id);

        CREATE TABLE IF NOT EXISTS developers (
            developer_id TEXT PRIMARY KEY,
            portal_id TEXT NOT NULL,
            username TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_developers_portal ON developers(portal_id);

        CREATE TABLE IF NOT EXISTS consumers (
            consumer_id TEXT PRIMARY KEY,
            developer_id TEXT NOT NULL,
            name TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_consumers_developer ON consumers(developer_id);

        CREATE TABLE IF NOT EXISTS subscriptions (
            subscription_id TEXT PRIMARY KEY,
            consumer_id TEXT NOT NULL,
            product_id TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL,
            UNIQUE (product_id, consumer_id)
        );
        CREATE INDEX IF NOT EXISTS idx_subscriptions_product ON subscriptions(product_id);
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub(crate) fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| PortalError::internal(format!("Invalid timestamp: {}", millis)))
}
