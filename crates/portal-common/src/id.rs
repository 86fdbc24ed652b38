//! Prefixed entity id generation.
//!
//! Ids are a short type prefix plus a random UUID (simple format), e.g.
//! `product-7f9c0a…`. The prefix makes ids self-describing in logs and
//! foreign-key columns.

use uuid::Uuid;

pub const PORTAL: &str = "portal";
pub const PRODUCT: &str = "product";
pub const DEVELOPER: &str = "dev";
pub const CONSUMER: &str = "consumer";
pub const SUBSCRIPTION: &str = "sub";

pub fn generate(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

pub fn portal_id() -> String {
    generate(PORTAL)
}

pub fn product_id() -> String {
    generate(PRODUCT)
}

pub fn developer_id() -> String {
    generate(DEVELOPER)
}

pub fn consumer_id() -> String {
    generate(CONSUMER)
}

pub fn subscription_id() -> String {
    generate(SUBSCRIPTION)
}

/// Gateway ids are prefixed by their provider type, e.g. `higress-…`.
pub fn gateway_id(provider_prefix: &str) -> String {
    generate(provider_prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_applied() {
        let id = product_id();
        assert!(id.starts_with("product-"));
        assert_eq!(id.len(), "product-".len() + 32);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(portal_id(), portal_id());
    }
}
