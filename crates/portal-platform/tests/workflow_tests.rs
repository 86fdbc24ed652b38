//! Control-Plane Workflow Integration Tests
//!
//! End-to-end tests over the service layer backed by in-memory SQLite:
//! gateway import and deletion guards, linkage atomicity, publication
//! idempotence, and the approval state machines.

use std::sync::Arc;

use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use portal_common::{Page, PageRequest};
use portal_platform::domain::{
    ApiProduct, ApiProductStatus, ApiProductType, ApprovalStatus, Gateway, GatewayResourceRef,
    GatewayType, HigressMcpItem, Portal, PortalSettings, ResourceSelector, RestApiItem,
};
use portal_platform::error::Result;
use portal_platform::providers::{ResourceDiscovery, ResourceItem};
use portal_platform::repository::{
    init_schema, ConsumerRepository, GatewayRepository, LinkageRepository, PortalRepository,
    ProductRepository,
};
use portal_platform::service::{
    ApprovalWorkflow, GatewayRegistry, LinkageManager, PublicationManager,
};
use portal_platform::PortalError;

/// Fixed provider answers so discovery tests never touch the network.
struct StubDiscovery;

#[async_trait::async_trait]
impl ResourceDiscovery for StubDiscovery {
    async fn list_resources(
        &self,
        gateway: &Gateway,
        _page: PageRequest,
    ) -> Result<Page<ResourceItem>> {
        let items = match gateway.gateway_type {
            GatewayType::Higress => vec![
                ResourceItem::HigressMcp(HigressMcpItem {
                    mcp_server_name: "weather-mcp".to_string(),
                }),
                ResourceItem::HigressMcp(HigressMcpItem {
                    mcp_server_name: "orders-mcp".to_string(),
                }),
            ],
            GatewayType::ApigApi => vec![ResourceItem::RestApi(RestApiItem {
                api_id: "api-1".to_string(),
                api_name: "orders".to_string(),
            })],
            _ => Vec::new(),
        };
        let total = items.len() as u64;
        Ok(Page::new(items, total))
    }
}

struct TestEnv {
    registry: Arc<GatewayRegistry>,
    linkage: Arc<LinkageManager>,
    publications: Arc<PublicationManager>,
    approvals: Arc<ApprovalWorkflow>,
    products: Arc<ProductRepository>,
    portals: Arc<PortalRepository>,
    refs: Arc<LinkageRepository>,
}

async fn test_env() -> TestEnv {
    let pool: SqlitePool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_schema(&pool).await.unwrap();

    let gateway_repo = Arc::new(GatewayRepository::new(pool.clone()));
    let product_repo = Arc::new(ProductRepository::new(pool.clone()));
    let linkage_repo = Arc::new(LinkageRepository::new(pool.clone()));
    let portal_repo = Arc::new(PortalRepository::new(pool.clone()));
    let consumer_repo = Arc::new(ConsumerRepository::new(pool));

    TestEnv {
        registry: Arc::new(GatewayRegistry::new(
            gateway_repo.clone(),
            Arc::new(StubDiscovery),
        )),
        linkage: Arc::new(LinkageManager::new(
            linkage_repo.clone(),
            gateway_repo,
            product_repo.clone(),
        )),
        publications: Arc::new(PublicationManager::new(
            portal_repo.clone(),
            product_repo.clone(),
        )),
        approvals: Arc::new(ApprovalWorkflow::new(
            consumer_repo,
            portal_repo.clone(),
            product_repo.clone(),
        )),
        products: product_repo,
        portals: portal_repo,
        refs: linkage_repo,
    }
}

impl TestEnv {
    async fn higress_gateway(&self) -> Gateway {
        self.registry
            .import_gateway(
                GatewayType::Higress,
                json!({"address": "http://higress:8001", "username": "admin", "password": "pw"}),
            )
            .await
            .unwrap()
    }

    async fn product(&self) -> ApiProduct {
        let product = ApiProduct::new("weather", ApiProductType::McpServer);
        self.products.insert(&product).await.unwrap();
        product
    }

    async fn portal(&self, name: &str, settings: PortalSettings) -> Portal {
        let portal = Portal::new(name).with_settings(settings);
        self.portals.insert(&portal).await.unwrap();
        portal
    }

    async fn manual_portal(&self, name: &str) -> Portal {
        self.portal(
            name,
            PortalSettings {
                auto_approve_developers: false,
                auto_approve_subscriptions: false,
            },
        )
        .await
    }
}

mod gateway_tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_auth_config_imports_nothing() {
        let env = test_env().await;
        let err = env
            .registry
            .import_gateway(GatewayType::Higress, json!({"address": "http://higress:8001"}))
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Validation { .. }));

        let page = env.registry.list_gateways(PageRequest::default()).await.unwrap();
        assert_eq!(page.total_elements, 0);
    }

    #[tokio::test]
    async fn test_discovery_answers_through_the_gateway_type() {
        let env = test_env().await;
        let gateway = env.higress_gateway().await;

        let page = env
            .registry
            .list_resources(&gateway.gateway_id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_elements, 2);
        assert!(matches!(page.content[0], ResourceItem::HigressMcp(_)));
    }

    #[tokio::test]
    async fn test_delete_refused_while_referenced() {
        let env = test_env().await;
        let gateway = env.higress_gateway().await;
        let product = env.product().await;

        env.linkage
            .link(
                &product.product_id,
                &gateway.gateway_id,
                json!({"mcpServerName": "weather-mcp"}),
            )
            .await
            .unwrap();

        let err = env.registry.delete_gateway(&gateway.gateway_id).await.unwrap_err();
        match err {
            PortalError::Conflict { blocking, .. } => {
                assert_eq!(blocking, vec![product.product_id.clone()]);
            }
            other => panic!("expected Conflict, got {:?}", other),
        }

        // Unlink frees the gateway for deletion.
        env.linkage.unlink(&product.product_id).await.unwrap();
        env.registry.delete_gateway(&gateway.gateway_id).await.unwrap();

        let err = env.registry.get_gateway(&gateway.gateway_id).await.unwrap_err();
        assert!(matches!(err, PortalError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_auth_config_revalidates() {
        let env = test_env().await;
        let gateway = env.higress_gateway().await;

        let err = env
            .registry
            .update_auth_config(&gateway.gateway_id, json!({"address": ""}))
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Validation { .. }));

        let updated = env
            .registry
            .update_auth_config(
                &gateway.gateway_id,
                json!({"address": "http://higress:8002", "username": "admin", "password": "pw2"}),
            )
            .await
            .unwrap();
        assert_eq!(updated.auth_config.endpoint_hint(), "http://higress:8002");
    }
}

mod linkage_tests {
    use super::*;

    #[tokio::test]
    async fn test_double_link_conflicts() {
        let env = test_env().await;
        let gateway = env.higress_gateway().await;
        let product = env.product().await;

        env.linkage
            .link(
                &product.product_id,
                &gateway.gateway_id,
                json!({"mcpServerName": "weather-mcp"}),
            )
            .await
            .unwrap();

        let err = env
            .linkage
            .link(
                &product.product_id,
                &gateway.gateway_id,
                json!({"mcpServerName": "orders-mcp"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_selector_must_match_gateway_type() {
        let env = test_env().await;
        let gateway = env.higress_gateway().await;
        let product = env.product().await;

        // A RestAPIItem payload is rejected against a Higress gateway.
        let err = env
            .linkage
            .link(
                &product.product_id,
                &gateway.gateway_id,
                json!({"apiId": "api-1", "apiName": "orders"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Validation { .. }));

        let re = env.linkage.get_ref(&product.product_id).await.unwrap();
        assert!(re.is_none());
    }

    #[tokio::test]
    async fn test_failed_replace_leaves_old_ref() {
        let env = test_env().await;
        let gateway = env.higress_gateway().await;
        let product = env.product().await;

        env.linkage
            .link(
                &product.product_id,
                &gateway.gateway_id,
                json!({"mcpServerName": "weather-mcp"}),
            )
            .await
            .unwrap();

        let err = env
            .linkage
            .replace(&product.product_id, "gw-missing", json!({"mcpServerName": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::NotFound { .. }));

        // The original ref is intact.
        let re = env.linkage.get_ref(&product.product_id).await.unwrap().unwrap();
        assert_eq!(re.gateway_id, gateway.gateway_id);

        // A valid replace swaps it.
        env.linkage
            .replace(
                &product.product_id,
                &gateway.gateway_id,
                json!({"mcpServerName": "orders-mcp"}),
            )
            .await
            .unwrap();
        let re = env.linkage.get_ref(&product.product_id).await.unwrap().unwrap();
        assert_eq!(
            re.resource_selector.to_json().unwrap(),
            json!({"mcpServerName": "orders-mcp"}).to_string()
        );
    }

    #[tokio::test]
    async fn test_ref_write_refused_after_gateway_deletion() {
        let env = test_env().await;
        let gateway = env.higress_gateway().await;
        let product = env.product().await;

        env.registry.delete_gateway(&gateway.gateway_id).await.unwrap();

        // A ref write that raced the deletion is refused inside the insert
        // transaction, so no dangling row lands.
        let selector = ResourceSelector::for_gateway_type(
            GatewayType::Higress,
            json!({"mcpServerName": "weather-mcp"}),
        )
        .unwrap();
        let re = GatewayResourceRef::new(&product.product_id, &gateway.gateway_id, selector);
        let err = env.refs.insert(&re).await.unwrap_err();
        assert!(matches!(err, PortalError::NotFound { .. }));
        let err = env.refs.replace(&re).await.unwrap_err();
        assert!(matches!(err, PortalError::NotFound { .. }));

        assert!(env.linkage.get_ref(&product.product_id).await.unwrap().is_none());

        // The product is not stuck on the dead gateway.
        let fresh = env.higress_gateway().await;
        env.linkage
            .link(
                &product.product_id,
                &fresh.gateway_id,
                json!({"mcpServerName": "weather-mcp"}),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unlink_is_idempotent() {
        let env = test_env().await;
        let product = env.product().await;
        env.linkage.unlink(&product.product_id).await.unwrap();
        env.linkage.unlink(&product.product_id).await.unwrap();
    }
}

mod publication_tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_publish_conflicts_and_unpublish_is_idempotent() {
        let env = test_env().await;
        let product = env.product().await;
        let portal = env.portal("main", PortalSettings::default()).await;

        env.publications
            .publish(&product.product_id, &portal.portal_id)
            .await
            .unwrap();
        let err = env
            .publications
            .publish(&product.product_id, &portal.portal_id)
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Conflict { .. }));

        env.publications
            .unpublish(&product.product_id, &portal.portal_id)
            .await
            .unwrap();
        env.publications
            .unpublish(&product.product_id, &portal.portal_id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_eligible_portals_disjoint_from_publications() {
        let env = test_env().await;
        let product = env.product().await;
        let portal_a = env.portal("portal-a", PortalSettings::default()).await;
        let portal_b = env.portal("portal-b", PortalSettings::default()).await;

        env.publications
            .publish(&product.product_id, &portal_a.portal_id)
            .await
            .unwrap();

        let eligible = env
            .publications
            .list_eligible_portals(&product.product_id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(eligible.total_elements, 1);
        assert_eq!(eligible.content[0].portal_id, portal_b.portal_id);

        let published = env
            .publications
            .list_publications(&product.product_id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(published.total_elements, 1);
        assert_eq!(published.content[0].portal_id, portal_a.portal_id);
    }

    #[tokio::test]
    async fn test_eligible_pages_union_covers_every_unpublished_portal() {
        let env = test_env().await;
        let product = env.product().await;
        let portal_a = env.portal("portal-a", PortalSettings::default()).await;
        let portal_b = env.portal("portal-b", PortalSettings::default()).await;
        let portal_c = env.portal("portal-c", PortalSettings::default()).await;

        env.publications
            .publish(&product.product_id, &portal_a.portal_id)
            .await
            .unwrap();

        // Walk the eligible listing one row per page; the union over pages
        // must be exactly the unpublished portals, with no repeats or gaps.
        let mut eligible_ids = std::collections::BTreeSet::new();
        let mut page = 1;
        loop {
            let chunk = env
                .publications
                .list_eligible_portals(&product.product_id, PageRequest::new(page, 1))
                .await
                .unwrap();
            assert_eq!(chunk.total_elements, 2);
            if chunk.content.is_empty() {
                break;
            }
            for portal in chunk.content {
                assert!(eligible_ids.insert(portal.portal_id));
            }
            page += 1;
        }

        let expected: std::collections::BTreeSet<_> =
            [portal_b.portal_id.clone(), portal_c.portal_id.clone()]
                .into_iter()
                .collect();
        assert_eq!(eligible_ids, expected);
        assert!(!eligible_ids.contains(&portal_a.portal_id));
    }

    #[tokio::test]
    async fn test_product_status_follows_relations() {
        let env = test_env().await;
        let gateway = env.higress_gateway().await;
        let product = env.product().await;
        let portal = env.portal("main", PortalSettings::default()).await;

        let load = |id: String| {
            let repo = env.products.clone();
            async move { repo.find_by_id(&id).await.unwrap().unwrap().status }
        };

        assert_eq!(load(product.product_id.clone()).await, ApiProductStatus::Pending);

        env.linkage
            .link(
                &product.product_id,
                &gateway.gateway_id,
                json!({"mcpServerName": "weather-mcp"}),
            )
            .await
            .unwrap();
        assert_eq!(load(product.product_id.clone()).await, ApiProductStatus::Ready);

        env.publications
            .publish(&product.product_id, &portal.portal_id)
            .await
            .unwrap();
        assert_eq!(
            load(product.product_id.clone()).await,
            ApiProductStatus::Published
        );

        // A publication keeps the product PUBLISHED even without a ref.
        env.linkage.unlink(&product.product_id).await.unwrap();
        assert_eq!(
            load(product.product_id.clone()).await,
            ApiProductStatus::Published
        );
    }
}

mod approval_tests {
    use super::*;

    #[tokio::test]
    async fn test_developer_state_machine() {
        let env = test_env().await;
        let portal = env.manual_portal("manual").await;

        let developer = env
            .approvals
            .register_developer(&portal.portal_id, "alice")
            .await
            .unwrap();
        assert_eq!(developer.status, ApprovalStatus::Pending);

        env.approvals.approve_developer(&developer.developer_id).await.unwrap();
        let err = env
            .approvals
            .approve_developer(&developer.developer_id)
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Conflict { .. }));

        env.approvals.revoke_developer(&developer.developer_id).await.unwrap();
        let developer = env.approvals.get_developer(&developer.developer_id).await.unwrap();
        assert_eq!(developer.status, ApprovalStatus::Pending);
    }

    #[tokio::test]
    async fn test_auto_approve_developers_takes_effect_at_registration() {
        let env = test_env().await;
        let portal = env
            .portal(
                "open",
                PortalSettings {
                    auto_approve_developers: true,
                    auto_approve_subscriptions: false,
                },
            )
            .await;

        let developer = env
            .approvals
            .register_developer(&portal.portal_id, "bob")
            .await
            .unwrap();
        assert_eq!(developer.status, ApprovalStatus::Approved);
    }

    #[tokio::test]
    async fn test_consumers_always_start_pending() {
        let env = test_env().await;
        let portal = env
            .portal(
                "open",
                PortalSettings {
                    auto_approve_developers: true,
                    auto_approve_subscriptions: true,
                },
            )
            .await;
        let developer = env
            .approvals
            .register_developer(&portal.portal_id, "carol")
            .await
            .unwrap();

        let consumer = env
            .approvals
            .create_consumer(&developer.developer_id, "carol-app")
            .await
            .unwrap();
        assert_eq!(consumer.status, ApprovalStatus::Pending);

        env.approvals.approve_consumer(&consumer.consumer_id).await.unwrap();
        let consumer = env.approvals.get_consumer(&consumer.consumer_id).await.unwrap();
        assert_eq!(consumer.status, ApprovalStatus::Approved);
    }

    #[tokio::test]
    async fn test_subscription_auto_approval_policy() {
        let env = test_env().await;
        let product = env.product().await;

        // Portal auto-approves subscriptions: subscription starts APPROVED.
        let open_portal = env.portal("open", PortalSettings::default()).await;
        let developer = env
            .approvals
            .register_developer(&open_portal.portal_id, "dave")
            .await
            .unwrap();
        let consumer = env
            .approvals
            .create_consumer(&developer.developer_id, "dave-app")
            .await
            .unwrap();
        let subscription = env
            .approvals
            .create_subscription(&consumer.consumer_id, &product.product_id)
            .await
            .unwrap();
        assert_eq!(subscription.status, ApprovalStatus::Approved);

        // Manual portal without an auto-approving publication: PENDING.
        let manual_portal = env.manual_portal("manual").await;
        env.publications
            .publish(&product.product_id, &manual_portal.portal_id)
            .await
            .unwrap();
        let developer = env
            .approvals
            .register_developer(&manual_portal.portal_id, "erin")
            .await
            .unwrap();
        let consumer = env
            .approvals
            .create_consumer(&developer.developer_id, "erin-app")
            .await
            .unwrap();
        let subscription = env
            .approvals
            .create_subscription(&consumer.consumer_id, &product.product_id)
            .await
            .unwrap();
        assert_eq!(subscription.status, ApprovalStatus::Pending);

        env.approvals
            .approve_subscription(&subscription.subscription_id)
            .await
            .unwrap();
        // Approval is monotonic; a second approve is a Conflict.
        let err = env
            .approvals
            .approve_subscription(&subscription.subscription_id)
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_one_subscription_per_product_and_consumer() {
        let env = test_env().await;
        let product = env.product().await;
        let portal = env.portal("open", PortalSettings::default()).await;
        let developer = env
            .approvals
            .register_developer(&portal.portal_id, "frank")
            .await
            .unwrap();
        let consumer = env
            .approvals
            .create_consumer(&developer.developer_id, "frank-app")
            .await
            .unwrap();

        env.approvals
            .create_subscription(&consumer.consumer_id, &product.product_id)
            .await
            .unwrap();
        let err = env
            .approvals
            .create_subscription(&consumer.consumer_id, &product.product_id)
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_subscriptions_survive_unpublish() {
        let env = test_env().await;
        let product = env.product().await;
        let portal = env.portal("open", PortalSettings::default()).await;
        let developer = env
            .approvals
            .register_developer(&portal.portal_id, "grace")
            .await
            .unwrap();
        let consumer = env
            .approvals
            .create_consumer(&developer.developer_id, "grace-app")
            .await
            .unwrap();

        env.publications
            .publish(&product.product_id, &portal.portal_id)
            .await
            .unwrap();
        let subscription = env
            .approvals
            .create_subscription(&consumer.consumer_id, &product.product_id)
            .await
            .unwrap();

        env.publications
            .unpublish(&product.product_id, &portal.portal_id)
            .await
            .unwrap();

        let kept = env
            .approvals
            .get_subscription(&subscription.subscription_id)
            .await
            .unwrap();
        assert_eq!(kept.status, subscription.status);
    }
}
