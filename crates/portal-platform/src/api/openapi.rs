//! OpenAPI Documentation
//!
//! Central OpenAPI specification for the admin APIs.

use utoipa::OpenApi;

/// Portal control-plane OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "API Portal Control Plane",
        version = "1.0.0",
        description = "REST APIs for gateway import, product linkage, portal publication and the subscription workflow"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "gateways", description = "Gateway import and resource discovery"),
        (name = "products", description = "API product management and linkage"),
        (name = "portals", description = "Developer portal management"),
        (name = "developers", description = "Developer accounts and approval"),
        (name = "consumers", description = "Consumer credentials"),
        (name = "subscriptions", description = "Product subscriptions")
    ),
    paths(
        // Gateways Admin API
        super::gateways::import_gateway,
        super::gateways::list_gateways,
        super::gateways::get_gateway,
        super::gateways::update_auth_config,
        super::gateways::delete_gateway,
        super::gateways::list_resources,
        // Products Admin API
        super::products::create_product,
        super::products::list_products,
        super::products::get_product,
        super::products::update_product,
        super::products::delete_product,
        super::products::get_ref,
        super::products::link,
        super::products::replace,
        super::products::unlink,
        super::products::list_publications,
        super::products::publish,
        super::products::unpublish,
        super::products::list_eligible_portals,
        super::products::list_subscriptions,
        // Portals Admin API
        super::portals::create_portal,
        super::portals::list_portals,
        super::portals::get_portal,
        super::portals::update_portal,
        super::portals::delete_portal,
        super::portals::register_developer,
        super::portals::list_developers,
        // Developers Admin API
        super::developers::get_developer,
        super::developers::approve_developer,
        super::developers::revoke_developer,
        super::developers::delete_developer,
        super::developers::create_consumer,
        super::developers::list_consumers,
        // Consumers & Subscriptions Admin API
        super::consumers::get_consumer,
        super::consumers::approve_consumer,
        super::consumers::delete_consumer,
        super::consumers::create_subscription,
        super::consumers::list_subscriptions,
        super::consumers::get_subscription,
        super::consumers::approve_subscription,
        super::consumers::delete_subscription,
    )
)]
pub struct PortalApiDoc;
