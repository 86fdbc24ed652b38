//! API Portal Server
//!
//! Production server for the portal control-plane REST APIs:
//! - Gateway import and resource discovery
//! - API product management, linkage and publication
//! - Developer / consumer / subscription approval workflow
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PORTAL_API_PORT` | `8080` | HTTP API port |
//! | `PORTAL_DATABASE_URL` | `sqlite://portal.db` | SQLite connection URL |
//! | `RUST_LOG` | `info` | Log level |

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use portal_platform::api::{
    consumers_router, developers_router, gateways_router, portals_router, products_router,
    subscriptions_router, ConsumersState, DevelopersState, GatewaysState, PortalApiDoc,
    PortalsState, ProductsState,
};
use portal_platform::providers::DiscoveryRouter;
use portal_platform::repository::{
    init_schema, ConsumerRepository, GatewayRepository, LinkageRepository, PortalRepository,
    ProductRepository,
};
use portal_platform::service::{
    ApprovalWorkflow, GatewayRegistry, LinkageManager, PublicationManager,
};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Starting API Portal Server");

    // Configuration from environment
    let api_port: u16 = env_or_parse("PORTAL_API_PORT", 8080);
    let database_url = env_or("PORTAL_DATABASE_URL", "sqlite://portal.db");

    // Connect to SQLite
    info!("Connecting to database: {}", database_url);
    let options = SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    init_schema(&pool).await?;

    // Initialize repositories
    let gateway_repo = Arc::new(GatewayRepository::new(pool.clone()));
    let product_repo = Arc::new(ProductRepository::new(pool.clone()));
    let linkage_repo = Arc::new(LinkageRepository::new(pool.clone()));
    let portal_repo = Arc::new(PortalRepository::new(pool.clone()));
    let consumer_repo = Arc::new(ConsumerRepository::new(pool));
    info!("Repositories initialized");

    // Initialize services
    let discovery = Arc::new(DiscoveryRouter::default());
    let registry = Arc::new(GatewayRegistry::new(gateway_repo.clone(), discovery));
    let linkage = Arc::new(LinkageManager::new(
        linkage_repo,
        gateway_repo,
        product_repo.clone(),
    ));
    let publications = Arc::new(PublicationManager::new(
        portal_repo.clone(),
        product_repo.clone(),
    ));
    let approvals = Arc::new(ApprovalWorkflow::new(
        consumer_repo,
        portal_repo.clone(),
        product_repo.clone(),
    ));
    info!("Services initialized");

    // Build API states
    let gateways_state = GatewaysState { registry };
    let products_state = ProductsState {
        products: product_repo,
        linkage,
        publications,
        approvals: approvals.clone(),
    };
    let portals_state = PortalsState {
        portals: portal_repo,
        approvals: approvals.clone(),
    };
    let developers_state = DevelopersState {
        approvals: approvals.clone(),
    };
    let consumers_state = ConsumersState { approvals };

    // Build the admin API router
    let app = Router::new()
        .nest("/api/v1/gateways", gateways_router(gateways_state))
        .nest("/api/v1/products", products_router(products_state))
        .nest("/api/v1/portals", portals_router(portals_state))
        .nest("/api/v1/developers", developers_router(developers_state))
        .nest("/api/v1/consumers", consumers_router(consumers_state.clone()))
        .nest(
            "/api/v1/subscriptions",
            subscriptions_router(consumers_state),
        )
        .route("/health", get(health_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", PortalApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start API server
    let api_addr = format!("0.0.0.0:{}", api_port);
    info!("API server listening on http://{}", api_addr);

    let listener = TcpListener::bind(&api_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API Portal Server shutdown complete");
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
