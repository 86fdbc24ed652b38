//! Admin REST API
//!
//! Axum routers for the platform surface. Each resource gets its own
//! router plus a small state struct holding the services it needs; the
//! server binary nests them under `/api/v1`.

pub mod common;
pub mod consumers;
pub mod developers;
pub mod gateways;
pub mod openapi;
pub mod portals;
pub mod products;

pub use common::ApiResponse;
pub use openapi::PortalApiDoc;
pub use consumers::{consumers_router, subscriptions_router, ConsumersState};
pub use developers::{developers_router, DevelopersState};
pub use gateways::{gateways_router, GatewaysState};
pub use portals::{portals_router, PortalsState};
pub use products::{products_router, ProductsState};
