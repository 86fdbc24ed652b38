//! API Portal Platform
//!
//! Control plane for an API developer portal:
//! - Gateway import and heterogeneous resource discovery
//! - API product to gateway-resource linkage (single active ref)
//! - Product to portal publication (many-to-many)
//! - Developer / consumer / subscription approval workflow

pub mod api;
pub mod domain;
pub mod error;
pub mod providers;
pub mod repository;
pub mod service;

pub use domain::*;
pub use error::PortalError;
