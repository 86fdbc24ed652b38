//! Domain Models
//!
//! Core entities of the portal control plane. Ids are prefixed strings
//! (see `portal_common::id`); statuses serialize as SCREAMING_SNAKE_CASE.

pub mod consumer;
pub mod gateway;
pub mod linkage;
pub mod portal;
pub mod product;

pub use consumer::*;
pub use gateway::*;
pub use linkage::*;
pub use portal::*;
pub use product::*;
