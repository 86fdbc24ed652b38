//! Service Layer
//!
//! The workflow engine proper: gateway registry, linkage, publication, and
//! the approval state machines. Services validate before any write and
//! lean on the repository layer's constraints and transactions for
//! atomicity under concurrency.

pub mod approval;
pub mod gateway_registry;
pub mod linkage;
pub mod publication;

pub use approval::ApprovalWorkflow;
pub use gateway_registry::GatewayRegistry;
pub use linkage::LinkageManager;
pub use publication::PublicationManager;
