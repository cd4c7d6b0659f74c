//! Order bundle provisioning saga.
//!
//! A bundle request names a lead, a project, and an order with line items.
//! The orchestrator resolves or creates each entity in dependency order,
//! verifies cross-entity consistency, creates the order and its items, and
//! finally anchors the lead's lifecycle status. There is no cross-resource
//! transaction; a failure after the first write triggers reverse-order
//! compensation that archives everything this run created.
//!
//! Module map:
//! - [`request`]: the inbound request shape and its select/create unions
//! - [`validator`]: structural validation, gate for every write
//! - [`resolver`]: generic two-mode resolution for lead/client and project
//! - [`consistency`]: the project-belongs-to-client check
//! - [`order`]: order header, item batch, and total read-back
//! - [`orchestrator`]: step sequencing, compensation, idempotency
//! - [`state`]: saga state machine and step names
//! - [`report`]: receipts, failure reports, compensation outcomes
//! - [`events`] / [`audit`]: fire-and-forget audit trail

pub mod audit;
pub mod consistency;
pub mod error;
pub mod events;
pub mod order;
pub mod orchestrator;
pub mod report;
pub mod request;
pub mod resolver;
pub mod state;
pub mod validator;

pub use audit::{AuditError, AuditSink, InMemoryAuditSink};
pub use error::{BundleError, Violation};
pub use events::BundleEvent;
pub use orchestrator::{BundleOrchestrator, DEFAULT_STEP_TIMEOUT};
pub use report::{BundleFailure, BundleReceipt, CompensationOutcome, CompensationReport, EntityId};
pub use request::{BundleRequest, ItemDraft, LeadRef, NewLead, NewProject, OrderDraft, ProjectRef};
pub use state::{BundleState, Step};
pub use validator::{validate, ValidatedRequest};
