//! Shared types for the order bundle workflow.

mod money;
mod types;

pub use money::Money;
pub use types::{ClientId, IdempotencyKey, LeadId, OrderId, OrderItemId, ProjectId, SupplierId};
