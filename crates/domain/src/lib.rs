//! Domain layer for the order bundle workflow.
//!
//! Holds the entity records a bundle links together (lead, client, project,
//! order with its items), their status enums with explicit transition rules,
//! and the shared [`Address`] value object.

pub mod address;
pub mod client;
pub mod error;
pub mod lead;
pub mod order;
pub mod project;

pub use address::Address;
pub use client::Client;
pub use error::DomainError;
pub use lead::{Lead, LeadStatus};
pub use order::{Order, OrderItem, OrderStatus};
pub use project::{Project, ProjectStatus};
