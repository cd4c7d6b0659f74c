//! Persistence API for the order bundle workflow.
//!
//! The workflow talks to storage through the [`BundleStore`] trait: row-level
//! CRUD for the five entity kinds, conditional (compare-and-set) lead status
//! updates, soft deletes used for saga compensation, and a durable
//! idempotency ledger with first-writer-wins semantics.
//!
//! [`InMemoryStore`] implements the trait for tests and the demo server,
//! with injectable fail points to exercise failure and compensation paths.

pub mod actor;
pub mod error;
pub mod idempotency;
pub mod memory;
pub mod store;

pub use actor::Actor;
pub use error::{Result, StoreError};
pub use idempotency::IdempotencyBegin;
pub use memory::InMemoryStore;
pub use store::BundleStore;
