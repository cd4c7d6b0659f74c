//! HTTP route handlers.

pub mod bundles;
pub mod health;
pub mod metrics;
