use thiserror::Error;

/// Errors raised by domain-level rules.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A status transition is not allowed by the entity's state machine.
    #[error("Invalid status transition: {entity} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
