use thiserror::Error;

/// Errors that can occur when interacting with the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested row does not exist (or is soft-deleted).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The acting identity is not allowed to perform the write.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A conditional write lost a race: the observed state no longer holds.
    #[error("Conditional write conflict on {entity} {id}: {detail}")]
    Conflict {
        entity: &'static str,
        id: String,
        detail: String,
    },

    /// The storage backend failed or timed out.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, StoreError>;
