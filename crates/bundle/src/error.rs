//! Bundle error taxonomy.

use serde::{Deserialize, Serialize};
use store::StoreError;
use thiserror::Error;

/// One validation violation, addressable by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// The offending request field (e.g., "order.items", "lead.new.full_name").
    pub field: String,
    /// Human-readable description of the violation.
    pub message: String,
    /// Index into `order.items` when the violation concerns one item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_index: Option<usize>,
}

impl Violation {
    /// Creates a violation for a top-level field.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            item_index: None,
        }
    }

    /// Creates a violation for one order item.
    pub fn for_item(index: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            item_index: Some(index),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.item_index {
            Some(i) => write!(f, "{} (item {}): {}", self.field, i, self.message),
            None => write!(f, "{}: {}", self.field, self.message),
        }
    }
}

/// Errors raised by the bundle workflow.
///
/// Validation and authorization errors are raised before any write.
/// Downstream and conflict errors raised after a creation trigger the
/// compensation path; the compensation outcome travels separately in the
/// failure report, never inside this enum.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The request is structurally or semantically invalid. Carries every
    /// violation found, not just the first.
    #[error("Validation failed: {}", format_violations(.0))]
    Validation(Vec<Violation>),

    /// The caller's identity does not match the declared supplier, or a
    /// selected entity is owned by someone else.
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// A selected entity does not exist (or is soft-deleted).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Cross-entity mismatch, a lost conditional write, or a duplicate
    /// in-flight invocation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A persistence call failed or timed out.
    #[error("Downstream failure: {0}")]
    Downstream(String),
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl BundleError {
    /// Returns the violations if this is a validation error.
    pub fn violations(&self) -> Option<&[Violation]> {
        match self {
            BundleError::Validation(v) => Some(v),
            _ => None,
        }
    }
}

impl From<StoreError> for BundleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => BundleError::NotFound { entity, id },
            StoreError::PermissionDenied(msg) => BundleError::Authorization(msg),
            StoreError::Conflict { .. } => BundleError::Conflict(err.to_string()),
            StoreError::Unavailable(_) | StoreError::Serialization(_) => {
                BundleError::Downstream(err.to_string())
            }
        }
    }
}

/// Result type for bundle operations.
pub type Result<T> = std::result::Result<T, BundleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_all_violations() {
        let err = BundleError::Validation(vec![
            Violation::new("order.items", "must not be empty"),
            Violation::for_item(2, "qty", "must be greater than zero"),
        ]);
        let text = err.to_string();
        assert!(text.contains("order.items: must not be empty"));
        assert!(text.contains("qty (item 2): must be greater than zero"));
    }

    #[test]
    fn test_store_error_mapping() {
        let not_found = StoreError::NotFound {
            entity: "lead",
            id: "abc".into(),
        };
        assert!(matches!(
            BundleError::from(not_found),
            BundleError::NotFound { entity: "lead", .. }
        ));

        let denied = StoreError::PermissionDenied("nope".into());
        assert!(matches!(
            BundleError::from(denied),
            BundleError::Authorization(_)
        ));

        let conflict = StoreError::Conflict {
            entity: "lead",
            id: "abc".into(),
            detail: "stale status".into(),
        };
        assert!(matches!(BundleError::from(conflict), BundleError::Conflict(_)));

        let unavailable = StoreError::Unavailable("boom".into());
        assert!(matches!(
            BundleError::from(unavailable),
            BundleError::Downstream(_)
        ));
    }
}
