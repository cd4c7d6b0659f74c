//! Bundle saga state machine.

use serde::{Deserialize, Serialize};

/// The forward steps of the bundle saga, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Resolve or create the lead (and its backing client).
    ResolveLead,

    /// Resolve or create the project.
    ResolveProject,

    /// Verify the project belongs to the resolved client.
    CheckConsistency,

    /// Create the order header.
    CreateOrder,

    /// Create the order's line items in one batch.
    CreateItems,

    /// Drive the lead to `project_in_process` with a conditional write.
    AnchorLead,
}

impl Step {
    /// Returns the step name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::ResolveLead => "resolve_lead",
            Step::ResolveProject => "resolve_project",
            Step::CheckConsistency => "check_consistency",
            Step::CreateOrder => "create_order",
            Step::CreateItems => "create_items",
            Step::AnchorLead => "anchor_lead",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The state of a bundle saga in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──► LeadResolved ──► ProjectResolved ──► Consistent
///     ──► OrderCreated ──► ItemsCreated ──► Completed
///
/// any non-terminal ──► Failed                       (nothing created)
/// any non-terminal ──► Compensating ──┬──► Compensated
///                                     └──► CompensationFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BundleState {
    /// Validated, nothing resolved yet.
    #[default]
    Pending,

    /// Lead (and client) resolved or created.
    LeadResolved,

    /// Project resolved or created.
    ProjectResolved,

    /// Cross-entity invariant verified.
    Consistent,

    /// Order header committed.
    OrderCreated,

    /// All line items committed.
    ItemsCreated,

    /// Saga finished successfully (terminal state).
    Completed,

    /// Saga failed with nothing to undo (terminal state).
    Failed,

    /// A step failed after creations; reverse actions are running.
    Compensating,

    /// Every entity created in this run was rolled back (terminal state).
    Compensated,

    /// A reverse action itself failed; orphans remain (terminal state).
    CompensationFailed,
}

impl BundleState {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BundleState::Completed
                | BundleState::Failed
                | BundleState::Compensated
                | BundleState::CompensationFailed
        )
    }

    /// Returns true if reverse actions are in progress.
    pub fn is_compensating(&self) -> bool {
        matches!(self, BundleState::Compensating)
    }

    /// Returns true if the saga ended without leaving active entities from
    /// this run behind.
    pub fn is_clean_failure(&self) -> bool {
        matches!(self, BundleState::Failed | BundleState::Compensated)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleState::Pending => "pending",
            BundleState::LeadResolved => "lead_resolved",
            BundleState::ProjectResolved => "project_resolved",
            BundleState::Consistent => "consistent",
            BundleState::OrderCreated => "order_created",
            BundleState::ItemsCreated => "items_created",
            BundleState::Completed => "completed",
            BundleState::Failed => "failed",
            BundleState::Compensating => "compensating",
            BundleState::Compensated => "compensated",
            BundleState::CompensationFailed => "compensation_failed",
        }
    }
}

impl std::fmt::Display for BundleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
