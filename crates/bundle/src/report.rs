//! Result aggregation: success receipts and structured failure reports.

use common::{ClientId, LeadId, Money, OrderId, ProjectId};
use serde::{Deserialize, Serialize};

use crate::error::BundleError;
use crate::state::{BundleState, Step};

/// Reference to one entity created during a saga run, used for
/// compensation bookkeeping and operator escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityId {
    Client(ClientId),
    Lead(LeadId),
    Project(ProjectId),
    Order(OrderId),
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityId::Client(id) => write!(f, "client:{id}"),
            EntityId::Lead(id) => write!(f, "lead:{id}"),
            EntityId::Project(id) => write!(f, "project:{id}"),
            EntityId::Order(id) => write!(f, "order:{id}"),
        }
    }
}

/// The success payload of a completed bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleReceipt {
    pub order_id: OrderId,
    pub lead_id: LeadId,
    pub project_id: ProjectId,
    pub client_id: ClientId,
    /// Persistence-computed total, read back after item creation.
    pub total_amount: Money,
}

/// How a compensation pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationOutcome {
    /// Every entity created in this run was rolled back.
    Compensated,

    /// A reverse action failed; `orphaned` entities need manual reconciliation.
    Failed,
}

/// Report of the reverse actions run after a step failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationReport {
    pub outcome: CompensationOutcome,
    /// Entities successfully rolled back, in compensation order.
    pub compensated: Vec<EntityId>,
    /// Entities left behind after a failed reverse action.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orphaned: Vec<EntityId>,
}

impl CompensationReport {
    /// Returns true if orphans remain.
    pub fn has_orphans(&self) -> bool {
        !self.orphaned.is_empty()
    }
}

/// Structured failure report for a bundle that did not complete.
///
/// Names the step that failed, carries the underlying error, and, when
/// reverse actions ran, their outcome. The caller is never left guessing
/// whether partial state exists.
#[derive(Debug)]
pub struct BundleFailure {
    /// The step that failed, or `None` when the request never entered the
    /// saga (validation, authorization, idempotency rejection).
    pub step: Option<Step>,
    /// The underlying error.
    pub error: BundleError,
    /// Compensation outcome, present when at least one entity had been
    /// created before the failure.
    pub compensation: Option<CompensationReport>,
    /// Terminal saga state.
    pub state: BundleState,
}

impl BundleFailure {
    /// Failure raised before the saga started; nothing was written.
    pub fn rejected(error: BundleError) -> Self {
        Self {
            step: None,
            error,
            compensation: None,
            state: BundleState::Failed,
        }
    }

    /// Failure at `step` with nothing created in this run.
    pub fn at_step(step: Step, error: BundleError) -> Self {
        Self {
            step: Some(step),
            error,
            compensation: None,
            state: BundleState::Failed,
        }
    }

    /// Failure at `step` after reverse actions ran.
    pub fn compensated(step: Step, error: BundleError, report: CompensationReport) -> Self {
        let state = match report.outcome {
            CompensationOutcome::Compensated => BundleState::Compensated,
            CompensationOutcome::Failed => BundleState::CompensationFailed,
        };
        Self {
            step: Some(step),
            error,
            compensation: Some(report),
            state,
        }
    }
}

impl std::fmt::Display for BundleFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.step {
            Some(step) => write!(f, "bundle failed at {step}: {}", self.error)?,
            None => write!(f, "bundle rejected: {}", self.error)?,
        }
        if let Some(report) = &self.compensation {
            match report.outcome {
                CompensationOutcome::Compensated => write!(f, " (compensated)")?,
                CompensationOutcome::Failed => {
                    write!(f, " (compensation failed, orphaned: ")?;
                    for (i, id) in report.orphaned.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{id}")?;
                    }
                    write!(f, ")")?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for BundleFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_serialization_roundtrip() {
        let receipt = BundleReceipt {
            order_id: OrderId::new(),
            lead_id: LeadId::new(),
            project_id: ProjectId::new(),
            client_id: ClientId::new(),
            total_amount: Money::from_cents(300_000),
        };
        let json = serde_json::to_value(receipt).unwrap();
        let deserialized: BundleReceipt = serde_json::from_value(json).unwrap();
        assert_eq!(receipt, deserialized);
    }

    #[test]
    fn test_entity_id_display() {
        let id = ClientId::new();
        assert_eq!(EntityId::Client(id).to_string(), format!("client:{id}"));
    }

    #[test]
    fn test_compensated_failure_state() {
        let failure = BundleFailure::compensated(
            Step::ResolveProject,
            BundleError::Downstream("project insert failed".into()),
            CompensationReport {
                outcome: CompensationOutcome::Compensated,
                compensated: vec![EntityId::Lead(LeadId::new())],
                orphaned: vec![],
            },
        );
        assert_eq!(failure.state, BundleState::Compensated);
        assert!(failure.to_string().contains("resolve_project"));
    }

    #[test]
    fn test_compensation_failed_lists_orphans() {
        let lead_id = LeadId::new();
        let failure = BundleFailure::compensated(
            Step::CreateItems,
            BundleError::Downstream("item insert failed".into()),
            CompensationReport {
                outcome: CompensationOutcome::Failed,
                compensated: vec![],
                orphaned: vec![EntityId::Lead(lead_id)],
            },
        );
        assert_eq!(failure.state, BundleState::CompensationFailed);
        assert!(failure.to_string().contains(&format!("lead:{lead_id}")));
    }
}
