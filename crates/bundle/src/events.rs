//! Audit events emitted by the saga, one per committed transition.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, SupplierId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::report::EntityId;
use crate::state::Step;

/// Events describing one bundle saga run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum BundleEvent {
    /// Saga execution started.
    BundleStarted(BundleStartedData),

    /// A forward step started execution.
    StepStarted(StepData),

    /// A forward step completed; lists entities it created, if any.
    StepCompleted(StepCompletedData),

    /// A forward step failed.
    StepFailed(StepFailedData),

    /// Compensation started after a step failure.
    CompensationStarted(CompensationData),

    /// One entity was rolled back.
    CompensationStepCompleted(CompensationStepData),

    /// A rollback attempt failed; remaining entities are orphaned.
    CompensationStepFailed(CompensationStepFailedData),

    /// Saga completed successfully.
    BundleCompleted(BundleCompletedData),

    /// Saga ended in failure.
    BundleFailed(BundleFailedData),
}

impl BundleEvent {
    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            BundleEvent::BundleStarted(_) => "BundleStarted",
            BundleEvent::StepStarted(_) => "StepStarted",
            BundleEvent::StepCompleted(_) => "StepCompleted",
            BundleEvent::StepFailed(_) => "StepFailed",
            BundleEvent::CompensationStarted(_) => "CompensationStarted",
            BundleEvent::CompensationStepCompleted(_) => "CompensationStepCompleted",
            BundleEvent::CompensationStepFailed(_) => "CompensationStepFailed",
            BundleEvent::BundleCompleted(_) => "BundleCompleted",
            BundleEvent::BundleFailed(_) => "BundleFailed",
        }
    }

    /// Returns the saga run this event belongs to.
    pub fn run_id(&self) -> Uuid {
        match self {
            BundleEvent::BundleStarted(data) => data.run_id,
            BundleEvent::StepStarted(data) => data.run_id,
            BundleEvent::StepCompleted(data) => data.run_id,
            BundleEvent::StepFailed(data) => data.run_id,
            BundleEvent::CompensationStarted(data) => data.run_id,
            BundleEvent::CompensationStepCompleted(data) => data.run_id,
            BundleEvent::CompensationStepFailed(data) => data.run_id,
            BundleEvent::BundleCompleted(data) => data.run_id,
            BundleEvent::BundleFailed(data) => data.run_id,
        }
    }
}

/// Data for BundleStarted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleStartedData {
    pub run_id: Uuid,
    pub supplier_id: SupplierId,
    pub started_at: DateTime<Utc>,
}

/// Data for StepStarted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepData {
    pub run_id: Uuid,
    pub step: Step,
}

/// Data for StepCompleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepCompletedData {
    pub run_id: Uuid,
    pub step: Step,
    /// Entities created by this step, in creation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub created: Vec<EntityId>,
}

/// Data for StepFailed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepFailedData {
    pub run_id: Uuid,
    pub step: Step,
    pub error: String,
}

/// Data for CompensationStarted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationData {
    pub run_id: Uuid,
    pub from_step: Step,
}

/// Data for CompensationStepCompleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationStepData {
    pub run_id: Uuid,
    pub entity: EntityId,
}

/// Data for CompensationStepFailed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationStepFailedData {
    pub run_id: Uuid,
    pub entity: EntityId,
    pub error: String,
}

/// Data for BundleCompleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleCompletedData {
    pub run_id: Uuid,
    pub order_id: OrderId,
    pub total_amount: Money,
    pub completed_at: DateTime<Utc>,
}

/// Data for BundleFailed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleFailedData {
    pub run_id: Uuid,
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

// Convenience constructors
impl BundleEvent {
    pub fn started(run_id: Uuid, supplier_id: SupplierId) -> Self {
        BundleEvent::BundleStarted(BundleStartedData {
            run_id,
            supplier_id,
            started_at: Utc::now(),
        })
    }

    pub fn step_started(run_id: Uuid, step: Step) -> Self {
        BundleEvent::StepStarted(StepData { run_id, step })
    }

    pub fn step_completed(run_id: Uuid, step: Step, created: Vec<EntityId>) -> Self {
        BundleEvent::StepCompleted(StepCompletedData {
            run_id,
            step,
            created,
        })
    }

    pub fn step_failed(run_id: Uuid, step: Step, error: impl Into<String>) -> Self {
        BundleEvent::StepFailed(StepFailedData {
            run_id,
            step,
            error: error.into(),
        })
    }

    pub fn compensation_started(run_id: Uuid, from_step: Step) -> Self {
        BundleEvent::CompensationStarted(CompensationData { run_id, from_step })
    }

    pub fn compensation_step_completed(run_id: Uuid, entity: EntityId) -> Self {
        BundleEvent::CompensationStepCompleted(CompensationStepData { run_id, entity })
    }

    pub fn compensation_step_failed(run_id: Uuid, entity: EntityId, error: impl Into<String>) -> Self {
        BundleEvent::CompensationStepFailed(CompensationStepFailedData {
            run_id,
            entity,
            error: error.into(),
        })
    }

    pub fn completed(run_id: Uuid, order_id: OrderId, total_amount: Money) -> Self {
        BundleEvent::BundleCompleted(BundleCompletedData {
            run_id,
            order_id,
            total_amount,
            completed_at: Utc::now(),
        })
    }

    pub fn failed(run_id: Uuid, reason: impl Into<String>) -> Self {
        BundleEvent::BundleFailed(BundleFailedData {
            run_id,
            reason: reason.into(),
            failed_at: Utc::now(),
        })
    }
}
