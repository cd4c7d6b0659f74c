//! Saga orchestrator for order bundle provisioning.
//!
//! Sequences the forward steps (lead/client resolution, project resolution,
//! consistency check, order header, item batch, lead anchoring), tracks
//! every entity created in the current run, and on failure walks that
//! journal in reverse to soft-delete what this run created. Entities that
//! were merely selected are never touched by compensation.

use std::future::Future;
use std::time::Duration;

use common::{IdempotencyKey, SupplierId};
use domain::LeadStatus;
use domain::order::OrderLinks;
use store::{Actor, BundleStore, IdempotencyBegin};
use uuid::Uuid;

use crate::audit::AuditSink;
use crate::consistency;
use crate::error::{BundleError, Result};
use crate::events::BundleEvent;
use crate::order::OrderCreator;
use crate::report::{
    BundleFailure, BundleReceipt, CompensationOutcome, CompensationReport, EntityId,
};
use crate::request::{BundleRequest, LeadRef, ProjectRef};
use crate::resolver::{EntityRef, LeadResolver, ProjectResolver, resolve};
use crate::state::{BundleState, Step};
use crate::validator;

/// Default bound on each saga step's persistence work.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Orchestrates the execution of order bundle sagas.
///
/// Each invocation runs as a single sequential pipeline; concurrency
/// arises only across invocations and is handled by conditional writes
/// (lead status compare-and-set, first-writer-wins idempotency ledger).
pub struct BundleOrchestrator<S, A> {
    store: S,
    audit: A,
    step_timeout: Duration,
}

impl<S, A> BundleOrchestrator<S, A>
where
    S: BundleStore,
    A: AuditSink,
{
    /// Creates a new orchestrator with the default step timeout.
    pub fn new(store: S, audit: A) -> Self {
        Self {
            store,
            audit,
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    /// Overrides the per-step timeout.
    pub fn with_step_timeout(mut self, step_timeout: Duration) -> Self {
        self.step_timeout = step_timeout;
        self
    }

    /// Executes the create-order-bundle workflow for `caller`.
    ///
    /// Validates before any write, honors the idempotency key if one is
    /// supplied, then runs the saga. Returns the success receipt or a
    /// structured failure naming the failed step and the compensation
    /// outcome.
    #[tracing::instrument(skip(self, request), fields(supplier = %caller))]
    pub async fn execute(
        &self,
        caller: SupplierId,
        request: BundleRequest,
    ) -> std::result::Result<BundleReceipt, BundleFailure> {
        metrics::counter!("bundle_executions_total").increment(1);
        let started = std::time::Instant::now();

        let request = validator::validate(caller, request)
            .map_err(BundleFailure::rejected)?
            .into_inner();

        let key = request.idempotency_key.clone();
        if let Some(key) = &key {
            if let Some(receipt) = self.check_idempotency(key).await? {
                return Ok(receipt);
            }
        }

        let result = self.run(caller, &request).await;

        metrics::histogram!("bundle_duration_seconds").record(started.elapsed().as_secs_f64());

        match result {
            Ok(receipt) => {
                if let Some(key) = &key {
                    self.record_completion(key, &receipt).await;
                }
                metrics::counter!("bundle_completed").increment(1);
                Ok(receipt)
            }
            Err(failure) => {
                // A failed run must not pin the key forever; clearing it
                // lets the caller retry with the same key.
                if let Some(key) = &key
                    && let Err(e) = self.store.clear_invocation(key).await
                {
                    tracing::warn!(%key, error = %e, "failed to clear idempotency record");
                }
                metrics::counter!("bundle_failed").increment(1);
                tracing::warn!(failure = %failure, "bundle did not complete");
                Err(failure)
            }
        }
    }

    /// Registers this invocation in the idempotency ledger.
    ///
    /// Returns a stored receipt when a prior invocation with the same key
    /// completed; fails fast when one is still in flight.
    async fn check_idempotency(
        &self,
        key: &IdempotencyKey,
    ) -> std::result::Result<Option<BundleReceipt>, BundleFailure> {
        let begin = self
            .bounded(async { self.store.begin_invocation(key).await.map_err(BundleError::from) })
            .await
            .map_err(BundleFailure::rejected)?;

        match begin {
            IdempotencyBegin::Started => Ok(None),
            IdempotencyBegin::InFlight => Err(BundleFailure::rejected(BundleError::Conflict(
                format!("in-flight: an invocation with key {key} is already running"),
            ))),
            IdempotencyBegin::Completed(value) => {
                let receipt: BundleReceipt = serde_json::from_value(value).map_err(|e| {
                    BundleFailure::rejected(BundleError::Downstream(format!(
                        "stored invocation result is unreadable: {e}"
                    )))
                })?;
                metrics::counter!("bundle_idempotent_replays_total").increment(1);
                tracing::info!(%key, "returning stored result for completed invocation");
                Ok(Some(receipt))
            }
        }
    }

    /// Persists the receipt under the idempotency key.
    async fn record_completion(&self, key: &IdempotencyKey, receipt: &BundleReceipt) {
        let value = match serde_json::to_value(receipt) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(%key, error = %e, "could not serialize receipt for ledger");
                return;
            }
        };
        // The bundle itself committed; a ledger write failure only weakens
        // replay, so it is logged rather than failing the invocation.
        if let Err(e) = self.store.complete_invocation(key, value).await {
            tracing::warn!(%key, error = %e, "failed to record completed invocation");
        }
    }

    /// Runs the forward steps of one saga.
    async fn run(
        &self,
        caller: SupplierId,
        request: &BundleRequest,
    ) -> std::result::Result<BundleReceipt, BundleFailure> {
        let run_id = Uuid::new_v4();
        let mut state = BundleState::Pending;
        let mut journal: Vec<EntityId> = Vec::new();

        self.emit(BundleEvent::started(run_id, caller)).await;

        // Step 1: resolve lead and client.
        self.emit(BundleEvent::step_started(run_id, Step::ResolveLead))
            .await;
        let lead_ref = match &request.lead {
            LeadRef::Select { lead_id } => EntityRef::Select(*lead_id),
            LeadRef::Create { new } => EntityRef::Create(new.clone()),
        };
        let lead_resolver = LeadResolver::new(&self.store, caller);
        let resolved_lead = match self.bounded(resolve(&lead_resolver, lead_ref)).await {
            Ok(resolved) => resolved,
            Err(e) => return Err(self.fail(run_id, Step::ResolveLead, e, journal).await),
        };
        let mut created_here = Vec::new();
        if resolved_lead.created {
            created_here.push(EntityId::Client(resolved_lead.entity.client.id));
            created_here.push(EntityId::Lead(resolved_lead.entity.lead.id));
            journal.extend_from_slice(&created_here);
        }
        self.emit(BundleEvent::step_completed(
            run_id,
            Step::ResolveLead,
            created_here,
        ))
        .await;
        self.advance(&mut state, BundleState::LeadResolved);

        let lead = &resolved_lead.entity.lead;
        let client_id = resolved_lead.entity.client.id;

        // Step 2: resolve project.
        self.emit(BundleEvent::step_started(run_id, Step::ResolveProject))
            .await;
        let project_ref = match &request.project {
            ProjectRef::Select { project_id } => EntityRef::Select(*project_id),
            ProjectRef::Create { new } => EntityRef::Create(new.clone()),
        };
        let project_resolver = ProjectResolver::new(&self.store, caller, client_id);
        let resolved_project = match self.bounded(resolve(&project_resolver, project_ref)).await {
            Ok(resolved) => resolved,
            Err(e) => return Err(self.fail(run_id, Step::ResolveProject, e, journal).await),
        };
        let mut created_here = Vec::new();
        if resolved_project.created {
            created_here.push(EntityId::Project(resolved_project.entity.id));
            journal.extend_from_slice(&created_here);
        }
        self.emit(BundleEvent::step_completed(
            run_id,
            Step::ResolveProject,
            created_here,
        ))
        .await;
        self.advance(&mut state, BundleState::ProjectResolved);

        let project = &resolved_project.entity;

        // Step 3: cross-entity consistency.
        self.emit(BundleEvent::step_started(run_id, Step::CheckConsistency))
            .await;
        if let Err(e) = consistency::check_same_client(client_id, project) {
            return Err(self.fail(run_id, Step::CheckConsistency, e, journal).await);
        }
        self.emit(BundleEvent::step_completed(
            run_id,
            Step::CheckConsistency,
            Vec::new(),
        ))
        .await;
        self.advance(&mut state, BundleState::Consistent);

        // Step 4: order header.
        self.emit(BundleEvent::step_started(run_id, Step::CreateOrder))
            .await;
        let creator = OrderCreator::new(&self.store, caller);
        let links = OrderLinks {
            supplier_id: caller,
            client_id,
            lead_id: lead.id,
            project_id: project.id,
        };
        let order = match self
            .bounded(creator.create_header(links, &request.order))
            .await
        {
            Ok(order) => order,
            Err(e) => return Err(self.fail(run_id, Step::CreateOrder, e, journal).await),
        };
        journal.push(EntityId::Order(order.id));
        self.emit(BundleEvent::step_completed(
            run_id,
            Step::CreateOrder,
            vec![EntityId::Order(order.id)],
        ))
        .await;
        self.advance(&mut state, BundleState::OrderCreated);

        // Step 5: item batch, then total read-back.
        self.emit(BundleEvent::step_started(run_id, Step::CreateItems))
            .await;
        let order = match self
            .bounded(async {
                creator.create_items(order.id, &request.order.items).await?;
                creator.read_back(order.id).await
            })
            .await
        {
            Ok(order) => order,
            Err(e) => return Err(self.fail(run_id, Step::CreateItems, e, journal).await),
        };
        self.emit(BundleEvent::step_completed(
            run_id,
            Step::CreateItems,
            Vec::new(),
        ))
        .await;
        self.advance(&mut state, BundleState::ItemsCreated);

        // Step 6: anchor the lead with a conditional status write. The
        // expected status is the one observed at resolution time, so a
        // racing bundle is detected instead of silently overwritten.
        self.emit(BundleEvent::step_started(run_id, Step::AnchorLead))
            .await;
        let anchor = self
            .bounded(async {
                self.store
                    .update_lead_status(
                        &Actor::Supplier(caller),
                        lead.id,
                        lead.status,
                        LeadStatus::ProjectInProcess,
                    )
                    .await
                    .map_err(BundleError::from)
            })
            .await;
        if let Err(e) = anchor {
            return Err(self.fail(run_id, Step::AnchorLead, e, journal).await);
        }
        self.emit(BundleEvent::step_completed(
            run_id,
            Step::AnchorLead,
            Vec::new(),
        ))
        .await;

        self.advance(&mut state, BundleState::Completed);
        self.emit(BundleEvent::completed(run_id, order.id, order.total_amount))
            .await;
        tracing::info!(%run_id, order_id = %order.id, total = %order.total_amount, "bundle completed");

        Ok(BundleReceipt {
            order_id: order.id,
            lead_id: lead.id,
            project_id: project.id,
            client_id,
            total_amount: order.total_amount,
        })
    }

    /// Records a step failure and, when this run created entities, walks
    /// the journal in reverse to compensate them.
    async fn fail(
        &self,
        run_id: Uuid,
        step: Step,
        error: BundleError,
        journal: Vec<EntityId>,
    ) -> BundleFailure {
        self.emit(BundleEvent::step_failed(run_id, step, error.to_string()))
            .await;
        tracing::warn!(%run_id, %step, %error, "bundle step failed");

        if journal.is_empty() {
            self.emit(BundleEvent::failed(run_id, format!("{step}: {error}")))
                .await;
            return BundleFailure::at_step(step, error);
        }

        metrics::counter!("bundle_compensations_total").increment(1);
        self.emit(BundleEvent::compensation_started(run_id, step))
            .await;
        let report = self.compensate(run_id, &journal).await;
        self.emit(BundleEvent::failed(run_id, format!("{step}: {error}")))
            .await;
        BundleFailure::compensated(step, error, report)
    }

    /// Soft-deletes the entities created in this run, newest first.
    ///
    /// Stops at the first rollback failure and reports the remaining
    /// entities as orphaned; a compensation failure is never swallowed.
    async fn compensate(&self, run_id: Uuid, journal: &[EntityId]) -> CompensationReport {
        let reverse: Vec<EntityId> = journal.iter().rev().copied().collect();
        let mut compensated = Vec::new();

        for (index, entity) in reverse.iter().enumerate() {
            let result = self
                .bounded(async {
                    match entity {
                        EntityId::Order(id) => self.store.archive_order(*id).await,
                        EntityId::Project(id) => self.store.archive_project(*id).await,
                        EntityId::Lead(id) => self.store.archive_lead(*id).await,
                        EntityId::Client(id) => self.store.archive_client(*id).await,
                    }
                    .map_err(BundleError::from)
                })
                .await;

            match result {
                Ok(()) => {
                    self.emit(BundleEvent::compensation_step_completed(run_id, *entity))
                        .await;
                    compensated.push(*entity);
                }
                Err(e) => {
                    self.emit(BundleEvent::compensation_step_failed(
                        run_id,
                        *entity,
                        e.to_string(),
                    ))
                    .await;
                    let orphaned = reverse[index..].to_vec();
                    tracing::error!(
                        %run_id,
                        entity = %entity,
                        error = %e,
                        orphan_count = orphaned.len(),
                        "compensation failed, orphans remain for manual reconciliation"
                    );
                    return CompensationReport {
                        outcome: CompensationOutcome::Failed,
                        compensated,
                        orphaned,
                    };
                }
            }
        }

        CompensationReport {
            outcome: CompensationOutcome::Compensated,
            compensated,
            orphaned: Vec::new(),
        }
    }

    /// Bounds one step's persistence work; a timeout is a step failure.
    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.step_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(BundleError::Downstream(format!(
                "persistence call exceeded {:?}",
                self.step_timeout
            ))),
        }
    }

    fn advance(&self, state: &mut BundleState, next: BundleState) {
        *state = next;
        tracing::debug!(state = %next, "saga advanced");
    }

    /// Emits one audit event, best effort.
    async fn emit(&self, event: BundleEvent) {
        if let Err(e) = self.audit.emit(event).await {
            tracing::warn!(error = %e, "audit emission failed");
        }
    }
}
