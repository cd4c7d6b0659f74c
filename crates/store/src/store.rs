use async_trait::async_trait;
use common::{ClientId, IdempotencyKey, LeadId, OrderId, ProjectId};
use domain::{Client, Lead, LeadStatus, Order, OrderItem, Project};

use crate::actor::Actor;
use crate::error::Result;
use crate::idempotency::IdempotencyBegin;

/// Row-level persistence API consumed by the bundle workflow.
///
/// Writes carry the [`Actor`] they run as; the implementation enforces the
/// row-level policy (a supplier may only write rows it owns, and only the
/// system actor may insert clients). Reads return `None` for soft-deleted
/// rows.
///
/// The `update_lead_status` call is conditional: it only applies if the
/// lead's current status equals `expected`, so a racing writer is detected
/// rather than silently overwritten.
#[async_trait]
pub trait BundleStore: Send + Sync {
    // -- Leads --

    /// Fetches an active lead by id.
    async fn get_lead(&self, id: LeadId) -> Result<Option<Lead>>;

    /// Inserts a new lead row.
    async fn insert_lead(&self, actor: &Actor, lead: Lead) -> Result<Lead>;

    /// Compare-and-set status update; fails with a conflict if the lead's
    /// current status is not `expected`.
    async fn update_lead_status(
        &self,
        actor: &Actor,
        id: LeadId,
        expected: LeadStatus,
        next: LeadStatus,
    ) -> Result<Lead>;

    /// Soft-deletes a lead (compensation path).
    async fn archive_lead(&self, id: LeadId) -> Result<()>;

    // -- Clients --

    /// Fetches an active client by id.
    async fn get_client(&self, id: ClientId) -> Result<Option<Client>>;

    /// Inserts a new client row. Requires the elevated system actor.
    async fn insert_client(&self, actor: &Actor, client: Client) -> Result<Client>;

    /// Soft-deletes a client (compensation path).
    async fn archive_client(&self, id: ClientId) -> Result<()>;

    // -- Projects --

    /// Fetches an active project by id.
    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>>;

    /// Inserts a new project row.
    async fn insert_project(&self, actor: &Actor, project: Project) -> Result<Project>;

    /// Soft-deletes a project (compensation path).
    async fn archive_project(&self, id: ProjectId) -> Result<()>;

    // -- Orders --

    /// Fetches an active order by id, with `total_amount` derived from its
    /// items at read time.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Inserts a new order header row.
    async fn insert_order(&self, actor: &Actor, order: Order) -> Result<Order>;

    /// Inserts all line items for an order in one batch.
    async fn insert_order_items(&self, actor: &Actor, items: Vec<OrderItem>) -> Result<()>;

    /// Fetches the active line items for an order.
    async fn get_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>>;

    /// Soft-deletes an order and its items (compensation path).
    async fn archive_order(&self, id: OrderId) -> Result<()>;

    // -- Idempotency ledger --

    /// Registers an invocation under `key` with a conditional insert.
    async fn begin_invocation(&self, key: &IdempotencyKey) -> Result<IdempotencyBegin>;

    /// Marks the invocation under `key` completed with its result payload.
    async fn complete_invocation(&self, key: &IdempotencyKey, result: serde_json::Value)
    -> Result<()>;

    /// Removes the invocation record so a failed run can be retried.
    async fn clear_invocation(&self, key: &IdempotencyKey) -> Result<()>;
}
