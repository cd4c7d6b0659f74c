use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{ClientId, IdempotencyKey, LeadId, Money, OrderId, ProjectId, SupplierId};
use domain::{Client, Lead, LeadStatus, Order, OrderItem, Project};
use tokio::sync::RwLock;

use crate::actor::Actor;
use crate::error::{Result, StoreError};
use crate::idempotency::{IdempotencyBegin, InvocationRecord};
use crate::store::BundleStore;

/// Per-operation fail switches used to exercise failure paths in tests.
#[derive(Debug, Default)]
struct FailPoints {
    insert_lead: bool,
    insert_client: bool,
    insert_project: bool,
    insert_order: bool,
    insert_items: bool,
    archive: bool,
    insert_project_delay: Option<Duration>,
}

#[derive(Default)]
struct StoreState {
    leads: HashMap<LeadId, Lead>,
    clients: HashMap<ClientId, Client>,
    projects: HashMap<ProjectId, Project>,
    orders: HashMap<OrderId, Order>,
    items: HashMap<OrderId, Vec<OrderItem>>,
    archived_leads: HashSet<LeadId>,
    archived_clients: HashSet<ClientId>,
    archived_projects: HashSet<ProjectId>,
    archived_orders: HashSet<OrderId>,
    invocations: HashMap<IdempotencyKey, InvocationRecord>,
    fail: FailPoints,
}

/// In-memory persistence implementation for tests and the demo server.
///
/// Enforces the same row-level policy a production backend would: supplier
/// actors may only write rows they own, and client inserts require the
/// elevated system actor. Soft deletes hide rows from reads without
/// destroying them.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // -- Fail switches --

    /// Fails the next lead insert when set.
    pub async fn set_fail_on_insert_lead(&self, fail: bool) {
        self.state.write().await.fail.insert_lead = fail;
    }

    /// Fails the next client insert when set.
    pub async fn set_fail_on_insert_client(&self, fail: bool) {
        self.state.write().await.fail.insert_client = fail;
    }

    /// Fails the next project insert when set.
    pub async fn set_fail_on_insert_project(&self, fail: bool) {
        self.state.write().await.fail.insert_project = fail;
    }

    /// Fails the next order header insert when set.
    pub async fn set_fail_on_insert_order(&self, fail: bool) {
        self.state.write().await.fail.insert_order = fail;
    }

    /// Fails the next item batch insert when set.
    pub async fn set_fail_on_insert_items(&self, fail: bool) {
        self.state.write().await.fail.insert_items = fail;
    }

    /// Fails archive calls when set (exercises compensation failure).
    pub async fn set_fail_on_archive(&self, fail: bool) {
        self.state.write().await.fail.archive = fail;
    }

    /// Delays project inserts (exercises the per-step timeout path).
    pub async fn set_insert_project_delay(&self, delay: Duration) {
        self.state.write().await.fail.insert_project_delay = Some(delay);
    }

    // -- Inspection helpers for tests --

    /// Number of leads that are not soft-deleted.
    pub async fn active_lead_count(&self) -> usize {
        let state = self.state.read().await;
        state
            .leads
            .keys()
            .filter(|id| !state.archived_leads.contains(id))
            .count()
    }

    /// Number of clients that are not soft-deleted.
    pub async fn active_client_count(&self) -> usize {
        let state = self.state.read().await;
        state
            .clients
            .keys()
            .filter(|id| !state.archived_clients.contains(id))
            .count()
    }

    /// Number of projects that are not soft-deleted.
    pub async fn active_project_count(&self) -> usize {
        let state = self.state.read().await;
        state
            .projects
            .keys()
            .filter(|id| !state.archived_projects.contains(id))
            .count()
    }

    /// Number of orders that are not soft-deleted.
    pub async fn active_order_count(&self) -> usize {
        let state = self.state.read().await;
        state
            .orders
            .keys()
            .filter(|id| !state.archived_orders.contains(id))
            .count()
    }

    /// True if the lead row still exists, soft-deleted or not.
    pub async fn lead_row_exists(&self, id: LeadId) -> bool {
        self.state.read().await.leads.contains_key(&id)
    }

    fn authorize(actor: &Actor, owner: SupplierId, entity: &'static str) -> Result<()> {
        match actor {
            Actor::System => Ok(()),
            Actor::Supplier(id) if *id == owner => Ok(()),
            Actor::Supplier(id) => Err(StoreError::PermissionDenied(format!(
                "supplier {id} may not write {entity} rows owned by {owner}"
            ))),
        }
    }
}

#[async_trait]
impl BundleStore for InMemoryStore {
    async fn get_lead(&self, id: LeadId) -> Result<Option<Lead>> {
        let state = self.state.read().await;
        if state.archived_leads.contains(&id) {
            return Ok(None);
        }
        Ok(state.leads.get(&id).cloned())
    }

    async fn insert_lead(&self, actor: &Actor, lead: Lead) -> Result<Lead> {
        Self::authorize(actor, lead.supplier_id, "lead")?;
        let mut state = self.state.write().await;
        if state.fail.insert_lead {
            return Err(StoreError::Unavailable("lead insert failed".to_string()));
        }
        state.leads.insert(lead.id, lead.clone());
        Ok(lead)
    }

    async fn update_lead_status(
        &self,
        actor: &Actor,
        id: LeadId,
        expected: LeadStatus,
        next: LeadStatus,
    ) -> Result<Lead> {
        let mut state = self.state.write().await;
        if state.archived_leads.contains(&id) {
            return Err(StoreError::NotFound {
                entity: "lead",
                id: id.to_string(),
            });
        }
        let lead = state.leads.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "lead",
            id: id.to_string(),
        })?;
        Self::authorize(actor, lead.supplier_id, "lead")?;
        if lead.status != expected {
            return Err(StoreError::Conflict {
                entity: "lead",
                id: id.to_string(),
                detail: format!("expected status {expected}, found {}", lead.status),
            });
        }
        lead.status = next;
        Ok(lead.clone())
    }

    async fn archive_lead(&self, id: LeadId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail.archive {
            return Err(StoreError::Unavailable("archive failed".to_string()));
        }
        state.archived_leads.insert(id);
        Ok(())
    }

    async fn get_client(&self, id: ClientId) -> Result<Option<Client>> {
        let state = self.state.read().await;
        if state.archived_clients.contains(&id) {
            return Ok(None);
        }
        Ok(state.clients.get(&id).cloned())
    }

    async fn insert_client(&self, actor: &Actor, client: Client) -> Result<Client> {
        if !actor.is_system() {
            return Err(StoreError::PermissionDenied(format!(
                "client rows may only be inserted by the system actor, got {actor}"
            )));
        }
        let mut state = self.state.write().await;
        if state.fail.insert_client {
            return Err(StoreError::Unavailable("client insert failed".to_string()));
        }
        state.clients.insert(client.id, client.clone());
        Ok(client)
    }

    async fn archive_client(&self, id: ClientId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail.archive {
            return Err(StoreError::Unavailable("archive failed".to_string()));
        }
        state.archived_clients.insert(id);
        Ok(())
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>> {
        let state = self.state.read().await;
        if state.archived_projects.contains(&id) {
            return Ok(None);
        }
        Ok(state.projects.get(&id).cloned())
    }

    async fn insert_project(&self, actor: &Actor, project: Project) -> Result<Project> {
        Self::authorize(actor, project.created_by, "project")?;
        // Sleep outside the write lock so a cancelled call never wedges
        // later writes.
        let delay = self.state.read().await.fail.insert_project_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.write().await;
        if state.fail.insert_project {
            return Err(StoreError::Unavailable("project insert failed".to_string()));
        }
        state.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn archive_project(&self, id: ProjectId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail.archive {
            return Err(StoreError::Unavailable("archive failed".to_string()));
        }
        state.archived_projects.insert(id);
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        if state.archived_orders.contains(&id) {
            return Ok(None);
        }
        let Some(order) = state.orders.get(&id) else {
            return Ok(None);
        };
        // Derive the total from the item rows at read time.
        let total: Money = state
            .items
            .get(&id)
            .map(|items| items.iter().map(OrderItem::line_total).sum())
            .unwrap_or_else(Money::zero);
        let mut order = order.clone();
        order.total_amount = total;
        Ok(Some(order))
    }

    async fn insert_order(&self, actor: &Actor, order: Order) -> Result<Order> {
        Self::authorize(actor, order.supplier_id, "order")?;
        let mut state = self.state.write().await;
        if state.fail.insert_order {
            return Err(StoreError::Unavailable("order insert failed".to_string()));
        }
        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn insert_order_items(&self, actor: &Actor, items: Vec<OrderItem>) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail.insert_items {
            return Err(StoreError::Unavailable("item insert failed".to_string()));
        }
        for item in items {
            let order = state
                .orders
                .get(&item.order_id)
                .ok_or(StoreError::NotFound {
                    entity: "order",
                    id: item.order_id.to_string(),
                })?;
            Self::authorize(actor, order.supplier_id, "order_item")?;
            state.items.entry(item.order_id).or_default().push(item);
        }
        Ok(())
    }

    async fn get_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let state = self.state.read().await;
        if state.archived_orders.contains(&order_id) {
            return Ok(Vec::new());
        }
        Ok(state.items.get(&order_id).cloned().unwrap_or_default())
    }

    async fn archive_order(&self, id: OrderId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail.archive {
            return Err(StoreError::Unavailable("archive failed".to_string()));
        }
        state.archived_orders.insert(id);
        Ok(())
    }

    async fn begin_invocation(&self, key: &IdempotencyKey) -> Result<IdempotencyBegin> {
        let mut state = self.state.write().await;
        match state.invocations.get(key) {
            Some(InvocationRecord::InFlight) => Ok(IdempotencyBegin::InFlight),
            Some(InvocationRecord::Completed(result)) => {
                Ok(IdempotencyBegin::Completed(result.clone()))
            }
            None => {
                // First writer wins: the insert happens under the same lock
                // as the lookup.
                state
                    .invocations
                    .insert(key.clone(), InvocationRecord::InFlight);
                Ok(IdempotencyBegin::Started)
            }
        }
    }

    async fn complete_invocation(
        &self,
        key: &IdempotencyKey,
        result: serde_json::Value,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .invocations
            .insert(key.clone(), InvocationRecord::Completed(result));
        Ok(())
    }

    async fn clear_invocation(&self, key: &IdempotencyKey) -> Result<()> {
        let mut state = self.state.write().await;
        state.invocations.remove(key);
        Ok(())
    }
}
