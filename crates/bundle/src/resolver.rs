//! Generic two-mode entity resolution.
//!
//! One algorithm, parameterized over entity kind, used for the lead/client
//! pair and for the project: `Select` fetches an existing row and verifies
//! the caller may anchor a bundle to it; `Create` persists a new row from
//! validated fields. The `created` flag feeds compensation bookkeeping.

use async_trait::async_trait;
use common::{ClientId, LeadId, ProjectId, SupplierId};
use domain::{Client, Lead, Project};
use store::{Actor, BundleStore};

use crate::error::{BundleError, Result, Violation};
use crate::request::{NewLead, NewProject};

/// Select an existing entity by id, or create a new one from fields.
#[derive(Debug, Clone)]
pub enum EntityRef<Id, New> {
    Select(Id),
    Create(New),
}

/// A resolved entity plus whether this run created it.
#[derive(Debug, Clone)]
pub struct Resolved<E> {
    pub entity: E,
    pub created: bool,
}

/// Per-entity hooks for the two-mode resolution algorithm.
#[async_trait]
pub trait EntityResolver {
    type Id: Send;
    type New: Send;
    type Entity: Send;

    /// Fetches the entity by id, verifying existence and ownership.
    async fn fetch(&self, id: Self::Id) -> Result<Self::Entity>;

    /// Creates and persists a new entity from validated fields.
    async fn create(&self, new: Self::New) -> Result<Self::Entity>;
}

/// Resolves `entity_ref` through the resolver's hooks.
pub async fn resolve<R>(resolver: &R, entity_ref: EntityRef<R::Id, R::New>) -> Result<Resolved<R::Entity>>
where
    R: EntityResolver + Sync,
{
    match entity_ref {
        EntityRef::Select(id) => Ok(Resolved {
            entity: resolver.fetch(id).await?,
            created: false,
        }),
        EntityRef::Create(new) => Ok(Resolved {
            entity: resolver.create(new).await?,
            created: true,
        }),
    }
}

/// A lead together with its backing client record.
#[derive(Debug, Clone)]
pub struct ResolvedLead {
    pub lead: Lead,
    pub client: Client,
}

/// Resolver for the lead/client pair.
///
/// Creation is nested: a brand-new lead always gets a brand-new client
/// first, inserted as the elevated system actor because no authenticated
/// session exists yet for the client.
pub struct LeadResolver<'a, S> {
    store: &'a S,
    supplier_id: SupplierId,
}

impl<'a, S: BundleStore> LeadResolver<'a, S> {
    pub fn new(store: &'a S, supplier_id: SupplierId) -> Self {
        Self { store, supplier_id }
    }
}

#[async_trait]
impl<S: BundleStore> EntityResolver for LeadResolver<'_, S> {
    type Id = LeadId;
    type New = NewLead;
    type Entity = ResolvedLead;

    async fn fetch(&self, id: LeadId) -> Result<ResolvedLead> {
        let lead = self
            .store
            .get_lead(id)
            .await?
            .ok_or(BundleError::NotFound {
                entity: "lead",
                id: id.to_string(),
            })?;

        if lead.supplier_id != self.supplier_id {
            return Err(BundleError::Authorization(format!(
                "lead {id} is not owned by supplier {}",
                self.supplier_id
            )));
        }

        // A won or lost lead can no longer anchor a bundle.
        if lead.status.is_terminal() {
            return Err(BundleError::Conflict(format!(
                "lead {id} is {} and cannot anchor a new bundle",
                lead.status
            )));
        }

        // A lead cannot anchor an order without a client behind it.
        let client_id = lead.client_id.ok_or_else(|| {
            BundleError::Validation(vec![Violation::new(
                "lead.lead_id",
                "selected lead has no linked client",
            )])
        })?;

        let client = self
            .store
            .get_client(client_id)
            .await?
            .ok_or(BundleError::NotFound {
                entity: "client",
                id: client_id.to_string(),
            })?;

        Ok(ResolvedLead { lead, client })
    }

    async fn create(&self, new: NewLead) -> Result<ResolvedLead> {
        let client = Client::new(new.full_name.clone(), new.email.clone(), new.phone.clone());
        let client = self.store.insert_client(&Actor::System, client).await?;

        let mut lead = Lead::new(
            self.supplier_id,
            client.id,
            new.full_name,
            new.email,
            new.phone,
        );
        lead.source = Some("bundle".to_string());
        let lead = match self
            .store
            .insert_lead(&Actor::Supplier(self.supplier_id), lead)
            .await
        {
            Ok(lead) => lead,
            Err(e) => {
                // The client committed before the lead; the caller's journal
                // never sees either, so the rollback has to happen here.
                if let Err(archive_err) = self.store.archive_client(client.id).await {
                    tracing::error!(
                        client_id = %client.id,
                        error = %archive_err,
                        "failed to roll back client after lead insert failure"
                    );
                }
                return Err(e.into());
            }
        };

        Ok(ResolvedLead { lead, client })
    }
}

/// Resolver for the project, bound to the client resolved from the lead.
pub struct ProjectResolver<'a, S> {
    store: &'a S,
    supplier_id: SupplierId,
    client_id: ClientId,
}

impl<'a, S: BundleStore> ProjectResolver<'a, S> {
    pub fn new(store: &'a S, supplier_id: SupplierId, client_id: ClientId) -> Self {
        Self {
            store,
            supplier_id,
            client_id,
        }
    }
}

#[async_trait]
impl<S: BundleStore> EntityResolver for ProjectResolver<'_, S> {
    type Id = ProjectId;
    type New = NewProject;
    type Entity = Project;

    async fn fetch(&self, id: ProjectId) -> Result<Project> {
        let project = self
            .store
            .get_project(id)
            .await?
            .ok_or(BundleError::NotFound {
                entity: "project",
                id: id.to_string(),
            })?;

        if project.created_by != self.supplier_id {
            return Err(BundleError::Authorization(format!(
                "project {id} is not owned by supplier {}",
                self.supplier_id
            )));
        }

        // Client consistency is the ConsistencyChecker's concern; selection
        // only verifies existence and ownership.
        Ok(project)
    }

    async fn create(&self, new: NewProject) -> Result<Project> {
        let project = Project::new(self.client_id, self.supplier_id, new.title, new.address);
        let project = self
            .store
            .insert_project(&Actor::Supplier(self.supplier_id), project)
            .await?;
        Ok(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Address;
    use store::InMemoryStore;

    fn make_new_lead() -> NewLead {
        NewLead {
            full_name: "Dana Cohen".into(),
            email: Some("dana@example.com".into()),
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_create_lead_creates_backing_client() {
        let store = InMemoryStore::new();
        let supplier_id = SupplierId::new();
        let resolver = LeadResolver::new(&store, supplier_id);

        let resolved = resolve(&resolver, EntityRef::Create(make_new_lead()))
            .await
            .unwrap();

        assert!(resolved.created);
        let ResolvedLead { lead, client } = resolved.entity;
        assert_eq!(lead.client_id, Some(client.id));
        assert_eq!(lead.supplier_id, supplier_id);
        assert_eq!(lead.source.as_deref(), Some("bundle"));
        assert_eq!(client.full_name, "Dana Cohen");
        assert_eq!(store.active_client_count().await, 1);
        assert_eq!(store.active_lead_count().await, 1);
    }

    #[tokio::test]
    async fn test_lead_insert_failure_rolls_back_client() {
        let store = InMemoryStore::new();
        store.set_fail_on_insert_lead(true).await;
        let resolver = LeadResolver::new(&store, SupplierId::new());

        let err = resolver.create(make_new_lead()).await.unwrap_err();
        assert!(matches!(err, BundleError::Downstream(_)));
        assert_eq!(store.active_client_count().await, 0);
        assert_eq!(store.active_lead_count().await, 0);
    }

    #[tokio::test]
    async fn test_select_lead_happy_path() {
        let store = InMemoryStore::new();
        let supplier_id = SupplierId::new();
        let resolver = LeadResolver::new(&store, supplier_id);

        let created = resolver.create(make_new_lead()).await.unwrap();
        let resolved = resolve(&resolver, EntityRef::Select(created.lead.id))
            .await
            .unwrap();

        assert!(!resolved.created);
        assert_eq!(resolved.entity.lead.id, created.lead.id);
        assert_eq!(resolved.entity.client.id, created.client.id);
    }

    #[tokio::test]
    async fn test_select_missing_lead_is_not_found() {
        let store = InMemoryStore::new();
        let resolver = LeadResolver::new(&store, SupplierId::new());

        let err = resolver.fetch(LeadId::new()).await.unwrap_err();
        assert!(matches!(err, BundleError::NotFound { entity: "lead", .. }));
    }

    #[tokio::test]
    async fn test_select_foreign_lead_is_authorization_error() {
        let store = InMemoryStore::new();
        let owner = SupplierId::new();
        let owner_resolver = LeadResolver::new(&store, owner);
        let created = owner_resolver.create(make_new_lead()).await.unwrap();

        let other_resolver = LeadResolver::new(&store, SupplierId::new());
        let err = other_resolver.fetch(created.lead.id).await.unwrap_err();
        assert!(matches!(err, BundleError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_select_lead_without_client_is_validation_error() {
        let store = InMemoryStore::new();
        let supplier_id = SupplierId::new();

        let mut lead = Lead::new(supplier_id, ClientId::new(), "Dana Cohen", None, None);
        lead.client_id = None;
        let lead = store
            .insert_lead(&Actor::Supplier(supplier_id), lead)
            .await
            .unwrap();

        let resolver = LeadResolver::new(&store, supplier_id);
        let err = resolver.fetch(lead.id).await.unwrap_err();
        assert!(matches!(err, BundleError::Validation(_)));
    }

    #[tokio::test]
    async fn test_select_terminal_lead_is_conflict() {
        let store = InMemoryStore::new();
        let supplier_id = SupplierId::new();

        let mut lead = Lead::new(supplier_id, ClientId::new(), "Dana Cohen", None, None);
        lead.status = domain::LeadStatus::Lost;
        let lead = store
            .insert_lead(&Actor::Supplier(supplier_id), lead)
            .await
            .unwrap();

        let resolver = LeadResolver::new(&store, supplier_id);
        let err = resolver.fetch(lead.id).await.unwrap_err();
        assert!(matches!(err, BundleError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_project_uses_bound_client() {
        let store = InMemoryStore::new();
        let supplier_id = SupplierId::new();
        let client_id = ClientId::new();
        let resolver = ProjectResolver::new(&store, supplier_id, client_id);

        let resolved = resolve(
            &resolver,
            EntityRef::Create(NewProject {
                title: "Kitchen Remodel".into(),
                address: Address::default(),
            }),
        )
        .await
        .unwrap();

        assert!(resolved.created);
        assert_eq!(resolved.entity.client_id, client_id);
        assert_eq!(resolved.entity.created_by, supplier_id);
    }

    #[tokio::test]
    async fn test_select_foreign_project_is_authorization_error() {
        let store = InMemoryStore::new();
        let owner = SupplierId::new();
        let client_id = ClientId::new();
        let owner_resolver = ProjectResolver::new(&store, owner, client_id);
        let project = owner_resolver
            .create(NewProject {
                title: "Kitchen Remodel".into(),
                address: Address::default(),
            })
            .await
            .unwrap();

        let other_resolver = ProjectResolver::new(&store, SupplierId::new(), client_id);
        let err = other_resolver.fetch(project.id).await.unwrap_err();
        assert!(matches!(err, BundleError::Authorization(_)));
    }
}
