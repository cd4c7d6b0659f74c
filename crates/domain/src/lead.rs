use chrono::{DateTime, Utc};
use common::{ClientId, LeadId, SupplierId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The status of a lead in its lifecycle.
///
/// Status transitions:
/// ```text
/// New ──► Contacted ──► ProjectInProcess ──┬──► Won
///                                          └──► Lost
/// ```
///
/// The bundle workflow only ever drives `* → ProjectInProcess`, when an
/// order bundle is successfully anchored to the lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    /// Freshly imported or created, not yet worked.
    #[default]
    New,

    /// A supplier has reached out.
    Contacted,

    /// A project and order are anchored to this lead.
    ProjectInProcess,

    /// The lead converted (terminal state).
    Won,

    /// The lead was dropped (terminal state).
    Lost,
}

impl LeadStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::Won | LeadStatus::Lost)
    }

    /// Returns true if the transition to `next` is allowed.
    ///
    /// Any non-terminal status may move to `ProjectInProcess` (the anchor
    /// transition); the remaining edges follow the lifecycle above.
    pub fn can_transition_to(&self, next: LeadStatus) -> bool {
        if next == LeadStatus::ProjectInProcess {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (LeadStatus::New, LeadStatus::Contacted)
                | (LeadStatus::Contacted, LeadStatus::ProjectInProcess)
                | (LeadStatus::ProjectInProcess, LeadStatus::Won)
                | (LeadStatus::ProjectInProcess, LeadStatus::Lost)
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::ProjectInProcess => "project_in_process",
            LeadStatus::Won => "won",
            LeadStatus::Lost => "lost",
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A prospective client relationship tracked by a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub supplier_id: SupplierId,
    /// Backing client record; `None` until the lead is resolved to a person.
    pub client_id: Option<ClientId>,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: LeadStatus,
    /// Where the lead came from (e.g., "import", "referral", "bundle").
    pub source: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    /// Creates a new lead owned by `supplier_id` and linked to `client_id`.
    pub fn new(
        supplier_id: SupplierId,
        client_id: ClientId,
        display_name: impl Into<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> Self {
        Self {
            id: LeadId::new(),
            supplier_id,
            client_id: Some(client_id),
            display_name: display_name.into(),
            email,
            phone,
            status: LeadStatus::New,
            source: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Moves the lead to `next`, enforcing the status machine.
    pub fn transition_to(&mut self, next: LeadStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                entity: "Lead",
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}
