use chrono::{DateTime, Utc};
use common::{ClientId, ProjectId, SupplierId};
use serde::{Deserialize, Serialize};

use crate::address::Address;

/// The status of a project.
///
/// The bundle workflow creates projects in `InProgressPreparation` and does
/// not transition them further; later phases are driven elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Initial status for a freshly provisioned project.
    #[default]
    InProgressPreparation,

    /// Work on site has started.
    InProgress,

    /// The project finished.
    Done,

    /// The project was called off.
    Cancelled,
}

impl ProjectStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::InProgressPreparation => "in_progress_preparation",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Done => "done",
            ProjectStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A client's project, owned by the client and created by a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub client_id: ClientId,
    /// The supplier who created the project.
    pub created_by: SupplierId,
    pub title: String,
    pub status: ProjectStatus,
    pub address: Address,
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Creates a new project for `client_id`, recorded against its creator.
    pub fn new(
        client_id: ClientId,
        created_by: SupplierId,
        title: impl Into<String>,
        address: Address,
    ) -> Self {
        Self {
            id: ProjectId::new(),
            client_id,
            created_by,
            title: title.into(),
            status: ProjectStatus::InProgressPreparation,
            address,
            created_at: Utc::now(),
        }
    }
}
