//! Cross-entity consistency checks.

use common::ClientId;
use domain::Project;

use crate::error::{BundleError, Result};

/// Verifies that `project` belongs to the client resolved from the lead.
///
/// Trivially true for a project created in this run (it was created with
/// the resolved client id); for a selected project the comparison is the
/// primary cross-entity invariant. Runs before any order write, so a
/// mismatch never needs order compensation.
pub fn check_same_client(client_id: ClientId, project: &Project) -> Result<()> {
    if project.client_id != client_id {
        return Err(BundleError::Conflict(format!(
            "project {} belongs to client {}, but the resolved lead's client is {client_id}",
            project.id, project.client_id
        )));
    }
    Ok(())
}
