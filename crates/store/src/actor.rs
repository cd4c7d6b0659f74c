use common::SupplierId;
use serde::{Deserialize, Serialize};

/// The identity a persistence call runs as.
///
/// Almost every write in the bundle workflow runs as the requesting
/// supplier. The one exception is the nested client creation: a brand-new
/// client has no authenticated session yet, so that single insert runs as
/// [`Actor::System`]. The elevated capability is never carried by the rest
/// of the saga.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    /// A supplier acting on rows it owns.
    Supplier(SupplierId),

    /// The elevated system identity.
    System,
}

impl Actor {
    /// Returns true for the elevated system identity.
    pub fn is_system(&self) -> bool {
        matches!(self, Actor::System)
    }

    /// Returns the supplier id, if this is a supplier actor.
    pub fn supplier_id(&self) -> Option<SupplierId> {
        match self {
            Actor::Supplier(id) => Some(*id),
            Actor::System => None,
        }
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::Supplier(id) => write!(f, "supplier:{id}"),
            Actor::System => write!(f, "system"),
        }
    }
}
