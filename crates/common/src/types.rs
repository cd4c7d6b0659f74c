use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Defines a UUID-backed identifier newtype.
///
/// Wrapping the UUID gives type safety so a lead id can never be passed
/// where a project id is expected.
macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for a supplier account.
    SupplierId
}

uuid_id! {
    /// Unique identifier for a client (person) record.
    ClientId
}

uuid_id! {
    /// Unique identifier for a lead.
    LeadId
}

uuid_id! {
    /// Unique identifier for a project.
    ProjectId
}

uuid_id! {
    /// Unique identifier for an order.
    OrderId
}

uuid_id! {
    /// Unique identifier for an order line item.
    OrderItemId
}

/// Caller-supplied key that deduplicates retried bundle submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Creates a key from any string-like value.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for IdempotencyKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IdempotencyKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(SupplierId::new(), SupplierId::new());
        assert_ne!(LeadId::new(), LeadId::new());
        assert_ne!(OrderId::new(), OrderId::new());
    }

    #[test]
    fn id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = ClientId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn id_serialization_roundtrip() {
        let id = ProjectId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: ProjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn id_serializes_as_plain_uuid_string() {
        let id = OrderId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }

    #[test]
    fn idempotency_key_from_str() {
        let key = IdempotencyKey::from("retry-1");
        assert_eq!(key.as_str(), "retry-1");
        assert_eq!(key.to_string(), "retry-1");
    }
}
