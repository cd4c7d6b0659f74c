use chrono::{DateTime, Utc};
use common::ClientId;
use serde::{Deserialize, Serialize};

/// A person record usable across leads, projects and orders.
///
/// Created by the bundle workflow only when a brand-new lead is created;
/// otherwise resolved through the selected lead's client reference.
/// Immutable inside this workflow once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Free-form role tag (e.g., "homeowner", "contractor").
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// Creates a new client record with a fresh id.
    pub fn new(full_name: impl Into<String>, email: Option<String>, phone: Option<String>) -> Self {
        Self {
            id: ClientId::new(),
            full_name: full_name.into(),
            email,
            phone,
            role: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_client_has_fresh_id() {
        let a = Client::new("Dana Cohen", None, None);
        let b = Client::new("Dana Cohen", None, None);
        assert_ne!(a.id, b.id);
        assert_eq!(a.full_name, "Dana Cohen");
    }

    #[test]
    fn test_client_serialization_roundtrip() {
        let client = Client::new("Dana Cohen", Some("dana@example.com".into()), None);
        let json = serde_json::to_string(&client).unwrap();
        let deserialized: Client = serde_json::from_str(&json).unwrap();
        assert_eq!(client, deserialized);
    }
}
