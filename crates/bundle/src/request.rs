//! Bundle request types.

use chrono::NaiveDate;
use common::{IdempotencyKey, LeadId, Money, ProjectId, SupplierId};
use domain::Address;
use serde::{Deserialize, Serialize};

/// Fields for creating a brand-new lead (and its backing client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLead {
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Fields for creating a brand-new project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub title: String,
    #[serde(default)]
    pub address: Address,
}

/// Select an existing lead or create a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LeadRef {
    Select { lead_id: LeadId },
    Create { new: NewLead },
}

/// Select an existing project or create a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProjectRef {
    Select { project_id: ProjectId },
    Create { new: NewProject },
}

/// One requested order line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub qty: u32,
    pub unit_price_cents: i64,
}

impl ItemDraft {
    /// Returns the unit price as money.
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

/// The requested order header and its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub address: Address,
    pub items: Vec<ItemDraft>,
}

/// The raw create-order-bundle request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleRequest {
    pub supplier_id: SupplierId,
    pub lead: LeadRef,
    pub project: ProjectRef,
    pub order: OrderDraft,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<IdempotencyKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_ref_select_wire_format() {
        let lead_id = LeadId::new();
        let json = format!(r#"{{"mode":"select","lead_id":"{lead_id}"}}"#);
        let parsed: LeadRef = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, LeadRef::Select { lead_id });
    }

    #[test]
    fn test_lead_ref_create_wire_format() {
        let parsed: LeadRef =
            serde_json::from_str(r#"{"mode":"create","new":{"full_name":"Dana Cohen"}}"#).unwrap();
        match parsed {
            LeadRef::Create { new } => {
                assert_eq!(new.full_name, "Dana Cohen");
                assert!(new.email.is_none());
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[test]
    fn test_select_without_id_is_rejected() {
        let result: std::result::Result<ProjectRef, _> =
            serde_json::from_str(r#"{"mode":"select"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_full_request_roundtrip() {
        let request = BundleRequest {
            supplier_id: SupplierId::new(),
            lead: LeadRef::Create {
                new: NewLead {
                    full_name: "Dana Cohen".into(),
                    email: None,
                    phone: None,
                },
            },
            project: ProjectRef::Create {
                new: NewProject {
                    title: "Kitchen Remodel".into(),
                    address: Address {
                        city: Some("Haifa".into()),
                        ..Address::default()
                    },
                },
            },
            order: OrderDraft {
                title: "Cabinets".into(),
                description: None,
                start_date: None,
                end_date: None,
                address: Address::default(),
                items: vec![ItemDraft {
                    product_id: None,
                    name: "Cabinets".into(),
                    description: None,
                    qty: 2,
                    unit_price_cents: 150_000,
                }],
            },
            idempotency_key: Some("retry-1".into()),
        };

        let json = serde_json::to_string(&request).unwrap();
        let deserialized: BundleRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request, deserialized);
    }
}
