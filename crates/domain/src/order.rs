use chrono::{DateTime, NaiveDate, Utc};
use common::{ClientId, LeadId, Money, OrderId, OrderItemId, ProjectId, SupplierId};
use serde::{Deserialize, Serialize};

use crate::address::Address;

/// The status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Initial status for a freshly provisioned order.
    #[default]
    Pending,

    /// The client approved the order.
    Approved,

    /// The order was called off.
    Cancelled,
}

impl OrderStatus {
    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The terminal artifact of a bundle: an order linking supplier, client,
/// lead and project.
///
/// `total_amount` is derived by the persistence layer from the order's
/// items; the workflow never sets it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub supplier_id: SupplierId,
    pub client_id: ClientId,
    pub lead_id: LeadId,
    pub project_id: ProjectId,
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub address: Address,
    pub status: OrderStatus,
    /// Sum of item line totals, owned by the storage layer.
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
}

/// Links the order header to all four upstream entities.
#[derive(Debug, Clone, Copy)]
pub struct OrderLinks {
    pub supplier_id: SupplierId,
    pub client_id: ClientId,
    pub lead_id: LeadId,
    pub project_id: ProjectId,
}

impl Order {
    /// Creates a new pending order header with a zero total.
    pub fn new(
        links: OrderLinks,
        title: impl Into<String>,
        description: Option<String>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        address: Address,
    ) -> Self {
        Self {
            id: OrderId::new(),
            supplier_id: links.supplier_id,
            client_id: links.client_id,
            lead_id: links.lead_id,
            project_id: links.project_id,
            title: title.into(),
            description,
            start_date,
            end_date,
            address,
            status: OrderStatus::Pending,
            total_amount: Money::zero(),
            created_at: Utc::now(),
        }
    }
}

/// A line item belonging to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    /// Optional reference into the supplier's product catalog.
    pub product_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderItem {
    /// Creates a new line item for `order_id`.
    pub fn new(
        order_id: OrderId,
        product_id: Option<String>,
        name: impl Into<String>,
        description: Option<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            id: OrderItemId::new(),
            order_id,
            product_id,
            name: name.into(),
            description,
            quantity,
            unit_price,
        }
    }

    /// Returns the line total (quantity × unit price).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_links() -> OrderLinks {
        OrderLinks {
            supplier_id: SupplierId::new(),
            client_id: ClientId::new(),
            lead_id: LeadId::new(),
            project_id: ProjectId::new(),
        }
    }

    #[test]
    fn test_new_order_is_pending_with_zero_total() {
        let order = Order::new(make_links(), "Cabinets", None, None, None, Address::default());
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.total_amount.is_zero());
    }

    #[test]
    fn test_line_total() {
        let item = OrderItem::new(
            OrderId::new(),
            None,
            "Cabinets",
            None,
            2,
            Money::from_cents(150_000),
        );
        assert_eq!(item.line_total().cents(), 300_000);
    }

    #[test]
    fn test_order_serialization_roundtrip() {
        let order = Order::new(
            make_links(),
            "Cabinets",
            Some("two units".into()),
            NaiveDate::from_ymd_opt(2025, 3, 1),
            NaiveDate::from_ymd_opt(2025, 4, 1),
            Address::default(),
        );
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, deserialized);
    }
}
