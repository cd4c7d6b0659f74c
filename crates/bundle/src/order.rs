//! Order creation: header, item batch, and total read-back.

use common::{OrderId, SupplierId};
use domain::order::OrderLinks;
use domain::{Order, OrderItem};
use store::{Actor, BundleStore};

use crate::error::{BundleError, Result};
use crate::request::{ItemDraft, OrderDraft};

/// Creates the order header and its items as the final forward steps of
/// the saga, then reads the order back to obtain the persistence-computed
/// total. The total is owned by the storage layer and never computed here,
/// so header and items cannot drift.
pub struct OrderCreator<'a, S> {
    store: &'a S,
    actor: Actor,
}

impl<'a, S: BundleStore> OrderCreator<'a, S> {
    pub fn new(store: &'a S, supplier_id: SupplierId) -> Self {
        Self {
            store,
            actor: Actor::Supplier(supplier_id),
        }
    }

    /// Creates the order header row.
    pub async fn create_header(&self, links: OrderLinks, draft: &OrderDraft) -> Result<Order> {
        let order = Order::new(
            links,
            draft.title.clone(),
            draft.description.clone(),
            draft.start_date,
            draft.end_date,
            draft.address.clone(),
        );
        let order = self.store.insert_order(&self.actor, order).await?;
        Ok(order)
    }

    /// Creates all line items for `order_id` in one batch.
    pub async fn create_items(&self, order_id: OrderId, items: &[ItemDraft]) -> Result<()> {
        let rows: Vec<OrderItem> = items
            .iter()
            .map(|draft| {
                OrderItem::new(
                    order_id,
                    draft.product_id.clone(),
                    draft.name.clone(),
                    draft.description.clone(),
                    draft.qty,
                    draft.unit_price(),
                )
            })
            .collect();
        self.store.insert_order_items(&self.actor, rows).await?;
        Ok(())
    }

    /// Re-reads the order so `total_amount` reflects the committed items.
    pub async fn read_back(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or(BundleError::NotFound {
                entity: "order",
                id: order_id.to_string(),
            })
    }
}
