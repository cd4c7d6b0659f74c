//! Bundle provisioning and read-back endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use bundle::{BundleOrchestrator, BundleRequest, InMemoryAuditSink};
use common::OrderId;
use serde::Serialize;
use store::BundleStore;

use crate::auth::{StaticTokenVerifier, authenticate};
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: BundleStore> {
    pub orchestrator: BundleOrchestrator<S, InMemoryAuditSink>,
    pub store: S,
    pub auth: StaticTokenVerifier,
}

// -- Response types --

#[derive(Serialize)]
pub struct BundleCreatedResponse {
    pub success: bool,
    pub order_id: String,
    pub lead_id: String,
    pub project_id: String,
    pub client_id: String,
    /// Total in cents, computed by the storage layer from the line items.
    pub total_amount: i64,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: Option<String>,
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub order_id: String,
    pub supplier_id: String,
    pub client_id: String,
    pub lead_id: String,
    pub project_id: String,
    pub title: String,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
}

// -- Handlers --

/// POST /bundles — run the create-order-bundle workflow.
#[tracing::instrument(skip(state, headers, request))]
pub async fn create<S: BundleStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(request): Json<BundleRequest>,
) -> Result<Json<BundleCreatedResponse>, ApiError> {
    let caller = authenticate(&state.auth, &headers)?;

    let receipt = state.orchestrator.execute(caller, request).await?;

    Ok(Json(BundleCreatedResponse {
        success: true,
        order_id: receipt.order_id.to_string(),
        lead_id: receipt.lead_id.to_string(),
        project_id: receipt.project_id.to_string(),
        client_id: receipt.client_id.to_string(),
        total_amount: receipt.total_amount.cents(),
    }))
}

/// GET /bundles/:order_id — read back a provisioned order with its items.
#[tracing::instrument(skip(state, headers))]
pub async fn get<S: BundleStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let caller = authenticate(&state.auth, &headers)?;
    let order_id = parse_order_id(&order_id)?;

    let order = state
        .store
        .get_order(order_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        // A foreign order reads the same as a missing one.
        .filter(|order| order.supplier_id == caller)
        .ok_or_else(|| ApiError::NotFound(format!("Order {order_id} not found")))?;

    let items = state
        .store
        .get_order_items(order_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let items: Vec<OrderItemResponse> = items
        .into_iter()
        .map(|item| OrderItemResponse {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
            line_total_cents: item.line_total().cents(),
        })
        .collect();

    Ok(Json(OrderResponse {
        order_id: order.id.to_string(),
        supplier_id: order.supplier_id.to_string(),
        client_id: order.client_id.to_string(),
        lead_id: order.lead_id.to_string(),
        project_id: order.project_id.to_string(),
        title: order.title.clone(),
        status: order.status.to_string(),
        items,
        total_cents: order.total_amount.cents(),
    }))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
