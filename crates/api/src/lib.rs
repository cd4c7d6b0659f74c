//! HTTP API server for order bundle provisioning.
//!
//! Exposes the create-order-bundle workflow and order read-back over REST,
//! with bearer-token authentication, structured logging (tracing) and
//! Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use bundle::{BundleOrchestrator, InMemoryAuditSink};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{BundleStore, InMemoryStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::StaticTokenVerifier;
use routes::bundles::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: BundleStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/bundles", post(routes::bundles::create::<S>))
        .route("/bundles/{order_id}", get(routes::bundles::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state backed by in-memory collaborators.
pub fn create_default_state(
    auth: StaticTokenVerifier,
    step_timeout: std::time::Duration,
) -> (Arc<AppState<InMemoryStore>>, InMemoryStore, InMemoryAuditSink) {
    let store = InMemoryStore::new();
    let audit = InMemoryAuditSink::new();
    let orchestrator =
        BundleOrchestrator::new(store.clone(), audit.clone()).with_step_timeout(step_timeout);

    let state = Arc::new(AppState {
        orchestrator,
        store: store.clone(),
        auth,
    });

    (state, store, audit)
}
