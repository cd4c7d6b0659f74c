//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use bundle::{DEFAULT_STEP_TIMEOUT, InMemoryAuditSink};
use common::SupplierId;
use metrics_exporter_prometheus::PrometheusHandle;
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

const TOKEN: &str = "test-token";

struct Harness {
    app: axum::Router,
    supplier_id: SupplierId,
    #[allow(dead_code)]
    state: Arc<api::routes::bundles::AppState<InMemoryStore>>,
    store: InMemoryStore,
    #[allow(dead_code)]
    audit: InMemoryAuditSink,
}

fn setup() -> Harness {
    let supplier_id = SupplierId::new();
    let mut verifier = api::auth::StaticTokenVerifier::new();
    verifier.register(TOKEN, supplier_id);

    let (state, store, audit) = api::create_default_state(verifier, DEFAULT_STEP_TIMEOUT);
    let app = api::create_app(state.clone(), get_metrics_handle());
    Harness {
        app,
        supplier_id,
        state,
        store,
        audit,
    }
}

fn bundle_body(supplier_id: SupplierId) -> serde_json::Value {
    serde_json::json!({
        "supplier_id": supplier_id,
        "lead": {
            "mode": "create",
            "new": { "full_name": "Dana Cohen", "email": "dana@example.com" }
        },
        "project": {
            "mode": "create",
            "new": { "title": "Kitchen Remodel", "address": { "city": "Haifa" } }
        },
        "order": {
            "title": "Cabinets",
            "items": [
                { "name": "Upper cabinets", "qty": 1, "unit_price_cents": 220000 },
                { "name": "Lower cabinets", "qty": 1, "unit_price_cents": 180000 }
            ]
        }
    })
}

fn post_bundle(body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/bundles")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {TOKEN}"))
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let harness = setup();

    let response = harness
        .app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "bundle-api");
}

#[tokio::test]
async fn test_create_bundle() {
    let harness = setup();

    let response = harness
        .app
        .oneshot(post_bundle(&bundle_body(harness.supplier_id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["total_amount"], 400_000);
    assert!(json["order_id"].as_str().is_some());
    assert!(json["lead_id"].as_str().is_some());
    assert!(json["project_id"].as_str().is_some());
    assert!(json["client_id"].as_str().is_some());
}

#[tokio::test]
async fn test_create_and_read_back_bundle() {
    let harness = setup();

    let create_response = harness
        .app
        .clone()
        .oneshot(post_bundle(&bundle_body(harness.supplier_id)))
        .await
        .unwrap();
    let created = json_body(create_response).await;
    let order_id = created["order_id"].as_str().unwrap().to_string();

    let get_response = harness
        .app
        .oneshot(
            Request::builder()
                .uri(format!("/bundles/{order_id}"))
                .header("authorization", format!("Bearer {TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(get_response.status(), StatusCode::OK);
    let order = json_body(get_response).await;
    assert_eq!(order["order_id"], order_id.as_str());
    assert_eq!(order["status"], "pending");
    assert_eq!(order["total_cents"], 400_000);
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    assert_eq!(order["items"][0]["line_total_cents"], 220_000);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let harness = setup();

    let response = harness
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/bundles")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::to_string(&bundle_body(harness.supplier_id)).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_supplier_mismatch_is_forbidden() {
    let harness = setup();

    // The body declares a different supplier than the token authenticates.
    let response = harness
        .app
        .oneshot(post_bundle(&bundle_body(SupplierId::new())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_validation_failure_lists_violations() {
    let harness = setup();

    let mut body = bundle_body(harness.supplier_id);
    body["order"]["items"] = serde_json::json!([]);

    let response = harness.app.oneshot(post_bundle(&body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["details"][0]["field"], "order.items");
    assert!(json["step"].is_null());
}

#[tokio::test]
async fn test_downstream_failure_reports_compensation() {
    let harness = setup();
    harness.store.set_fail_on_insert_items(true).await;

    let response = harness
        .app
        .oneshot(post_bundle(&bundle_body(harness.supplier_id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["step"], "create_items");
    assert_eq!(json["state"], "compensated");
    assert_eq!(json["compensation"]["outcome"], "compensated");
    assert_eq!(
        json["compensation"]["compensated"].as_array().unwrap().len(),
        4
    );

    // Nothing survived the rollback.
    assert_eq!(harness.store.active_order_count().await, 0);
    assert_eq!(harness.store.active_lead_count().await, 0);
}

#[tokio::test]
async fn test_selected_missing_lead_is_not_found() {
    let harness = setup();

    let mut body = bundle_body(harness.supplier_id);
    body["lead"] = serde_json::json!({
        "mode": "select",
        "lead_id": uuid::Uuid::new_v4()
    });

    let response = harness.app.oneshot(post_bundle(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_idempotency_key_replays_receipt() {
    let harness = setup();

    let mut body = bundle_body(harness.supplier_id);
    body["idempotency_key"] = serde_json::json!("bundle-retry-1");

    let first = harness
        .app
        .clone()
        .oneshot(post_bundle(&body))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first = json_body(first).await;

    let second = harness.app.oneshot(post_bundle(&body)).await.unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second = json_body(second).await;

    assert_eq!(first["order_id"], second["order_id"]);
    assert_eq!(harness.store.active_order_count().await, 1);
}

#[tokio::test]
async fn test_read_back_foreign_order_is_not_found() {
    let harness = setup();

    let create_response = harness
        .app
        .clone()
        .oneshot(post_bundle(&bundle_body(harness.supplier_id)))
        .await
        .unwrap();
    let created = json_body(create_response).await;
    let order_id = created["order_id"].as_str().unwrap().to_string();

    // A second supplier on the same store, with its own valid token.
    let other_supplier = SupplierId::new();
    let mut verifier = api::auth::StaticTokenVerifier::new();
    verifier.register("other-token", other_supplier);
    let state = Arc::new(api::routes::bundles::AppState {
        orchestrator: bundle::BundleOrchestrator::new(
            harness.store.clone(),
            InMemoryAuditSink::new(),
        ),
        store: harness.store.clone(),
        auth: verifier,
    });
    let app = api::create_app(state, get_metrics_handle());

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/bundles/{order_id}"))
                .header("authorization", "Bearer other-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_order_id_format() {
    let harness = setup();

    let response = harness
        .app
        .oneshot(
            Request::builder()
                .uri("/bundles/not-a-uuid")
                .header("authorization", format!("Bearer {TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let harness = setup();

    let response = harness
        .app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
