//! API server entry point.

use common::SupplierId;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Builds the demo token registry.
///
/// Reads `SUPPLIER_TOKENS` as comma-separated `token=supplier-uuid` pairs;
/// without it, registers one generated supplier and logs its credential.
fn build_verifier() -> api::auth::StaticTokenVerifier {
    let mut verifier = api::auth::StaticTokenVerifier::new();

    if let Ok(raw) = std::env::var("SUPPLIER_TOKENS") {
        for pair in raw.split(',') {
            match pair.split_once('=') {
                Some((token, id)) => match id.trim().parse::<uuid::Uuid>() {
                    Ok(uuid) => verifier.register(token.trim(), SupplierId::from_uuid(uuid)),
                    Err(e) => tracing::warn!(pair, error = %e, "skipping malformed supplier token"),
                },
                None => tracing::warn!(pair, "skipping malformed supplier token"),
            }
        }
        return verifier;
    }

    let supplier_id = SupplierId::new();
    let token = uuid::Uuid::new_v4().to_string();
    tracing::info!(%supplier_id, token, "no SUPPLIER_TOKENS set, generated a demo credential");
    verifier.register(token, supplier_id);
    verifier
}

#[tokio::main]
async fn main() {
    let config = api::config::Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Create application state
    let verifier = build_verifier();
    let (state, _store, _audit) = api::create_default_state(verifier, config.step_timeout());

    // 4. Build the application
    let app = api::create_app(state, metrics_handle);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
