pub mod chart;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use cylmon_core::Monitor;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve_on()` and available for integration testing.
pub fn build_router(monitor: Arc<Monitor>) -> Router {
    let app_state = state::AppState::new(monitor);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Events (SSE)
        .route("/api/events", get(routes::events::sse_events))
        // Actuators
        .route("/api/actuators", get(routes::actuators::list_actuators))
        .route("/api/actuators/{id}", get(routes::actuators::get_actuator))
        .route(
            "/api/actuators/{id}/history",
            get(routes::actuators::get_history),
        )
        // Status
        .route("/api/status", get(routes::status::get_status))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the monitor and serve its feed on a pre-bound listener until Ctrl-C.
/// The caller binds first so it can read the actual port (useful with port 0).
pub async fn serve_on(
    monitor: Arc<Monitor>,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(monitor.clone());

    monitor.start();
    tracing::info!("cylinder feed listening on http://localhost:{actual_port}");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    monitor.stop();
    result?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
