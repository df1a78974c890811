//! HTTP server implementation using Axum.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use chrono::FixedOffset;
use studopt_bot::DispatchEngine;
use crate::routes;
use studopt_channels::DispatchSink;
use studopt_store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub dispatch: Arc<DispatchEngine>,
    pub sink: Arc<dyn DispatchSink>,
    pub tz: FixedOffset,
    /// Secret the bot platform echoes back on webhook deliveries. Empty
    /// means deliveries are accepted unverified.
    pub webhook_secret: String,
    /// Shared secret for the admin API. Empty disables the check.
    pub admin_secret: String,
}

/// Admin auth middleware. Validates the X-Admin-Secret header.
async fn require_admin(
    State(state): State<Arc<AppState>>,
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    if state.admin_secret.is_empty() {
        return next.run(req).await;
    }
    let from_header = req
        .headers()
        .get("X-Admin-Secret")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if from_header == state.admin_secret {
        return next.run(req).await;
    }
    routes::unauthorized("invalid or missing admin secret")
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    build_router_from_arc(Arc::new(state))
}

pub fn build_router_from_arc(shared: Arc<AppState>) -> Router {
    // Admin routes, behind the shared secret.
    let admin = Router::new()
        .route("/api/v1/users", get(routes::list_users))
        .route("/api/v1/classes", get(routes::list_classes))
        .route("/api/v1/classes", post(routes::create_class))
        .route(
            "/api/v1/classes/{id}/assignments",
            get(routes::list_assignments),
        )
        .route(
            "/api/v1/classes/{id}/assignments",
            post(routes::create_assignment),
        )
        .route(
            "/api/v1/assignments/{id}",
            axum::routing::delete(routes::delete_assignment),
        )
        .route("/api/v1/bot/enabled", post(routes::set_bot_enabled))
        .route_layer(axum::middleware::from_fn_with_state(
            shared.clone(),
            require_admin,
        ));

    // Public routes. The webhook authenticates itself via the platform's
    // secret-token header.
    let public = Router::new()
        .route("/health", get(routes::health_check))
        .route("/webhook", post(routes::webhook_inbound));

    admin
        .merge(public)
        .layer(
            CorsLayer::new()
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers(Any)
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Bind and serve until the task is cancelled.
pub async fn start(host: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🌐 Gateway listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
