//! HTTP API over the ticket store.
//!
//! - `GET /health` liveness probe
//! - `/tickets` list, create, stats
//! - `/tickets/{id}` get, update, delete, status, events
//!
//! Handlers lock one shared [`SqliteStorage`] per request. Errors are
//! rendered as `{"detail": ..., "code": ...}` with 400/404/409/500.

pub mod error;
pub mod middleware;
pub mod routes;

use crate::config::ServerConfig;
use crate::error::{Result, TrackerError};
use crate::model::Priority;
use crate::query::DEFAULT_PAGE_LIMIT;
use crate::storage::SqliteStorage;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::from_fn,
    routing::{get, patch},
};
use std::sync::{Arc, Mutex};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Mutex<SqliteStorage>>,
    /// Priority for tickets created without one.
    pub default_priority: Priority,
    /// Page size when a listing omits `limit`.
    pub page_size: usize,
}

impl AppState {
    #[must_use]
    pub fn new(storage: SqliteStorage) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            default_priority: Priority::default(),
            page_size: DEFAULT_PAGE_LIMIT,
        }
    }

    #[must_use]
    pub const fn with_defaults(mut self, default_priority: Priority, page_size: usize) -> Self {
        self.default_priority = default_priority;
        self.page_size = page_size;
        self
    }
}

/// CORS for the configured origins. `*` allows any origin.
#[must_use]
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Build the application router.
#[must_use]
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/tickets",
            get(routes::list_tickets).post(routes::create_ticket),
        )
        .route("/tickets/stats", get(routes::ticket_stats))
        .route(
            "/tickets/{id}",
            get(routes::get_ticket)
                .put(routes::update_ticket)
                .delete(routes::delete_ticket),
        )
        .route("/tickets/{id}/status", patch(routes::update_status))
        .route("/tickets/{id}/events", get(routes::ticket_events))
        .with_state(state)
        .layer(from_fn(middleware::log_request))
        .layer(cors_layer(&config.cors_origins))
}

/// Bind and serve until Ctrl-C.
///
/// # Errors
///
/// Returns an I/O error if the address cannot be bound or the server fails.
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local = listener.local_addr()?;
    info!(%local, origins = ?config.cors_origins, "Serving ticket API");

    axum::serve(listener, app(state, config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(TrackerError::Io)?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
