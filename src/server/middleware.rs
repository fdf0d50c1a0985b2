use axum::{
    body::Body,
    http::{Method, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, warn};

/// Log method, path, response status and latency for every request.
///
/// CORS preflight `OPTIONS` requests pass through unlogged. Server errors
/// are logged at `warn`.
pub async fn log_request(req: Request<Body>, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return next.run(req).await;
    }

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let latency_ms = started.elapsed().as_millis();
    if status.is_server_error() {
        warn!(%method, %path, status = status.as_u16(), latency_ms, "Request failed");
    } else {
        info!(%method, %path, status = status.as_u16(), latency_ms, "Handled request");
    }

    response
}
