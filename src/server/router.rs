use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::admin::admin_router;
use super::owner::owner_router;
use crate::clock::Clock;
use crate::config::ServerConfig;
use crate::loyalty::StampLinks;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
    pub config: ServerConfig,
}

impl AppState {
    #[must_use]
    pub fn links_for(&self, cafe_id: &str) -> StampLinks {
        StampLinks::new(
            &self.config.stamp_base_url,
            &self.config.nfc_base_url,
            cafe_id,
        )
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/admin", admin_router())
        .nest("/api/v1", owner_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
