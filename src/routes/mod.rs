use axum::{routing::get, Router};
use std::sync::Arc;
use crate::AppState;
use tower_http::trace::TraceLayer;

pub mod sheets;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
}

async fn health_check() -> &'static str {
    "OK"
}

/// Full application router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes())
        .merge(sheets::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
