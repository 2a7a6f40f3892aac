//! Router configuration.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::SharedState;

/// Build the target service router.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/volumefile", get(handlers::volume_file))
        .route("/udp", get(handlers::udp_value))
        .route("/scalechecker", get(handlers::scale_checker))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
