use crate::{
    handlers::{diagnostics, health_check, ready_check, table_snapshot},
    routes::auth_middleware::auth_middleware,
    AppState,
};
use axum::{middleware, routing::get, Router};
use std::sync::Arc;

/// Create API routes
pub fn create_api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/v1/diagnostics", get(diagnostics))
        .route("/v1/tables/:table_id/snapshot", get(table_snapshot))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware)); // Applies to all routes added above

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .merge(protected)
}
