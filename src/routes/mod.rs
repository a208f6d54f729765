pub mod api;
pub mod auth_middleware;

use std::sync::Arc;

use axum::{http::HeaderValue, middleware, routing::get, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use api::create_api_routes;
use auth_middleware::auth_middleware;

use crate::config::Config;
use crate::docs::ApiDoc;
use crate::websocket::websocket_handler;
use crate::AppState;

/// Build the whole application: WebSocket endpoint, REST API and Swagger UI
pub fn create_app(state: Arc<AppState>) -> Router {
    let ws_routes = Router::new()
        .route("/ws/:table_id", get(websocket_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(ws_routes)
        // Mount API routes
        .nest("/api", create_api_routes(state.clone()))
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors_layer(&state.config))
        // Add tracing layer
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let Some(origins) = config.cors_origin_list() else {
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
