use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{debug, error};

use crate::services::auth_service::{get_auth_token, validate_jwt, AuthUser};
use crate::AppState;

pub async fn auth_middleware(
    State(app_state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Without a shared secret there is nothing to validate against
    let Some(secret) = &app_state.config.auth_jwt_secret else {
        return Ok(next.run(req).await);
    };

    // 2. Get the auth token from the request
    let token = match get_auth_token(&req) {
        Ok(token) => token,
        Err(e) => {
            debug!("No auth token: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    // 3. Validate Token
    let token_data = match validate_jwt(&token, secret) {
        Ok(token_data) => token_data,
        Err(e) => {
            error!("JWT validation failed: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    // 4. Set the user into request extensions for downstream handlers
    let user = AuthUser::from(token_data.claims);
    debug!("User {} authenticated", user.username);
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
