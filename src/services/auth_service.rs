use axum::http::{self};
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};

/// Claims issued by the table service's login endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Username
    pub sub: String,
    /// Numeric user id, used for table access checks
    #[serde(default)]
    pub uid: Option<i64>,
    pub exp: u64,
}

/// The authenticated caller, set as a request extension by the auth middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
    pub uid: Option<i64>,
}

impl From<AuthClaims> for AuthUser {
    fn from(claims: AuthClaims) -> Self {
        Self {
            username: claims.sub,
            uid: claims.uid,
        }
    }
}

// Get the auth token from a request
pub fn get_auth_token<B>(req: &http::Request<B>) -> Result<String, String> {
    // 1. Try to get token from Authorization header
    if let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION) {
        let auth_str = auth_header.to_str().map_err(|_| "Invalid Authorization header".to_string())?;
        return Ok(auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).to_string());
    }

    // 2. Try to get token from cookies
    if let Some(cookie_header) = req.headers().get(http::header::COOKIE) {
        let cookie_header = cookie_header.to_str().map_err(|_| "Invalid Cookie header".to_string())?;
        for c in cookie::Cookie::split_parse(cookie_header).flatten() {
            if c.name() == "auth_token" {
                return Ok(c.value().to_string());
            }
        }
    }

    // 3. Browsers cannot set headers on a WebSocket upgrade, so allow ?token=
    if let Some(query) = req.uri().query() {
        for pair in query.split('&') {
            if let Some(token) = pair.strip_prefix("token=") {
                if !token.is_empty() {
                    return Ok(token.to_string());
                }
            }
        }
    }

    Err("Missing Authorization header, auth_token cookie or token parameter".to_string())
}

// Validate a JWT token and return the token data
pub fn validate_jwt(token: &str, secret: &str) -> Result<TokenData<AuthClaims>, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<AuthClaims>(token, &decoding_key, &validation)
}
