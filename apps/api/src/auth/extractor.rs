//! `AuthUser` extractor: resolves the caller from the `x-auth-token` header.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::auth::jwt::validate_token;
use crate::errors::AppError;
use crate::state::AppState;

pub const AUTH_HEADER: &str = "x-auth-token";

/// The authenticated caller. Add as a handler argument to make a route private.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTH_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("No token, authorization denied".to_string()))?;

        let claims = validate_token(token, &state.jwt)
            .map_err(|_| AppError::Unauthorized("Token is not valid".to_string()))?;

        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}
