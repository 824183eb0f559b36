//! Actor extraction from the `Authorization: Bearer` header.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use influberry_core::error::CoreError;
use influberry_core::types::DbId;

use crate::auth::jwt::decode_access_token;
use crate::error::AppError;
use crate::state::AppState;

/// The creator on whose behalf a request runs. Every engine call a handler
/// makes is scoped to `user_id`; rows owned by anyone else are invisible.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub plan: String,
}

fn unauthorized(message: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(message.to_string()))
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| unauthorized("Expected: Authorization: Bearer <token>"))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let claims = decode_access_token(token, &state.config.jwt).map_err(|err| {
            tracing::debug!(error = %err, path = %parts.uri.path(), "Bearer token rejected");
            unauthorized("Invalid or expired token")
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            plan: claims.plan,
        })
    }
}
