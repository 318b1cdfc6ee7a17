use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::convert::Infallible;
use tracing::warn;

use crate::auth::jwt::{Claims, JwtKeys};
use crate::auth::repo_types::User;
use crate::error::AppError;
use crate::state::AppState;

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_once(' '))
        .map(|(_, token)| token)
        .filter(|t| !t.is_empty())
}

/// Mandatory gate. Missing token and invalid token are deliberately distinct
/// classes: no token at all is 401, a token that fails verification is 403.
#[derive(Debug)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::unauthorized("Access token required"))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify_access(token).map_err(|_| {
            warn!("access token failed verification");
            AppError::forbidden("Invalid or expired token")
        })?;

        // The token alone is not enough: the user must still exist and be
        // active at request time.
        match User::find_by_id(&state.db, claims.sub).await? {
            Some(user) if user.is_active => Ok(AuthUser(claims)),
            _ => Err(AppError::unauthorized("User not found or inactive")),
        }
    }
}

/// Optional gate: same pipeline as [`AuthUser`], but every failure silently
/// yields an anonymous request instead of a rejection.
pub struct MaybeAuthUser(pub Option<Claims>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(
            AuthUser::from_request_parts(parts, state)
                .await
                .ok()
                .map(|AuthUser(claims)| claims),
        ))
    }
}
