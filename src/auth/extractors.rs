use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use tower_cookies::Cookies;

use crate::auth::repo_types::User;
use crate::auth::sessions;
use crate::error::ApiError;
use crate::state::AppState;

/// Resolves the session cookie to the requesting account, rejecting
/// missing, expired, or dangling sessions with 401.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = maybe_user(parts, state).await?;
        user.map(AuthUser).ok_or(ApiError::Unauthorized)
    }
}

/// Like `AuthUser`, but `None` instead of a rejection when the request
/// carries no usable session. `/auth/me` answers 200 either way.
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(maybe_user(parts, state).await?))
    }
}

/// Admin-gated extractor: 401 without a session, 403 without the role.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = maybe_user(parts, state)
            .await?
            .ok_or(ApiError::Unauthorized)?;
        if !user.is_admin() {
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}

async fn maybe_user(parts: &mut Parts, state: &AppState) -> Result<Option<User>, ApiError> {
    let cookies = Cookies::from_request_parts(parts, state)
        .await
        .map_err(|_| ApiError::Unauthorized)?;
    let Some(token) = sessions::session_token(&cookies, &state.config.session) else {
        return Ok(None);
    };
    let user = sessions::resolve_session(&state.db, &token).await?;
    Ok(user)
}
