use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post, put},
    Json, Router,
};
use tower_cookies::Cookies;
use tracing::{error, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, GoogleAuthQuery, GoogleCallbackQuery, LoginRequest, MeResponse,
            MessageResponse, ProfileUpdateRequest, RegisterRequest, RegisteredResponse,
            ResendOtpRequest, VerifyOtpRequest,
        },
        extractors::{AuthUser, MaybeUser},
        repo_types::User,
        services, sessions,
    },
    error::ApiError,
    state::AppState,
};

pub fn local_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/local/register", post(register))
        .route("/auth/local/verify", post(verify_otp))
        .route("/auth/local/resend", post(resend_otp))
        .route("/auth/local/login", post(login))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/google", get(google_auth))
        .route("/auth/google/callback", get(google_callback))
        .route("/auth/me", get(get_me))
        .route("/auth/profile", put(update_profile))
        .route("/auth/logout", get(logout))
}

async fn establish_session(
    state: &AppState,
    cookies: &Cookies,
    user: &User,
) -> Result<(), ApiError> {
    let token =
        sessions::create_session(&state.db, user.id, state.config.session.ttl_days).await?;
    sessions::set_session_cookie(cookies, &state.config.session, token);
    Ok(())
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisteredResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !services::is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.chars().count() < 8 {
        return Err(ApiError::Validation("Password too short".into()));
    }

    let user = services::register_local(&state, &payload.name, &payload.email, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse {
            message: "Registration successful. OTP sent to email.".into(),
            user_id: user.id,
        }),
    ))
}

/// Verification and login are atomic from the caller's perspective:
/// a successful verify responds with the session cookie already set.
#[instrument(skip(state, cookies, payload))]
async fn verify_otp(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(mut payload): Json<VerifyOtpRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = services::verify_otp(&state, &payload.email, &payload.otp).await?;
    establish_session(&state, &cookies, &user).await?;

    Ok(Json(AuthResponse {
        message: "Verification successful".into(),
        user: user.into(),
    }))
}

#[instrument(skip(state, payload))]
async fn resend_otp(
    State(state): State<AppState>,
    Json(mut payload): Json<ResendOtpRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    services::resend_otp(&state, &payload.email).await?;
    Ok(Json(MessageResponse {
        message: "If the account exists and is unverified, a new OTP has been sent.".into(),
    }))
}

#[instrument(skip(state, cookies, payload))]
async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !services::is_valid_email(&payload.email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }

    let user = services::login_local(&state, &payload.email, &payload.password).await?;
    establish_session(&state, &cookies, &user).await?;

    Ok(Json(AuthResponse {
        message: "Logged in successfully".into(),
        user: user.into(),
    }))
}

#[instrument(skip(state))]
async fn google_auth(
    State(state): State<AppState>,
    Query(query): Query<GoogleAuthQuery>,
) -> Redirect {
    let path = services::validate_state_path(query.redirect.as_deref());
    Redirect::to(&state.oauth.authorize_url(path))
}

/// Provider failures never surface as errors to the browser; the user
/// lands back on the login page with a generic marker instead.
#[instrument(skip(state, cookies, query))]
async fn google_callback(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<GoogleCallbackQuery>,
) -> Redirect {
    let failure = format!("{}/login?error=auth_failed", state.config.client_url);

    let Some(code) = query.code.as_deref() else {
        return Redirect::to(&failure);
    };

    let profile = match state.oauth.fetch_profile(code).await {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "provider code exchange failed");
            return Redirect::to(&failure);
        }
    };

    let user = match services::resolve_external_identity(&state, &profile).await {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "external identity resolution failed");
            return Redirect::to(&failure);
        }
    };

    if let Err(e) = establish_session(&state, &cookies, &user).await {
        error!(error = %e, user_id = %user.id, "session creation failed");
        return Redirect::to(&failure);
    }

    let path = services::validate_state_path(query.state.as_deref());
    Redirect::to(&format!("{}{}", state.config.client_url, path))
}

#[instrument(skip_all)]
async fn get_me(MaybeUser(user): MaybeUser) -> Json<MeResponse> {
    match user {
        Some(user) => Json(MeResponse {
            authenticated: true,
            user: Some(user.into()),
        }),
        None => Json(MeResponse {
            authenticated: false,
            user: None,
        }),
    }
}

#[instrument(skip(state, user, payload))]
async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let updated = User::update_profile(
        &state.db,
        user.id,
        payload.income_range.as_deref(),
        payload.exact_income,
    )
    .await?
    .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(AuthResponse {
        message: "Profile updated".into(),
        user: updated.into(),
    }))
}

#[instrument(skip(state, cookies))]
async fn logout(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Json<MessageResponse>, ApiError> {
    if let Some(token) = sessions::session_token(&cookies, &state.config.session) {
        sessions::destroy_session(&state.db, &token).await?;
    }
    sessions::clear_session_cookie(&cookies, &state.config.session);
    Ok(Json(MessageResponse {
        message: "Logged out successfully".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_measures_password_length_in_chars() {
        // Four characters but eight bytes; byte counting would let
        // this through.
        let payload = RegisterRequest {
            name: "Asha".into(),
            email: "asha@example.com".into(),
            password: "éééé".into(),
        };

        let err = register(State(AppState::fake()), Json(payload))
            .await
            .unwrap_err();
        match err {
            ApiError::Validation(message) => assert_eq!(message, "Password too short"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn register_rejects_malformed_email() {
        let payload = RegisterRequest {
            name: "Asha".into(),
            email: "not-an-address".into(),
            password: "long enough password".into(),
        };

        let err = register(State(AppState::fake()), Json(payload))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
