use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use serde_json::json;
use tracing::instrument;

use crate::auth::{
    dto::{ChangePasswordRequest, LoginRequest, RefreshRequest, RegisterRequest},
    extractors::AuthUser,
    jwt::JwtKeys,
    repo::PreferencesUpdate,
    repo_types::{User, UserPreferences},
    services::{self, RegisterData},
};
use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/profile", get(profile))
        .route("/auth/password", put(change_password))
        .route(
            "/auth/preferences",
            get(get_preferences).put(update_preferences),
        )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let (Some(email), Some(username), Some(password)) =
        (payload.email, payload.username, payload.password)
    else {
        return Err(AppError::validation(
            "Email, username, and password are required",
        ));
    };

    let email = email.trim().to_lowercase();
    if !services::is_valid_email(&email) {
        return Err(AppError::validation("Invalid email format"));
    }
    if password.len() < 8 {
        return Err(AppError::validation(
            "Password must be at least 8 characters long",
        ));
    }
    if payload.bankroll.is_some_and(|b| b.is_sign_negative()) {
        return Err(AppError::validation("Bankroll cannot be negative"));
    }

    let keys = JwtKeys::from_ref(&state);
    let result = services::register(
        &state.db,
        &keys,
        RegisterData {
            email,
            username,
            password,
            bankroll: payload.bankroll,
            risk_appetite: payload.risk_appetite,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "data": result,
        })),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(AppError::validation("Email and password are required"));
    };
    let email = email.trim().to_lowercase();

    let keys = JwtKeys::from_ref(&state);
    let result = services::login(&state.db, &keys, &email, &password).await?;

    Ok(Json(json!({
        "message": "Login successful",
        "data": result,
    })))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let Some(refresh_token) = payload.refresh_token else {
        return Err(AppError::validation("Refresh token is required"));
    };

    let keys = JwtKeys::from_ref(&state);
    let tokens = services::refresh(&state.db, &keys, &refresh_token).await?;

    Ok(Json(json!({
        "message": "Token refreshed successfully",
        "data": tokens,
    })))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> AppResult<Json<serde_json::Value>> {
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(json!({ "data": user })))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let (Some(old_password), Some(new_password)) = (payload.old_password, payload.new_password)
    else {
        return Err(AppError::validation(
            "Old password and new password are required",
        ));
    };
    if new_password.len() < 8 {
        return Err(AppError::validation(
            "Password must be at least 8 characters long",
        ));
    }

    services::change_password(&state.db, claims.sub, &old_password, &new_password).await?;

    Ok(Json(json!({ "message": "Password changed successfully" })))
}

#[instrument(skip(state))]
pub async fn get_preferences(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> AppResult<Json<serde_json::Value>> {
    let prefs = UserPreferences::find_by_user(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::not_found("Preferences not found"))?;

    Ok(Json(json!({ "data": prefs })))
}

#[instrument(skip(state, payload))]
pub async fn update_preferences(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<PreferencesUpdate>,
) -> AppResult<Json<serde_json::Value>> {
    let prefs = UserPreferences::update(&state.db, claims.sub, payload)
        .await?
        .ok_or_else(|| AppError::not_found("Preferences not found"))?;

    Ok(Json(json!({
        "message": "Preferences updated successfully",
        "data": prefs,
    })))
}
