use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::jwt::{JwtKeys, TokenPair};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo_types::{RiskAppetite, User};
use crate::error::{AppError, AppResult};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[derive(Debug)]
pub struct RegisterData {
    pub email: String,
    pub username: String,
    pub password: String,
    pub bankroll: Option<Decimal>,
    pub risk_appetite: Option<RiskAppetite>,
}

/// The serialized user never carries the password hash (skipped at the type
/// level on [`User`]).
#[derive(Debug, Serialize)]
pub struct AuthResult {
    pub user: User,
    pub tokens: TokenPair,
}

pub async fn register(db: &PgPool, keys: &JwtKeys, data: RegisterData) -> AppResult<AuthResult> {
    if User::find_by_email(db, &data.email).await?.is_some() {
        return Err(AppError::validation("User with this email already exists"));
    }
    if User::find_by_username(db, &data.username).await?.is_some() {
        return Err(AppError::validation(
            "User with this username already exists",
        ));
    }

    let password_hash = hash_password(&data.password)?;

    // The pre-checks race with concurrent registrations; the unique index
    // has the final say, and its violation is still a duplicate, not a 500.
    let (user, _preferences) = User::create_with_preferences(
        db,
        &data.email,
        &data.username,
        &password_hash,
        data.bankroll.unwrap_or(Decimal::ZERO),
        data.risk_appetite.unwrap_or_default(),
    )
    .await
    .map_err(registration_conflict)?;

    let tokens = keys.sign_pair(user.id, &user.email, &user.username)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(AuthResult { user, tokens })
}

fn registration_conflict(e: anyhow::Error) -> AppError {
    if let Some(db_err) = e
        .downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
    {
        // 23505 = unique_violation
        if db_err.code().as_deref() == Some("23505") {
            return if db_err.constraint().is_some_and(|c| c.contains("username")) {
                AppError::validation("User with this username already exists")
            } else {
                AppError::validation("User with this email already exists")
            };
        }
    }
    AppError::Internal(e)
}

pub async fn login(db: &PgPool, keys: &JwtKeys, email: &str, password: &str) -> AppResult<AuthResult> {
    let user = User::find_by_email(db, email)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid email or password"))?;

    if !user.is_active {
        return Err(AppError::unauthorized("Account is deactivated"));
    }

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    // Best-effort stamp; a failure here must not fail the login.
    if let Err(e) = User::update_last_login(db, user.id).await {
        warn!(error = %e, user_id = %user.id, "failed to update last_login");
    }

    let tokens = keys.sign_pair(user.id, &user.email, &user.username)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(AuthResult { user, tokens })
}

/// Mints a brand-new pair from a valid refresh token. No revocation list is
/// kept, so the old refresh token stays structurally valid until its own
/// expiry even after rotation.
pub async fn refresh(db: &PgPool, keys: &JwtKeys, refresh_token: &str) -> AppResult<TokenPair> {
    let claims = keys
        .verify_refresh(refresh_token)
        .map_err(|_| AppError::unauthorized("Invalid refresh token"))?;

    let user = match User::find_by_id(db, claims.sub).await? {
        Some(u) if u.is_active => u,
        _ => return Err(AppError::unauthorized("Invalid refresh token")),
    };

    Ok(keys.sign_pair(user.id, &user.email, &user.username)?)
}

pub async fn validate_password(db: &PgPool, user_id: Uuid, password: &str) -> AppResult<bool> {
    let Some(user) = User::find_by_id(db, user_id).await? else {
        return Ok(false);
    };
    Ok(verify_password(password, &user.password_hash)?)
}

pub async fn change_password(
    db: &PgPool,
    user_id: Uuid,
    old_password: &str,
    new_password: &str,
) -> AppResult<()> {
    if !validate_password(db, user_id, old_password).await? {
        return Err(AppError::validation("Current password is incorrect"));
    }

    let password_hash = hash_password(new_password)?;
    User::update_password(db, user_id, &password_hash).await?;

    info!(%user_id, "password changed");
    Ok(())
}
