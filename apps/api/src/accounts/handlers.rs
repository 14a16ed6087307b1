use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::accounts::store::{find_by_email, find_by_id, insert_user};
use crate::accounts::validation::{normalize_email, validate_login, validate_registration};
use crate::auth::jwt::issue_token;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::user::{User, UserProfile};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

fn auth_response(state: &AppState, user: &User) -> Result<AuthResponse, AppError> {
    let token = issue_token(user.id, &state.jwt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to sign token: {e}")))?;
    Ok(AuthResponse {
        token,
        user: UserProfile::from(user),
    })
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let email = normalize_email(&req.email);
    validate_registration(&req.name, &email, &req.password)?;

    let duplicate = || AppError::Validation("User already exists with this email".to_string());
    if find_by_email(&state.db, &email).await?.is_some() {
        return Err(duplicate());
    }

    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {e}")))?;

    let user = insert_user(&state.db, req.name.trim(), &email, &password_hash)
        .await?
        .ok_or_else(duplicate)?;

    info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(auth_response(&state, &user)?)))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&req.email);
    validate_login(&email, &req.password)?;

    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());
    let user = find_by_email(&state.db, &email).await?.ok_or_else(invalid)?;

    let password = req.password;
    let stored_hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password check task failed: {e}")))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Stored password hash is invalid: {e}")))?;
    if !matches {
        return Err(invalid());
    }

    Ok(Json(auth_response(&state, &user)?))
}

/// GET /api/users/me
pub async fn handle_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<User>, AppError> {
    let user = find_by_id(&state.db, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}
