//! services/api/src/web/users.rs
//!
//! Account endpoints: registration, login, profile updates and deletion.

use crate::web::{port_error_response, state::AppState};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use game_tracker_core::{
    accounts::{validate_profile_update, validate_registration},
    domain::UserAccount,
    PortError, ProfileUpdate, Registration,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

const INVALID_LOGIN: &str = "Invalid user name or password";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<UserAccount> for UserResponse {
    fn from(account: UserAccount) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
        }
    }
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

fn hash_password(password: &str) -> Result<String, (StatusCode, String)> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to hash password".to_string())
        })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /users - Create a new account
#[utoipa::path(
    post,
    path = "/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation failed; every problem is listed"),
        (status = 409, description = "User name or email already in use")
    )
)]
pub async fn register_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let registration = Registration {
        name: req.name,
        email: req.email,
        password: req.password,
        confirm_password: req.confirm_password,
    };
    validate_registration(&registration)
        .map_err(|e| port_error_response("Invalid registration", e))?;

    let password_hash = hash_password(&registration.password)?;
    let account = app_state
        .accounts
        .register(&registration, password_hash)
        .await
        .map_err(|e| port_error_response("Failed to create user", e))?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(account))))
}

/// POST /login - Check a user name and password
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = UserResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let credentials = app_state
        .accounts
        .credentials(&req.username)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized => (StatusCode::UNAUTHORIZED, INVALID_LOGIN.to_string()),
            other => port_error_response("Failed to load user", other),
        })?;

    let parsed_hash = PasswordHash::new(&credentials.password_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error".to_string())
    })?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| (StatusCode::UNAUTHORIZED, INVALID_LOGIN.to_string()))?;

    info!(user_id = credentials.account.id, "User logged in");
    Ok(Json(UserResponse::from(credentials.account)))
}

/// PUT /users/{id} - Change name, email or password
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id.")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid field"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User name or email already in use")
    )
)]
pub async fn update_user_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let update = ProfileUpdate {
        name: req.name,
        email: req.email,
        password: req.password,
    };
    validate_profile_update(&update).map_err(|e| port_error_response("Invalid update", e))?;

    let password_hash = update.password.as_deref().map(hash_password).transpose()?;
    let account = app_state
        .accounts
        .update(user_id, &update, password_hash)
        .await
        .map_err(|e| port_error_response("Failed to update user", e))?;
    Ok(Json(UserResponse::from(account)))
}

/// DELETE /users/{id} - Remove the account and its library
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = i64, Path, description = "User id.")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state
        .accounts
        .delete(user_id)
        .await
        .map_err(|e| port_error_response("Failed to delete user", e))?;
    app_state.feeds.remove(user_id).await;
    Ok(Json(MessageResponse {
        message: "User deleted".to_string(),
    }))
}
