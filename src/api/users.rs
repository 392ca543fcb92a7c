use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{RegisterRequest, User, UserResponse};
use crate::AppState;

use super::auth::{hash_password, require_active, require_teacher, CurrentUser};
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_password, validate_username};

fn validate_register_request(req: &RegisterRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_email(&req.email) {
        errors.add("email", e);
    }
    if let Err(e) = validate_username(&req.username) {
        errors.add("username", e);
    }
    if let Err(e) = validate_password(&req.password) {
        errors.add("password", e);
    }

    errors.finish()
}

/// Register a new user (student by default, teacher when is_teacher is set)
///
/// POST /users/
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_register_request(&req)?;

    let email_taken: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?;
    if email_taken.is_some() {
        return Err(ApiError::bad_request("Email already registered"));
    }

    let username_taken: Option<(String,)> =
        sqlx::query_as("SELECT id FROM users WHERE username = ?")
            .bind(&req.username)
            .fetch_optional(&state.db)
            .await?;
    if username_taken.is_some() {
        return Err(ApiError::bad_request("Username already taken"));
    }

    let id = Uuid::new_v4().to_string();
    let password_hash = hash_password(&req.password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {e}")))?;
    let created_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    sqlx::query(
        "INSERT INTO users (id, email, username, full_name, password_hash, is_teacher, is_active, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, 1, ?)",
    )
    .bind(&id)
    .bind(&req.email)
    .bind(&req.username)
    .bind(&req.full_name)
    .bind(&password_hash)
    .bind(req.is_teacher)
    .bind(&created_at)
    .execute(&state.db)
    .await?;

    tracing::info!(user_id = %id, username = %req.username, "User registered");

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// List users, teacher-only
///
/// GET /users/
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    CurrentUser(current): CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    require_active(&current)?;
    require_teacher(&current)?;

    let users = sqlx::query_as::<_, User>("SELECT * FROM users LIMIT ? OFFSET ?")
        .bind(query.limit)
        .bind(query.skip)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// The authenticated user's own profile
///
/// GET /users/me
pub async fn me(CurrentUser(current): CurrentUser) -> Result<Json<UserResponse>, ApiError> {
    require_active(&current)?;
    Ok(Json(UserResponse::from(current)))
}

/// Get a user by id
///
/// GET /users/:user_id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(&user_id)
        .fetch_optional(&state.db)
        .await?;

    let user = user.ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(UserResponse::from(user)))
}
