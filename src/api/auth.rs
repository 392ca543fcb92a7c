use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::request::Parts,
    Json,
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::db::{LoginRequest, LoginResponse, User, UserResponse};
use crate::AppState;

use super::error::ApiError;

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Token claims: subject is the user id, expiry is a unix timestamp
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

fn signing_algorithm(auth: &AuthConfig) -> Result<Algorithm, ApiError> {
    Algorithm::from_str(&auth.algorithm)
        .map_err(|_| ApiError::internal(format!("Unsupported signing algorithm: {}", auth.algorithm)))
}

/// Issue a signed, time-limited access token for a user
pub fn create_access_token(user_id: &str, auth: &AuthConfig) -> Result<String, ApiError> {
    let algorithm = signing_algorithm(auth)?;
    let exp = (chrono::Utc::now() + chrono::Duration::minutes(auth.token_ttl_minutes)).timestamp();

    let claims = Claims {
        sub: user_id.to_string(),
        exp,
    };

    jsonwebtoken::encode(
        &Header::new(algorithm),
        &claims,
        &EncodingKey::from_secret(auth.secret_key.as_bytes()),
    )
    .map_err(|e| ApiError::internal(format!("Failed to sign token: {e}")))
}

/// Verify a token's signature and expiry, returning the subject user id
pub fn verify_token(token: &str, auth: &AuthConfig) -> Result<String, ApiError> {
    let algorithm = signing_algorithm(auth)?;
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.secret_key.as_bytes()),
        &Validation::new(algorithm),
    )
    .map_err(|_| ApiError::unauthorized("Could not validate credentials"))?;

    Ok(data.claims.sub)
}

/// Fail unless the user's account is active
pub fn require_active(user: &User) -> Result<(), ApiError> {
    if !user.is_active {
        return Err(ApiError::bad_request("Inactive user"));
    }
    Ok(())
}

/// Fail unless the user is a teacher
pub fn require_teacher(user: &User) -> Result<(), ApiError> {
    if !user.is_teacher {
        return Err(ApiError::forbidden(
            "Only teachers can perform this action",
        ));
    }
    Ok(())
}

/// Login endpoint
///
/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&request.email)
        .fetch_optional(&state.db)
        .await?;

    let user = user.ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let access_token = create_access_token(&user.id, &state.config.auth)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "bearer".to_string(),
        user: UserResponse::from(user),
    }))
}

fn extract_bearer(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Get the current user from a token
pub async fn get_current_user(
    pool: &sqlx::SqlitePool,
    auth: &AuthConfig,
    token: &str,
) -> Result<User, ApiError> {
    let user_id = verify_token(token, auth)?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(&user_id)
        .fetch_optional(pool)
        .await?;

    user.ok_or_else(|| ApiError::unauthorized("User not found"))
}

/// Extractor for the authenticated user behind a bearer token
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;
        let user = get_current_user(&state.db, &state.config.auth, token).await?;
        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorCode;

    fn test_auth_config() -> AuthConfig {
        AuthConfig {
            secret_key: "test-secret".to_string(),
            algorithm: "HS256".to_string(),
            token_ttl_minutes: 30,
        }
    }

    fn test_user(is_teacher: bool, is_active: bool) -> User {
        User {
            id: "u1".to_string(),
            email: "ada@school.edu".to_string(),
            username: "ada".to_string(),
            full_name: None,
            password_hash: String::new(),
            is_teacher,
            is_active,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-phc-string"));
    }

    #[test]
    fn test_token_roundtrip() {
        let auth = test_auth_config();
        let token = create_access_token("u1", &auth).unwrap();
        assert_eq!(verify_token(&token, &auth).unwrap(), "u1");
    }

    #[test]
    fn test_token_wrong_secret_rejected() {
        let auth = test_auth_config();
        let token = create_access_token("u1", &auth).unwrap();

        let other = AuthConfig {
            secret_key: "another-secret".to_string(),
            ..test_auth_config()
        };
        let err = verify_token(&token, &other).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = test_auth_config();
        let claims = Claims {
            sub: "u1".to_string(),
            exp: (chrono::Utc::now() - chrono::Duration::hours(1)).timestamp(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(auth.secret_key.as_bytes()),
        )
        .unwrap();

        let err = verify_token(&token, &auth).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[test]
    fn test_malformed_token_rejected() {
        let auth = test_auth_config();
        let err = verify_token("not.a.token", &auth).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[test]
    fn test_unknown_algorithm_is_internal_error() {
        let auth = AuthConfig {
            algorithm: "HS9000".to_string(),
            ..test_auth_config()
        };
        let err = create_access_token("u1", &auth).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[test]
    fn test_require_active() {
        assert!(require_active(&test_user(false, true)).is_ok());
        let err = require_active(&test_user(false, false)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::BadRequest);
    }

    #[test]
    fn test_require_teacher() {
        assert!(require_teacher(&test_user(true, true)).is_ok());
        let err = require_teacher(&test_user(false, true)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}
