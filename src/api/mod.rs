mod attendance;
pub mod auth;
pub mod error;
mod users;
mod validation;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new().route("/auth/login", post(auth::login));

    let user_routes = Router::new()
        .route("/users/", post(users::register).get(users::list_users))
        .route("/users/me", get(users::me))
        .route("/users/:user_id", get(users::get_user));

    let attendance_routes = Router::new()
        .route("/attendance/check-in", post(attendance::check_in))
        .route("/attendance/mark", post(attendance::mark))
        .route("/attendance/", get(attendance::list))
        .route("/attendance/user/:user_id", get(attendance::user_attendance))
        .route("/attendance/class/:class_name/today", get(attendance::class_today))
        .route("/attendance/stats/user/:user_id", get(attendance::user_stats))
        .route("/attendance/stats/class/:class_name", get(attendance::class_stats));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(auth_routes)
        .merge(user_routes)
        .merge(attendance_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Rollcall attendance service",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}
