// Attendance endpoints: check-in, teacher marking, listings, statistics.
// The rules live in the ledger module; handlers validate input and map
// ledger results onto HTTP.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use crate::db::{
    AttendanceRecord, AttendanceWithUser, CheckInRequest, ClassStats, MarkRequest, UserStats,
};
use crate::ledger;
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_class_name, validate_notes};

fn validate_record_fields(class_name: &str, notes: Option<&str>) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_class_name(class_name) {
        errors.add("class_name", e);
    }
    if let Err(e) = validate_notes(notes) {
        errors.add("notes", e);
    }
    errors.finish()
}

/// Student checks in for a class
///
/// POST /attendance/check-in
pub async fn check_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckInRequest>,
) -> Result<(StatusCode, Json<AttendanceRecord>), ApiError> {
    validate_record_fields(&req.class_name, req.notes.as_deref())?;

    let record = ledger::check_in(
        &state.db,
        &req.user_id,
        &req.class_name,
        req.status,
        req.notes.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize)]
pub struct MarkQuery {
    /// ID of the teacher marking attendance
    pub teacher_id: String,
}

/// Teacher marks student attendance
///
/// POST /attendance/mark?teacher_id=<id>
pub async fn mark(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MarkQuery>,
    Json(req): Json<MarkRequest>,
) -> Result<(StatusCode, Json<AttendanceRecord>), ApiError> {
    validate_record_fields(&req.class_name, req.notes.as_deref())?;

    let record = ledger::mark(
        &state.db,
        state.config.attendance.dedupe_marks,
        &query.teacher_id,
        &req.user_id,
        &req.class_name,
        req.status,
        req.notes.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub class_name: Option<String>,
    pub date_filter: Option<NaiveDate>,
}

fn default_limit() -> i64 {
    100
}

/// List attendance records with optional filters
///
/// GET /attendance/?skip&limit&class_name&date_filter
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError> {
    let records = ledger::list(
        &state.db,
        query.class_name.as_deref(),
        query.date_filter,
        query.skip,
        query.limit,
    )
    .await?;
    Ok(Json(records))
}

/// All attendance records for one user
///
/// GET /attendance/user/:user_id
pub async fn user_attendance(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError> {
    let records = ledger::list_for_user(&state.db, &user_id).await?;
    Ok(Json(records))
}

/// Today's roster for a class, with student identity
///
/// GET /attendance/class/:class_name/today
pub async fn class_today(
    State(state): State<Arc<AppState>>,
    Path(class_name): Path<String>,
) -> Result<Json<Vec<AttendanceWithUser>>, ApiError> {
    let roster = ledger::class_today(&state.db, &class_name).await?;
    Ok(Json(roster))
}

/// Attendance statistics for a user
///
/// GET /attendance/stats/user/:user_id
pub async fn user_stats(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserStats>, ApiError> {
    let stats = ledger::user_stats(&state.db, &user_id).await?;
    Ok(Json(stats))
}

/// Attendance statistics for a class
///
/// GET /attendance/stats/class/:class_name
pub async fn class_stats(
    State(state): State<Arc<AppState>>,
    Path(class_name): Path<String>,
) -> Result<Json<ClassStats>, ApiError> {
    let stats = ledger::class_stats(&state.db, &class_name).await?;
    Ok(Json(stats))
}
