//! Attendance ledger: the rules governing who may create a record, the
//! same-day duplicate guard, and the aggregate computations.
//!
//! Records are create-once; nothing here updates or deletes them. All
//! day arithmetic is anchored to the UTC calendar day, so the duplicate
//! guard and the date filters agree regardless of server locale.

use chrono::{NaiveDate, SecondsFormat, Utc};
use sqlx::{QueryBuilder, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{
    AttendanceRecord, AttendanceStatus, AttendanceWithUser, ClassStats, User, UserStats,
};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("User not found")]
    UserNotFound,
    #[error("Student not found")]
    StudentNotFound,
    #[error("Only teachers can mark attendance")]
    NotATeacher,
    #[error("Already checked in for this class today")]
    AlreadyCheckedIn,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn today_utc() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

async fn fetch_user(pool: &SqlitePool, user_id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Whether a record already exists for (user, class, today's UTC day).
///
/// Read-then-write: two concurrent check-ins for the same triple can both
/// pass this check before either insert commits. The window is accepted,
/// matching the original behavior.
async fn has_record_today(
    pool: &SqlitePool,
    user_id: &str,
    class_name: &str,
) -> Result<bool, sqlx::Error> {
    let existing: Option<(String,)> = sqlx::query_as(
        "SELECT id FROM attendance \
         WHERE user_id = ? AND class_name = ? AND date(check_in_time) = ?",
    )
    .bind(user_id)
    .bind(class_name)
    .bind(today_utc())
    .fetch_optional(pool)
    .await?;

    Ok(existing.is_some())
}

async fn insert_record(
    pool: &SqlitePool,
    user_id: &str,
    class_name: &str,
    status: AttendanceStatus,
    notes: Option<&str>,
    marked_by: Option<&str>,
) -> Result<AttendanceRecord, sqlx::Error> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO attendance (id, user_id, class_name, status, check_in_time, notes, marked_by) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(user_id)
    .bind(class_name)
    .bind(status)
    .bind(now_rfc3339())
    .bind(notes)
    .bind(marked_by)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, AttendanceRecord>("SELECT * FROM attendance WHERE id = ?")
        .bind(&id)
        .fetch_one(pool)
        .await
}

/// Student checks in for a class
pub async fn check_in(
    pool: &SqlitePool,
    user_id: &str,
    class_name: &str,
    status: AttendanceStatus,
    notes: Option<&str>,
) -> Result<AttendanceRecord, LedgerError> {
    if fetch_user(pool, user_id).await?.is_none() {
        return Err(LedgerError::UserNotFound);
    }

    if has_record_today(pool, user_id, class_name).await? {
        return Err(LedgerError::AlreadyCheckedIn);
    }

    let record = insert_record(pool, user_id, class_name, status, notes, None).await?;
    tracing::info!(user_id, class_name, status = %status, "Student checked in");
    Ok(record)
}

/// Teacher marks a student's attendance.
///
/// With `dedupe` off, a teacher may create several records for the same
/// class and day; with it on, the check-in duplicate guard applies here
/// too.
pub async fn mark(
    pool: &SqlitePool,
    dedupe: bool,
    teacher_id: &str,
    user_id: &str,
    class_name: &str,
    status: AttendanceStatus,
    notes: Option<&str>,
) -> Result<AttendanceRecord, LedgerError> {
    let teacher = fetch_user(pool, teacher_id).await?;
    match teacher {
        Some(ref t) if t.is_teacher && t.is_active => {}
        _ => return Err(LedgerError::NotATeacher),
    }

    if fetch_user(pool, user_id).await?.is_none() {
        return Err(LedgerError::StudentNotFound);
    }

    if dedupe && has_record_today(pool, user_id, class_name).await? {
        return Err(LedgerError::AlreadyCheckedIn);
    }

    let record = insert_record(pool, user_id, class_name, status, notes, Some(teacher_id)).await?;
    tracing::info!(teacher_id, user_id, class_name, status = %status, "Attendance marked");
    Ok(record)
}

/// List records matching all provided filters, offset/limit paginated
pub async fn list(
    pool: &SqlitePool,
    class_name: Option<&str>,
    date: Option<NaiveDate>,
    skip: i64,
    limit: i64,
) -> Result<Vec<AttendanceRecord>, LedgerError> {
    let mut query = QueryBuilder::new("SELECT * FROM attendance WHERE 1 = 1");

    if let Some(class_name) = class_name {
        query.push(" AND class_name = ").push_bind(class_name);
    }
    if let Some(date) = date {
        query
            .push(" AND date(check_in_time) = ")
            .push_bind(date.format("%Y-%m-%d").to_string());
    }
    query.push(" LIMIT ").push_bind(limit);
    query.push(" OFFSET ").push_bind(skip);

    let records = query
        .build_query_as::<AttendanceRecord>()
        .fetch_all(pool)
        .await?;
    Ok(records)
}

/// All records for one user
pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<AttendanceRecord>, LedgerError> {
    if fetch_user(pool, user_id).await?.is_none() {
        return Err(LedgerError::UserNotFound);
    }

    let records =
        sqlx::query_as::<_, AttendanceRecord>("SELECT * FROM attendance WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(pool)
            .await?;
    Ok(records)
}

/// Today's roster for a class, joined with student identity. An unknown
/// class is not an error; it just yields an empty roster.
pub async fn class_today(
    pool: &SqlitePool,
    class_name: &str,
) -> Result<Vec<AttendanceWithUser>, LedgerError> {
    let rows = sqlx::query_as::<_, AttendanceWithUser>(
        "SELECT a.id, a.user_id, a.class_name, a.status, a.check_in_time, \
                a.check_out_time, a.notes, a.marked_by, u.username, u.full_name \
         FROM attendance a \
         JOIN users u ON a.user_id = u.id \
         WHERE a.class_name = ? AND date(a.check_in_time) = ?",
    )
    .bind(class_name)
    .bind(today_utc())
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[derive(Debug, Default)]
struct StatusCounts {
    present: i64,
    absent: i64,
    late: i64,
    excused: i64,
    total: i64,
}

impl StatusCounts {
    fn add(&mut self, status: AttendanceStatus, count: i64) {
        match status {
            AttendanceStatus::Present => self.present += count,
            AttendanceStatus::Absent => self.absent += count,
            AttendanceStatus::Late => self.late += count,
            AttendanceStatus::Excused => self.excused += count,
        }
        self.total += count;
    }

    /// round((present + late) / total * 100, 2), 0 when there are no records
    fn rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let rate = (self.present + self.late) as f64 / self.total as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    }
}

async fn status_counts(
    pool: &SqlitePool,
    column: &str,
    value: &str,
) -> Result<StatusCounts, sqlx::Error> {
    // column is one of two fixed names, never caller input
    let sql = format!(
        "SELECT status, COUNT(*) FROM attendance WHERE {} = ? GROUP BY status",
        column
    );
    let rows: Vec<(AttendanceStatus, i64)> =
        sqlx::query_as(&sql).bind(value).fetch_all(pool).await?;

    let mut counts = StatusCounts::default();
    for (status, count) in rows {
        counts.add(status, count);
    }
    Ok(counts)
}

/// Attendance statistics for a user, over all of their records
pub async fn user_stats(pool: &SqlitePool, user_id: &str) -> Result<UserStats, LedgerError> {
    let user = fetch_user(pool, user_id)
        .await?
        .ok_or(LedgerError::UserNotFound)?;

    let counts = status_counts(pool, "user_id", user_id).await?;

    Ok(UserStats {
        user_id: user.id,
        username: user.username,
        full_name: user.full_name,
        total_records: counts.total,
        present: counts.present,
        absent: counts.absent,
        late: counts.late,
        excused: counts.excused,
        attendance_rate: format!("{}%", counts.rate()),
    })
}

/// Attendance statistics for a class, over all of its records
pub async fn class_stats(pool: &SqlitePool, class_name: &str) -> Result<ClassStats, LedgerError> {
    let counts = status_counts(pool, "class_name", class_name).await?;

    let (unique_students,): (i64,) =
        sqlx::query_as("SELECT COUNT(DISTINCT user_id) FROM attendance WHERE class_name = ?")
            .bind(class_name)
            .fetch_one(pool)
            .await?;

    Ok(ClassStats {
        class_name: class_name.to_string(),
        total_records: counts.total,
        unique_students,
        present: counts.present,
        absent: counts.absent,
        late: counts.late,
        excused: counts.excused,
    })
}
