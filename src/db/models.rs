use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub password_hash: String,
    pub is_teacher: bool,
    pub is_active: bool,
    pub created_at: String,
}

/// Public view of a user, without the password hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub is_teacher: bool,
    pub is_active: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            full_name: user.full_name,
            is_teacher: user.is_teacher,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// Closed attendance status set. Unknown values are rejected during
/// request deserialization rather than coerced.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
            Self::Excused => "excused",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: String,
    pub user_id: String,
    pub class_name: String,
    pub status: AttendanceStatus,
    pub check_in_time: String,
    pub check_out_time: Option<String>,
    pub notes: Option<String>,
    pub marked_by: Option<String>,
}

/// Attendance record joined with the student's identity, used by the
/// per-class daily roster view
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceWithUser {
    pub id: String,
    pub user_id: String,
    pub class_name: String,
    pub status: AttendanceStatus,
    pub check_in_time: String,
    pub check_out_time: Option<String>,
    pub notes: Option<String>,
    pub marked_by: Option<String>,
    pub username: String,
    pub full_name: Option<String>,
}

// DTOs for API

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
    pub password: String,
    #[serde(default)]
    pub is_teacher: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    pub user_id: String,
    pub class_name: String,
    #[serde(default)]
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MarkRequest {
    pub user_id: String,
    pub class_name: String,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

/// Per-user attendance aggregate over all of the user's records
#[derive(Debug, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: String,
    pub username: String,
    pub full_name: Option<String>,
    pub total_records: i64,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
    /// Percentage of records counted present or late, e.g. "80%"
    pub attendance_rate: String,
}

/// Per-class attendance aggregate over all of the class's records
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassStats {
    pub class_name: String,
    pub total_records: i64,
    pub unique_students: i64,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
}
