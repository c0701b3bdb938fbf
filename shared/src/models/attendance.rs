//! Attendance Model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum AttendanceStatus {
    #[default]
    Present,
    Late,
    Absent,
    HalfDay,
    WorkFromHome,
    OnLeave,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum WorkLocation {
    #[default]
    Office,
    Home,
    Client,
}

/// Where the check-in/out happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
}

/// One attendance row per employee per business date
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Attendance {
    pub id: i64,
    pub tenant_id: String,
    pub employee_id: i64,
    /// Business date (YYYY-MM-DD)
    pub date: String,
    pub check_in: Option<i64>,
    pub check_out: Option<i64>,
    /// Set while a break is open
    pub break_start: Option<i64>,
    pub break_minutes: i64,
    pub total_hours: f64,
    pub overtime_hours: f64,
    pub status: AttendanceStatus,
    pub work_location: WorkLocation,
    #[cfg_attr(feature = "db", sqlx(json(nullable)))]
    pub location: Option<GeoLocation>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckInRequest {
    pub work_location: Option<WorkLocation>,
    pub location: Option<GeoLocation>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckOutRequest {
    pub location: Option<GeoLocation>,
    pub notes: Option<String>,
}

/// Session flags derived from today's record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub checked_in: bool,
    pub on_break: bool,
    pub checked_out: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodayAttendance {
    pub date: String,
    pub record: Option<Attendance>,
    pub session: SessionState,
}

/// Range summary returned by `GET /api/attendance/stats`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceStats {
    pub total_days: i64,
    pub present: i64,
    pub late: i64,
    pub absent: i64,
    pub work_from_home: i64,
    pub half_day: i64,
    pub on_leave: i64,
    pub total_hours: f64,
    pub overtime_hours: f64,
    /// Non-absent days over total days, percent with 2 decimals
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum RegularizationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Correction request for a past attendance day
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Regularization {
    pub id: i64,
    pub tenant_id: String,
    pub attendance_id: i64,
    pub employee_id: i64,
    pub date: String,
    pub reason: String,
    pub requested_check_in: Option<i64>,
    pub requested_check_out: Option<i64>,
    pub status: RegularizationStatus,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<i64>,
    pub rejection_reason: Option<String>,
    pub created_at: i64,
}

/// Regularization payload; times are `HH:MM` on `date` in business time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegularizationCreate {
    pub date: String,
    pub reason: String,
    pub requested_check_in: Option<String>,
    pub requested_check_out: Option<String>,
}
