//! Dashboard read models

use serde::{Deserialize, Serialize};

use super::attendance::{Attendance, SessionState};
use super::employee::DepartmentCount;
use super::leave::{LeaveBalanceEntry, LeaveRequest};
use super::payroll::{CurrencyTotals, Payroll};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadcountSummary {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub on_leave: i64,
    pub terminated: i64,
}

/// Attendance counts for one business date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyAttendanceSummary {
    pub date: String,
    pub checked_in: i64,
    pub present: i64,
    pub late: i64,
    pub work_from_home: i64,
    pub on_leave: i64,
    /// Active employees without a record today
    pub not_marked: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminDashboard {
    pub headcount: HeadcountSummary,
    pub departments: Vec<DepartmentCount>,
    pub attendance_today: DailyAttendanceSummary,
    pub pending_leave_requests: i64,
    pub pending_regularizations: i64,
    pub month: u32,
    pub year: i32,
    pub payroll_this_month: Vec<CurrencyTotals>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HrDashboard {
    pub headcount: HeadcountSummary,
    pub attendance_today: DailyAttendanceSummary,
    pub pending_leave_requests: i64,
    pub upcoming_leave: Vec<LeaveRequest>,
    pub month: u32,
    pub year: i32,
    pub payroll_this_month: Vec<CurrencyTotals>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerDashboard {
    pub team_size: i64,
    pub attendance_today: DailyAttendanceSummary,
    pub pending_leave_requests: Vec<LeaveRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeDashboard {
    pub employee_id: i64,
    pub today: Option<Attendance>,
    pub session: SessionState,
    pub year: i32,
    pub leave_balances: Vec<LeaveBalanceEntry>,
    pub pending_leave_requests: i64,
    pub latest_payroll: Option<Payroll>,
}
