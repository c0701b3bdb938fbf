//! Leave Model

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum LeaveType {
    Annual,
    Sick,
    Maternity,
    Paternity,
    Emergency,
    Unpaid,
    Compensatory,
}

impl LeaveType {
    pub const ALL: [LeaveType; 7] = [
        LeaveType::Annual,
        LeaveType::Sick,
        LeaveType::Maternity,
        LeaveType::Paternity,
        LeaveType::Emergency,
        LeaveType::Unpaid,
        LeaveType::Compensatory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveType::Annual => "annual",
            LeaveType::Sick => "sick",
            LeaveType::Maternity => "maternity",
            LeaveType::Paternity => "paternity",
            LeaveType::Emergency => "emergency",
            LeaveType::Unpaid => "unpaid",
            LeaveType::Compensatory => "compensatory",
        }
    }

    /// Unpaid leave has no balance
    pub fn is_tracked(&self) -> bool {
        !matches!(self, LeaveType::Unpaid)
    }
}

impl fmt::Display for LeaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
            LeaveStatus::Cancelled => "cancelled",
        }
    }
}

/// Leave request entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LeaveRequest {
    pub id: i64,
    pub tenant_id: String,
    pub employee_id: i64,
    pub leave_type: LeaveType,
    pub start_date: String,
    pub end_date: String,
    /// Weekdays in the inclusive range
    pub days: f64,
    pub reason: String,
    pub status: LeaveStatus,
    pub applied_at: i64,
    pub approved_by: Option<i64>,
    pub approved_at: Option<i64>,
    pub rejected_by: Option<i64>,
    pub rejected_at: Option<i64>,
    pub rejection_reason: Option<String>,
    pub cancelled_at: Option<i64>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub documents: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Apply for leave payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequestCreate {
    /// Only HR/admin may apply on behalf of someone else
    pub employee_id: Option<i64>,
    pub leave_type: LeaveType,
    pub start_date: String,
    pub end_date: String,
    pub reason: String,
    #[serde(default)]
    pub documents: Vec<String>,
}

/// Stored balance row for one (employee, year, type)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LeaveBalance {
    pub id: i64,
    pub tenant_id: String,
    pub employee_id: i64,
    pub year: i32,
    pub leave_type: LeaveType,
    pub total: f64,
    pub used: f64,
    pub updated_at: i64,
}

impl LeaveBalance {
    pub fn remaining(&self) -> f64 {
        self.total - self.used
    }
}

/// Balance line as the client sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveBalanceEntry {
    pub leave_type: LeaveType,
    pub total: f64,
    pub used: f64,
    pub remaining: f64,
}

impl From<&LeaveBalance> for LeaveBalanceEntry {
    fn from(b: &LeaveBalance) -> Self {
        Self {
            leave_type: b.leave_type,
            total: b.total,
            used: b.used,
            remaining: b.remaining(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveBalanceSummary {
    pub employee_id: i64,
    pub year: i32,
    pub balances: Vec<LeaveBalanceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveAllocation {
    pub leave_type: LeaveType,
    pub total: f64,
}

/// Set allocations for a year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveBalanceUpdate {
    pub year: i32,
    pub allocations: Vec<LeaveAllocation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_is_derived() {
        let b = LeaveBalance {
            id: 1,
            tenant_id: "t".into(),
            employee_id: 2,
            year: 2025,
            leave_type: LeaveType::Annual,
            total: 21.0,
            used: 5.0,
            updated_at: 0,
        };
        let entry = LeaveBalanceEntry::from(&b);
        assert_eq!(entry.remaining, 16.0);
        assert_eq!(entry.used + entry.remaining, entry.total);
    }

    #[test]
    fn test_unpaid_is_untracked() {
        assert!(!LeaveType::Unpaid.is_tracked());
        assert!(
            LeaveType::ALL
                .iter()
                .filter(|t| **t != LeaveType::Unpaid)
                .all(|t| t.is_tracked())
        );
    }

    #[test]
    fn test_leave_type_serde() {
        let t: LeaveType = serde_json::from_str("\"compensatory\"").unwrap();
        assert_eq!(t, LeaveType::Compensatory);
        assert_eq!(serde_json::to_string(&LeaveStatus::Cancelled).unwrap(), "\"cancelled\"");
    }
}
