//! Leave rules - day counting, allocations, status transitions

use chrono::{Datelike, NaiveDate};
use shared::models::{LeaveStatus, LeaveType};

use crate::utils::time::{is_weekend, parse_date};
use crate::utils::{AppError, AppResult, ErrorCode};

/// Yearly allocation given to every employee when a balance year is first read
pub fn default_allocation(leave_type: LeaveType) -> f64 {
    match leave_type {
        LeaveType::Annual => 21.0,
        LeaveType::Sick => 12.0,
        LeaveType::Maternity => 180.0,
        LeaveType::Paternity => 15.0,
        LeaveType::Emergency => 5.0,
        LeaveType::Compensatory => 0.0,
        LeaveType::Unpaid => 0.0,
    }
}

/// Weekdays (Mon-Fri) in the inclusive range
pub fn count_weekdays(start: NaiveDate, end: NaiveDate) -> f64 {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !is_weekend(*d))
        .count() as f64
}

/// A validated request range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaveRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: f64,
}

impl LeaveRange {
    /// Balance year of a request is the year it starts in
    pub fn year(&self) -> i32 {
        self.start.year()
    }
}

/// Parse and check a request range
pub fn validate_range(start_date: &str, end_date: &str) -> AppResult<LeaveRange> {
    let start = parse_date(start_date)?;
    let end = parse_date(end_date)?;
    if end < start {
        return Err(AppError::with_message(
            ErrorCode::LeaveInvalidDateRange,
            "End date must be on or after start date",
        ));
    }
    let days = count_weekdays(start, end);
    if days == 0.0 {
        return Err(AppError::with_message(
            ErrorCode::LeaveInvalidDateRange,
            "Leave range contains no working days",
        ));
    }
    Ok(LeaveRange { start, end, days })
}

pub fn insufficient_balance_message(leave_type: LeaveType, available: f64, requested: f64) -> String {
    format!(
        "Insufficient {} leave balance. Available: {} days, Requested: {} days",
        leave_type, available, requested
    )
}

/// Allowed status graph
pub fn can_transition(from: LeaveStatus, to: LeaveStatus) -> bool {
    use LeaveStatus::*;
    matches!(
        (from, to),
        (Pending, Approved) | (Pending, Rejected) | (Pending, Cancelled) | (Approved, Cancelled)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_weekdays() {
        let mon = parse_date("2025-03-17").unwrap();
        let fri = parse_date("2025-03-21").unwrap();
        let next_mon = parse_date("2025-03-24").unwrap();
        assert_eq!(count_weekdays(mon, mon), 1.0);
        assert_eq!(count_weekdays(mon, fri), 5.0);
        assert_eq!(count_weekdays(mon, next_mon), 6.0);
    }

    #[test]
    fn test_validate_range() {
        let range = validate_range("2025-03-17", "2025-03-18").unwrap();
        assert_eq!(range.days, 2.0);
        assert_eq!(range.year(), 2025);

        let err = validate_range("2025-03-18", "2025-03-17").unwrap_err();
        assert_eq!(err.code, ErrorCode::LeaveInvalidDateRange);

        // Saturday and Sunday only
        let err = validate_range("2025-03-15", "2025-03-16").unwrap_err();
        assert_eq!(err.code, ErrorCode::LeaveInvalidDateRange);

        assert!(validate_range("17/03/2025", "2025-03-18").is_err());
    }

    #[test]
    fn test_transitions() {
        use LeaveStatus::*;
        assert!(can_transition(Pending, Approved));
        assert!(can_transition(Approved, Cancelled));
        assert!(!can_transition(Approved, Rejected));
        assert!(!can_transition(Rejected, Cancelled));
        assert!(!can_transition(Cancelled, Pending));
    }

    #[test]
    fn test_balance_message() {
        assert_eq!(
            insufficient_balance_message(LeaveType::Sick, 2.0, 3.0),
            "Insufficient sick leave balance. Available: 2 days, Requested: 3 days"
        );
    }

    #[test]
    fn test_defaults() {
        assert_eq!(default_allocation(LeaveType::Annual), 21.0);
        assert_eq!(default_allocation(LeaveType::Maternity), 180.0);
        assert_eq!(default_allocation(LeaveType::Compensatory), 0.0);
    }
}
