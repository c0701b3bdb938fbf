//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 2xxx: Permission errors
/// - 3xxx: Tenant errors
/// - 4xxx: Employee errors
/// - 5xxx: Attendance errors
/// - 6xxx: Leave errors
/// - 7xxx: Payroll errors
/// - 8xxx: Notification errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Tenant errors (3xxx)
    Tenant,
    /// Employee errors (4xxx)
    Employee,
    /// Attendance errors (5xxx)
    Attendance,
    /// Leave errors (6xxx)
    Leave,
    /// Payroll errors (7xxx)
    Payroll,
    /// Notification errors (8xxx)
    Notification,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            3000..4000 => Self::Tenant,
            4000..5000 => Self::Employee,
            5000..6000 => Self::Attendance,
            6000..7000 => Self::Leave,
            7000..8000 => Self::Payroll,
            8000..9000 => Self::Notification,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Tenant => "tenant",
            Self::Employee => "employee",
            Self::Attendance => "attendance",
            Self::Leave => "leave",
            Self::Payroll => "payroll",
            Self::Notification => "notification",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(2001), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(3001), ErrorCategory::Tenant);
        assert_eq!(ErrorCategory::from_code(4001), ErrorCategory::Employee);
        assert_eq!(ErrorCategory::from_code(5101), ErrorCategory::Attendance);
        assert_eq!(ErrorCategory::from_code(6007), ErrorCategory::Leave);
        assert_eq!(ErrorCategory::from_code(7001), ErrorCategory::Payroll);
        assert_eq!(ErrorCategory::from_code(8500), ErrorCategory::Notification);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::TokenExpired.category(), ErrorCategory::Auth);
        assert_eq!(ErrorCode::NotDirectReport.category(), ErrorCategory::Permission);
        assert_eq!(ErrorCode::NotCheckedIn.category(), ErrorCategory::Attendance);
        assert_eq!(ErrorCode::LeaveNotPending.category(), ErrorCategory::Leave);
        assert_eq!(ErrorCode::PayrollNotFound.category(), ErrorCategory::Payroll);
        assert_eq!(ErrorCode::DatabaseError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_category_serialize() {
        let json = serde_json::to_string(&ErrorCategory::Attendance).unwrap();
        assert_eq!(json, "\"attendance\"");
        let category: ErrorCategory = serde_json::from_str("\"payroll\"").unwrap();
        assert_eq!(category, ErrorCategory::Payroll);
        assert_eq!(category.name(), "payroll");
    }
}
