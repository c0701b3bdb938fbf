//! Unified error codes for the HCM server
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Tenant errors
//! - 4xxx: Employee errors
//! - 5xxx: Attendance errors
//! - 6xxx: Leave errors
//! - 7xxx: Payroll errors
//! - 8xxx: Notification errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the browser client can
/// switch on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Too many requests (rate limited)
    TooManyRequests = 9,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,
    /// Password too short
    PasswordTooShort = 1008,
    /// Email already registered
    EmailAlreadyRegistered = 1009,
    /// Current password does not match
    CurrentPasswordIncorrect = 1010,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Acting on someone outside the manager's team
    NotDirectReport = 2003,
    /// Cannot modify a super admin account
    CannotModifySuperAdmin = 2004,
    /// Self registration into an existing tenant with a raised role
    RegistrationRoleRestricted = 2005,

    // ==================== 3xxx: Tenant ====================
    /// Tenant id missing or malformed
    TenantRequired = 3001,

    // ==================== 4xxx: Employee ====================
    /// Employee not found
    EmployeeNotFound = 4001,
    /// Employee code already used in this tenant
    EmployeeCodeExists = 4002,
    /// Employee is not active
    EmployeeInactive = 4003,
    /// User account has no linked employee profile
    EmployeeProfileMissing = 4004,
    /// User not found
    UserNotFound = 4101,

    // ==================== 5xxx: Attendance ====================
    /// Attendance record not found
    AttendanceNotFound = 5001,
    /// Already checked in today
    AlreadyCheckedIn = 5002,
    /// Not checked in
    NotCheckedIn = 5003,
    /// Already checked out
    AlreadyCheckedOut = 5004,
    /// Break already in progress
    BreakAlreadyStarted = 5005,
    /// No break in progress
    BreakNotStarted = 5006,
    /// Regularization request not found
    RegularizationNotFound = 5101,
    /// Regularization request is no longer pending
    RegularizationNotPending = 5102,

    // ==================== 6xxx: Leave ====================
    /// Leave request not found
    LeaveRequestNotFound = 6001,
    /// Leave date range is invalid
    LeaveInvalidDateRange = 6002,
    /// Not enough leave balance
    LeaveInsufficientBalance = 6003,
    /// Leave request is not pending
    LeaveNotPending = 6004,
    /// Leave request cannot be cancelled in its current state
    LeaveCannotCancel = 6005,
    /// Leave balance not found
    LeaveBalanceNotFound = 6006,
    /// Leave request overlaps an existing request
    LeaveOverlap = 6007,

    // ==================== 7xxx: Payroll ====================
    /// Payroll record not found
    PayrollNotFound = 7001,
    /// Payroll already exists for the period
    PayrollAlreadyExists = 7002,
    /// Payroll status transition not allowed
    PayrollInvalidTransition = 7003,
    /// Payroll period invalid
    PayrollInvalidPeriod = 7004,
    /// No active employees to run payroll for
    NoActiveEmployees = 7005,
    /// Invalid salary amount
    PayrollInvalidAmount = 7006,
    /// Country has no known currency or tax rule
    UnsupportedCountry = 7007,
    /// Tax brackets are malformed
    TaxRuleInvalid = 7008,

    // ==================== 8xxx: Notification ====================
    NotificationNotFound = 8001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::TooManyRequests => "Too many requests, try again later",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid credentials",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is inactive",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",
            ErrorCode::EmailAlreadyRegistered => "User already exists",
            ErrorCode::CurrentPasswordIncorrect => "Current password is incorrect",

            // Permission
            ErrorCode::PermissionDenied => "Forbidden: Insufficient permissions",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::NotDirectReport => "Can only act on direct reports",
            ErrorCode::CannotModifySuperAdmin => "Cannot modify super admin account",
            ErrorCode::RegistrationRoleRestricted => {
                "Only employee accounts can be self-registered into an existing tenant"
            }

            // Tenant
            ErrorCode::TenantRequired => "Tenant is required",

            // Employee
            ErrorCode::EmployeeNotFound => "Employee not found",
            ErrorCode::EmployeeCodeExists => "Employee ID already exists",
            ErrorCode::EmployeeInactive => "Employee is not active",
            ErrorCode::EmployeeProfileMissing => "No employee profile linked to this account",
            ErrorCode::UserNotFound => "User not found",

            // Attendance
            ErrorCode::AttendanceNotFound => "No attendance record found for today",
            ErrorCode::AlreadyCheckedIn => "Already checked in today",
            ErrorCode::NotCheckedIn => "Not checked in",
            ErrorCode::AlreadyCheckedOut => "Already checked out",
            ErrorCode::BreakAlreadyStarted => "Break already started",
            ErrorCode::BreakNotStarted => "Break not started",
            ErrorCode::RegularizationNotFound => "Regularization request not found",
            ErrorCode::RegularizationNotPending => "Regularization request is not pending",

            // Leave
            ErrorCode::LeaveRequestNotFound => "Leave request not found",
            ErrorCode::LeaveInvalidDateRange => "Invalid date range",
            ErrorCode::LeaveInsufficientBalance => "Insufficient leave balance",
            ErrorCode::LeaveNotPending => "Leave request is not pending",
            ErrorCode::LeaveCannotCancel => "Leave request cannot be cancelled",
            ErrorCode::LeaveBalanceNotFound => "Leave balance not found",
            ErrorCode::LeaveOverlap => "Leave request overlaps an existing request",

            // Payroll
            ErrorCode::PayrollNotFound => "Payroll record not found",
            ErrorCode::PayrollAlreadyExists => "Payroll already exists for this month",
            ErrorCode::PayrollInvalidTransition => "Payroll status transition not allowed",
            ErrorCode::PayrollInvalidPeriod => "Invalid payroll period",
            ErrorCode::NoActiveEmployees => "No active employees found",
            ErrorCode::PayrollInvalidAmount => "Invalid salary amount",
            ErrorCode::UnsupportedCountry => "Country is not supported",
            ErrorCode::TaxRuleInvalid => "Invalid tax brackets",

            // Notification
            ErrorCode::NotificationNotFound => "Notification not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::TooManyRequests),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountDisabled),
            1008 => Ok(ErrorCode::PasswordTooShort),
            1009 => Ok(ErrorCode::EmailAlreadyRegistered),
            1010 => Ok(ErrorCode::CurrentPasswordIncorrect),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::NotDirectReport),
            2004 => Ok(ErrorCode::CannotModifySuperAdmin),
            2005 => Ok(ErrorCode::RegistrationRoleRestricted),

            // Tenant
            3001 => Ok(ErrorCode::TenantRequired),

            // Employee
            4001 => Ok(ErrorCode::EmployeeNotFound),
            4002 => Ok(ErrorCode::EmployeeCodeExists),
            4003 => Ok(ErrorCode::EmployeeInactive),
            4004 => Ok(ErrorCode::EmployeeProfileMissing),
            4101 => Ok(ErrorCode::UserNotFound),

            // Attendance
            5001 => Ok(ErrorCode::AttendanceNotFound),
            5002 => Ok(ErrorCode::AlreadyCheckedIn),
            5003 => Ok(ErrorCode::NotCheckedIn),
            5004 => Ok(ErrorCode::AlreadyCheckedOut),
            5005 => Ok(ErrorCode::BreakAlreadyStarted),
            5006 => Ok(ErrorCode::BreakNotStarted),
            5101 => Ok(ErrorCode::RegularizationNotFound),
            5102 => Ok(ErrorCode::RegularizationNotPending),

            // Leave
            6001 => Ok(ErrorCode::LeaveRequestNotFound),
            6002 => Ok(ErrorCode::LeaveInvalidDateRange),
            6003 => Ok(ErrorCode::LeaveInsufficientBalance),
            6004 => Ok(ErrorCode::LeaveNotPending),
            6005 => Ok(ErrorCode::LeaveCannotCancel),
            6006 => Ok(ErrorCode::LeaveBalanceNotFound),
            6007 => Ok(ErrorCode::LeaveOverlap),

            // Payroll
            7001 => Ok(ErrorCode::PayrollNotFound),
            7002 => Ok(ErrorCode::PayrollAlreadyExists),
            7003 => Ok(ErrorCode::PayrollInvalidTransition),
            7004 => Ok(ErrorCode::PayrollInvalidPeriod),
            7005 => Ok(ErrorCode::NoActiveEmployees),
            7006 => Ok(ErrorCode::PayrollInvalidAmount),
            7007 => Ok(ErrorCode::UnsupportedCountry),
            7008 => Ok(ErrorCode::TaxRuleInvalid),

            // Notification
            8001 => Ok(ErrorCode::NotificationNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
