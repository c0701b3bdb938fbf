//! Audit log types
//!
//! Entries are immutable and never deleted; each one carries the SHA-256
//! hash of its predecessor in the same tenant's chain.

use serde::{Deserialize, Serialize};

/// Audited operation (closed set, not free text)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AuditAction {
    // Auth
    LoginSuccess,
    LoginFailed,
    Logout,
    UserRegistered,
    PasswordChanged,
    PasswordResetRequested,
    PasswordReset,

    // Employees
    EmployeeCreated,
    EmployeeUpdated,
    EmployeeDeleted,
    EmployeeDocumentAdded,

    // Attendance
    RegularizationApproved,
    RegularizationRejected,

    // Leave
    LeaveApplied,
    LeaveApproved,
    LeaveRejected,
    LeaveCancelled,
    LeaveBalanceUpdated,

    // Payroll
    PayrollGenerated,
    PayrollBulkGenerated,
    PayrollProcessed,
    PayrollPaid,
    PayrollCancelled,
    TaxRuleUpdated,

    // Notifications
    NotificationSent,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::LoginSuccess => "login_success",
            AuditAction::LoginFailed => "login_failed",
            AuditAction::Logout => "logout",
            AuditAction::UserRegistered => "user_registered",
            AuditAction::PasswordChanged => "password_changed",
            AuditAction::PasswordResetRequested => "password_reset_requested",
            AuditAction::PasswordReset => "password_reset",
            AuditAction::EmployeeCreated => "employee_created",
            AuditAction::EmployeeUpdated => "employee_updated",
            AuditAction::EmployeeDeleted => "employee_deleted",
            AuditAction::EmployeeDocumentAdded => "employee_document_added",
            AuditAction::RegularizationApproved => "regularization_approved",
            AuditAction::RegularizationRejected => "regularization_rejected",
            AuditAction::LeaveApplied => "leave_applied",
            AuditAction::LeaveApproved => "leave_approved",
            AuditAction::LeaveRejected => "leave_rejected",
            AuditAction::LeaveCancelled => "leave_cancelled",
            AuditAction::LeaveBalanceUpdated => "leave_balance_updated",
            AuditAction::PayrollGenerated => "payroll_generated",
            AuditAction::PayrollBulkGenerated => "payroll_bulk_generated",
            AuditAction::PayrollProcessed => "payroll_processed",
            AuditAction::PayrollPaid => "payroll_paid",
            AuditAction::PayrollCancelled => "payroll_cancelled",
            AuditAction::TaxRuleUpdated => "tax_rule_updated",
            AuditAction::NotificationSent => "notification_sent",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit log entry (immutable)
///
/// - `prev_hash`: hash of the previous entry in this tenant's chain
/// - `curr_hash`: SHA-256 over `prev_hash` and every stored field
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditEntry {
    pub tenant_id: String,
    /// Per-tenant sequence, starting at 1
    pub sequence: i64,
    pub timestamp: i64,
    pub action: AuditAction,
    /// e.g. "employee", "leave_request", "payroll"
    pub resource_type: String,
    pub resource_id: String,
    /// None for unauthenticated events (failed login)
    pub operator_id: Option<String>,
    pub operator_name: Option<String>,
    #[sqlx(json)]
    pub details: serde_json::Value,
    pub prev_hash: String,
    pub curr_hash: String,
}

/// Query parameters for `GET /api/audit`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    /// Unix millis, inclusive
    pub from: Option<i64>,
    /// Unix millis, inclusive
    pub to: Option<i64>,
    pub action: Option<AuditAction>,
    pub operator_id: Option<String>,
    pub resource_type: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct AuditListResponse {
    pub items: Vec<AuditEntry>,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct AuditChainVerification {
    pub total_entries: i64,
    pub chain_intact: bool,
    pub breaks: Vec<AuditChainBreak>,
}

#[derive(Debug, Serialize)]
pub struct AuditChainBreak {
    pub sequence: i64,
    pub expected_prev_hash: String,
    pub actual_prev_hash: String,
    /// False when the entry's own fields no longer match its hash
    pub hash_valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serde_matches_as_str() {
        for action in [
            AuditAction::LoginFailed,
            AuditAction::EmployeeDocumentAdded,
            AuditAction::PayrollBulkGenerated,
        ] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
        }
    }
}
