//! Notification Model

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum NotificationKind {
    LeaveRequest,
    AttendanceAlert,
    PayrollProcessed,
    DocumentExpiry,
    SystemAlert,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::LeaveRequest => "leave_request",
            NotificationKind::AttendanceAlert => "attendance_alert",
            NotificationKind::PayrollProcessed => "payroll_processed",
            NotificationKind::DocumentExpiry => "document_expiry",
            NotificationKind::SystemAlert => "system_alert",
        }
    }
}

/// In-app message addressed to one user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: i64,
    pub tenant_id: String,
    pub user_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub action_url: Option<String>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub metadata: Value,
    pub created_at: i64,
    pub read_at: Option<i64>,
}

/// POST /api/notifications/send body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendNotification {
    pub user_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UnreadCount {
    pub count: i64,
}

/// Rows touched by a bulk mark-read
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarkedRead {
    pub updated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_body_defaults() {
        let body: SendNotification = serde_json::from_str(
            r#"{"user_id":7,"kind":"system_alert","title":"Maintenance","message":"Tonight"}"#,
        )
        .unwrap();
        assert_eq!(body.kind, NotificationKind::SystemAlert);
        assert!(body.action_url.is_none());
        assert!(body.metadata.is_null());
    }
}
