//! Permission Definitions
//!
//! Role based access control. Each role maps to a fixed permission list;
//! `super_admin` implicitly holds everything. The list is sent to the client
//! in `/api/auth/me` so UI gating uses the same constants.

use shared::models::Role;

// === Dashboard ===
pub const DASHBOARD_GLOBAL: &str = "dashboard:global";
pub const DASHBOARD_HR: &str = "dashboard:hr";
pub const DASHBOARD_TEAM: &str = "dashboard:team";
pub const DASHBOARD_PERSONAL: &str = "dashboard:personal";

// === Employee ===
pub const EMPLOYEE_CREATE: &str = "employee:create";
pub const EMPLOYEE_READ_ALL: &str = "employee:read_all";
pub const EMPLOYEE_READ_TEAM: &str = "employee:read_team";
pub const EMPLOYEE_READ_SELF: &str = "employee:read_self";
pub const EMPLOYEE_UPDATE_ALL: &str = "employee:update_all";
pub const EMPLOYEE_UPDATE_SELF: &str = "employee:update_self";
pub const EMPLOYEE_DELETE: &str = "employee:delete";

// === Attendance ===
pub const ATTENDANCE_VIEW_ALL: &str = "attendance:view_all";
pub const ATTENDANCE_VIEW_TEAM: &str = "attendance:view_team";
pub const ATTENDANCE_VIEW_SELF: &str = "attendance:view_self";
pub const ATTENDANCE_APPROVE: &str = "attendance:approve";
pub const ATTENDANCE_MARK: &str = "attendance:mark";

// === Leave ===
pub const LEAVE_VIEW_ALL: &str = "leave:view_all";
pub const LEAVE_VIEW_TEAM: &str = "leave:view_team";
pub const LEAVE_VIEW_SELF: &str = "leave:view_self";
pub const LEAVE_APPROVE: &str = "leave:approve";
pub const LEAVE_APPLY: &str = "leave:apply";
pub const LEAVE_MANAGE_BALANCE: &str = "leave:manage_balance";

// === Payroll ===
pub const PAYROLL_PROCESS: &str = "payroll:process";
pub const PAYROLL_VIEW_ALL: &str = "payroll:view_all";
pub const PAYROLL_VIEW_TEAM: &str = "payroll:view_team";
pub const PAYROLL_VIEW_SELF: &str = "payroll:view_self";

// === Notification ===
pub const NOTIFICATION_SEND: &str = "notification:send";

// === System ===
pub const SYSTEM_MANAGE_USERS: &str = "system:manage_users";
pub const SYSTEM_AUDIT: &str = "system:audit";

/// Every permission the server checks
pub const ALL_PERMISSIONS: &[&str] = &[
    DASHBOARD_GLOBAL,
    DASHBOARD_HR,
    DASHBOARD_TEAM,
    DASHBOARD_PERSONAL,
    EMPLOYEE_CREATE,
    EMPLOYEE_READ_ALL,
    EMPLOYEE_READ_TEAM,
    EMPLOYEE_READ_SELF,
    EMPLOYEE_UPDATE_ALL,
    EMPLOYEE_UPDATE_SELF,
    EMPLOYEE_DELETE,
    ATTENDANCE_VIEW_ALL,
    ATTENDANCE_VIEW_TEAM,
    ATTENDANCE_VIEW_SELF,
    ATTENDANCE_APPROVE,
    ATTENDANCE_MARK,
    LEAVE_VIEW_ALL,
    LEAVE_VIEW_TEAM,
    LEAVE_VIEW_SELF,
    LEAVE_APPROVE,
    LEAVE_APPLY,
    LEAVE_MANAGE_BALANCE,
    PAYROLL_PROCESS,
    PAYROLL_VIEW_ALL,
    PAYROLL_VIEW_TEAM,
    PAYROLL_VIEW_SELF,
    NOTIFICATION_SEND,
    SYSTEM_MANAGE_USERS,
    SYSTEM_AUDIT,
];

const ADMIN_PERMISSIONS: &[&str] = &[
    DASHBOARD_GLOBAL,
    EMPLOYEE_CREATE,
    EMPLOYEE_READ_ALL,
    EMPLOYEE_UPDATE_ALL,
    EMPLOYEE_DELETE,
    ATTENDANCE_VIEW_ALL,
    ATTENDANCE_APPROVE,
    LEAVE_VIEW_ALL,
    LEAVE_APPROVE,
    LEAVE_MANAGE_BALANCE,
    PAYROLL_PROCESS,
    PAYROLL_VIEW_ALL,
    NOTIFICATION_SEND,
    SYSTEM_MANAGE_USERS,
    SYSTEM_AUDIT,
];

const HR_PERMISSIONS: &[&str] = &[
    DASHBOARD_HR,
    EMPLOYEE_CREATE,
    EMPLOYEE_READ_ALL,
    EMPLOYEE_UPDATE_ALL,
    ATTENDANCE_VIEW_ALL,
    ATTENDANCE_APPROVE,
    LEAVE_VIEW_ALL,
    LEAVE_APPROVE,
    LEAVE_MANAGE_BALANCE,
    PAYROLL_PROCESS,
    PAYROLL_VIEW_ALL,
    NOTIFICATION_SEND,
    SYSTEM_MANAGE_USERS,
];

const MANAGER_PERMISSIONS: &[&str] = &[
    DASHBOARD_TEAM,
    EMPLOYEE_READ_TEAM,
    ATTENDANCE_VIEW_TEAM,
    ATTENDANCE_APPROVE,
    ATTENDANCE_MARK,
    LEAVE_VIEW_TEAM,
    LEAVE_APPROVE,
    LEAVE_VIEW_SELF,
    LEAVE_APPLY,
    PAYROLL_VIEW_TEAM,
    PAYROLL_VIEW_SELF,
    NOTIFICATION_SEND,
];

const EMPLOYEE_PERMISSIONS: &[&str] = &[
    DASHBOARD_PERSONAL,
    EMPLOYEE_READ_SELF,
    EMPLOYEE_UPDATE_SELF,
    ATTENDANCE_VIEW_SELF,
    ATTENDANCE_MARK,
    LEAVE_VIEW_SELF,
    LEAVE_APPLY,
    PAYROLL_VIEW_SELF,
];

/// Permission constants granted to a role
pub fn role_permissions(role: Role) -> &'static [&'static str] {
    match role {
        Role::SuperAdmin => ALL_PERMISSIONS,
        Role::Admin => ADMIN_PERMISSIONS,
        Role::Hr => HR_PERMISSIONS,
        Role::Manager => MANAGER_PERMISSIONS,
        Role::Employee => EMPLOYEE_PERMISSIONS,
    }
}

/// Owned permission list for token claims and `/me`
pub fn permissions_for(role: Role) -> Vec<String> {
    role_permissions(role)
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_permission_is_known() {
        for role in Role::ALL {
            for p in role_permissions(role) {
                assert!(ALL_PERMISSIONS.contains(p), "{role}: unknown permission {p}");
            }
        }
    }

    #[test]
    fn test_role_scopes() {
        assert!(role_permissions(Role::Hr).contains(&PAYROLL_PROCESS));
        assert!(!role_permissions(Role::Hr).contains(&EMPLOYEE_DELETE));
        assert!(role_permissions(Role::Manager).contains(&LEAVE_APPROVE));
        assert!(!role_permissions(Role::Manager).contains(&PAYROLL_PROCESS));
        assert!(!role_permissions(Role::Employee).contains(&LEAVE_APPROVE));
        assert!(role_permissions(Role::Employee).contains(&ATTENDANCE_MARK));
        assert!(role_permissions(Role::Manager).contains(&NOTIFICATION_SEND));
        assert!(!role_permissions(Role::Employee).contains(&NOTIFICATION_SEND));
        assert_eq!(permissions_for(Role::SuperAdmin).len(), ALL_PERMISSIONS.len());
    }
}
