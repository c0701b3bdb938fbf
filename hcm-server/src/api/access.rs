//! Role scoping shared by the resource handlers
//!
//! Permissions decide whether a route is reachable; these helpers decide
//! which employees' rows the caller may see or act on.

use shared::error::ErrorCode;

use crate::audit::{AuditAction, AuditRecord};
use crate::auth::{CurrentUser, permissions};
use crate::core::ServerState;
use crate::db::repository::{Scope, employee};
use crate::utils::{AppError, AppResult};

/// The three visibility levels a resource grants
#[derive(Debug, Clone, Copy)]
pub struct ViewPermissions {
    pub all: &'static str,
    pub team: &'static str,
    pub own: &'static str,
}

impl ViewPermissions {
    pub fn as_slice(&self) -> [&'static str; 3] {
        [self.all, self.team, self.own]
    }
}

pub const EMPLOYEE_VIEW: ViewPermissions = ViewPermissions {
    all: permissions::EMPLOYEE_READ_ALL,
    team: permissions::EMPLOYEE_READ_TEAM,
    own: permissions::EMPLOYEE_READ_SELF,
};

pub const ATTENDANCE_VIEW: ViewPermissions = ViewPermissions {
    all: permissions::ATTENDANCE_VIEW_ALL,
    team: permissions::ATTENDANCE_VIEW_TEAM,
    own: permissions::ATTENDANCE_VIEW_SELF,
};

pub const LEAVE_VIEW: ViewPermissions = ViewPermissions {
    all: permissions::LEAVE_VIEW_ALL,
    team: permissions::LEAVE_VIEW_TEAM,
    own: permissions::LEAVE_VIEW_SELF,
};

pub const PAYROLL_VIEW: ViewPermissions = ViewPermissions {
    all: permissions::PAYROLL_VIEW_ALL,
    team: permissions::PAYROLL_VIEW_TEAM,
    own: permissions::PAYROLL_VIEW_SELF,
};

/// Caller's linked employee profile id
pub fn own_employee_id(user: &CurrentUser) -> AppResult<i64> {
    user.employee_id
        .ok_or_else(|| AppError::new(ErrorCode::EmployeeProfileMissing))
}

/// Rows the caller may read for a resource
///
/// - `all`: the whole tenant
/// - `team`: direct reports plus self
/// - `own`: self only
pub async fn view_scope(
    state: &ServerState,
    user: &CurrentUser,
    perms: ViewPermissions,
) -> AppResult<Scope> {
    if user.has_permission(perms.all) {
        return Ok(Scope::All);
    }
    if user.has_permission(perms.team) {
        let mut ids = match user.employee_id {
            Some(manager_id) => {
                employee::direct_report_ids(&state.pool, &user.tenant_id, manager_id).await?
            }
            None => Vec::new(),
        };
        ids.extend(user.employee_id);
        return Ok(Scope::Employees(ids));
    }
    if user.has_permission(perms.own) {
        return Ok(Scope::single(own_employee_id(user)?));
    }
    Err(AppError::forbidden("Forbidden: Insufficient permissions"))
}

/// Refuse with 403 unless `employee_id` is inside the caller's scope
pub async fn ensure_can_view(
    state: &ServerState,
    user: &CurrentUser,
    perms: ViewPermissions,
    employee_id: i64,
) -> AppResult<()> {
    let scope = view_scope(state, user, perms).await?;
    if scope.allows(employee_id) {
        Ok(())
    } else {
        Err(AppError::forbidden("Forbidden: Insufficient permissions"))
    }
}

/// Reviewers without tenant wide visibility may only act on direct reports
pub async fn ensure_can_review(
    state: &ServerState,
    user: &CurrentUser,
    view_all: &'static str,
    employee_id: i64,
) -> AppResult<()> {
    if user.employee_id == Some(employee_id) && !user.is_super_admin() {
        return Err(AppError::forbidden("Cannot review your own request"));
    }
    if user.has_permission(view_all) {
        return Ok(());
    }
    let manager_id = own_employee_id(user)?;
    let reports = employee::direct_report_ids(&state.pool, &user.tenant_id, manager_id).await?;
    if reports.contains(&employee_id) {
        Ok(())
    } else {
        Err(AppError::new(ErrorCode::NotDirectReport))
    }
}

/// Audit record attributed to the caller
pub fn audit(
    user: &CurrentUser,
    action: AuditAction,
    resource_type: &str,
    resource_id: impl ToString,
    details: serde_json::Value,
) -> AuditRecord {
    AuditRecord {
        tenant_id: user.tenant_id.clone(),
        action,
        resource_type: resource_type.to_string(),
        resource_id: resource_id.to_string(),
        operator_id: Some(user.id.to_string()),
        operator_name: Some(user.name.clone()),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::permissions::permissions_for;
    use crate::core::Config;
    use crate::db::repository::test_support::{pool, seed_employee};
    use shared::models::Role;

    fn caller(role: Role, tenant: &str, employee_id: Option<i64>) -> CurrentUser {
        CurrentUser {
            id: 1,
            email: "caller@test".into(),
            name: "Caller".into(),
            role,
            tenant_id: tenant.into(),
            employee_id,
            permissions: permissions_for(role),
        }
    }

    #[tokio::test]
    async fn test_scope_by_role() {
        let state = ServerState::new(Config::for_tests(), pool().await);
        let boss = seed_employee(&state.pool, "acme", "M1", "Eng", None).await;
        let report = seed_employee(&state.pool, "acme", "E1", "Eng", Some(boss.id)).await;
        let other = seed_employee(&state.pool, "acme", "E2", "Ops", None).await;

        let hr = caller(Role::Hr, "acme", None);
        assert_eq!(view_scope(&state, &hr, LEAVE_VIEW).await.unwrap(), Scope::All);

        let manager = caller(Role::Manager, "acme", Some(boss.id));
        let scope = view_scope(&state, &manager, LEAVE_VIEW).await.unwrap();
        assert!(scope.allows(report.id));
        assert!(scope.allows(boss.id));
        assert!(!scope.allows(other.id));

        let staff = caller(Role::Employee, "acme", Some(report.id));
        assert_eq!(
            view_scope(&state, &staff, PAYROLL_VIEW).await.unwrap(),
            Scope::single(report.id)
        );
        assert!(ensure_can_view(&state, &staff, PAYROLL_VIEW, other.id).await.is_err());
    }

    #[tokio::test]
    async fn test_review_limited_to_direct_reports() {
        let state = ServerState::new(Config::for_tests(), pool().await);
        let boss = seed_employee(&state.pool, "acme", "M1", "Eng", None).await;
        let report = seed_employee(&state.pool, "acme", "E1", "Eng", Some(boss.id)).await;
        let other = seed_employee(&state.pool, "acme", "E2", "Ops", None).await;

        let manager = caller(Role::Manager, "acme", Some(boss.id));
        assert!(
            ensure_can_review(&state, &manager, permissions::LEAVE_VIEW_ALL, report.id)
                .await
                .is_ok()
        );
        let err = ensure_can_review(&state, &manager, permissions::LEAVE_VIEW_ALL, other.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotDirectReport);

        let err = ensure_can_review(&state, &manager, permissions::LEAVE_VIEW_ALL, boss.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }
}
