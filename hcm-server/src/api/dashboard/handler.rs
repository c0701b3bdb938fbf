//! Dashboard API Handlers

use axum::{Json, extract::State};
use chrono::Datelike;
use shared::models::{
    AdminDashboard, EmployeeDashboard, HrDashboard, LeaveBalanceEntry, LeaveStatus,
    ManagerDashboard,
};

use crate::api::access;
use crate::attendance::session_state;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::leave::LeaveFilter;
use crate::db::repository::{
    Scope, attendance, employee, leave, leave_balance, payroll, regularization,
};
use crate::utils::AppResult;
use crate::utils::time::format_date;

const UPCOMING_LEAVE_LIMIT: i64 = 10;
const TEAM_PENDING_LIMIT: i64 = 50;

/// GET /api/dashboard/admin
pub async fn admin(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<AdminDashboard>> {
    let pool = &state.pool;
    let tenant = current.tenant_id.as_str();
    let today = state.today();
    let date = format_date(today);

    Ok(Json(AdminDashboard {
        headcount: employee::headcount(pool, tenant, &Scope::All).await?,
        departments: employee::department_counts(pool, tenant).await?,
        attendance_today: attendance::daily_summary(pool, tenant, &Scope::All, &date).await?,
        pending_leave_requests: leave::count_pending(pool, tenant, &Scope::All).await?,
        pending_regularizations: regularization::count_pending(pool, tenant, &Scope::All).await?,
        month: today.month(),
        year: today.year(),
        payroll_this_month: payroll::totals_by_currency(
            pool,
            tenant,
            Some(today.month() as i32),
            Some(today.year()),
        )
        .await?,
    }))
}

/// GET /api/dashboard/hr
pub async fn hr(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<HrDashboard>> {
    let pool = &state.pool;
    let tenant = current.tenant_id.as_str();
    let today = state.today();
    let date = format_date(today);

    Ok(Json(HrDashboard {
        headcount: employee::headcount(pool, tenant, &Scope::All).await?,
        attendance_today: attendance::daily_summary(pool, tenant, &Scope::All, &date).await?,
        pending_leave_requests: leave::count_pending(pool, tenant, &Scope::All).await?,
        upcoming_leave: leave::upcoming_approved(pool, tenant, &date, UPCOMING_LEAVE_LIMIT)
            .await?,
        month: today.month(),
        year: today.year(),
        payroll_this_month: payroll::totals_by_currency(
            pool,
            tenant,
            Some(today.month() as i32),
            Some(today.year()),
        )
        .await?,
    }))
}

/// GET /api/dashboard/manager - direct reports only
pub async fn manager(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<ManagerDashboard>> {
    let own_id = access::own_employee_id(&current)?;
    let pool = &state.pool;
    let tenant = current.tenant_id.as_str();
    let date = format_date(state.today());

    let team = employee::direct_report_ids(pool, tenant, own_id).await?;
    let team_size = team.len() as i64;
    let scope = Scope::Employees(team);

    let filter = LeaveFilter {
        status: Some(LeaveStatus::Pending),
        ..Default::default()
    };
    let (pending, _) = leave::list(pool, tenant, &scope, &filter, TEAM_PENDING_LIMIT, 0).await?;

    Ok(Json(ManagerDashboard {
        team_size,
        attendance_today: attendance::daily_summary(pool, tenant, &scope, &date).await?,
        pending_leave_requests: pending,
    }))
}

/// GET /api/dashboard/me
pub async fn me(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<EmployeeDashboard>> {
    let employee_id = access::own_employee_id(&current)?;
    let pool = &state.pool;
    let tenant = current.tenant_id.as_str();
    let today = state.today();

    let record = attendance::find_by_date(pool, tenant, employee_id, &format_date(today)).await?;
    let balances = leave_balance::list_for(pool, tenant, employee_id, today.year()).await?;

    Ok(Json(EmployeeDashboard {
        employee_id,
        session: session_state(record.as_ref()),
        today: record,
        year: today.year(),
        leave_balances: balances.iter().map(LeaveBalanceEntry::from).collect(),
        pending_leave_requests: leave::count_pending(pool, tenant, &Scope::single(employee_id))
            .await?,
        latest_payroll: payroll::latest_for_employee(pool, tenant, employee_id).await?,
    }))
}
