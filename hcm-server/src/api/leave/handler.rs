//! Leave API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Datelike;
use serde::Deserialize;
use shared::error::ErrorCode;
use shared::models::{
    LeaveBalanceEntry, LeaveBalanceSummary, LeaveBalanceUpdate, LeaveRequest, LeaveRequestCreate,
    LeaveStatus, LeaveType, NotificationKind, PaginatedResponse, RejectRequest, page_window,
};

use crate::api::access::{self, LEAVE_VIEW};
use crate::api::notifications::notify_employee;
use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::auth::permissions::{LEAVE_MANAGE_BALANCE, LEAVE_VIEW_ALL};
use crate::core::ServerState;
use crate::db::repository::leave::{self, LeaveFilter, NewLeave};
use crate::db::repository::{employee, leave_balance};
use crate::leave::{can_transition, validate_range};
use crate::utils::time::parse_date;
use crate::utils::validation::{MAX_NOTE_LEN, MAX_URL_LEN, validate_required_text};
use crate::utils::{AppError, AppResult};

const RESOURCE: &str = "leave_request";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub employee_id: Option<i64>,
    pub leave_type: Option<LeaveType>,
    pub status: Option<LeaveStatus>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub employee_id: Option<i64>,
    pub year: Option<i32>,
}

async fn load(state: &ServerState, tenant_id: &str, id: i64) -> AppResult<LeaveRequest> {
    leave::find_by_id(&state.pool, tenant_id, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::LeaveRequestNotFound))
}

async fn ensure_employee(state: &ServerState, tenant_id: &str, id: i64) -> AppResult<()> {
    employee::find_by_id(&state.pool, tenant_id, id)
        .await?
        .map(|_| ())
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::EmployeeNotFound, format!("Employee {} not found", id))
        })
}

/// POST /api/leave
///
/// `employee_id` other than the caller's own requires `leave:manage_balance`.
pub async fn apply(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<LeaveRequestCreate>,
) -> AppResult<Json<LeaveRequest>> {
    let employee_id = match payload.employee_id {
        Some(id) if current.employee_id != Some(id) => {
            if !current.has_permission(LEAVE_MANAGE_BALANCE) {
                return Err(AppError::forbidden(
                    "Forbidden: cannot apply for leave on behalf of others",
                ));
            }
            id
        }
        Some(id) => id,
        None => access::own_employee_id(&current)?,
    };

    validate_required_text(&payload.reason, "reason", MAX_NOTE_LEN)?;
    for doc in &payload.documents {
        validate_required_text(doc, "document", MAX_URL_LEN)?;
    }
    let range = validate_range(&payload.start_date, &payload.end_date)?;
    ensure_employee(&state, &current.tenant_id, employee_id).await?;

    let created = leave::create(
        &state.pool,
        &current.tenant_id,
        &NewLeave {
            employee_id,
            leave_type: payload.leave_type,
            start_date: crate::utils::time::format_date(range.start),
            end_date: crate::utils::time::format_date(range.end),
            days: range.days,
            reason: payload.reason.trim().to_string(),
            documents: payload.documents,
        },
    )
    .await?;

    state
        .audit
        .record(access::audit(
            &current,
            AuditAction::LeaveApplied,
            RESOURCE,
            created.id,
            serde_json::json!({
                "employee_id": created.employee_id,
                "leave_type": created.leave_type,
                "days": created.days,
            }),
        ))
        .await;

    Ok(Json(created))
}

/// GET /api/leave - most recently applied first
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<PaginatedResponse<LeaveRequest>>> {
    let scope = access::view_scope(&state, &current, LEAVE_VIEW).await?;
    if let Some(id) = query.employee_id
        && !scope.allows(id)
    {
        return Err(AppError::forbidden("Forbidden: Insufficient permissions"));
    }
    for date in [&query.start_date, &query.end_date].into_iter().flatten() {
        parse_date(date)?;
    }
    let (page, limit, offset) = page_window(query.page, query.limit, 10);

    let filter = LeaveFilter {
        employee_id: query.employee_id,
        leave_type: query.leave_type,
        status: query.status,
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let (items, total) = leave::list(
        &state.pool,
        &current.tenant_id,
        &scope,
        &filter,
        limit as i64,
        offset,
    )
    .await?;
    Ok(Json(PaginatedResponse::new(items, total, page, limit)))
}

/// GET /api/leave/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<LeaveRequest>> {
    let request = load(&state, &current.tenant_id, id).await?;
    access::ensure_can_view(&state, &current, LEAVE_VIEW, request.employee_id).await?;
    Ok(Json(request))
}

/// POST /api/leave/{id}/approve - debits the balance in the same transaction
pub async fn approve(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<LeaveRequest>> {
    let request = load(&state, &current.tenant_id, id).await?;
    access::ensure_can_review(&state, &current, LEAVE_VIEW_ALL, request.employee_id).await?;

    let approved = leave::approve(&state.pool, &current.tenant_id, id, current.id).await?;

    state
        .audit
        .record(access::audit(
            &current,
            AuditAction::LeaveApproved,
            RESOURCE,
            id,
            serde_json::json!({
                "employee_id": approved.employee_id,
                "leave_type": approved.leave_type,
                "days": approved.days,
            }),
        ))
        .await;
    tracing::info!(leave_id = id, approver = current.id, "Leave approved");
    notify_employee(
        &state,
        &current.tenant_id,
        approved.employee_id,
        NotificationKind::LeaveRequest,
        "Leave approved",
        format!(
            "Your {} leave from {} to {} was approved",
            approved.leave_type, approved.start_date, approved.end_date
        ),
        serde_json::json!({ "leave_id": id, "status": "approved" }),
    )
    .await;

    Ok(Json(approved))
}

/// POST /api/leave/{id}/reject
pub async fn reject(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RejectRequest>,
) -> AppResult<Json<LeaveRequest>> {
    validate_required_text(&payload.reason, "reason", MAX_NOTE_LEN)?;
    let request = load(&state, &current.tenant_id, id).await?;
    access::ensure_can_review(&state, &current, LEAVE_VIEW_ALL, request.employee_id).await?;

    let rejected =
        leave::reject(&state.pool, &current.tenant_id, id, current.id, &payload.reason).await?;

    state
        .audit
        .record(access::audit(
            &current,
            AuditAction::LeaveRejected,
            RESOURCE,
            id,
            serde_json::json!({ "employee_id": rejected.employee_id, "reason": payload.reason }),
        ))
        .await;
    notify_employee(
        &state,
        &current.tenant_id,
        rejected.employee_id,
        NotificationKind::LeaveRequest,
        "Leave rejected",
        format!(
            "Your {} leave from {} to {} was rejected: {}",
            rejected.leave_type, rejected.start_date, rejected.end_date, payload.reason
        ),
        serde_json::json!({ "leave_id": id, "status": "rejected" }),
    )
    .await;

    Ok(Json(rejected))
}

/// POST /api/leave/{id}/cancel - the applicant, or someone managing balances
pub async fn cancel(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<LeaveRequest>> {
    let request = load(&state, &current.tenant_id, id).await?;
    let is_owner = current.employee_id == Some(request.employee_id);
    if !is_owner && !current.has_permission(LEAVE_MANAGE_BALANCE) {
        return Err(AppError::forbidden(
            "Forbidden: only the applicant can cancel this request",
        ));
    }
    if !can_transition(request.status, LeaveStatus::Cancelled) {
        return Err(AppError::with_message(
            ErrorCode::LeaveCannotCancel,
            format!("A {} leave request cannot be cancelled", request.status.as_str()),
        ));
    }

    let cancelled = leave::cancel(&state.pool, &current.tenant_id, id).await?;

    state
        .audit
        .record(access::audit(
            &current,
            AuditAction::LeaveCancelled,
            RESOURCE,
            id,
            serde_json::json!({
                "employee_id": cancelled.employee_id,
                "was": request.status,
                "days": cancelled.days,
            }),
        ))
        .await;

    Ok(Json(cancelled))
}

/// GET /api/leave/balance?employee_id&year - created with defaults on first read
pub async fn get_balance(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<BalanceQuery>,
) -> AppResult<Json<LeaveBalanceSummary>> {
    let employee_id = match query.employee_id {
        Some(id) => id,
        None => access::own_employee_id(&current)?,
    };
    access::ensure_can_view(&state, &current, LEAVE_VIEW, employee_id).await?;
    ensure_employee(&state, &current.tenant_id, employee_id).await?;
    let year = query.year.unwrap_or_else(|| state.today().year());

    let rows = leave_balance::list_for(&state.pool, &current.tenant_id, employee_id, year).await?;
    Ok(Json(LeaveBalanceSummary {
        employee_id,
        year,
        balances: rows.iter().map(LeaveBalanceEntry::from).collect(),
    }))
}

/// PUT /api/leave/balance/{employee_id}
pub async fn set_balance(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(employee_id): Path<i64>,
    Json(payload): Json<LeaveBalanceUpdate>,
) -> AppResult<Json<LeaveBalanceSummary>> {
    if !(2000..=2100).contains(&payload.year) {
        return Err(AppError::validation("year must be between 2000 and 2100"));
    }
    ensure_employee(&state, &current.tenant_id, employee_id).await?;

    let rows = leave_balance::set_allocations(
        &state.pool,
        &current.tenant_id,
        employee_id,
        payload.year,
        &payload.allocations,
    )
    .await?;

    state
        .audit
        .record(access::audit(
            &current,
            AuditAction::LeaveBalanceUpdated,
            "leave_balance",
            employee_id,
            serde_json::json!({ "year": payload.year, "allocations": payload.allocations }),
        ))
        .await;

    Ok(Json(LeaveBalanceSummary {
        employee_id,
        year: payload.year,
        balances: rows.iter().map(LeaveBalanceEntry::from).collect(),
    }))
}
