//! Attendance API Handlers
//!
//! Session writes always act on the caller's own record for today's
//! business date; timestamps come from the server clock.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Datelike;
use serde::Deserialize;
use shared::error::ErrorCode;
use shared::models::{
    Attendance, AttendanceStats, CheckInRequest, CheckOutRequest, GeoLocation,
    PaginatedResponse, Regularization, RegularizationCreate, RegularizationStatus, RejectRequest,
    TodayAttendance, page_window,
};

use crate::api::access::{self, ATTENDANCE_VIEW};
use crate::attendance::{self as rules, AttendancePolicy};
use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::auth::permissions::ATTENDANCE_VIEW_ALL;
use crate::core::ServerState;
use crate::db::repository::attendance::{self, AttendanceFilter, CheckOut};
use crate::db::repository::regularization;
use crate::db::repository::{Scope, employee};
use crate::utils::time::{format_date, parse_date, parse_time_on_date};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub employee_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub employee_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegularizationQuery {
    pub status: Option<RegularizationStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn validate_location(location: &Option<GeoLocation>) -> AppResult<()> {
    if let Some(loc) = location {
        let lat_ok = loc.latitude.is_finite() && (-90.0..=90.0).contains(&loc.latitude);
        let lng_ok = loc.longitude.is_finite() && (-180.0..=180.0).contains(&loc.longitude);
        if !lat_ok || !lng_ok {
            return Err(AppError::validation("Invalid location coordinates"));
        }
        validate_optional_text(&loc.address, "address", MAX_NOTE_LEN)?;
    }
    Ok(())
}

/// Caller's employee id, refusing profiles that are no longer active
async fn active_self(state: &ServerState, current: &CurrentUser) -> AppResult<i64> {
    let id = access::own_employee_id(current)?;
    let found = employee::find_by_id(&state.pool, &current.tenant_id, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::EmployeeProfileMissing))?;
    if found.status != shared::models::EmployeeStatus::Active {
        return Err(AppError::new(ErrorCode::EmployeeInactive));
    }
    Ok(id)
}

async fn today_record(
    state: &ServerState,
    current: &CurrentUser,
    employee_id: i64,
) -> AppResult<Option<Attendance>> {
    let date = format_date(state.today());
    Ok(attendance::find_by_date(&state.pool, &current.tenant_id, employee_id, &date).await?)
}

/// Record checked in and not yet out
fn open_record(record: Option<Attendance>) -> AppResult<Attendance> {
    let record = match record {
        Some(r) if r.check_in.is_some() => r,
        _ => return Err(AppError::new(ErrorCode::NotCheckedIn)),
    };
    if record.check_out.is_some() {
        return Err(AppError::new(ErrorCode::AlreadyCheckedOut));
    }
    Ok(record)
}

/// POST /api/attendance/check-in
pub async fn check_in(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<CheckInRequest>,
) -> AppResult<Json<Attendance>> {
    validate_location(&payload.location)?;
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;
    let employee_id = active_self(&state, &current).await?;

    let now = shared::util::now_millis();
    let work_location = payload.work_location.unwrap_or_default();
    let status = AttendancePolicy::from_config(&state.config).status_at_check_in(work_location, now);

    let record = attendance::check_in(
        &state.pool,
        &current.tenant_id,
        employee_id,
        &format_date(state.today()),
        now,
        status,
        work_location,
        payload.location,
        payload.notes,
    )
    .await?;
    tracing::debug!(employee_id, status = ?record.status, "Checked in");

    Ok(Json(record))
}

/// POST /api/attendance/check-out - closes an open break first
pub async fn check_out(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<CheckOutRequest>,
) -> AppResult<Json<Attendance>> {
    validate_location(&payload.location)?;
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;
    let employee_id = access::own_employee_id(&current)?;
    let record = open_record(today_record(&state, &current, employee_id).await?)?;

    let now = shared::util::now_millis();
    let worked = AttendancePolicy::from_config(&state.config).close_day(&record, now);

    let updated = attendance::check_out(
        &state.pool,
        &current.tenant_id,
        record.id,
        &CheckOut {
            at: now,
            break_minutes: worked.break_minutes,
            total_hours: worked.total_hours,
            overtime_hours: worked.overtime_hours,
            status: worked.status,
            notes: payload.notes,
        },
    )
    .await?;
    tracing::debug!(employee_id, total_hours = updated.total_hours, "Checked out");

    Ok(Json(updated))
}

/// POST /api/attendance/start-break
pub async fn start_break(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<Attendance>> {
    let employee_id = access::own_employee_id(&current)?;
    let record = open_record(today_record(&state, &current, employee_id).await?)?;
    if record.break_start.is_some() {
        return Err(AppError::new(ErrorCode::BreakAlreadyStarted));
    }

    let updated = attendance::start_break(
        &state.pool,
        &current.tenant_id,
        record.id,
        shared::util::now_millis(),
    )
    .await?;
    Ok(Json(updated))
}

/// POST /api/attendance/end-break
pub async fn end_break(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<Attendance>> {
    let employee_id = access::own_employee_id(&current)?;
    let record = open_record(today_record(&state, &current, employee_id).await?)?;
    if record.break_start.is_none() {
        return Err(AppError::new(ErrorCode::BreakNotStarted));
    }

    let updated = attendance::end_break(
        &state.pool,
        &current.tenant_id,
        record.id,
        shared::util::now_millis(),
    )
    .await?;
    Ok(Json(updated))
}

/// GET /api/attendance/today
pub async fn today(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<TodayAttendance>> {
    let employee_id = access::own_employee_id(&current)?;
    let record = today_record(&state, &current, employee_id).await?;

    Ok(Json(TodayAttendance {
        date: format_date(state.today()),
        session: rules::session_state(record.as_ref()),
        record,
    }))
}

/// Validate optional date bounds and return them normalized
fn date_range(
    start: Option<String>,
    end: Option<String>,
) -> AppResult<(Option<String>, Option<String>)> {
    let start = start.as_deref().map(parse_date).transpose()?;
    let end = end.as_deref().map(parse_date).transpose()?;
    if let (Some(s), Some(e)) = (start, end)
        && e < s
    {
        return Err(AppError::validation("end_date must not be before start_date"));
    }
    Ok((start.map(format_date), end.map(format_date)))
}

/// Scope narrowed to one employee when the caller asks for one
async fn narrowed_scope(
    state: &ServerState,
    current: &CurrentUser,
    employee_id: Option<i64>,
) -> AppResult<Scope> {
    let scope = access::view_scope(state, current, ATTENDANCE_VIEW).await?;
    match employee_id {
        Some(id) if !scope.allows(id) => {
            Err(AppError::forbidden("Forbidden: Insufficient permissions"))
        }
        Some(id) => Ok(Scope::single(id)),
        None => Ok(scope),
    }
}

/// GET /api/attendance - newest date first
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Attendance>>> {
    let scope = narrowed_scope(&state, &current, query.employee_id).await?;
    let (start_date, end_date) = date_range(query.start_date, query.end_date)?;
    let (page, limit, offset) = page_window(query.page, query.limit, 31);

    let filter = AttendanceFilter {
        employee_id: None,
        start_date,
        end_date,
    };
    let (items, total) = attendance::list(
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

/// GET /api/attendance/stats - defaults to the current month up to today
pub async fn stats(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<AttendanceStats>> {
    let scope = narrowed_scope(&state, &current, query.employee_id).await?;
    let today = state.today();
    let month_start = today.with_day(1).unwrap_or(today);
    let (start_date, end_date) = date_range(
        Some(query.start_date.unwrap_or_else(|| format_date(month_start))),
        Some(query.end_date.unwrap_or_else(|| format_date(today))),
    )?;

    let filter = AttendanceFilter {
        employee_id: None,
        start_date,
        end_date,
    };
    let records = attendance::list_all(&state.pool, &current.tenant_id, &scope, &filter).await?;
    Ok(Json(rules::summarize(&records)))
}

/// POST /api/attendance/regularization
pub async fn request_regularization(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<RegularizationCreate>,
) -> AppResult<Json<Regularization>> {
    validate_required_text(&payload.reason, "reason", MAX_NOTE_LEN)?;
    let employee_id = access::own_employee_id(&current)?;

    let date = parse_date(&payload.date)?;
    if date > state.today() {
        return Err(AppError::validation("Cannot regularize a future date"));
    }
    let tz = state.config.timezone;
    let check_in = payload
        .requested_check_in
        .as_deref()
        .map(|t| parse_time_on_date(date, t, tz))
        .transpose()?;
    let check_out = payload
        .requested_check_out
        .as_deref()
        .map(|t| parse_time_on_date(date, t, tz))
        .transpose()?;
    if let (Some(i), Some(o)) = (check_in, check_out)
        && o <= i
    {
        return Err(AppError::validation(
            "requested_check_out must be after requested_check_in",
        ));
    }

    let created = regularization::create(
        &state.pool,
        &current.tenant_id,
        employee_id,
        &format_date(date),
        payload.reason.trim(),
        check_in,
        check_out,
    )
    .await?;
    Ok(Json(created))
}

/// GET /api/attendance/regularization
pub async fn list_regularizations(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<RegularizationQuery>,
) -> AppResult<Json<PaginatedResponse<Regularization>>> {
    let scope = access::view_scope(&state, &current, ATTENDANCE_VIEW).await?;
    let (page, limit, offset) = page_window(query.page, query.limit, 20);

    let (items, total) = regularization::list(
        &state.pool,
        &current.tenant_id,
        &scope,
        query.status,
        limit as i64,
        offset,
    )
    .await?;
    Ok(Json(PaginatedResponse::new(items, total, page, limit)))
}

async fn load_regularization(
    state: &ServerState,
    tenant_id: &str,
    id: i64,
) -> AppResult<Regularization> {
    regularization::find_by_id(&state.pool, tenant_id, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::RegularizationNotFound))
}

/// POST /api/attendance/regularization/{id}/approve
///
/// Requested times replace the recorded ones; a correction that would put
/// check-out at or before check-in is refused and the request stays pending.
pub async fn approve_regularization(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Regularization>> {
    let request = load_regularization(&state, &current.tenant_id, id).await?;
    access::ensure_can_review(&state, &current, ATTENDANCE_VIEW_ALL, request.employee_id).await?;
    if request.status != RegularizationStatus::Pending {
        return Err(AppError::new(ErrorCode::RegularizationNotPending));
    }

    let policy = AttendancePolicy::from_config(&state.config);
    let (approved, correction) =
        regularization::approve(&state.pool, &current.tenant_id, id, current.id, &policy).await?;

    state
        .audit
        .record(access::audit(
            &current,
            AuditAction::RegularizationApproved,
            "attendance_regularization",
            id,
            serde_json::json!({
                "employee_id": approved.employee_id,
                "date": approved.date,
                "total_hours": correction.total_hours,
            }),
        ))
        .await;

    Ok(Json(approved))
}

/// POST /api/attendance/regularization/{id}/reject
pub async fn reject_regularization(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RejectRequest>,
) -> AppResult<Json<Regularization>> {
    validate_required_text(&payload.reason, "reason", MAX_NOTE_LEN)?;
    let request = load_regularization(&state, &current.tenant_id, id).await?;
    access::ensure_can_review(&state, &current, ATTENDANCE_VIEW_ALL, request.employee_id).await?;

    let rejected = regularization::reject(
        &state.pool,
        &current.tenant_id,
        id,
        current.id,
        payload.reason.trim(),
    )
    .await?;

    state
        .audit
        .record(access::audit(
            &current,
            AuditAction::RegularizationRejected,
            "attendance_regularization",
            id,
            serde_json::json!({ "employee_id": rejected.employee_id, "reason": payload.reason }),
        ))
        .await;

    Ok(Json(rejected))
}
