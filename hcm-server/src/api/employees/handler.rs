//! Employee API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::error::ErrorCode;
use shared::models::{
    Employee, EmployeeCreate, EmployeeDocument, EmployeeDocumentCreate, EmployeeRemoval,
    EmployeeStats, EmployeeStatus, EmployeeUpdate, PaginatedResponse, Role, page_window,
};

use crate::api::access::{self, EMPLOYEE_VIEW};
use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::auth::password::{MIN_PASSWORD_LEN, hash_password};
use crate::auth::permissions::{EMPLOYEE_READ_ALL, EMPLOYEE_UPDATE_ALL};
use crate::core::ServerState;
use crate::db::repository::employee::{self, EmployeeFilter, NewAccount, Removal};
use crate::db::repository::user;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN, validate_amount, validate_email,
    validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResult};

const RESOURCE: &str = "employee";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub department: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn employee_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::EmployeeNotFound, format!("Employee {} not found", id))
}

async fn load(state: &ServerState, tenant_id: &str, id: i64) -> AppResult<Employee> {
    employee::find_by_id(&state.pool, tenant_id, id)
        .await?
        .ok_or_else(|| employee_not_found(id))
}

fn validate_profile(info: &shared::models::PersonalInfo) -> AppResult<()> {
    validate_required_text(&info.first_name, "first_name", MAX_NAME_LEN)?;
    validate_required_text(&info.last_name, "last_name", MAX_NAME_LEN)?;
    validate_email(&info.email, "email")?;
    validate_optional_text(&info.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    Ok(())
}

fn validate_company(info: &shared::models::CompanyInfo) -> AppResult<()> {
    validate_required_text(&info.department, "department", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&info.designation, "designation", MAX_SHORT_TEXT_LEN)?;
    Ok(())
}

fn validate_compensation(comp: &shared::models::Compensation) -> AppResult<()> {
    validate_amount(comp.annual_ctc, "annual_ctc")?;
    validate_amount(comp.monthly_basic, "monthly_basic")?;
    for a in &comp.allowances {
        validate_required_text(&a.name, "allowance name", MAX_SHORT_TEXT_LEN)?;
        validate_amount(a.amount, "allowance amount")?;
    }
    for d in &comp.deductions {
        validate_required_text(&d.name, "deduction name", MAX_SHORT_TEXT_LEN)?;
        validate_amount(d.amount, "deduction amount")?;
    }
    Ok(())
}

/// Manager must be another employee of the same tenant
async fn validate_manager(
    state: &ServerState,
    tenant_id: &str,
    manager_id: Option<i64>,
) -> AppResult<()> {
    if let Some(manager_id) = manager_id
        && employee::find_by_id(&state.pool, tenant_id, manager_id)
            .await?
            .is_none()
    {
        return Err(AppError::validation(format!(
            "Manager {} does not exist",
            manager_id
        )));
    }
    Ok(())
}

/// GET /api/employees - paged list; managers only see their direct reports
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Employee>>> {
    let manager_id = if current.has_permission(EMPLOYEE_READ_ALL) {
        None
    } else {
        Some(access::own_employee_id(&current)?)
    };
    let filter = EmployeeFilter {
        department: query.department,
        status: query.status,
        search: query.search,
        manager_id,
    };
    let (page, limit, offset) = page_window(query.page, query.limit, 10);

    let (items, total) =
        employee::list(&state.pool, &current.tenant_id, &filter, limit as i64, offset).await?;
    Ok(Json(PaginatedResponse::new(items, total, page, limit)))
}

/// GET /api/employees/stats
pub async fn stats(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<EmployeeStats>> {
    let stats = employee::stats(&state.pool, &current.tenant_id).await?;
    Ok(Json(stats))
}

/// GET /api/employees/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Employee>> {
    access::ensure_can_view(&state, &current, EMPLOYEE_VIEW, id).await?;
    let found = load(&state, &current.tenant_id, id).await?;
    Ok(Json(found))
}

/// POST /api/employees - optionally with a login account
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<EmployeeCreate>,
) -> AppResult<Json<Employee>> {
    validate_required_text(&payload.employee_code, "employee_code", MAX_SHORT_TEXT_LEN)?;
    validate_profile(&payload.personal_info)?;
    validate_company(&payload.company_info)?;
    if let Some(comp) = &payload.compensation {
        validate_compensation(comp)?;
    }
    validate_manager(&state, &current.tenant_id, payload.manager_id).await?;

    let account = match &payload.account {
        Some(account) => {
            if account.password.len() < MIN_PASSWORD_LEN {
                return Err(AppError::new(ErrorCode::PasswordTooShort));
            }
            let role = account.role.unwrap_or_default();
            if role == Role::SuperAdmin && !current.is_super_admin() {
                return Err(AppError::new(ErrorCode::CannotModifySuperAdmin));
            }
            Some(NewAccount {
                password_hash: hash_password(&account.password)?,
                role,
            })
        }
        None => None,
    };

    let created = employee::create(&state.pool, &current.tenant_id, &payload, account).await?;

    state
        .audit
        .record(access::audit(
            &current,
            AuditAction::EmployeeCreated,
            RESOURCE,
            created.id,
            serde_json::json!({
                "employee_code": created.employee_code,
                "name": created.personal_info.full_name(),
                "with_account": created.user_id.is_some(),
            }),
        ))
        .await;
    tracing::info!(employee_id = created.id, tenant_id = %current.tenant_id, "Employee created");

    Ok(Json(created))
}

/// PUT /api/employees/{id}
///
/// Without `employee:update_all` a caller may only change the
/// `personal_info` of their own record.
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<EmployeeUpdate>,
) -> AppResult<Json<Employee>> {
    if !current.has_permission(EMPLOYEE_UPDATE_ALL) {
        if current.employee_id != Some(id) {
            return Err(AppError::forbidden("Forbidden: can only update your own profile"));
        }
        if payload.touches_restricted_fields() {
            return Err(AppError::forbidden(
                "Forbidden: only personal information can be changed",
            ));
        }
    }

    if let Some(code) = &payload.employee_code {
        validate_required_text(code, "employee_code", MAX_SHORT_TEXT_LEN)?;
    }
    if let Some(info) = &payload.personal_info {
        validate_profile(info)?;
    }
    if let Some(info) = &payload.company_info {
        validate_company(info)?;
    }
    if let Some(comp) = &payload.compensation {
        validate_compensation(comp)?;
    }
    validate_manager(&state, &current.tenant_id, payload.manager_id).await?;

    // 404 before the merge so the error code is employee specific
    load(&state, &current.tenant_id, id).await?;
    let updated = employee::update(&state.pool, &current.tenant_id, id, &payload).await?;

    if payload.personal_info.is_some() || payload.company_info.is_some() {
        user::sync_profile(
            &state.pool,
            &current.tenant_id,
            updated.id,
            &updated.personal_info.full_name(),
            &updated.company_info.department,
            &updated.company_info.designation,
        )
        .await?;
    }

    state
        .audit
        .record(access::audit(
            &current,
            AuditAction::EmployeeUpdated,
            RESOURCE,
            updated.id,
            serde_json::json!({ "restricted_fields": payload.touches_restricted_fields() }),
        ))
        .await;

    Ok(Json(updated))
}

/// DELETE /api/employees/{id}
///
/// Employees with attendance, leave or payroll history are terminated and
/// their account deactivated; the rest are removed with their account.
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<EmployeeRemoval>> {
    if current.employee_id == Some(id) {
        return Err(AppError::forbidden("Cannot delete your own employee record"));
    }
    let existing = load(&state, &current.tenant_id, id).await?;
    let removal = employee::delete(&state.pool, &current.tenant_id, id).await?;
    let terminated = matches!(removal, Removal::Terminated(_));

    state
        .audit
        .record(access::audit(
            &current,
            AuditAction::EmployeeDeleted,
            RESOURCE,
            id,
            serde_json::json!({
                "employee_code": existing.employee_code,
                "name": existing.personal_info.full_name(),
                "terminated": terminated,
            }),
        ))
        .await;
    tracing::info!(employee_id = id, tenant_id = %current.tenant_id, terminated, "Employee removed");

    Ok(Json(EmployeeRemoval {
        id,
        deleted: !terminated,
        terminated,
    }))
}

/// GET /api/employees/{id}/documents
pub async fn list_documents(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<EmployeeDocument>>> {
    access::ensure_can_view(&state, &current, EMPLOYEE_VIEW, id).await?;
    let found = load(&state, &current.tenant_id, id).await?;
    Ok(Json(found.documents))
}

/// POST /api/employees/{id}/documents - appended unverified
pub async fn add_document(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<EmployeeDocumentCreate>,
) -> AppResult<Json<Employee>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&payload.doc_type, "type", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&payload.url, "url", MAX_URL_LEN)?;
    if let Some(expiry) = &payload.expiry_date {
        crate::utils::time::parse_date(expiry)?;
    }
    load(&state, &current.tenant_id, id).await?;

    let document = EmployeeDocument {
        name: payload.name.trim().to_string(),
        doc_type: payload.doc_type.trim().to_string(),
        url: payload.url.trim().to_string(),
        uploaded_at: shared::util::now_millis(),
        expiry_date: payload.expiry_date,
        verified: false,
    };
    let updated = employee::add_document(&state.pool, &current.tenant_id, id, &document).await?;

    state
        .audit
        .record(access::audit(
            &current,
            AuditAction::EmployeeDocumentAdded,
            RESOURCE,
            id,
            serde_json::json!({ "name": document.name, "type": document.doc_type }),
        ))
        .await;

    Ok(Json(updated))
}
