//! Payroll API Handlers

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::error::ErrorCode;
use shared::models::{
    BulkItemStatus, BulkPayrollItem, BulkPayrollReport, BulkPayrollRequest, MarkPaidRequest,
    NotificationKind, PaginatedResponse, Payroll, PayrollCreate, PayrollStats, PayrollStatus, Payslip,
    SupportedCountry, TaxBracket, TaxRule, TaxRuleUpdate, page_window,
};

use crate::api::access::{self, PAYROLL_VIEW};
use crate::api::notifications::notify_employee;
use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::payroll::{self, PayrollFilter};
use crate::db::repository::{RepoError, Scope, employee, tax_rule};
use crate::payroll::tax::{self, SUPPORTED_COUNTRIES};
use crate::payroll::{draft, payslip as render_payslip, validate_period};
use crate::utils::time::{format_date, parse_date};
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_optional_text};
use crate::utils::{AppError, AppResult};

const RESOURCE: &str = "payroll";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub employee_id: Option<i64>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub status: Option<PayrollStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub month: Option<i32>,
    pub year: Option<i32>,
}

/// Stored brackets for the country, else the flat fallback
async fn rule_for(state: &ServerState, tenant_id: &str, country: &str) -> AppResult<TaxRule> {
    match tax_rule::find(&state.pool, tenant_id, country).await? {
        Some(rule) => Ok(rule),
        None => Ok(state.payroll_policy.default_rule(country)),
    }
}

async fn load(state: &ServerState, tenant_id: &str, id: i64) -> AppResult<Payroll> {
    payroll::find_by_id(&state.pool, tenant_id, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PayrollNotFound))
}

/// POST /api/payroll - one draft for (employee, month, year)
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<PayrollCreate>,
) -> AppResult<Json<Payroll>> {
    validate_period(payload.month, payload.year)?;
    validate_optional_text(&payload.currency, "currency", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.country, "country", MAX_SHORT_TEXT_LEN)?;

    let found = employee::find_by_id(&state.pool, &current.tenant_id, payload.employee_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::EmployeeNotFound,
                format!("Employee {} not found", payload.employee_id),
            )
        })?;

    let policy = &state.payroll_policy;
    let structure = policy.resolve(&found, &payload);
    let rule = rule_for(&state, &current.tenant_id, &structure.country).await?;
    let breakdown = policy.compute(&structure, &rule.brackets)?;
    let record = draft(&found, payload.month, payload.year, structure, breakdown);
    let created = payroll::create(&state.pool, &record).await?;

    state
        .audit
        .record(access::audit(
            &current,
            AuditAction::PayrollGenerated,
            RESOURCE,
            created.id,
            serde_json::json!({
                "employee_id": created.employee_id,
                "month": created.month,
                "year": created.year,
                "net_salary": created.net_salary,
                "currency": created.currency,
            }),
        ))
        .await;

    Ok(Json(created))
}

/// POST /api/payroll/bulk - every active employee, reported one by one
///
/// Employees that already have a record for the period are skipped; any
/// other failure is reported with its reason and does not stop the run.
pub async fn bulk_create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<BulkPayrollRequest>,
) -> AppResult<Json<BulkPayrollReport>> {
    validate_period(payload.month, payload.year)?;
    validate_optional_text(&payload.department, "department", MAX_SHORT_TEXT_LEN)?;

    let employees = employee::list_active(
        &state.pool,
        &current.tenant_id,
        payload.department.as_deref(),
    )
    .await?;
    if employees.is_empty() {
        return Err(AppError::new(ErrorCode::NoActiveEmployees));
    }

    let policy = &state.payroll_policy;
    let mut rules: HashMap<String, Vec<TaxBracket>> = HashMap::new();
    let mut results = Vec::with_capacity(employees.len());
    for emp in &employees {
        let request = PayrollCreate {
            employee_id: emp.id,
            month: payload.month,
            year: payload.year,
            basic_salary: None,
            allowances: None,
            deductions: None,
            currency: None,
            country: None,
        };
        let structure = policy.resolve(emp, &request);
        if !rules.contains_key(&structure.country) {
            let rule = rule_for(&state, &current.tenant_id, &structure.country).await?;
            rules.insert(structure.country.clone(), rule.brackets);
        }
        let brackets = rules.get(&structure.country).map(Vec::as_slice).unwrap_or_default();

        let outcome = match policy.compute(&structure, brackets) {
            Ok(breakdown) => {
                let record = draft(emp, payload.month, payload.year, structure, breakdown);
                payroll::create(&state.pool, &record).await.map_err(AppError::from)
            }
            Err(e) => Err(e),
        };

        let item = match outcome {
            Ok(created) => BulkPayrollItem {
                employee_id: emp.id,
                employee_code: emp.employee_code.clone(),
                status: BulkItemStatus::Created,
                payroll_id: Some(created.id),
                reason: None,
            },
            Err(e) if e.code == ErrorCode::PayrollAlreadyExists => BulkPayrollItem {
                employee_id: emp.id,
                employee_code: emp.employee_code.clone(),
                status: BulkItemStatus::Skipped,
                payroll_id: None,
                reason: Some(e.message),
            },
            Err(e) => {
                tracing::warn!(employee_id = emp.id, error = %e.message, "Bulk payroll item failed");
                BulkPayrollItem {
                    employee_id: emp.id,
                    employee_code: emp.employee_code.clone(),
                    status: BulkItemStatus::Failed,
                    payroll_id: None,
                    reason: Some(e.message),
                }
            }
        };
        results.push(item);
    }

    let count = |s: BulkItemStatus| results.iter().filter(|r| r.status == s).count();
    let report = BulkPayrollReport {
        month: payload.month,
        year: payload.year,
        created: count(BulkItemStatus::Created),
        skipped: count(BulkItemStatus::Skipped),
        failed: count(BulkItemStatus::Failed),
        results,
    };

    state
        .audit
        .record(access::audit(
            &current,
            AuditAction::PayrollBulkGenerated,
            RESOURCE,
            format!("{}-{:02}", report.year, report.month),
            serde_json::json!({
                "department": payload.department,
                "created": report.created,
                "skipped": report.skipped,
                "failed": report.failed,
            }),
        ))
        .await;
    tracing::info!(
        tenant_id = %current.tenant_id,
        created = report.created,
        skipped = report.skipped,
        failed = report.failed,
        "Bulk payroll generated"
    );

    Ok(Json(report))
}

/// POST /api/payroll/{id}/process - draft to processed
pub async fn process(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Payroll>> {
    let updated = payroll::process(&state.pool, &current.tenant_id, id, current.id).await?;

    state
        .audit
        .record(access::audit(
            &current,
            AuditAction::PayrollProcessed,
            RESOURCE,
            id,
            serde_json::json!({ "employee_id": updated.employee_id }),
        ))
        .await;

    Ok(Json(updated))
}

/// POST /api/payroll/{id}/paid - processed to paid; payment date defaults to today
pub async fn mark_paid(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<MarkPaidRequest>,
) -> AppResult<Json<Payroll>> {
    let payment_date = match payload.payment_date.as_deref() {
        Some(date) => format_date(parse_date(date)?),
        None => format_date(state.today()),
    };
    let updated = payroll::mark_paid(&state.pool, &current.tenant_id, id, &payment_date).await?;

    state
        .audit
        .record(access::audit(
            &current,
            AuditAction::PayrollPaid,
            RESOURCE,
            id,
            serde_json::json!({
                "employee_id": updated.employee_id,
                "payment_date": payment_date,
                "net_salary": updated.net_salary,
                "currency": updated.currency,
            }),
        ))
        .await;
    notify_employee(
        &state,
        &current.tenant_id,
        updated.employee_id,
        NotificationKind::PayrollProcessed,
        "Salary paid",
        format!(
            "Your salary for {}/{} was paid on {}",
            updated.month, updated.year, payment_date
        ),
        serde_json::json!({ "payroll_id": id, "net_salary": updated.net_salary }),
    )
    .await;

    Ok(Json(updated))
}

/// POST /api/payroll/{id}/cancel - from draft or processed
pub async fn cancel(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Payroll>> {
    let updated = payroll::cancel(&state.pool, &current.tenant_id, id).await?;

    state
        .audit
        .record(access::audit(
            &current,
            AuditAction::PayrollCancelled,
            RESOURCE,
            id,
            serde_json::json!({ "employee_id": updated.employee_id }),
        ))
        .await;

    Ok(Json(updated))
}

/// GET /api/payroll - latest period first
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Payroll>>> {
    let scope = access::view_scope(&state, &current, PAYROLL_VIEW).await?;
    if let Some(id) = query.employee_id
        && !scope.allows(id)
    {
        return Err(AppError::forbidden("Forbidden: Insufficient permissions"));
    }
    let (page, limit, offset) = page_window(query.page, query.limit, 10);

    let filter = PayrollFilter {
        employee_id: query.employee_id,
        month: query.month,
        year: query.year,
        status: query.status,
    };
    let (items, total) = payroll::list(
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

/// GET /api/payroll/stats - totals grouped by currency, never converted
pub async fn stats(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<PayrollStats>> {
    if let Some(month) = query.month
        && !(1..=12).contains(&month)
    {
        return Err(AppError::new(ErrorCode::PayrollInvalidPeriod));
    }
    let by_currency =
        payroll::totals_by_currency(&state.pool, &current.tenant_id, query.month, query.year)
            .await?;
    let status_counts =
        payroll::status_counts(&state.pool, &current.tenant_id, query.month, query.year).await?;
    let headcount = employee::headcount(&state.pool, &current.tenant_id, &Scope::All).await?;

    Ok(Json(PayrollStats {
        month: query.month,
        year: query.year,
        by_currency,
        status_counts,
        active_employees: headcount.active,
    }))
}

/// GET /api/payroll/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Payroll>> {
    let record = load(&state, &current.tenant_id, id).await?;
    access::ensure_can_view(&state, &current, PAYROLL_VIEW, record.employee_id).await?;
    Ok(Json(record))
}

/// GET /api/payroll/{id}/payslip
pub async fn payslip(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Payslip>> {
    let record = load(&state, &current.tenant_id, id).await?;
    access::ensure_can_view(&state, &current, PAYROLL_VIEW, record.employee_id).await?;

    let found = employee::find_by_id(&state.pool, &current.tenant_id, record.employee_id)
        .await?
        .ok_or(RepoError::NotFound(format!(
            "Employee {} not found",
            record.employee_id
        )))?;
    Ok(Json(render_payslip(&record, &found)))
}

/// GET /api/payroll/countries
pub async fn countries() -> Json<&'static [SupportedCountry]> {
    Json(SUPPORTED_COUNTRIES)
}

/// GET /api/payroll/tax-rules/{country} - the fallback when none is stored
pub async fn get_tax_rule(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(country): Path<String>,
) -> AppResult<Json<TaxRule>> {
    let known = tax::require_country(&country)?;
    Ok(Json(rule_for(&state, &current.tenant_id, known.code).await?))
}

/// PUT /api/payroll/tax-rules/{country}
///
/// Replaces the brackets; records already generated keep their amounts.
pub async fn update_tax_rule(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(country): Path<String>,
    Json(payload): Json<TaxRuleUpdate>,
) -> AppResult<Json<TaxRule>> {
    let known = tax::require_country(&country)?;
    validate_optional_text(&payload.currency, "currency", MAX_SHORT_TEXT_LEN)?;
    tax::validate_brackets(&payload.brackets)?;

    let currency = payload
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(known.currency)
        .to_uppercase();
    let saved = tax_rule::upsert(
        &state.pool,
        &current.tenant_id,
        known.code,
        &currency,
        &payload.brackets,
        current.id,
    )
    .await?;

    state
        .audit
        .record(access::audit(
            &current,
            AuditAction::TaxRuleUpdated,
            "tax_rule",
            known.code,
            serde_json::json!({
                "currency": saved.currency,
                "brackets": saved.brackets.len(),
            }),
        ))
        .await;

    Ok(Json(saved))
}
