//! Leave Request Repository
//!
//! Approval and cancellation move the request and the balance together in
//! one transaction.

use chrono::{Datelike, NaiveDate};
use shared::ErrorCode;
use shared::models::{LeaveRequest, LeaveStatus, LeaveType};
use shared::util::{now_millis, snowflake_id};
use sqlx::{SqliteConnection, SqlitePool};

use super::{RepoError, RepoResult, Scope, leave_balance, to_json};
use crate::leave::insufficient_balance_message;

/// New request, already validated
#[derive(Debug, Clone)]
pub struct NewLeave {
    pub employee_id: i64,
    pub leave_type: LeaveType,
    pub start_date: String,
    pub end_date: String,
    pub days: f64,
    pub reason: String,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LeaveFilter {
    pub employee_id: Option<i64>,
    pub leave_type: Option<LeaveType>,
    pub status: Option<LeaveStatus>,
    /// Requests overlapping `[start_date, end_date]`
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

const LIST_WHERE: &str = "tenant_id = ?1
    AND (?2 IS NULL OR employee_id IN (SELECT value FROM json_each(?2)))
    AND (?3 IS NULL OR employee_id = ?3)
    AND (?4 IS NULL OR leave_type = ?4)
    AND (?5 IS NULL OR status = ?5)
    AND (?6 IS NULL OR end_date >= ?6)
    AND (?7 IS NULL OR start_date <= ?7)";

fn request_year(start_date: &str) -> RepoResult<i32> {
    NaiveDate::parse_from_str(start_date, "%Y-%m-%d")
        .map(|d| d.year())
        .map_err(|_| RepoError::Validation(format!("Invalid date format: {}", start_date)))
}

pub async fn find_by_id(
    pool: &SqlitePool,
    tenant_id: &str,
    id: i64,
) -> RepoResult<Option<LeaveRequest>> {
    let row = sqlx::query_as("SELECT * FROM leave_requests WHERE tenant_id = ? AND id = ?")
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

async fn load(conn: &mut SqliteConnection, tenant_id: &str, id: i64) -> RepoResult<LeaveRequest> {
    sqlx::query_as("SELECT * FROM leave_requests WHERE tenant_id = ? AND id = ?")
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| {
            RepoError::Business(ErrorCode::LeaveRequestNotFound, "Leave request not found".into())
        })
}

/// Remaining balance check for tracked types
async fn check_balance(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    employee_id: i64,
    year: i32,
    leave_type: LeaveType,
    days: f64,
) -> RepoResult<()> {
    if !leave_type.is_tracked() {
        return Ok(());
    }
    leave_balance::ensure_year(conn, tenant_id, employee_id, year).await?;
    let available = leave_balance::find(conn, tenant_id, employee_id, year, leave_type)
        .await?
        .map(|b| b.remaining())
        .unwrap_or_default();
    if days > available {
        return Err(RepoError::Business(
            ErrorCode::LeaveInsufficientBalance,
            insufficient_balance_message(leave_type, available, days),
        ));
    }
    Ok(())
}

/// Insert a pending request after the overlap and balance checks
pub async fn create(pool: &SqlitePool, tenant_id: &str, data: &NewLeave) -> RepoResult<LeaveRequest> {
    let year = request_year(&data.start_date)?;
    let mut tx = pool.begin().await?;

    let overlapping: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM leave_requests
         WHERE tenant_id = ? AND employee_id = ? AND status IN ('pending', 'approved')
           AND start_date <= ? AND end_date >= ?
         LIMIT 1",
    )
    .bind(tenant_id)
    .bind(data.employee_id)
    .bind(&data.end_date)
    .bind(&data.start_date)
    .fetch_optional(&mut *tx)
    .await?;
    if overlapping.is_some() {
        return Err(RepoError::Business(
            ErrorCode::LeaveOverlap,
            "Leave request overlaps an existing request".into(),
        ));
    }

    check_balance(&mut tx, tenant_id, data.employee_id, year, data.leave_type, data.days).await?;

    let now = now_millis();
    let request = LeaveRequest {
        id: snowflake_id(),
        tenant_id: tenant_id.to_string(),
        employee_id: data.employee_id,
        leave_type: data.leave_type,
        start_date: data.start_date.clone(),
        end_date: data.end_date.clone(),
        days: data.days,
        reason: data.reason.trim().to_string(),
        status: LeaveStatus::Pending,
        applied_at: now,
        approved_by: None,
        approved_at: None,
        rejected_by: None,
        rejected_at: None,
        rejection_reason: None,
        cancelled_at: None,
        documents: data.documents.clone(),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO leave_requests (id, tenant_id, employee_id, leave_type, start_date, end_date, days, reason, status, applied_at, documents, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?, ?, ?)",
    )
    .bind(request.id)
    .bind(&request.tenant_id)
    .bind(request.employee_id)
    .bind(request.leave_type)
    .bind(&request.start_date)
    .bind(&request.end_date)
    .bind(request.days)
    .bind(&request.reason)
    .bind(now)
    .bind(to_json(&request.documents)?)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(request)
}

/// Paged list, most recently applied first
pub async fn list(
    pool: &SqlitePool,
    tenant_id: &str,
    scope: &Scope,
    filter: &LeaveFilter,
    limit: i64,
    offset: i64,
) -> RepoResult<(Vec<LeaveRequest>, i64)> {
    let scope = scope.bind_value();

    let count_sql = format!("SELECT COUNT(*) FROM leave_requests WHERE {LIST_WHERE}");
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(tenant_id)
        .bind(&scope)
        .bind(filter.employee_id)
        .bind(filter.leave_type)
        .bind(filter.status)
        .bind(&filter.start_date)
        .bind(&filter.end_date)
        .fetch_one(pool)
        .await?;

    let list_sql = format!(
        "SELECT * FROM leave_requests WHERE {LIST_WHERE}
         ORDER BY applied_at DESC, id DESC LIMIT ?8 OFFSET ?9"
    );
    let items = sqlx::query_as(&list_sql)
        .bind(tenant_id)
        .bind(&scope)
        .bind(filter.employee_id)
        .bind(filter.leave_type)
        .bind(filter.status)
        .bind(&filter.start_date)
        .bind(&filter.end_date)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok((items, total))
}

pub async fn count_pending(pool: &SqlitePool, tenant_id: &str, scope: &Scope) -> RepoResult<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM leave_requests
         WHERE tenant_id = ?1 AND status = 'pending'
           AND (?2 IS NULL OR employee_id IN (SELECT value FROM json_each(?2)))",
    )
    .bind(tenant_id)
    .bind(scope.bind_value())
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Approved leave ending on or after `from_date`, soonest first
pub async fn upcoming_approved(
    pool: &SqlitePool,
    tenant_id: &str,
    from_date: &str,
    limit: i64,
) -> RepoResult<Vec<LeaveRequest>> {
    let rows = sqlx::query_as(
        "SELECT * FROM leave_requests
         WHERE tenant_id = ? AND status = 'approved' AND end_date >= ?
         ORDER BY start_date, id LIMIT ?",
    )
    .bind(tenant_id)
    .bind(from_date)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Approve a pending request and debit the balance
pub async fn approve(
    pool: &SqlitePool,
    tenant_id: &str,
    id: i64,
    approver_id: i64,
) -> RepoResult<LeaveRequest> {
    let mut tx = pool.begin().await?;
    let request = load(&mut tx, tenant_id, id).await?;
    if request.status != LeaveStatus::Pending {
        return Err(not_pending());
    }
    let year = request_year(&request.start_date)?;
    check_balance(&mut tx, tenant_id, request.employee_id, year, request.leave_type, request.days)
        .await?;

    let now = now_millis();
    let result = sqlx::query(
        "UPDATE leave_requests SET status = 'approved', approved_by = ?, approved_at = ?, updated_at = ?
         WHERE tenant_id = ? AND id = ? AND status = 'pending'",
    )
    .bind(approver_id)
    .bind(now)
    .bind(now)
    .bind(tenant_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(not_pending());
    }

    if request.leave_type.is_tracked() {
        let debited = leave_balance::debit(
            &mut tx,
            tenant_id,
            request.employee_id,
            year,
            request.leave_type,
            request.days,
        )
        .await?;
        if !debited {
            return Err(RepoError::Business(
                ErrorCode::LeaveInsufficientBalance,
                format!("Insufficient {} leave balance", request.leave_type),
            ));
        }
    }

    let updated = load(&mut tx, tenant_id, id).await?;
    tx.commit().await?;
    Ok(updated)
}

pub async fn reject(
    pool: &SqlitePool,
    tenant_id: &str,
    id: i64,
    rejected_by: i64,
    reason: &str,
) -> RepoResult<LeaveRequest> {
    let mut tx = pool.begin().await?;
    load(&mut tx, tenant_id, id).await?;

    let now = now_millis();
    let result = sqlx::query(
        "UPDATE leave_requests
         SET status = 'rejected', rejected_by = ?, rejected_at = ?, rejection_reason = ?, updated_at = ?
         WHERE tenant_id = ? AND id = ? AND status = 'pending'",
    )
    .bind(rejected_by)
    .bind(now)
    .bind(reason.trim())
    .bind(now)
    .bind(tenant_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(not_pending());
    }

    let updated = load(&mut tx, tenant_id, id).await?;
    tx.commit().await?;
    Ok(updated)
}

/// Cancel a pending or approved request; approved days go back to the balance
pub async fn cancel(pool: &SqlitePool, tenant_id: &str, id: i64) -> RepoResult<LeaveRequest> {
    let mut tx = pool.begin().await?;
    let request = load(&mut tx, tenant_id, id).await?;
    if !matches!(request.status, LeaveStatus::Pending | LeaveStatus::Approved) {
        return Err(RepoError::Business(
            ErrorCode::LeaveCannotCancel,
            format!("A {} leave request cannot be cancelled", request.status.as_str()),
        ));
    }

    let now = now_millis();
    let result = sqlx::query(
        "UPDATE leave_requests SET status = 'cancelled', cancelled_at = ?, updated_at = ?
         WHERE tenant_id = ? AND id = ? AND status = ?",
    )
    .bind(now)
    .bind(now)
    .bind(tenant_id)
    .bind(id)
    .bind(request.status)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::Business(
            ErrorCode::LeaveCannotCancel,
            "Leave request changed while cancelling".into(),
        ));
    }

    if request.status == LeaveStatus::Approved && request.leave_type.is_tracked() {
        let year = request_year(&request.start_date)?;
        leave_balance::credit(
            &mut tx,
            tenant_id,
            request.employee_id,
            year,
            request.leave_type,
            request.days,
        )
        .await?;
    }

    let updated = load(&mut tx, tenant_id, id).await?;
    tx.commit().await?;
    Ok(updated)
}

fn not_pending() -> RepoError {
    RepoError::Business(ErrorCode::LeaveNotPending, "Leave request is not pending".into())
}
