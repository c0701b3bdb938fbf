//! Attendance Regularization Repository

use shared::ErrorCode;
use shared::models::{Attendance, Regularization, RegularizationStatus};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

use super::{RepoError, RepoResult, Scope, attendance};
use crate::attendance::{AttendancePolicy, Correction};

const LIST_WHERE: &str = "tenant_id = ?1
    AND (?2 IS NULL OR employee_id IN (SELECT value FROM json_each(?2)))
    AND (?3 IS NULL OR status = ?3)";

pub async fn find_by_id(
    pool: &SqlitePool,
    tenant_id: &str,
    id: i64,
) -> RepoResult<Option<Regularization>> {
    let row = sqlx::query_as(
        "SELECT * FROM attendance_regularizations WHERE tenant_id = ? AND id = ?",
    )
    .bind(tenant_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// File a request, creating an absent attendance row for the date if needed
pub async fn create(
    pool: &SqlitePool,
    tenant_id: &str,
    employee_id: i64,
    date: &str,
    reason: &str,
    requested_check_in: Option<i64>,
    requested_check_out: Option<i64>,
) -> RepoResult<Regularization> {
    let mut tx = pool.begin().await?;

    let record = attendance::ensure_for_date(&mut tx, tenant_id, employee_id, date).await?;

    let open: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM attendance_regularizations
         WHERE tenant_id = ? AND attendance_id = ? AND status = 'pending'",
    )
    .bind(tenant_id)
    .bind(record.id)
    .fetch_optional(&mut *tx)
    .await?;
    if open.is_some() {
        return Err(RepoError::Duplicate(format!(
            "A pending regularization already exists for {date}"
        )));
    }

    let row = Regularization {
        id: snowflake_id(),
        tenant_id: tenant_id.to_string(),
        attendance_id: record.id,
        employee_id,
        date: date.to_string(),
        reason: reason.trim().to_string(),
        requested_check_in,
        requested_check_out,
        status: RegularizationStatus::Pending,
        reviewed_by: None,
        reviewed_at: None,
        rejection_reason: None,
        created_at: now_millis(),
    };

    sqlx::query(
        "INSERT INTO attendance_regularizations (id, tenant_id, attendance_id, employee_id, date, reason, requested_check_in, requested_check_out, status, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?)",
    )
    .bind(row.id)
    .bind(&row.tenant_id)
    .bind(row.attendance_id)
    .bind(row.employee_id)
    .bind(&row.date)
    .bind(&row.reason)
    .bind(row.requested_check_in)
    .bind(row.requested_check_out)
    .bind(row.created_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

pub async fn list(
    pool: &SqlitePool,
    tenant_id: &str,
    scope: &Scope,
    status: Option<RegularizationStatus>,
    limit: i64,
    offset: i64,
) -> RepoResult<(Vec<Regularization>, i64)> {
    let scope = scope.bind_value();

    let count_sql = format!("SELECT COUNT(*) FROM attendance_regularizations WHERE {LIST_WHERE}");
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(tenant_id)
        .bind(&scope)
        .bind(status)
        .fetch_one(pool)
        .await?;

    let list_sql = format!(
        "SELECT * FROM attendance_regularizations WHERE {LIST_WHERE}
         ORDER BY created_at DESC, id DESC LIMIT ?4 OFFSET ?5"
    );
    let items = sqlx::query_as(&list_sql)
        .bind(tenant_id)
        .bind(&scope)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok((items, total))
}

pub async fn count_pending(pool: &SqlitePool, tenant_id: &str, scope: &Scope) -> RepoResult<i64> {
    let sql = format!("SELECT COUNT(*) FROM attendance_regularizations WHERE {LIST_WHERE}");
    let count = sqlx::query_scalar(&sql)
        .bind(tenant_id)
        .bind(scope.bind_value())
        .bind(RegularizationStatus::Pending)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Approve a pending request and correct its attendance row
///
/// The correction is computed from the attendance row as read inside the
/// same transaction, so a concurrent check-out or break is not lost.
pub async fn approve(
    pool: &SqlitePool,
    tenant_id: &str,
    id: i64,
    reviewer_id: i64,
    policy: &AttendancePolicy,
) -> RepoResult<(Regularization, Correction)> {
    let mut tx = pool.begin().await?;
    let now = now_millis();

    let result = sqlx::query(
        "UPDATE attendance_regularizations SET status = 'approved', reviewed_by = ?, reviewed_at = ?
         WHERE tenant_id = ? AND id = ? AND status = 'pending'",
    )
    .bind(reviewer_id)
    .bind(now)
    .bind(tenant_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(not_pending(&mut tx, tenant_id, id).await);
    }

    let row: Regularization = sqlx::query_as(
        "SELECT * FROM attendance_regularizations WHERE tenant_id = ? AND id = ?",
    )
    .bind(tenant_id)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    let record: Attendance =
        sqlx::query_as("SELECT * FROM attendance WHERE tenant_id = ? AND id = ?")
            .bind(tenant_id)
            .bind(row.attendance_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                RepoError::Business(
                    ErrorCode::AttendanceNotFound,
                    format!("Attendance record for {} not found", row.date),
                )
            })?;

    let correction = policy
        .correct(&record, row.requested_check_in, row.requested_check_out)
        .map_err(RepoError::Validation)?;
    attendance::apply_correction(&mut *tx, tenant_id, record.id, &correction).await?;

    tx.commit().await?;
    Ok((row, correction))
}

pub async fn reject(
    pool: &SqlitePool,
    tenant_id: &str,
    id: i64,
    reviewer_id: i64,
    reason: &str,
) -> RepoResult<Regularization> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE attendance_regularizations
         SET status = 'rejected', reviewed_by = ?, reviewed_at = ?, rejection_reason = ?
         WHERE tenant_id = ? AND id = ? AND status = 'pending'",
    )
    .bind(reviewer_id)
    .bind(now_millis())
    .bind(reason.trim())
    .bind(tenant_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(not_pending(&mut tx, tenant_id, id).await);
    }

    let row = sqlx::query_as(
        "SELECT * FROM attendance_regularizations WHERE tenant_id = ? AND id = ?",
    )
    .bind(tenant_id)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

/// Explain why a conditional review update matched nothing
async fn not_pending(conn: &mut sqlx::SqliteConnection, tenant_id: &str, id: i64) -> RepoError {
    let exists: Result<Option<i64>, sqlx::Error> = sqlx::query_scalar(
        "SELECT id FROM attendance_regularizations WHERE tenant_id = ? AND id = ?",
    )
    .bind(tenant_id)
    .bind(id)
    .fetch_optional(conn)
    .await;

    match exists {
        Ok(Some(_)) => RepoError::Business(
            ErrorCode::RegularizationNotPending,
            "Regularization request is not pending".into(),
        ),
        Ok(None) => RepoError::Business(
            ErrorCode::RegularizationNotFound,
            "Regularization request not found".into(),
        ),
        Err(e) => e.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::db::repository::test_support::{pool, seed_employee};
    use shared::models::{AttendanceStatus, WorkLocation};

    const HOUR: i64 = 3_600_000;

    #[tokio::test]
    async fn test_create_makes_absent_record() {
        let pool = pool().await;
        let e = seed_employee(&pool, "acme", "E1", "Ops", None).await;

        let req = create(&pool, "acme", e.id, "2025-03-10", "Forgot to check in", Some(100), Some(200))
            .await
            .unwrap();
        assert_eq!(req.status, RegularizationStatus::Pending);

        let record = attendance::find_by_id(&pool, "acme", req.attendance_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, AttendanceStatus::Absent);
        assert_eq!(record.date, "2025-03-10");

        // Only one open request per day
        let err = create(&pool, "acme", e.id, "2025-03-10", "again", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
        assert_eq!(count_pending(&pool, "acme", &Scope::All).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_approve_applies_correction_once() {
        let pool = pool().await;
        let policy = AttendancePolicy::from_config(&Config::for_tests());
        let e = seed_employee(&pool, "acme", "E1", "Ops", None).await;
        let req = create(&pool, "acme", e.id, "2025-03-10", "Missed", Some(0), Some(8 * HOUR))
            .await
            .unwrap();

        let (approved, correction) = approve(&pool, "acme", req.id, 42, &policy).await.unwrap();
        assert_eq!(approved.status, RegularizationStatus::Approved);
        assert_eq!(approved.reviewed_by, Some(42));
        assert_eq!(correction.total_hours, 8.0);

        let record = attendance::find_by_id(&pool, "acme", req.attendance_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.check_in, Some(0));
        assert_eq!(record.total_hours, 8.0);

        let err = approve(&pool, "acme", req.id, 42, &policy).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::RegularizationNotPending, _)));
        let err = reject(&pool, "acme", req.id, 42, "late").await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::RegularizationNotPending, _)));
    }

    #[tokio::test]
    async fn test_approve_refuses_check_in_after_recorded_check_out() {
        let pool = pool().await;
        let policy = AttendancePolicy::from_config(&Config::for_tests());
        let e = seed_employee(&pool, "acme", "E1", "Ops", None).await;
        let rec = attendance::check_in(
            &pool, "acme", e.id, "2025-03-10", HOUR,
            AttendanceStatus::Present, WorkLocation::Office, None, None,
        )
        .await
        .unwrap();
        let out = attendance::CheckOut {
            at: 5 * HOUR,
            break_minutes: 0,
            total_hours: 4.0,
            overtime_hours: 0.0,
            status: AttendanceStatus::Present,
            notes: None,
        };
        attendance::check_out(&pool, "acme", rec.id, &out).await.unwrap();

        let req = create(&pool, "acme", e.id, "2025-03-10", "Wrong time", Some(6 * HOUR), None)
            .await
            .unwrap();
        let err = approve(&pool, "acme", req.id, 42, &policy).await.unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));

        // Rolled back: still pending, record untouched
        let still = find_by_id(&pool, "acme", req.id).await.unwrap().unwrap();
        assert_eq!(still.status, RegularizationStatus::Pending);
        let record = attendance::find_by_id(&pool, "acme", rec.id).await.unwrap().unwrap();
        assert_eq!(record.check_in, Some(HOUR));
    }

    #[tokio::test]
    async fn test_reject_and_tenant_isolation() {
        let pool = pool().await;
        let e = seed_employee(&pool, "acme", "E1", "Ops", None).await;
        let req = create(&pool, "acme", e.id, "2025-03-11", "Missed", None, Some(5))
            .await
            .unwrap();

        let err = reject(&pool, "globex", req.id, 1, "no").await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::RegularizationNotFound, _)));

        let rejected = reject(&pool, "acme", req.id, 1, " not verified ").await.unwrap();
        assert_eq!(rejected.status, RegularizationStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("not verified"));

        let (rows, total) = list(&pool, "acme", &Scope::single(e.id), None, 10, 0)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].id, req.id);
    }
}
