//! Attendance Repository
//!
//! Session transitions are single conditional UPDATEs; a zero row count
//! means the record was not in the expected phase.

use shared::ErrorCode;
use shared::models::{Attendance, AttendanceStatus, DailyAttendanceSummary, GeoLocation, WorkLocation};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

use super::{RepoError, RepoResult, Scope, to_json};
use crate::attendance::Correction;

/// Fields written at check-out
#[derive(Debug, Clone)]
pub struct CheckOut {
    pub at: i64,
    pub break_minutes: i64,
    pub total_hours: f64,
    pub overtime_hours: f64,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

/// Range and employee filters for listing
#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub employee_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

const LIST_WHERE: &str = "tenant_id = ?1
    AND (?2 IS NULL OR employee_id IN (SELECT value FROM json_each(?2)))
    AND (?3 IS NULL OR employee_id = ?3)
    AND (?4 IS NULL OR date >= ?4)
    AND (?5 IS NULL OR date <= ?5)";

pub async fn find_by_id(
    pool: &SqlitePool,
    tenant_id: &str,
    id: i64,
) -> RepoResult<Option<Attendance>> {
    let record = sqlx::query_as("SELECT * FROM attendance WHERE tenant_id = ? AND id = ?")
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(record)
}

pub async fn find_by_date(
    pool: &SqlitePool,
    tenant_id: &str,
    employee_id: i64,
    date: &str,
) -> RepoResult<Option<Attendance>> {
    let record = sqlx::query_as(
        "SELECT * FROM attendance WHERE tenant_id = ? AND employee_id = ? AND date = ?",
    )
    .bind(tenant_id)
    .bind(employee_id)
    .bind(date)
    .fetch_optional(pool)
    .await?;
    Ok(record)
}

/// Open the day's record
///
/// A placeholder row without a check-in (left by an absent mark or a
/// regularization) is filled in place; a row that already has one means
/// the employee checked in before.
#[allow(clippy::too_many_arguments)]
pub async fn check_in(
    pool: &SqlitePool,
    tenant_id: &str,
    employee_id: i64,
    date: &str,
    at: i64,
    status: AttendanceStatus,
    work_location: WorkLocation,
    location: Option<GeoLocation>,
    notes: Option<String>,
) -> RepoResult<Attendance> {
    let result = sqlx::query(
        "INSERT INTO attendance (id, tenant_id, employee_id, date, check_in, status, work_location, location, notes, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (employee_id, date) DO UPDATE
         SET check_in = excluded.check_in, check_out = NULL, break_start = NULL, break_minutes = 0,
             total_hours = 0, overtime_hours = 0, status = excluded.status,
             work_location = excluded.work_location, location = excluded.location,
             notes = COALESCE(excluded.notes, attendance.notes), updated_at = excluded.updated_at
         WHERE attendance.check_in IS NULL AND attendance.tenant_id = excluded.tenant_id",
    )
    .bind(snowflake_id())
    .bind(tenant_id)
    .bind(employee_id)
    .bind(date)
    .bind(at)
    .bind(status)
    .bind(work_location)
    .bind(location.as_ref().map(to_json).transpose()?)
    .bind(&notes)
    .bind(at)
    .bind(at)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::Business(
            ErrorCode::AlreadyCheckedIn,
            "Already checked in today".into(),
        ));
    }
    find_by_date(pool, tenant_id, employee_id, date)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Attendance for {} not found", date)))
}

pub async fn check_out(
    pool: &SqlitePool,
    tenant_id: &str,
    id: i64,
    data: &CheckOut,
) -> RepoResult<Attendance> {
    let result = sqlx::query(
        "UPDATE attendance
         SET check_out = ?, break_start = NULL, break_minutes = ?, total_hours = ?, overtime_hours = ?,
             status = ?, notes = COALESCE(?, notes), updated_at = ?
         WHERE tenant_id = ? AND id = ? AND check_in IS NOT NULL AND check_out IS NULL",
    )
    .bind(data.at)
    .bind(data.break_minutes)
    .bind(data.total_hours)
    .bind(data.overtime_hours)
    .bind(data.status)
    .bind(&data.notes)
    .bind(data.at)
    .bind(tenant_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::Business(
            ErrorCode::AlreadyCheckedOut,
            "Already checked out today".into(),
        ));
    }
    reload(pool, tenant_id, id).await
}

pub async fn start_break(
    pool: &SqlitePool,
    tenant_id: &str,
    id: i64,
    at: i64,
) -> RepoResult<Attendance> {
    let result = sqlx::query(
        "UPDATE attendance SET break_start = ?, updated_at = ?
         WHERE tenant_id = ? AND id = ? AND check_in IS NOT NULL AND check_out IS NULL AND break_start IS NULL",
    )
    .bind(at)
    .bind(at)
    .bind(tenant_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::Business(
            ErrorCode::BreakAlreadyStarted,
            "Break already started".into(),
        ));
    }
    reload(pool, tenant_id, id).await
}

/// Fold the open break into `break_minutes`
pub async fn end_break(
    pool: &SqlitePool,
    tenant_id: &str,
    id: i64,
    at: i64,
) -> RepoResult<Attendance> {
    let result = sqlx::query(
        "UPDATE attendance
         SET break_minutes = break_minutes + MAX(0, (?1 - break_start) / 60000), break_start = NULL, updated_at = ?1
         WHERE tenant_id = ?2 AND id = ?3 AND break_start IS NOT NULL AND check_out IS NULL",
    )
    .bind(at)
    .bind(tenant_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::Business(
            ErrorCode::BreakNotStarted,
            "Break not started".into(),
        ));
    }
    reload(pool, tenant_id, id).await
}

/// Placeholder row for a day with no check-in; returns the existing row if any
pub async fn ensure_for_date(
    conn: &mut sqlx::SqliteConnection,
    tenant_id: &str,
    employee_id: i64,
    date: &str,
) -> RepoResult<Attendance> {
    let now = now_millis();
    sqlx::query(
        "INSERT OR IGNORE INTO attendance (id, tenant_id, employee_id, date, status, work_location, created_at, updated_at)
         VALUES (?, ?, ?, ?, 'absent', 'office', ?, ?)",
    )
    .bind(snowflake_id())
    .bind(tenant_id)
    .bind(employee_id)
    .bind(date)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let record = sqlx::query_as(
        "SELECT * FROM attendance WHERE tenant_id = ? AND employee_id = ? AND date = ?",
    )
    .bind(tenant_id)
    .bind(employee_id)
    .bind(date)
    .fetch_one(&mut *conn)
    .await?;
    Ok(record)
}

/// Overwrite times and hours after an approved correction
pub async fn apply_correction(
    conn: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
    tenant_id: &str,
    id: i64,
    correction: &Correction,
) -> RepoResult<()> {
    sqlx::query(
        "UPDATE attendance
         SET check_in = ?, check_out = ?, break_start = ?, break_minutes = ?, total_hours = ?,
             overtime_hours = ?, status = ?, updated_at = ?
         WHERE tenant_id = ? AND id = ?",
    )
    .bind(correction.check_in)
    .bind(correction.check_out)
    .bind(correction.break_start)
    .bind(correction.break_minutes)
    .bind(correction.total_hours)
    .bind(correction.overtime_hours)
    .bind(correction.status)
    .bind(now_millis())
    .bind(tenant_id)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Paged list, newest date first
pub async fn list(
    pool: &SqlitePool,
    tenant_id: &str,
    scope: &Scope,
    filter: &AttendanceFilter,
    limit: i64,
    offset: i64,
) -> RepoResult<(Vec<Attendance>, i64)> {
    let scope = scope.bind_value();

    let count_sql = format!("SELECT COUNT(*) FROM attendance WHERE {LIST_WHERE}");
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(tenant_id)
        .bind(&scope)
        .bind(filter.employee_id)
        .bind(&filter.start_date)
        .bind(&filter.end_date)
        .fetch_one(pool)
        .await?;

    let list_sql = format!(
        "SELECT * FROM attendance WHERE {LIST_WHERE} ORDER BY date DESC, id LIMIT ?6 OFFSET ?7"
    );
    let items = sqlx::query_as(&list_sql)
        .bind(tenant_id)
        .bind(&scope)
        .bind(filter.employee_id)
        .bind(&filter.start_date)
        .bind(&filter.end_date)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok((items, total))
}

/// Every record in range, for stats
pub async fn list_all(
    pool: &SqlitePool,
    tenant_id: &str,
    scope: &Scope,
    filter: &AttendanceFilter,
) -> RepoResult<Vec<Attendance>> {
    let sql = format!("SELECT * FROM attendance WHERE {LIST_WHERE} ORDER BY date");
    let rows = sqlx::query_as(&sql)
        .bind(tenant_id)
        .bind(scope.bind_value())
        .bind(filter.employee_id)
        .bind(&filter.start_date)
        .bind(&filter.end_date)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Counts for one date; `not_marked` is active employees in scope without a row
pub async fn daily_summary(
    pool: &SqlitePool,
    tenant_id: &str,
    scope: &Scope,
    date: &str,
) -> RepoResult<DailyAttendanceSummary> {
    let scope = scope.bind_value();

    let (checked_in, present, late, work_from_home, on_leave, marked): (i64, i64, i64, i64, i64, i64) =
        sqlx::query_as(
            "SELECT COALESCE(SUM(check_in IS NOT NULL), 0),
                    COALESCE(SUM(status = 'present'), 0),
                    COALESCE(SUM(status = 'late'), 0),
                    COALESCE(SUM(status = 'work_from_home'), 0),
                    COALESCE(SUM(status = 'on_leave'), 0),
                    COUNT(*)
             FROM attendance
             WHERE tenant_id = ?1 AND date = ?3
               AND (?2 IS NULL OR employee_id IN (SELECT value FROM json_each(?2)))",
        )
        .bind(tenant_id)
        .bind(&scope)
        .bind(date)
        .fetch_one(pool)
        .await?;

    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM employees
         WHERE tenant_id = ?1 AND status = 'active'
           AND (?2 IS NULL OR id IN (SELECT value FROM json_each(?2)))",
    )
    .bind(tenant_id)
    .bind(&scope)
    .fetch_one(pool)
    .await?;

    Ok(DailyAttendanceSummary {
        date: date.to_string(),
        checked_in,
        present,
        late,
        work_from_home,
        on_leave,
        not_marked: (active - marked).max(0),
    })
}

async fn reload(pool: &SqlitePool, tenant_id: &str, id: i64) -> RepoResult<Attendance> {
    find_by_id(pool, tenant_id, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Attendance {} not found", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::{pool, seed_employee};

    const HOUR: i64 = 3_600_000;

    #[tokio::test]
    async fn test_session_transitions() {
        let pool = pool().await;
        let e = seed_employee(&pool, "acme", "E1", "Ops", None).await;
        let t0 = 1_742_200_000_000;

        let rec = check_in(
            &pool, "acme", e.id, "2025-03-17", t0,
            AttendanceStatus::Present, WorkLocation::Office, None, None,
        )
        .await
        .unwrap();

        let err = check_in(
            &pool, "acme", e.id, "2025-03-17", t0 + 1,
            AttendanceStatus::Present, WorkLocation::Office, None, None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::AlreadyCheckedIn, _)));

        let err = end_break(&pool, "acme", rec.id, t0 + HOUR).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::BreakNotStarted, _)));

        start_break(&pool, "acme", rec.id, t0 + HOUR).await.unwrap();
        let err = start_break(&pool, "acme", rec.id, t0 + HOUR).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::BreakAlreadyStarted, _)));

        let rec = end_break(&pool, "acme", rec.id, t0 + HOUR + 45 * 60_000).await.unwrap();
        assert_eq!(rec.break_minutes, 45);
        assert_eq!(rec.break_start, None);

        let out = CheckOut {
            at: t0 + 9 * HOUR,
            break_minutes: rec.break_minutes,
            total_hours: 8.25,
            overtime_hours: 0.25,
            status: AttendanceStatus::Present,
            notes: Some("done".into()),
        };
        let rec = check_out(&pool, "acme", rec.id, &out).await.unwrap();
        assert_eq!(rec.check_out, Some(t0 + 9 * HOUR));
        assert_eq!(rec.total_hours, 8.25);

        let err = check_out(&pool, "acme", rec.id, &out).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::AlreadyCheckedOut, _)));
    }

    #[tokio::test]
    async fn test_list_scope_and_range() {
        let pool = pool().await;
        let a = seed_employee(&pool, "acme", "A", "Ops", None).await;
        let b = seed_employee(&pool, "acme", "B", "Ops", None).await;
        for (emp, date) in [(a.id, "2025-03-17"), (a.id, "2025-03-18"), (b.id, "2025-03-18")] {
            check_in(
                &pool, "acme", emp, date, 1,
                AttendanceStatus::Present, WorkLocation::Office, None, None,
            )
            .await
            .unwrap();
        }

        let (rows, total) = list(&pool, "acme", &Scope::All, &AttendanceFilter::default(), 10, 0)
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows[0].date, "2025-03-18");

        let (rows, total) = list(
            &pool, "acme", &Scope::single(a.id), &AttendanceFilter::default(), 10, 0,
        )
        .await
        .unwrap();
        assert_eq!(total, 2);
        assert!(rows.iter().all(|r| r.employee_id == a.id));

        let filter = AttendanceFilter {
            start_date: Some("2025-03-18".into()),
            end_date: Some("2025-03-18".into()),
            ..Default::default()
        };
        let rows = list_all(&pool, "acme", &Scope::All, &filter).await.unwrap();
        assert_eq!(rows.len(), 2);

        let (_, total) = list(&pool, "globex", &Scope::All, &AttendanceFilter::default(), 10, 0)
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_ensure_for_date_and_summary() {
        let pool = pool().await;
        let a = seed_employee(&pool, "acme", "A", "Ops", None).await;
        let b = seed_employee(&pool, "acme", "B", "Ops", None).await;
        seed_employee(&pool, "acme", "C", "Ops", None).await;

        check_in(
            &pool, "acme", a.id, "2025-03-18", 1,
            AttendanceStatus::Late, WorkLocation::Office, None, None,
        )
        .await
        .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let placeholder = ensure_for_date(&mut conn, "acme", b.id, "2025-03-18").await.unwrap();
        assert_eq!(placeholder.status, AttendanceStatus::Absent);
        assert_eq!(placeholder.check_in, None);
        let again = ensure_for_date(&mut conn, "acme", b.id, "2025-03-18").await.unwrap();
        assert_eq!(again.id, placeholder.id);
        drop(conn);

        let summary = daily_summary(&pool, "acme", &Scope::All, "2025-03-18").await.unwrap();
        assert_eq!(summary.checked_in, 1);
        assert_eq!(summary.late, 1);
        assert_eq!(summary.not_marked, 1);
    }

    #[tokio::test]
    async fn test_check_in_fills_placeholder_row() {
        let pool = pool().await;
        let e = seed_employee(&pool, "acme", "E1", "Ops", None).await;

        let mut conn = pool.acquire().await.unwrap();
        let placeholder = ensure_for_date(&mut conn, "acme", e.id, "2025-03-18").await.unwrap();
        drop(conn);

        let rec = check_in(
            &pool, "acme", e.id, "2025-03-18", 1_000,
            AttendanceStatus::Late, WorkLocation::Remote, None, Some("traffic".into()),
        )
        .await
        .unwrap();
        assert_eq!(rec.id, placeholder.id);
        assert_eq!(rec.check_in, Some(1_000));
        assert_eq!(rec.status, AttendanceStatus::Late);
        assert_eq!(rec.work_location, WorkLocation::Remote);
        assert_eq!(rec.notes.as_deref(), Some("traffic"));

        let err = check_in(
            &pool, "acme", e.id, "2025-03-18", 2_000,
            AttendanceStatus::Present, WorkLocation::Office, None, None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::AlreadyCheckedIn, _)));
    }
}
