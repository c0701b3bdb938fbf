//! Leave Balance Repository
//!
//! One row per (employee, year, tracked leave type). Rows for a year are
//! created on first read with the default allocations.

use shared::models::{LeaveAllocation, LeaveBalance, LeaveType};
use shared::util::{now_millis, snowflake_id};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use super::{RepoError, RepoResult};
use crate::leave::default_allocation;

/// Insert the default rows for a year; existing rows are left alone
pub async fn ensure_year(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    employee_id: i64,
    year: i32,
) -> RepoResult<()> {
    let now = now_millis();
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "INSERT OR IGNORE INTO leave_balances (id, tenant_id, employee_id, year, leave_type, total, used, updated_at) ",
    );
    qb.push_values(
        LeaveType::ALL.iter().filter(|t| t.is_tracked()),
        |mut row, leave_type| {
            row.push_bind(snowflake_id())
                .push_bind(tenant_id)
                .push_bind(employee_id)
                .push_bind(year)
                .push_bind(*leave_type)
                .push_bind(default_allocation(*leave_type))
                .push_bind(0.0_f64)
                .push_bind(now);
        },
    );
    qb.build().execute(&mut *conn).await?;
    Ok(())
}

/// Balances for a year, creating them if this is the first read
pub async fn list_for(
    pool: &SqlitePool,
    tenant_id: &str,
    employee_id: i64,
    year: i32,
) -> RepoResult<Vec<LeaveBalance>> {
    let mut conn = pool.acquire().await?;
    ensure_year(&mut conn, tenant_id, employee_id, year).await?;

    let rows = sqlx::query_as(
        "SELECT * FROM leave_balances WHERE tenant_id = ? AND employee_id = ? AND year = ?
         ORDER BY leave_type",
    )
    .bind(tenant_id)
    .bind(employee_id)
    .bind(year)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

pub async fn find(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    employee_id: i64,
    year: i32,
    leave_type: LeaveType,
) -> RepoResult<Option<LeaveBalance>> {
    let row = sqlx::query_as(
        "SELECT * FROM leave_balances
         WHERE tenant_id = ? AND employee_id = ? AND year = ? AND leave_type = ?",
    )
    .bind(tenant_id)
    .bind(employee_id)
    .bind(year)
    .bind(leave_type)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

/// Add `days` to `used`; false when it would exceed `total`
pub async fn debit(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    employee_id: i64,
    year: i32,
    leave_type: LeaveType,
    days: f64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE leave_balances SET used = used + ?1, updated_at = ?2
         WHERE tenant_id = ?3 AND employee_id = ?4 AND year = ?5 AND leave_type = ?6
           AND used + ?1 <= total",
    )
    .bind(days)
    .bind(now_millis())
    .bind(tenant_id)
    .bind(employee_id)
    .bind(year)
    .bind(leave_type)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Give `days` back, never below zero
pub async fn credit(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    employee_id: i64,
    year: i32,
    leave_type: LeaveType,
    days: f64,
) -> RepoResult<()> {
    sqlx::query(
        "UPDATE leave_balances SET used = MAX(0, used - ?), updated_at = ?
         WHERE tenant_id = ? AND employee_id = ? AND year = ? AND leave_type = ?",
    )
    .bind(days)
    .bind(now_millis())
    .bind(tenant_id)
    .bind(employee_id)
    .bind(year)
    .bind(leave_type)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Replace yearly totals; a total below what is already used is refused
pub async fn set_allocations(
    pool: &SqlitePool,
    tenant_id: &str,
    employee_id: i64,
    year: i32,
    allocations: &[LeaveAllocation],
) -> RepoResult<Vec<LeaveBalance>> {
    let mut tx = pool.begin().await?;
    ensure_year(&mut tx, tenant_id, employee_id, year).await?;

    for allocation in allocations {
        if !allocation.leave_type.is_tracked() {
            return Err(RepoError::Validation(format!(
                "{} leave has no balance",
                allocation.leave_type
            )));
        }
        if !allocation.total.is_finite() || allocation.total < 0.0 {
            return Err(RepoError::Validation(format!(
                "Invalid total for {} leave",
                allocation.leave_type
            )));
        }

        let result = sqlx::query(
            "UPDATE leave_balances SET total = ?1, updated_at = ?2
             WHERE tenant_id = ?3 AND employee_id = ?4 AND year = ?5 AND leave_type = ?6 AND used <= ?1",
        )
        .bind(allocation.total)
        .bind(now_millis())
        .bind(tenant_id)
        .bind(employee_id)
        .bind(year)
        .bind(allocation.leave_type)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let used = find(&mut tx, tenant_id, employee_id, year, allocation.leave_type)
                .await?
                .map(|b| b.used)
                .unwrap_or_default();
            return Err(RepoError::Validation(format!(
                "Total for {} leave cannot be below used days ({})",
                allocation.leave_type, used
            )));
        }
    }

    let rows = sqlx::query_as(
        "SELECT * FROM leave_balances WHERE tenant_id = ? AND employee_id = ? AND year = ?
         ORDER BY leave_type",
    )
    .bind(tenant_id)
    .bind(employee_id)
    .bind(year)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::{pool, seed_employee};

    #[tokio::test]
    async fn test_lazy_defaults() {
        let pool = pool().await;
        let e = seed_employee(&pool, "acme", "E1", "Ops", None).await;

        let rows = list_for(&pool, "acme", e.id, 2025).await.unwrap();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|b| b.leave_type != LeaveType::Unpaid));
        let annual = rows.iter().find(|b| b.leave_type == LeaveType::Annual).unwrap();
        assert_eq!(annual.total, 21.0);
        assert_eq!(annual.used, 0.0);

        // Second read does not duplicate
        assert_eq!(list_for(&pool, "acme", e.id, 2025).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_debit_and_credit() {
        let pool = pool().await;
        let e = seed_employee(&pool, "acme", "E1", "Ops", None).await;
        let mut conn = pool.acquire().await.unwrap();
        ensure_year(&mut conn, "acme", e.id, 2025).await.unwrap();

        assert!(debit(&mut conn, "acme", e.id, 2025, LeaveType::Emergency, 3.0).await.unwrap());
        assert!(!debit(&mut conn, "acme", e.id, 2025, LeaveType::Emergency, 3.0).await.unwrap());

        credit(&mut conn, "acme", e.id, 2025, LeaveType::Emergency, 10.0).await.unwrap();
        let b = find(&mut conn, "acme", e.id, 2025, LeaveType::Emergency)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(b.used, 0.0);
        assert_eq!(b.remaining(), 5.0);
    }

    #[tokio::test]
    async fn test_set_allocations_rejects_below_used() {
        let pool = pool().await;
        let e = seed_employee(&pool, "acme", "E1", "Ops", None).await;
        {
            let mut conn = pool.acquire().await.unwrap();
            ensure_year(&mut conn, "acme", e.id, 2025).await.unwrap();
            debit(&mut conn, "acme", e.id, 2025, LeaveType::Annual, 4.0).await.unwrap();
        }

        let rows = set_allocations(
            &pool,
            "acme",
            e.id,
            2025,
            &[LeaveAllocation { leave_type: LeaveType::Annual, total: 25.0 }],
        )
        .await
        .unwrap();
        let annual = rows.iter().find(|b| b.leave_type == LeaveType::Annual).unwrap();
        assert_eq!(annual.total, 25.0);
        assert_eq!(annual.used + annual.remaining(), annual.total);

        let err = set_allocations(
            &pool,
            "acme",
            e.id,
            2025,
            &[LeaveAllocation { leave_type: LeaveType::Annual, total: 3.0 }],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));

        let err = set_allocations(
            &pool,
            "acme",
            e.id,
            2025,
            &[LeaveAllocation { leave_type: LeaveType::Unpaid, total: 3.0 }],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }
}
