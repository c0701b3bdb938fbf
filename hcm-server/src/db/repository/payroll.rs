//! Payroll Repository

use shared::ErrorCode;
use shared::models::{CurrencyTotals, Payroll, PayrollStatus, PayrollStatusCounts};
use shared::util::now_millis;
use sqlx::SqlitePool;

use super::{RepoError, RepoResult, Scope, to_json};
use crate::payroll::sources_of;

#[derive(Debug, Clone, Default)]
pub struct PayrollFilter {
    pub employee_id: Option<i64>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub status: Option<PayrollStatus>,
}

const LIST_WHERE: &str = "tenant_id = ?1
    AND (?2 IS NULL OR employee_id IN (SELECT value FROM json_each(?2)))
    AND (?3 IS NULL OR employee_id = ?3)
    AND (?4 IS NULL OR month = ?4)
    AND (?5 IS NULL OR year = ?5)
    AND (?6 IS NULL OR status = ?6)";

pub async fn find_by_id(pool: &SqlitePool, tenant_id: &str, id: i64) -> RepoResult<Option<Payroll>> {
    let row = sqlx::query_as("SELECT * FROM payroll WHERE tenant_id = ? AND id = ?")
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Insert a draft; one record per employee per period
pub async fn create(pool: &SqlitePool, payroll: &Payroll) -> RepoResult<Payroll> {
    let result = sqlx::query(
        "INSERT INTO payroll (id, tenant_id, employee_id, month, year, basic_salary, allowances, deductions,
             gross_salary, taxable_income, tax, total_deductions, net_salary, currency, country, status,
             payment_date, payslip_url, processed_by, processed_at, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(payroll.id)
    .bind(&payroll.tenant_id)
    .bind(payroll.employee_id)
    .bind(payroll.month)
    .bind(payroll.year)
    .bind(payroll.basic_salary)
    .bind(to_json(&payroll.allowances)?)
    .bind(to_json(&payroll.deductions)?)
    .bind(payroll.gross_salary)
    .bind(payroll.taxable_income)
    .bind(payroll.tax)
    .bind(payroll.total_deductions)
    .bind(payroll.net_salary)
    .bind(&payroll.currency)
    .bind(&payroll.country)
    .bind(payroll.status)
    .bind(&payroll.payment_date)
    .bind(&payroll.payslip_url)
    .bind(payroll.processed_by)
    .bind(payroll.processed_at)
    .bind(payroll.created_at)
    .bind(payroll.updated_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(payroll.clone()),
        Err(e) => match RepoError::from(e) {
            RepoError::Duplicate(_) => Err(RepoError::Business(
                ErrorCode::PayrollAlreadyExists,
                format!(
                    "Payroll already exists for this employee for {:02}/{}",
                    payroll.month, payroll.year
                ),
            )),
            other => Err(other),
        },
    }
}

/// Paged list, latest period first
pub async fn list(
    pool: &SqlitePool,
    tenant_id: &str,
    scope: &Scope,
    filter: &PayrollFilter,
    limit: i64,
    offset: i64,
) -> RepoResult<(Vec<Payroll>, i64)> {
    let scope = scope.bind_value();

    let count_sql = format!("SELECT COUNT(*) FROM payroll WHERE {LIST_WHERE}");
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(tenant_id)
        .bind(&scope)
        .bind(filter.employee_id)
        .bind(filter.month)
        .bind(filter.year)
        .bind(filter.status)
        .fetch_one(pool)
        .await?;

    let list_sql = format!(
        "SELECT * FROM payroll WHERE {LIST_WHERE}
         ORDER BY year DESC, month DESC, id LIMIT ?7 OFFSET ?8"
    );
    let items = sqlx::query_as(&list_sql)
        .bind(tenant_id)
        .bind(&scope)
        .bind(filter.employee_id)
        .bind(filter.month)
        .bind(filter.year)
        .bind(filter.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok((items, total))
}

pub async fn latest_for_employee(
    pool: &SqlitePool,
    tenant_id: &str,
    employee_id: i64,
) -> RepoResult<Option<Payroll>> {
    let row = sqlx::query_as(
        "SELECT * FROM payroll WHERE tenant_id = ? AND employee_id = ? AND status != 'cancelled'
         ORDER BY year DESC, month DESC LIMIT 1",
    )
    .bind(tenant_id)
    .bind(employee_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// draft -> processed
pub async fn process(
    pool: &SqlitePool,
    tenant_id: &str,
    id: i64,
    processed_by: i64,
) -> RepoResult<Payroll> {
    let now = now_millis();
    let result = sqlx::query(
        "UPDATE payroll SET status = 'processed', processed_by = ?, processed_at = ?, updated_at = ?
         WHERE tenant_id = ? AND id = ? AND status IN (SELECT value FROM json_each(?))",
    )
    .bind(processed_by)
    .bind(now)
    .bind(now)
    .bind(tenant_id)
    .bind(id)
    .bind(to_json(&sources_of(PayrollStatus::Processed))?)
    .execute(pool)
    .await?;
    finish_transition(pool, tenant_id, id, result.rows_affected(), PayrollStatus::Processed).await
}

/// processed -> paid
pub async fn mark_paid(
    pool: &SqlitePool,
    tenant_id: &str,
    id: i64,
    payment_date: &str,
) -> RepoResult<Payroll> {
    let result = sqlx::query(
        "UPDATE payroll SET status = 'paid', payment_date = ?, updated_at = ?
         WHERE tenant_id = ? AND id = ? AND status IN (SELECT value FROM json_each(?))",
    )
    .bind(payment_date)
    .bind(now_millis())
    .bind(tenant_id)
    .bind(id)
    .bind(to_json(&sources_of(PayrollStatus::Paid))?)
    .execute(pool)
    .await?;
    finish_transition(pool, tenant_id, id, result.rows_affected(), PayrollStatus::Paid).await
}

/// draft | processed -> cancelled
pub async fn cancel(pool: &SqlitePool, tenant_id: &str, id: i64) -> RepoResult<Payroll> {
    let result = sqlx::query(
        "UPDATE payroll SET status = 'cancelled', updated_at = ?
         WHERE tenant_id = ? AND id = ? AND status IN (SELECT value FROM json_each(?))",
    )
    .bind(now_millis())
    .bind(tenant_id)
    .bind(id)
    .bind(to_json(&sources_of(PayrollStatus::Cancelled))?)
    .execute(pool)
    .await?;
    finish_transition(pool, tenant_id, id, result.rows_affected(), PayrollStatus::Cancelled).await
}

async fn finish_transition(
    pool: &SqlitePool,
    tenant_id: &str,
    id: i64,
    rows_affected: u64,
    to: PayrollStatus,
) -> RepoResult<Payroll> {
    let row = find_by_id(pool, tenant_id, id).await?.ok_or_else(|| {
        RepoError::Business(ErrorCode::PayrollNotFound, "Payroll record not found".into())
    })?;
    if rows_affected == 0 {
        return Err(RepoError::Business(
            ErrorCode::PayrollInvalidTransition,
            format!(
                "Cannot change payroll status from {} to {}",
                row.status.as_str(),
                to.as_str()
            ),
        ));
    }
    Ok(row)
}

/// Totals per currency, cancelled records excluded; never converted
pub async fn totals_by_currency(
    pool: &SqlitePool,
    tenant_id: &str,
    month: Option<i32>,
    year: Option<i32>,
) -> RepoResult<Vec<CurrencyTotals>> {
    let rows = sqlx::query_as(
        "SELECT currency,
                COUNT(*) AS count,
                ROUND(COALESCE(SUM(gross_salary), 0), 2) AS total_gross,
                ROUND(COALESCE(SUM(tax), 0), 2) AS total_tax,
                ROUND(COALESCE(SUM(total_deductions), 0), 2) AS total_deductions,
                ROUND(COALESCE(SUM(net_salary), 0), 2) AS total_net,
                ROUND(COALESCE(AVG(gross_salary), 0), 2) AS average_gross,
                ROUND(COALESCE(AVG(net_salary), 0), 2) AS average_net
         FROM payroll
         WHERE tenant_id = ?1 AND status != 'cancelled'
           AND (?2 IS NULL OR month = ?2)
           AND (?3 IS NULL OR year = ?3)
         GROUP BY currency
         ORDER BY currency",
    )
    .bind(tenant_id)
    .bind(month)
    .bind(year)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn status_counts(
    pool: &SqlitePool,
    tenant_id: &str,
    month: Option<i32>,
    year: Option<i32>,
) -> RepoResult<PayrollStatusCounts> {
    let (draft, processed, paid, cancelled): (i64, i64, i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(status = 'draft'), 0),
                COALESCE(SUM(status = 'processed'), 0),
                COALESCE(SUM(status = 'paid'), 0),
                COALESCE(SUM(status = 'cancelled'), 0)
         FROM payroll
         WHERE tenant_id = ?1
           AND (?2 IS NULL OR month = ?2)
           AND (?3 IS NULL OR year = ?3)",
    )
    .bind(tenant_id)
    .bind(month)
    .bind(year)
    .fetch_one(pool)
    .await?;

    Ok(PayrollStatusCounts {
        draft,
        processed,
        paid,
        cancelled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::{pool, seed_employee};
    use shared::util::snowflake_id;

    fn draft(tenant: &str, employee_id: i64, month: i32, currency: &str, net: f64) -> Payroll {
        Payroll {
            id: snowflake_id(),
            tenant_id: tenant.into(),
            employee_id,
            month,
            year: 2025,
            basic_salary: net,
            allowances: vec![],
            deductions: vec![],
            gross_salary: net,
            taxable_income: net,
            tax: 0.0,
            total_deductions: 0.0,
            net_salary: net,
            currency: currency.into(),
            country: "India".into(),
            status: PayrollStatus::Draft,
            payment_date: None,
            payslip_url: None,
            processed_by: None,
            processed_at: None,
            created_at: 1,
            updated_at: 1,
        }
    }

    #[tokio::test]
    async fn test_duplicate_period_rejected() {
        let pool = pool().await;
        let e = seed_employee(&pool, "acme", "E1", "Ops", None).await;
        create(&pool, &draft("acme", e.id, 3, "INR", 100.0)).await.unwrap();
        let err = create(&pool, &draft("acme", e.id, 3, "INR", 100.0)).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::PayrollAlreadyExists, _)));
        assert!(create(&pool, &draft("acme", e.id, 4, "INR", 100.0)).await.is_ok());
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let pool = pool().await;
        let e = seed_employee(&pool, "acme", "E1", "Ops", None).await;
        let p = create(&pool, &draft("acme", e.id, 3, "INR", 100.0)).await.unwrap();

        let err = mark_paid(&pool, "acme", p.id, "2025-03-31").await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::PayrollInvalidTransition, _)));

        let processed = process(&pool, "acme", p.id, 7).await.unwrap();
        assert_eq!(processed.status, PayrollStatus::Processed);
        assert_eq!(processed.processed_by, Some(7));

        let paid = mark_paid(&pool, "acme", p.id, "2025-03-31").await.unwrap();
        assert_eq!(paid.status, PayrollStatus::Paid);
        assert_eq!(paid.payment_date.as_deref(), Some("2025-03-31"));

        let err = cancel(&pool, "acme", p.id).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::PayrollInvalidTransition, _)));

        let err = process(&pool, "globex", p.id, 7).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::PayrollNotFound, _)));
    }

    #[tokio::test]
    async fn test_stats_group_by_currency() {
        let pool = pool().await;
        let a = seed_employee(&pool, "acme", "A", "Ops", None).await;
        let b = seed_employee(&pool, "acme", "B", "Ops", None).await;
        let c = seed_employee(&pool, "acme", "C", "Ops", None).await;
        create(&pool, &draft("acme", a.id, 3, "INR", 100.0)).await.unwrap();
        create(&pool, &draft("acme", b.id, 3, "INR", 300.0)).await.unwrap();
        let usd = create(&pool, &draft("acme", c.id, 3, "USD", 50.0)).await.unwrap();
        let gone = create(&pool, &draft("acme", c.id, 4, "USD", 999.0)).await.unwrap();
        cancel(&pool, "acme", gone.id).await.unwrap();
        process(&pool, "acme", usd.id, 1).await.unwrap();

        let totals = totals_by_currency(&pool, "acme", None, Some(2025)).await.unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].currency, "INR");
        assert_eq!(totals[0].count, 2);
        assert_eq!(totals[0].total_net, 400.0);
        assert_eq!(totals[0].average_net, 200.0);
        assert_eq!(totals[1].currency, "USD");
        assert_eq!(totals[1].total_net, 50.0);

        let counts = status_counts(&pool, "acme", Some(3), Some(2025)).await.unwrap();
        assert_eq!(counts.draft, 2);
        assert_eq!(counts.processed, 1);
        assert_eq!(counts.cancelled, 0);

        let (rows, total) = list(&pool, "acme", &Scope::single(c.id), &PayrollFilter::default(), 10, 0)
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(rows[0].month, 4);

        let latest = latest_for_employee(&pool, "acme", c.id).await.unwrap().unwrap();
        assert_eq!(latest.id, usd.id);
    }
}
