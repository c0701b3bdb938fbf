//! Tax Rule Repository
//!
//! One row per (tenant, country); countries without a row use the flat
//! fallback rate.

use shared::models::{TaxBracket, TaxRule};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

use super::{RepoResult, to_json};

pub async fn find(pool: &SqlitePool, tenant_id: &str, country: &str) -> RepoResult<Option<TaxRule>> {
    let rule = sqlx::query_as(
        "SELECT country, currency, brackets, updated_by, updated_at
         FROM tax_rules WHERE tenant_id = ? AND country = ?",
    )
    .bind(tenant_id)
    .bind(country)
    .fetch_optional(pool)
    .await?;
    Ok(rule)
}

/// Insert or replace the brackets for a country
pub async fn upsert(
    pool: &SqlitePool,
    tenant_id: &str,
    country: &str,
    currency: &str,
    brackets: &[TaxBracket],
    updated_by: i64,
) -> RepoResult<TaxRule> {
    let now = now_millis();
    sqlx::query(
        "INSERT INTO tax_rules (id, tenant_id, country, currency, brackets, updated_by, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (tenant_id, country) DO UPDATE
         SET currency = excluded.currency, brackets = excluded.brackets,
             updated_by = excluded.updated_by, updated_at = excluded.updated_at",
    )
    .bind(snowflake_id())
    .bind(tenant_id)
    .bind(country)
    .bind(currency)
    .bind(to_json(&brackets)?)
    .bind(updated_by)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(TaxRule {
        country: country.to_string(),
        currency: currency.to_string(),
        brackets: brackets.to_vec(),
        is_default: false,
        updated_by: Some(updated_by),
        updated_at: Some(now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::pool;

    #[tokio::test]
    async fn test_upsert_replaces_per_tenant() {
        let pool = pool().await;
        assert!(find(&pool, "acme", "UK").await.unwrap().is_none());

        let first = [TaxBracket { min: 0.0, max: None, rate: 0.2 }];
        upsert(&pool, "acme", "UK", "GBP", &first, 1).await.unwrap();

        let second = [
            TaxBracket { min: 0.0, max: Some(1_000.0), rate: 0.0 },
            TaxBracket { min: 1_000.0, max: None, rate: 0.4 },
        ];
        upsert(&pool, "acme", "UK", "GBP", &second, 2).await.unwrap();

        let stored = find(&pool, "acme", "UK").await.unwrap().unwrap();
        assert_eq!(stored.brackets, second.to_vec());
        assert_eq!(stored.updated_by, Some(2));
        assert!(!stored.is_default);

        assert!(find(&pool, "globex", "UK").await.unwrap().is_none());
    }
}
