//! Database Module
//!
//! Handles SQLite connection pool and migrations

pub mod repository;

use crate::utils::AppError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;

/// Database service, owns the SQLite connection pool
#[derive(Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Open the database (WAL, foreign keys) and apply migrations
    ///
    /// An in-memory URL gets a single long-lived connection so every
    /// query sees the same database.
    pub async fn new(database_url: &str) -> Result<Self, AppError> {
        let in_memory = database_url.contains(":memory:");

        let mut options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::database(format!("Invalid database url: {e}")))?
            .create_if_missing(true)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        // busy_timeout: wait 5s on write contention instead of failing immediately
        sqlx::query("PRAGMA busy_timeout = 5000;")
            .execute(&pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to set busy_timeout: {e}")))?;

        tracing::info!(in_memory, "Database connection established (busy_timeout=5000ms)");

        sqlx::migrate!("./migrations")
            .set_ignore_missing(true)
            .run(&pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply migrations: {e}")))?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_backed_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("hcm.db").display());

        let db = DbService::new(&url).await.unwrap();
        sqlx::query(
            "INSERT INTO users (id, tenant_id, email, password_hash, name, role, created_at, updated_at) VALUES (1, 't', 'a@b.c', 'x', 'A', 'admin', 0, 0)",
        )
        .execute(&db.pool)
        .await
        .unwrap();
        db.pool.close().await;

        // Re-open: migrations are idempotent and data is still there
        let db = DbService::new(&url).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_audit_log_is_append_only() {
        let db = DbService::new("sqlite::memory:").await.unwrap();
        sqlx::query(
            "INSERT INTO audit_log (tenant_id, sequence, timestamp, action, resource_type, resource_id, details, prev_hash, curr_hash) VALUES ('t', 1, 0, 'logout', 'user', '1', 'null', 'genesis', 'h')",
        )
        .execute(&db.pool)
        .await
        .unwrap();

        let update = sqlx::query("UPDATE audit_log SET curr_hash = 'x'")
            .execute(&db.pool)
            .await;
        assert!(update.is_err());
        let delete = sqlx::query("DELETE FROM audit_log").execute(&db.pool).await;
        assert!(delete.is_err());
    }
}
