//! Audit log SQLite storage
//!
//! Append-only: no update or delete path exists here, and triggers in the
//! schema abort any UPDATE or DELETE on `audit_log`.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use thiserror::Error;

use super::types::{
    AuditAction, AuditChainBreak, AuditChainVerification, AuditEntry, AuditQuery,
};
use shared::models::page_window;

pub const GENESIS_HASH: &str = "genesis";

#[derive(Debug, Error)]
pub enum AuditStorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AuditStorageResult<T> = Result<T, AuditStorageError>;

impl From<AuditStorageError> for shared::error::AppError {
    fn from(err: AuditStorageError) -> Self {
        shared::error::AppError::internal(err.to_string())
    }
}

/// Who did it and to what
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub tenant_id: String,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub operator_id: Option<String>,
    pub operator_name: Option<String>,
    pub details: serde_json::Value,
}

const ENTRY_COLUMNS: &str = "tenant_id, sequence, timestamp, action, resource_type, resource_id, \
     operator_id, operator_name, details, prev_hash, curr_hash";

const QUERY_WHERE: &str = "tenant_id = ?1
    AND (?2 IS NULL OR timestamp >= ?2)
    AND (?3 IS NULL OR timestamp <= ?3)
    AND (?4 IS NULL OR action = ?4)
    AND (?5 IS NULL OR operator_id = ?5)
    AND (?6 IS NULL OR resource_type = ?6)";

/// Audit log storage
///
/// Appends are serialized by a mutex so two writers never read the same
/// chain head.
#[derive(Clone)]
pub struct AuditStorage {
    pool: SqlitePool,
    append_lock: Arc<tokio::sync::Mutex<()>>,
}

impl AuditStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            append_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Append one entry to its tenant's chain
    pub async fn append(&self, record: AuditRecord) -> AuditStorageResult<AuditEntry> {
        let _guard = self.append_lock.lock().await;

        let last: Option<(i64, String)> = sqlx::query_as(
            "SELECT sequence, curr_hash FROM audit_log WHERE tenant_id = ?
             ORDER BY sequence DESC LIMIT 1",
        )
        .bind(&record.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        let (sequence, prev_hash) = match last {
            Some((seq, hash)) => (seq + 1, hash),
            None => (1, GENESIS_HASH.to_string()),
        };

        let mut entry = AuditEntry {
            tenant_id: record.tenant_id,
            sequence,
            timestamp: shared::util::now_millis(),
            action: record.action,
            resource_type: record.resource_type,
            resource_id: record.resource_id,
            operator_id: record.operator_id,
            operator_name: record.operator_name,
            details: record.details,
            prev_hash,
            curr_hash: String::new(),
        };
        entry.curr_hash = compute_audit_hash(&entry);

        sqlx::query(
            "INSERT INTO audit_log (tenant_id, sequence, timestamp, action, resource_type, resource_id, operator_id, operator_name, details, prev_hash, curr_hash)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.tenant_id)
        .bind(entry.sequence)
        .bind(entry.timestamp)
        .bind(entry.action)
        .bind(&entry.resource_type)
        .bind(&entry.resource_id)
        .bind(&entry.operator_id)
        .bind(&entry.operator_name)
        .bind(serde_json::to_string(&entry.details)?)
        .bind(&entry.prev_hash)
        .bind(&entry.curr_hash)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Append, logging instead of failing; the audited operation has
    /// already committed by the time this runs
    pub async fn record(&self, record: AuditRecord) {
        let action = record.action;
        if let Err(e) = self.append(record).await {
            tracing::error!(action = %action, error = %e, "Failed to append audit entry");
        }
    }

    /// Filtered page, newest first
    pub async fn query(
        &self,
        tenant_id: &str,
        q: &AuditQuery,
    ) -> AuditStorageResult<(Vec<AuditEntry>, i64)> {
        let (_, limit, offset) = page_window(q.page, q.limit, 50);

        let count_sql = format!("SELECT COUNT(*) FROM audit_log WHERE {QUERY_WHERE}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(tenant_id)
            .bind(q.from)
            .bind(q.to)
            .bind(q.action)
            .bind(&q.operator_id)
            .bind(&q.resource_type)
            .fetch_one(&self.pool)
            .await?;

        let select_sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM audit_log WHERE {QUERY_WHERE}
             ORDER BY sequence DESC LIMIT ?7 OFFSET ?8"
        );
        let items = sqlx::query_as(&select_sql)
            .bind(tenant_id)
            .bind(q.from)
            .bind(q.to)
            .bind(q.action)
            .bind(&q.operator_id)
            .bind(&q.resource_type)
            .bind(limit as i64)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((items, total))
    }

    /// Walk a tenant's chain from genesis and report every break
    pub async fn verify_chain(&self, tenant_id: &str) -> AuditStorageResult<AuditChainVerification> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM audit_log WHERE tenant_id = ? ORDER BY sequence"
        );
        let entries: Vec<AuditEntry> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;

        let mut breaks = Vec::new();
        let mut expected_prev = GENESIS_HASH.to_string();
        for entry in &entries {
            let hash_valid = compute_audit_hash(entry) == entry.curr_hash;
            if entry.prev_hash != expected_prev || !hash_valid {
                breaks.push(AuditChainBreak {
                    sequence: entry.sequence,
                    expected_prev_hash: expected_prev.clone(),
                    actual_prev_hash: entry.prev_hash.clone(),
                    hash_valid,
                });
            }
            expected_prev = entry.curr_hash.clone();
        }

        Ok(AuditChainVerification {
            total_entries: entries.len() as i64,
            chain_intact: breaks.is_empty(),
            breaks,
        })
    }
}

/// SHA-256 over every stored field
///
/// - variable-length fields are separated by `\x00`
/// - fixed-width integers are hashed as little-endian bytes
/// - optional fields carry a tag byte so `None` and `Some("")` differ
fn compute_audit_hash(entry: &AuditEntry) -> String {
    let mut hasher = Sha256::new();

    hasher.update(entry.prev_hash.as_bytes());
    hasher.update(b"\x00");
    hasher.update(entry.tenant_id.as_bytes());
    hasher.update(b"\x00");

    hasher.update(entry.sequence.to_le_bytes());
    hasher.update(entry.timestamp.to_le_bytes());

    hasher.update(entry.action.as_str().as_bytes());
    hasher.update(b"\x00");
    hasher.update(entry.resource_type.as_bytes());
    hasher.update(b"\x00");
    hasher.update(entry.resource_id.as_bytes());
    hasher.update(b"\x00");

    hash_optional(&mut hasher, entry.operator_id.as_deref());
    hash_optional(&mut hasher, entry.operator_name.as_deref());

    let details_json = serde_json::to_string(&entry.details).unwrap_or_default();
    hasher.update(details_json.as_bytes());
    hasher.update(b"\x00");

    hex::encode(hasher.finalize())
}

fn hash_optional(hasher: &mut Sha256, value: Option<&str>) {
    match value {
        Some(v) => {
            hasher.update(b"\x01");
            hasher.update(v.as_bytes());
        }
        None => {
            hasher.update(b"\x00");
        }
    }
    hasher.update(b"\x00");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::pool;

    fn record(tenant: &str, action: AuditAction, id: &str) -> AuditRecord {
        AuditRecord {
            tenant_id: tenant.into(),
            action,
            resource_type: "employee".into(),
            resource_id: id.into(),
            operator_id: Some("1".into()),
            operator_name: Some("Admin".into()),
            details: serde_json::json!({ "field": "status", "amount": 12.5 }),
        }
    }

    #[tokio::test]
    async fn test_chain_per_tenant() {
        let storage = AuditStorage::new(pool().await);
        let a1 = storage.append(record("acme", AuditAction::EmployeeCreated, "1")).await.unwrap();
        let a2 = storage.append(record("acme", AuditAction::EmployeeUpdated, "1")).await.unwrap();
        let g1 = storage.append(record("globex", AuditAction::EmployeeCreated, "9")).await.unwrap();

        assert_eq!(a1.prev_hash, GENESIS_HASH);
        assert_eq!(a2.prev_hash, a1.curr_hash);
        assert_eq!(a2.sequence, 2);
        assert_eq!(g1.sequence, 1);
        assert_eq!(g1.prev_hash, GENESIS_HASH);

        let v = storage.verify_chain("acme").await.unwrap();
        assert!(v.chain_intact);
        assert_eq!(v.total_entries, 2);
    }

    #[tokio::test]
    async fn test_query_filters() {
        let storage = AuditStorage::new(pool().await);
        storage.append(record("acme", AuditAction::LoginSuccess, "1")).await.unwrap();
        storage.append(record("acme", AuditAction::EmployeeDeleted, "2")).await.unwrap();
        storage.append(record("globex", AuditAction::EmployeeDeleted, "3")).await.unwrap();

        let (items, total) = storage.query("acme", &AuditQuery::default()).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(items[0].action, AuditAction::EmployeeDeleted);
        assert_eq!(items[0].details["amount"], 12.5);

        let q = AuditQuery {
            action: Some(AuditAction::LoginSuccess),
            ..Default::default()
        };
        let (items, total) = storage.query("acme", &q).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].resource_id, "1");
    }

    #[tokio::test]
    async fn test_log_is_append_only_and_tamper_detected() {
        let pool = pool().await;
        let storage = AuditStorage::new(pool.clone());
        storage.append(record("acme", AuditAction::PayrollPaid, "1")).await.unwrap();
        storage.append(record("acme", AuditAction::PayrollPaid, "2")).await.unwrap();

        let denied = sqlx::query("UPDATE audit_log SET resource_id = 'x'")
            .execute(&pool)
            .await;
        assert!(denied.is_err());
        assert!(sqlx::query("DELETE FROM audit_log").execute(&pool).await.is_err());

        // Bypass the guard to simulate tampering at the file level
        sqlx::query("DROP TRIGGER audit_log_no_update").execute(&pool).await.unwrap();
        sqlx::query("UPDATE audit_log SET resource_id = 'x' WHERE sequence = 1")
            .execute(&pool)
            .await
            .unwrap();

        let v = storage.verify_chain("acme").await.unwrap();
        assert!(!v.chain_intact);
        assert_eq!(v.breaks.len(), 1);
        assert_eq!(v.breaks[0].sequence, 1);
        assert!(!v.breaks[0].hash_valid);
    }
}
