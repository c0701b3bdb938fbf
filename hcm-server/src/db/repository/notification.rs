//! Notification Repository
//!
//! Every query is scoped by (tenant, recipient); a user never sees or
//! touches another user's rows.

use serde_json::Value;
use shared::ErrorCode;
use shared::models::{Notification, NotificationKind};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

use super::{RepoError, RepoResult, to_json};

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub action_url: Option<String>,
    pub metadata: Value,
}

fn not_found(id: i64) -> RepoError {
    RepoError::Business(
        ErrorCode::NotificationNotFound,
        format!("Notification {} not found", id),
    )
}

pub async fn create(
    pool: &SqlitePool,
    tenant_id: &str,
    data: &NewNotification,
) -> RepoResult<Notification> {
    let notification = Notification {
        id: snowflake_id(),
        tenant_id: tenant_id.to_string(),
        user_id: data.user_id,
        kind: data.kind,
        title: data.title.trim().to_string(),
        message: data.message.trim().to_string(),
        is_read: false,
        action_url: data.action_url.clone(),
        metadata: data.metadata.clone(),
        created_at: now_millis(),
        read_at: None,
    };

    sqlx::query(
        "INSERT INTO notifications (id, tenant_id, user_id, kind, title, message, is_read, action_url, metadata, created_at)
         VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?)",
    )
    .bind(notification.id)
    .bind(&notification.tenant_id)
    .bind(notification.user_id)
    .bind(notification.kind)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(&notification.action_url)
    .bind(to_json(&notification.metadata)?)
    .bind(notification.created_at)
    .execute(pool)
    .await?;

    Ok(notification)
}

/// Newest first; `read` filters on the read flag when given
pub async fn list(
    pool: &SqlitePool,
    tenant_id: &str,
    user_id: i64,
    read: Option<bool>,
    limit: i64,
    offset: i64,
) -> RepoResult<(Vec<Notification>, i64)> {
    const WHERE: &str = "tenant_id = ?1 AND user_id = ?2 AND (?3 IS NULL OR is_read = ?3)";

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM notifications WHERE {WHERE}"))
        .bind(tenant_id)
        .bind(user_id)
        .bind(read)
        .fetch_one(pool)
        .await?;

    let items = sqlx::query_as(&format!(
        "SELECT * FROM notifications WHERE {WHERE}
         ORDER BY created_at DESC, id DESC LIMIT ?4 OFFSET ?5"
    ))
    .bind(tenant_id)
    .bind(user_id)
    .bind(read)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((items, total))
}

pub async fn unread_count(pool: &SqlitePool, tenant_id: &str, user_id: i64) -> RepoResult<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM notifications WHERE tenant_id = ? AND user_id = ? AND is_read = 0",
    )
    .bind(tenant_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Mark one notification read; already-read rows keep their first `read_at`
pub async fn mark_read(
    pool: &SqlitePool,
    tenant_id: &str,
    user_id: i64,
    id: i64,
) -> RepoResult<Notification> {
    sqlx::query(
        "UPDATE notifications SET is_read = 1, read_at = COALESCE(read_at, ?)
         WHERE tenant_id = ? AND user_id = ? AND id = ?",
    )
    .bind(now_millis())
    .bind(tenant_id)
    .bind(user_id)
    .bind(id)
    .execute(pool)
    .await?;

    sqlx::query_as("SELECT * FROM notifications WHERE tenant_id = ? AND user_id = ? AND id = ?")
        .bind(tenant_id)
        .bind(user_id)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(id))
}

pub async fn mark_all_read(pool: &SqlitePool, tenant_id: &str, user_id: i64) -> RepoResult<u64> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = 1, read_at = ?
         WHERE tenant_id = ? AND user_id = ? AND is_read = 0",
    )
    .bind(now_millis())
    .bind(tenant_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete(pool: &SqlitePool, tenant_id: &str, user_id: i64, id: i64) -> RepoResult<()> {
    let result =
        sqlx::query("DELETE FROM notifications WHERE tenant_id = ? AND user_id = ? AND id = ?")
            .bind(tenant_id)
            .bind(user_id)
            .bind(id)
            .execute(pool)
            .await?;
    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::pool;

    fn note(user_id: i64, title: &str) -> NewNotification {
        NewNotification {
            user_id,
            kind: NotificationKind::SystemAlert,
            title: title.to_string(),
            message: "Body".into(),
            action_url: None,
            metadata: serde_json::json!({ "source": "test" }),
        }
    }

    #[tokio::test]
    async fn test_list_and_read_flow() {
        let pool = pool().await;
        let first = create(&pool, "acme", &note(1, "First")).await.unwrap();
        let second = create(&pool, "acme", &note(1, "Second")).await.unwrap();
        create(&pool, "acme", &note(2, "Other user")).await.unwrap();

        let (items, total) = list(&pool, "acme", 1, None, 20, 0).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(items[0].id, second.id);
        assert_eq!(items[1].metadata["source"], "test");
        assert_eq!(unread_count(&pool, "acme", 1).await.unwrap(), 2);

        let read = mark_read(&pool, "acme", 1, first.id).await.unwrap();
        assert!(read.is_read);
        assert!(read.read_at.is_some());

        let (unread, total) = list(&pool, "acme", 1, Some(false), 20, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(unread[0].id, second.id);

        assert_eq!(mark_all_read(&pool, "acme", 1).await.unwrap(), 1);
        assert_eq!(unread_count(&pool, "acme", 1).await.unwrap(), 0);
        assert_eq!(unread_count(&pool, "acme", 2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_other_users_rows_are_not_found() {
        let pool = pool().await;
        let theirs = create(&pool, "acme", &note(2, "Private")).await.unwrap();

        let err = mark_read(&pool, "acme", 1, theirs.id).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::NotificationNotFound, _)));
        let err = delete(&pool, "acme", 1, theirs.id).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::NotificationNotFound, _)));
        let err = delete(&pool, "globex", 2, theirs.id).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::NotificationNotFound, _)));

        delete(&pool, "acme", 2, theirs.id).await.unwrap();
        assert_eq!(unread_count(&pool, "acme", 2).await.unwrap(), 0);
    }
}
