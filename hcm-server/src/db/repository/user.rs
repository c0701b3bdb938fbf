//! User Repository
//!
//! Emails are stored lower-cased and are unique across tenants, so login
//! can resolve the tenant from the email alone.

use shared::models::{User, UserCreate};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

use super::RepoResult;

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<User>> {
    let user = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_id(pool: &SqlitePool, tenant_id: &str, id: i64) -> RepoResult<Option<User>> {
    let user = sqlx::query_as("SELECT * FROM users WHERE tenant_id = ? AND id = ?")
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Whether any account already belongs to the tenant
pub async fn tenant_has_users(
    conn: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
    tenant_id: &str,
) -> RepoResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE tenant_id = ? LIMIT 1")
        .bind(tenant_id)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

/// Insert a user; works on the pool or inside a transaction
pub async fn create(
    conn: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
    data: &UserCreate,
) -> RepoResult<User> {
    let now = now_millis();
    let user = User {
        id: snowflake_id(),
        tenant_id: data.tenant_id.clone(),
        email: data.email.trim().to_lowercase(),
        password_hash: data.password_hash.clone(),
        name: data.name.trim().to_string(),
        role: data.role,
        department: data.department.clone(),
        designation: data.designation.clone(),
        employee_id: data.employee_id,
        avatar: None,
        is_active: true,
        last_login: None,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO users (id, tenant_id, email, password_hash, name, role, department, designation, employee_id, is_active, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(user.id)
    .bind(&user.tenant_id)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.name)
    .bind(user.role)
    .bind(&user.department)
    .bind(&user.designation)
    .bind(user.employee_id)
    .bind(now)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(user)
}

pub async fn update_last_login(
    pool: &SqlitePool,
    tenant_id: &str,
    id: i64,
    now: i64,
) -> RepoResult<()> {
    sqlx::query("UPDATE users SET last_login = ?, updated_at = ? WHERE tenant_id = ? AND id = ?")
        .bind(now)
        .bind(now)
        .bind(tenant_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_password(
    pool: &SqlitePool,
    tenant_id: &str,
    id: i64,
    password_hash: &str,
) -> RepoResult<()> {
    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE tenant_id = ? AND id = ?")
        .bind(password_hash)
        .bind(now_millis())
        .bind(tenant_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Point a user at its employee profile
pub async fn link_employee(
    conn: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
    tenant_id: &str,
    user_id: i64,
    employee_id: i64,
) -> RepoResult<()> {
    sqlx::query("UPDATE users SET employee_id = ?, updated_at = ? WHERE tenant_id = ? AND id = ?")
        .bind(employee_id)
        .bind(now_millis())
        .bind(tenant_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Keep the user's display fields in step with the employee profile
pub async fn sync_profile(
    pool: &SqlitePool,
    tenant_id: &str,
    employee_id: i64,
    name: &str,
    department: &str,
    designation: &str,
) -> RepoResult<()> {
    sqlx::query(
        "UPDATE users SET name = ?, department = ?, designation = ?, updated_at = ?
         WHERE tenant_id = ? AND employee_id = ?",
    )
    .bind(name)
    .bind(department)
    .bind(designation)
    .bind(now_millis())
    .bind(tenant_id)
    .bind(employee_id)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::RepoError;
    use crate::db::repository::test_support::pool;
    use shared::models::Role;

    fn new_user(tenant: &str, email: &str) -> UserCreate {
        UserCreate {
            tenant_id: tenant.into(),
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
            name: " Asha Rao ".into(),
            role: Role::Hr,
            department: None,
            designation: None,
            employee_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let pool = pool().await;
        let created = create(&pool, &new_user("acme", "Asha@Acme.Test")).await.unwrap();
        assert_eq!(created.email, "asha@acme.test");
        assert_eq!(created.name, "Asha Rao");

        let by_email = find_by_email(&pool, "ASHA@acme.test").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_email.role, Role::Hr);
        assert!(by_email.is_active);

        // Tenant scoped lookup
        assert!(find_by_id(&pool, "acme", created.id).await.unwrap().is_some());
        assert!(find_by_id(&pool, "globex", created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let pool = pool().await;
        create(&pool, &new_user("acme", "dup@acme.test")).await.unwrap();
        let err = create(&pool, &new_user("globex", "dup@acme.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_password_and_login_updates() {
        let pool = pool().await;
        let user = create(&pool, &new_user("acme", "p@acme.test")).await.unwrap();
        update_password(&pool, "acme", user.id, "$argon2id$new").await.unwrap();
        update_last_login(&pool, "acme", user.id, 1234).await.unwrap();

        let reloaded = find_by_id(&pool, "acme", user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.password_hash, "$argon2id$new");
        assert_eq!(reloaded.last_login, Some(1234));
    }
}
