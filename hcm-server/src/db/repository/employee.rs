//! Employee Repository
//!
//! Profile sections are JSON TEXT columns; filters reach into them with
//! `json_extract`.

use shared::ErrorCode;
use shared::models::{
    DepartmentCount, Employee, EmployeeCreate, EmployeeDocument, EmployeeStats, EmployeeStatus,
    EmployeeUpdate, HeadcountSummary, Role, UserCreate,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

use super::{RepoError, RepoResult, Scope, to_json, user};

/// Login account created together with an employee
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub password_hash: String,
    pub role: Role,
}

/// List filters; `None` means "any"
#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    pub department: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub search: Option<String>,
    pub manager_id: Option<i64>,
}

const LIST_WHERE: &str = "tenant_id = ?1
    AND (?2 IS NULL OR json_extract(company_info, '$.department') = ?2)
    AND (?3 IS NULL OR status = ?3)
    AND (?4 IS NULL OR manager_id = ?4)
    AND (?5 IS NULL
         OR json_extract(personal_info, '$.first_name') LIKE ?5
         OR json_extract(personal_info, '$.last_name') LIKE ?5
         OR json_extract(personal_info, '$.email') LIKE ?5
         OR employee_code LIKE ?5)";

pub async fn find_by_id(
    pool: &SqlitePool,
    tenant_id: &str,
    id: i64,
) -> RepoResult<Option<Employee>> {
    let employee = sqlx::query_as("SELECT * FROM employees WHERE tenant_id = ? AND id = ?")
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(employee)
}

pub async fn find_by_user_id(
    pool: &SqlitePool,
    tenant_id: &str,
    user_id: i64,
) -> RepoResult<Option<Employee>> {
    let employee = sqlx::query_as("SELECT * FROM employees WHERE tenant_id = ? AND user_id = ?")
        .bind(tenant_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(employee)
}

/// Paged list sorted by first name; returns the page and the total count
pub async fn list(
    pool: &SqlitePool,
    tenant_id: &str,
    filter: &EmployeeFilter,
    limit: i64,
    offset: i64,
) -> RepoResult<(Vec<Employee>, i64)> {
    let search = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{s}%"));

    let count_sql = format!("SELECT COUNT(*) FROM employees WHERE {LIST_WHERE}");
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(tenant_id)
        .bind(&filter.department)
        .bind(filter.status)
        .bind(filter.manager_id)
        .bind(&search)
        .fetch_one(pool)
        .await?;

    let list_sql = format!(
        "SELECT * FROM employees WHERE {LIST_WHERE}
         ORDER BY json_extract(personal_info, '$.first_name') COLLATE NOCASE, id
         LIMIT ?6 OFFSET ?7"
    );
    let items = sqlx::query_as(&list_sql)
        .bind(tenant_id)
        .bind(&filter.department)
        .bind(filter.status)
        .bind(filter.manager_id)
        .bind(&search)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok((items, total))
}

/// Active employees, optionally in one department, ordered by code
pub async fn list_active(
    pool: &SqlitePool,
    tenant_id: &str,
    department: Option<&str>,
) -> RepoResult<Vec<Employee>> {
    let rows = sqlx::query_as(
        "SELECT * FROM employees
         WHERE tenant_id = ?1 AND status = 'active'
           AND (?2 IS NULL OR json_extract(company_info, '$.department') = ?2)
         ORDER BY employee_code",
    )
    .bind(tenant_id)
    .bind(department)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Ids of the employees reporting to `manager_id`
pub async fn direct_report_ids(
    pool: &SqlitePool,
    tenant_id: &str,
    manager_id: i64,
) -> RepoResult<Vec<i64>> {
    let ids = sqlx::query_scalar("SELECT id FROM employees WHERE tenant_id = ? AND manager_id = ?")
        .bind(tenant_id)
        .bind(manager_id)
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

/// Create an employee, and its login account when one is given, atomically
pub async fn create(
    pool: &SqlitePool,
    tenant_id: &str,
    data: &EmployeeCreate,
    account: Option<NewAccount>,
) -> RepoResult<Employee> {
    let mut tx = pool.begin().await?;

    let code_taken: Option<i64> =
        sqlx::query_scalar("SELECT id FROM employees WHERE tenant_id = ? AND employee_code = ?")
            .bind(tenant_id)
            .bind(&data.employee_code)
            .fetch_optional(&mut *tx)
            .await?;
    if code_taken.is_some() {
        return Err(RepoError::Business(
            ErrorCode::EmployeeCodeExists,
            format!("Employee ID {} already exists", data.employee_code),
        ));
    }

    let now = now_millis();
    let id = snowflake_id();

    let user_id = match account {
        Some(account) => {
            let email = data.personal_info.email.trim().to_lowercase();
            let email_taken: Option<i64> =
                sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
                    .bind(&email)
                    .fetch_optional(&mut *tx)
                    .await?;
            if email_taken.is_some() {
                return Err(RepoError::Business(
                    ErrorCode::EmailAlreadyRegistered,
                    format!("User with email {email} already exists"),
                ));
            }

            let created = user::create(
                &mut *tx,
                &UserCreate {
                    tenant_id: tenant_id.to_string(),
                    email,
                    password_hash: account.password_hash,
                    name: data.personal_info.full_name(),
                    role: account.role,
                    department: Some(data.company_info.department.clone()),
                    designation: Some(data.company_info.designation.clone()),
                    employee_id: Some(id),
                },
            )
            .await?;
            Some(created.id)
        }
        None => None,
    };

    let employee = Employee {
        id,
        tenant_id: tenant_id.to_string(),
        employee_code: data.employee_code.trim().to_string(),
        user_id,
        manager_id: data.manager_id,
        personal_info: data.personal_info.clone(),
        company_info: data.company_info.clone(),
        bank_info: data.bank_info.clone(),
        compensation: data.compensation.clone(),
        documents: vec![],
        qualifications: data.qualifications.clone(),
        previous_employment: data.previous_employment.clone(),
        status: data.status.unwrap_or_default(),
        onboarding_step: 1,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO employees (id, tenant_id, employee_code, user_id, manager_id, personal_info, company_info, bank_info, compensation, documents, qualifications, previous_employment, status, onboarding_step, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, '[]', ?, ?, ?, ?, ?, ?)",
    )
    .bind(employee.id)
    .bind(&employee.tenant_id)
    .bind(&employee.employee_code)
    .bind(employee.user_id)
    .bind(employee.manager_id)
    .bind(to_json(&employee.personal_info)?)
    .bind(to_json(&employee.company_info)?)
    .bind(to_json(&employee.bank_info)?)
    .bind(employee.compensation.as_ref().map(to_json).transpose()?)
    .bind(to_json(&employee.qualifications)?)
    .bind(to_json(&employee.previous_employment)?)
    .bind(employee.status)
    .bind(employee.onboarding_step)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(employee)
}

/// Merge the given sections into the stored profile
pub async fn update(
    pool: &SqlitePool,
    tenant_id: &str,
    id: i64,
    data: &EmployeeUpdate,
) -> RepoResult<Employee> {
    let mut employee = find_by_id(pool, tenant_id, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Employee {} not found", id)))?;

    if let Some(code) = &data.employee_code {
        let code = code.trim();
        if code != employee.employee_code {
            let taken: Option<i64> = sqlx::query_scalar(
                "SELECT id FROM employees WHERE tenant_id = ? AND employee_code = ?",
            )
            .bind(tenant_id)
            .bind(code)
            .fetch_optional(pool)
            .await?;
            if taken.is_some() {
                return Err(RepoError::Business(
                    ErrorCode::EmployeeCodeExists,
                    format!("Employee ID {} already exists", code),
                ));
            }
            employee.employee_code = code.to_string();
        }
    }
    if let Some(manager_id) = data.manager_id {
        if manager_id == id {
            return Err(RepoError::Validation(
                "An employee cannot report to themselves".into(),
            ));
        }
        employee.manager_id = Some(manager_id);
    }
    if let Some(v) = &data.personal_info {
        employee.personal_info = v.clone();
    }
    if let Some(v) = &data.company_info {
        employee.company_info = v.clone();
    }
    if let Some(v) = &data.bank_info {
        employee.bank_info = v.clone();
    }
    if let Some(v) = &data.compensation {
        employee.compensation = Some(v.clone());
    }
    if let Some(v) = &data.qualifications {
        employee.qualifications = v.clone();
    }
    if let Some(v) = &data.previous_employment {
        employee.previous_employment = v.clone();
    }
    if let Some(v) = data.status {
        employee.status = v;
    }
    if let Some(v) = data.onboarding_step {
        employee.onboarding_step = v;
    }
    employee.updated_at = now_millis();

    let result = sqlx::query(
        "UPDATE employees SET employee_code = ?, manager_id = ?, personal_info = ?, company_info = ?, bank_info = ?,
             compensation = ?, qualifications = ?, previous_employment = ?, status = ?, onboarding_step = ?, updated_at = ?
         WHERE tenant_id = ? AND id = ?",
    )
    .bind(&employee.employee_code)
    .bind(employee.manager_id)
    .bind(to_json(&employee.personal_info)?)
    .bind(to_json(&employee.company_info)?)
    .bind(to_json(&employee.bank_info)?)
    .bind(employee.compensation.as_ref().map(to_json).transpose()?)
    .bind(to_json(&employee.qualifications)?)
    .bind(to_json(&employee.previous_employment)?)
    .bind(employee.status)
    .bind(employee.onboarding_step)
    .bind(employee.updated_at)
    .bind(tenant_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Employee {} not found", id)));
    }
    Ok(employee)
}

/// Append a document in one statement, so concurrent uploads never drop each other
pub async fn add_document(
    pool: &SqlitePool,
    tenant_id: &str,
    id: i64,
    document: &EmployeeDocument,
) -> RepoResult<Employee> {
    let result = sqlx::query(
        "UPDATE employees SET documents = json_insert(documents, '$[#]', json(?)), updated_at = ?
         WHERE tenant_id = ? AND id = ?",
    )
    .bind(to_json(document)?)
    .bind(now_millis())
    .bind(tenant_id)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Employee {} not found", id)));
    }
    find_by_id(pool, tenant_id, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Employee {} not found", id)))
}

/// What `delete` did with the employee row
#[derive(Debug, Clone)]
pub enum Removal {
    /// No history; employee and login account are gone
    Deleted(Employee),
    /// Attendance, leave or payroll rows exist; the employee is kept as
    /// `terminated` and the login account is deactivated
    Terminated(Employee),
}

/// Remove an employee
///
/// Direct reports lose their manager link either way. History rows are
/// never deleted, so an employee that has any is terminated instead.
pub async fn delete(pool: &SqlitePool, tenant_id: &str, id: i64) -> RepoResult<Removal> {
    let mut tx = pool.begin().await?;

    let employee: Employee =
        sqlx::query_as("SELECT * FROM employees WHERE tenant_id = ? AND id = ?")
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Employee {} not found", id)))?;

    sqlx::query("UPDATE employees SET manager_id = NULL WHERE tenant_id = ? AND manager_id = ?")
        .bind(tenant_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let has_history: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM payroll WHERE employee_id = ?1)
             OR EXISTS (SELECT 1 FROM leave_requests WHERE employee_id = ?1)
             OR EXISTS (SELECT 1 FROM attendance WHERE employee_id = ?1)",
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    let removal = if has_history {
        let now = now_millis();
        sqlx::query(
            "UPDATE users SET is_active = 0, updated_at = ?
             WHERE tenant_id = ? AND (employee_id = ? OR id = ?)",
        )
        .bind(now)
        .bind(tenant_id)
        .bind(id)
        .bind(employee.user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE employees SET status = 'terminated', updated_at = ? WHERE tenant_id = ? AND id = ?",
        )
        .bind(now)
        .bind(tenant_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        Removal::Terminated(Employee {
            status: EmployeeStatus::Terminated,
            updated_at: now,
            ..employee
        })
    } else {
        sqlx::query("DELETE FROM users WHERE tenant_id = ? AND (employee_id = ? OR id = ?)")
            .bind(tenant_id)
            .bind(id)
            .bind(employee.user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM employees WHERE tenant_id = ? AND id = ?")
            .bind(tenant_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        Removal::Deleted(employee)
    };

    tx.commit().await?;
    Ok(removal)
}

/// Counts by status within a scope
pub async fn headcount(
    pool: &SqlitePool,
    tenant_id: &str,
    scope: &Scope,
) -> RepoResult<HeadcountSummary> {
    let (total, active, inactive, on_leave, terminated): (i64, i64, i64, i64, i64) =
        sqlx::query_as(
            "SELECT COUNT(*),
                    COALESCE(SUM(status = 'active'), 0),
                    COALESCE(SUM(status = 'inactive'), 0),
                    COALESCE(SUM(status = 'on_leave'), 0),
                    COALESCE(SUM(status = 'terminated'), 0)
             FROM employees
             WHERE tenant_id = ?1 AND (?2 IS NULL OR id IN (SELECT value FROM json_each(?2)))",
        )
        .bind(tenant_id)
        .bind(scope.bind_value())
        .fetch_one(pool)
        .await?;

    Ok(HeadcountSummary {
        total,
        active,
        inactive,
        on_leave,
        terminated,
    })
}

pub async fn department_counts(
    pool: &SqlitePool,
    tenant_id: &str,
) -> RepoResult<Vec<DepartmentCount>> {
    let rows = sqlx::query_as(
        "SELECT COALESCE(json_extract(company_info, '$.department'), '') AS department, COUNT(*) AS count
         FROM employees WHERE tenant_id = ?
         GROUP BY department
         ORDER BY count DESC, department",
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn stats(pool: &SqlitePool, tenant_id: &str) -> RepoResult<EmployeeStats> {
    let headcount = headcount(pool, tenant_id, &Scope::All).await?;
    let departments = department_counts(pool, tenant_id).await?;
    Ok(EmployeeStats {
        total: headcount.total,
        active: headcount.active,
        inactive: headcount.inactive,
        on_leave: headcount.on_leave,
        departments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::{pool, seed_employee};
    use shared::models::PersonalInfo;

    #[tokio::test]
    async fn test_list_filters_and_sort() {
        let pool = pool().await;
        seed_employee(&pool, "acme", "ZED", "Sales", None).await;
        seed_employee(&pool, "acme", "AMY", "Engineering", None).await;
        seed_employee(&pool, "acme", "BOB", "Engineering", None).await;
        seed_employee(&pool, "globex", "CAT", "Engineering", None).await;

        let (all, total) = list(&pool, "acme", &EmployeeFilter::default(), 10, 0)
            .await
            .unwrap();
        assert_eq!(total, 3);
        let codes: Vec<_> = all.iter().map(|e| e.employee_code.as_str()).collect();
        assert_eq!(codes, ["AMY", "BOB", "ZED"]);

        let filter = EmployeeFilter {
            department: Some("Engineering".into()),
            ..Default::default()
        };
        let (eng, total) = list(&pool, "acme", &filter, 1, 1).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(eng.len(), 1);
        assert_eq!(eng[0].employee_code, "BOB");

        let filter = EmployeeFilter {
            search: Some("zed".into()),
            ..Default::default()
        };
        let (found, _) = list(&pool, "acme", &filter, 10, 0).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_code_per_tenant() {
        let pool = pool().await;
        let first = seed_employee(&pool, "acme", "E001", "Ops", None).await;
        let data = EmployeeCreate {
            employee_code: "E001".into(),
            manager_id: None,
            personal_info: first.personal_info.clone(),
            company_info: first.company_info.clone(),
            bank_info: Default::default(),
            compensation: None,
            qualifications: vec![],
            previous_employment: vec![],
            status: None,
            account: None,
        };
        let err = create(&pool, "acme", &data, None).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::EmployeeCodeExists, _)));

        // Same code in another tenant is fine
        assert!(create(&pool, "globex", &data, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_with_account_links_user() {
        let pool = pool().await;
        let data = EmployeeCreate {
            employee_code: "E010".into(),
            manager_id: None,
            personal_info: PersonalInfo {
                first_name: "Ravi".into(),
                last_name: "Kumar".into(),
                email: "Ravi@Acme.test".into(),
                ..Default::default()
            },
            company_info: Default::default(),
            bank_info: Default::default(),
            compensation: None,
            qualifications: vec![],
            previous_employment: vec![],
            status: None,
            account: None,
        };
        let account = NewAccount {
            password_hash: "$argon2id$stub".into(),
            role: Role::Employee,
        };
        let employee = create(&pool, "acme", &data, Some(account.clone()))
            .await
            .unwrap();
        let user = user::find_by_email(&pool, "ravi@acme.test")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(employee.user_id, Some(user.id));
        assert_eq!(user.employee_id, Some(employee.id));
        assert_eq!(user.name, "Ravi Kumar");

        // Email clash rolls back the whole creation
        let again = EmployeeCreate {
            employee_code: "E011".into(),
            ..data
        };
        let err = create(&pool, "acme", &again, Some(account)).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::EmailAlreadyRegistered, _)));
        let (_, total) = list(&pool, "acme", &EmployeeFilter::default(), 10, 0)
            .await
            .unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_update_and_documents() {
        let pool = pool().await;
        let employee = seed_employee(&pool, "acme", "E020", "Ops", None).await;

        let updated = update(
            &pool,
            "acme",
            employee.id,
            &EmployeeUpdate {
                status: Some(EmployeeStatus::OnLeave),
                onboarding_step: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.status, EmployeeStatus::OnLeave);
        assert_eq!(updated.onboarding_step, 3);

        let doc = EmployeeDocument {
            name: "Passport".into(),
            doc_type: "id_proof".into(),
            url: "https://files.test/p.pdf".into(),
            uploaded_at: 1,
            expiry_date: None,
            verified: false,
        };
        add_document(&pool, "acme", employee.id, &doc).await.unwrap();
        let reloaded = add_document(&pool, "acme", employee.id, &doc).await.unwrap();
        assert_eq!(reloaded.documents.len(), 2);
        assert_eq!(reloaded.status, EmployeeStatus::OnLeave);

        // Other tenants cannot touch it
        let err = add_document(&pool, "globex", employee.id, &doc).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_user_and_manager_links() {
        let pool = pool().await;
        let manager = seed_employee(&pool, "acme", "M001", "Ops", None).await;
        let report = seed_employee(&pool, "acme", "E030", "Ops", Some(manager.id)).await;
        assert_eq!(
            direct_report_ids(&pool, "acme", manager.id).await.unwrap(),
            vec![report.id]
        );

        let removal = delete(&pool, "acme", manager.id).await.unwrap();
        assert!(matches!(removal, Removal::Deleted(_)));
        assert!(find_by_id(&pool, "acme", manager.id).await.unwrap().is_none());
        let report = find_by_id(&pool, "acme", report.id).await.unwrap().unwrap();
        assert_eq!(report.manager_id, None);

        let err = delete(&pool, "acme", manager.id).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_with_history_terminates() {
        use crate::db::repository::attendance;
        use shared::models::{AttendanceStatus, WorkLocation};

        let pool = pool().await;
        let e = seed_employee(&pool, "acme", "E040", "Ops", None).await;
        let rec = attendance::check_in(
            &pool, "acme", e.id, "2025-03-17", 1,
            AttendanceStatus::Present, WorkLocation::Office, None, None,
        )
        .await
        .unwrap();

        let removal = delete(&pool, "acme", e.id).await.unwrap();
        let Removal::Terminated(kept) = removal else {
            panic!("employee with attendance must be terminated, not deleted");
        };
        assert_eq!(kept.status, EmployeeStatus::Terminated);

        let reloaded = find_by_id(&pool, "acme", e.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, EmployeeStatus::Terminated);
        assert!(attendance::find_by_id(&pool, "acme", rec.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_stats() {
        let pool = pool().await;
        seed_employee(&pool, "acme", "E1", "Sales", None).await;
        seed_employee(&pool, "acme", "E2", "Sales", None).await;
        let e3 = seed_employee(&pool, "acme", "E3", "Ops", None).await;
        update(
            &pool,
            "acme",
            e3.id,
            &EmployeeUpdate {
                status: Some(EmployeeStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let stats = stats(&pool, "acme").await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.inactive, 1);
        assert_eq!(stats.departments[0].department, "Sales");
        assert_eq!(stats.departments[0].count, 2);
    }
}
