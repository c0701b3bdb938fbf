//! Repository Module
//!
//! Free async functions over `&SqlitePool`, one module per table.
//! Every query is scoped by `tenant_id`.

pub mod attendance;
pub mod employee;
pub mod leave;
pub mod leave_balance;
pub mod notification;
pub mod payroll;
pub mod regularization;
pub mod tax_rule;
pub mod user;

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A domain rule rejected the write (state changed, balance too low, ...)
    #[error("{1}")]
    Business(ErrorCode, String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepoError::Duplicate(db.message().to_string())
            }
            sqlx::Error::RowNotFound => RepoError::NotFound("Row not found".into()),
            _ => RepoError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(err: serde_json::Error) -> Self {
        RepoError::Database(format!("JSON column encode failed: {err}"))
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::conflict(msg),
            RepoError::Database(msg) => AppError::database(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Business(code, msg) => AppError::with_message(code, msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Serialize a value for a JSON TEXT column
pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> RepoResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Which employees' rows a list query may return
///
/// Bound as a JSON array and matched with
/// `employee_id IN (SELECT value FROM json_each(?))`; `All` binds NULL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Employees(Vec<i64>),
}

impl Scope {
    pub fn single(employee_id: i64) -> Self {
        Scope::Employees(vec![employee_id])
    }

    pub(crate) fn bind_value(&self) -> Option<String> {
        match self {
            Scope::All => None,
            Scope::Employees(ids) => Some(
                serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string()),
            ),
        }
    }

    pub fn allows(&self, employee_id: i64) -> bool {
        match self {
            Scope::All => true,
            Scope::Employees(ids) => ids.contains(&employee_id),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory database with migrations applied, plus seed helpers

    use shared::models::{CompanyInfo, Employee, EmployeeStatus, PersonalInfo};
    use sqlx::SqlitePool;

    pub async fn pool() -> SqlitePool {
        crate::db::DbService::new("sqlite::memory:")
            .await
            .expect("in-memory database")
            .pool
    }

    pub async fn seed_employee(
        pool: &SqlitePool,
        tenant: &str,
        code: &str,
        department: &str,
        manager_id: Option<i64>,
    ) -> Employee {
        let data = shared::models::EmployeeCreate {
            employee_code: code.to_string(),
            manager_id,
            personal_info: PersonalInfo {
                first_name: code.to_string(),
                last_name: "Test".into(),
                email: format!("{}@{}.test", code.to_lowercase(), tenant),
                ..Default::default()
            },
            company_info: CompanyInfo {
                department: department.to_string(),
                designation: "Engineer".into(),
                ..Default::default()
            },
            bank_info: Default::default(),
            compensation: None,
            qualifications: vec![],
            previous_employment: vec![],
            status: Some(EmployeeStatus::Active),
            account: None,
        };
        super::employee::create(pool, tenant, &data, None)
            .await
            .expect("seed employee")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_error_maps_to_app_error() {
        let err: AppError = RepoError::NotFound("Employee 7 not found".into()).into();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err: AppError = RepoError::Duplicate("email".into()).into();
        assert_eq!(err.http_status(), http::StatusCode::CONFLICT);

        let err: AppError =
            RepoError::Business(ErrorCode::LeaveNotPending, "Leave request is not pending".into())
                .into();
        assert_eq!(err.code, ErrorCode::LeaveNotPending);
        assert_eq!(err.message, "Leave request is not pending");
    }

    #[test]
    fn test_scope_binding() {
        assert_eq!(Scope::All.bind_value(), None);
        assert_eq!(Scope::Employees(vec![3, 5]).bind_value().as_deref(), Some("[3,5]"));
        assert!(Scope::single(3).allows(3));
        assert!(!Scope::single(3).allows(4));
        assert!(Scope::All.allows(4));
    }
}
