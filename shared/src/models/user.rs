//! User Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::employee::Employee;

/// Account role, ordered from most to least privileged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum Role {
    SuperAdmin,
    Admin,
    Hr,
    Manager,
    #[default]
    Employee,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Hr,
        Role::Manager,
        Role::Employee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Hr => "hr",
            Role::Manager => "manager",
            Role::Employee => "employee",
        }
    }

    /// Admin-level roles see and manage the whole tenant
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("Unknown role: {}", s))
    }
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub tenant_id: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub employee_id: Option<i64>,
    pub avatar: Option<String>,
    pub is_active: bool,
    pub last_login: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields needed to insert a user row (password already hashed)
#[derive(Debug, Clone)]
pub struct UserCreate {
    pub tenant_id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub department: Option<String>,
    pub designation: Option<String>,
    pub employee_id: Option<i64>,
}

/// Login payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Self-registration payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    pub role: Option<Role>,
    pub tenant_id: Option<String>,
    pub department: Option<String>,
    pub designation: Option<String>,
}

/// Token + profile returned by login and register
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
    pub permissions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<Employee>,
}

/// `GET /api/auth/me` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: User,
    pub permissions: Vec<String>,
    pub employee: Option<Employee>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_user_password_hash_not_serialized() {
        let user = User {
            id: 1,
            tenant_id: "default".into(),
            email: "a@b.com".into(),
            password_hash: "$argon2id$secret".into(),
            name: "A".into(),
            role: Role::Hr,
            department: None,
            designation: None,
            employee_id: None,
            avatar: None,
            is_active: true,
            last_login: None,
            created_at: 0,
            updated_at: 0,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(json.contains("\"role\":\"hr\""));
    }

    #[test]
    fn test_register_request_validation() {
        let req = RegisterRequest {
            email: "not-an-email".into(),
            password: "short".into(),
            name: "".into(),
            role: None,
            tenant_id: None,
            department: None,
            designation: None,
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("name"));
    }
}
