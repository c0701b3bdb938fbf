//! Authentication Handlers
//!
//! Handles login, registration and password management

use std::time::Duration;

use axum::{Json, extract::State};
use serde::Serialize;
use shared::error::ErrorCode;
use shared::models::{
    AuthResponse, ChangePasswordRequest, Employee, ForgotPasswordRequest, LoginRequest,
    MeResponse, RegisterRequest, ResetPasswordRequest, Role, User, UserCreate,
};

use crate::api::access::audit;
use crate::audit::{AuditAction, AuditRecord};
use crate::auth::jwt::TOKEN_TYPE_RESET;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::permissions::permissions_for;
use crate::auth::{CurrentUser, JwtError};
use crate::core::ServerState;
use crate::db::repository::{RepoError, employee, user};
use crate::security_log;
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_dto, validate_optional_text};
use crate::utils::{AppError, AppResult};

/// Fixed delay on failed logins, blunts timing based account probing
const AUTH_FAILURE_DELAY_MS: u64 = 200;

const DEFAULT_TENANT: &str = "default";

fn token_error(e: JwtError) -> AppError {
    AppError::internal(format!("Failed to generate token: {e}"))
}

async fn linked_employee(state: &ServerState, user: &User) -> AppResult<Option<Employee>> {
    match user.employee_id {
        Some(id) => Ok(employee::find_by_id(&state.pool, &user.tenant_id, id).await?),
        None => Ok(None),
    }
}

/// Login handler
///
/// Unknown email and wrong password share one error so accounts cannot be
/// enumerated.
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    validate_dto(&req)?;

    let Some(found) = user::find_by_email(&state.pool, &req.email).await? else {
        tokio::time::sleep(Duration::from_millis(AUTH_FAILURE_DELAY_MS)).await;
        security_log!("WARN", "login_failed", email = req.email.clone(), reason = "user_not_found");
        return Err(AppError::invalid_credentials());
    };

    if !found.is_active {
        security_log!("WARN", "login_failed", user_id = found.id, reason = "account_disabled");
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    if !verify_password(&req.password, &found.password_hash) {
        tokio::time::sleep(Duration::from_millis(AUTH_FAILURE_DELAY_MS)).await;
        state
            .audit
            .record(AuditRecord {
                tenant_id: found.tenant_id.clone(),
                action: AuditAction::LoginFailed,
                resource_type: "user".into(),
                resource_id: found.id.to_string(),
                operator_id: None,
                operator_name: None,
                details: serde_json::json!({ "reason": "invalid_credentials" }),
            })
            .await;
        security_log!("WARN", "login_failed", user_id = found.id, reason = "invalid_credentials");
        return Err(AppError::invalid_credentials());
    }

    let permissions = permissions_for(found.role);
    let token = state
        .get_jwt_service()
        .generate_token(&found, &permissions)
        .map_err(token_error)?;

    let now = shared::util::now_millis();
    user::update_last_login(&state.pool, &found.tenant_id, found.id, now).await?;
    let employee = linked_employee(&state, &found).await?;

    state
        .audit
        .record(AuditRecord {
            tenant_id: found.tenant_id.clone(),
            action: AuditAction::LoginSuccess,
            resource_type: "user".into(),
            resource_id: found.id.to_string(),
            operator_id: Some(found.id.to_string()),
            operator_name: Some(found.name.clone()),
            details: serde_json::json!({ "role": found.role }),
        })
        .await;
    tracing::info!(user_id = found.id, tenant_id = %found.tenant_id, "User logged in");

    Ok(Json(AuthResponse {
        token,
        user: User {
            last_login: Some(now),
            ..found
        },
        permissions,
        employee,
    }))
}

/// Self registration
///
/// The first account of a tenant may take any role below super admin and
/// bootstraps that tenant. Once a tenant has users, self registration into
/// it only creates `employee` accounts; raised roles come from
/// `POST /api/employees`.
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    validate_dto(&req)?;
    validate_optional_text(&req.tenant_id, "tenant_id", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&req.department, "department", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&req.designation, "designation", MAX_SHORT_TEXT_LEN)?;

    let role = req.role.unwrap_or_default();
    if role == Role::SuperAdmin {
        return Err(AppError::new(ErrorCode::CannotModifySuperAdmin));
    }
    let tenant_id = req
        .tenant_id
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TENANT)
        .to_string();

    let data = UserCreate {
        tenant_id,
        email: req.email.clone(),
        password_hash: hash_password(&req.password)?,
        name: req.name.clone(),
        role,
        department: req.department.clone(),
        designation: req.designation.clone(),
        employee_id: None,
    };

    let mut tx = state.pool.begin().await.map_err(RepoError::from)?;
    if role != Role::Employee && user::tenant_has_users(&mut *tx, &data.tenant_id).await? {
        security_log!(
            "WARN",
            "register_refused",
            email = data.email.clone(),
            tenant_id = data.tenant_id.clone(),
            reason = "raised_role_in_existing_tenant"
        );
        return Err(AppError::new(ErrorCode::RegistrationRoleRestricted));
    }
    let created = match user::create(&mut *tx, &data).await {
        Ok(u) => u,
        Err(RepoError::Duplicate(_)) => {
            return Err(AppError::new(ErrorCode::EmailAlreadyRegistered));
        }
        Err(e) => return Err(e.into()),
    };
    tx.commit().await.map_err(RepoError::from)?;

    let permissions = permissions_for(created.role);
    let token = state
        .get_jwt_service()
        .generate_token(&created, &permissions)
        .map_err(token_error)?;

    state
        .audit
        .record(AuditRecord {
            tenant_id: created.tenant_id.clone(),
            action: AuditAction::UserRegistered,
            resource_type: "user".into(),
            resource_id: created.id.to_string(),
            operator_id: Some(created.id.to_string()),
            operator_name: Some(created.name.clone()),
            details: serde_json::json!({ "email": created.email, "role": created.role }),
        })
        .await;

    Ok(Json(AuthResponse {
        token,
        user: created,
        permissions,
        employee: None,
    }))
}

/// Current user, permission list and linked employee
pub async fn me(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<MeResponse>> {
    let found = user::find_by_id(&state.pool, &current.tenant_id, current.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    let employee = linked_employee(&state, &found).await?;

    Ok(Json(MeResponse {
        permissions: permissions_for(found.role),
        user: found,
        employee,
    }))
}

/// Reissue an access token for the caller
///
/// Role, permissions and account state are reloaded, so a demoted or
/// deactivated user cannot keep extending an old token.
pub async fn refresh_token(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<AuthResponse>> {
    let found = user::find_by_id(&state.pool, &current.tenant_id, current.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    if !found.is_active {
        security_log!("WARN", "refresh_refused", user_id = found.id, reason = "account_disabled");
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let permissions = permissions_for(found.role);
    let token = state
        .get_jwt_service()
        .generate_token(&found, &permissions)
        .map_err(token_error)?;
    let employee = linked_employee(&state, &found).await?;
    tracing::debug!(user_id = found.id, "Access token refreshed");

    Ok(Json(AuthResponse {
        token,
        user: found,
        permissions,
        employee,
    }))
}

pub async fn change_password(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<Json<bool>> {
    validate_dto(&req)?;

    let found = user::find_by_id(&state.pool, &current.tenant_id, current.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    if !verify_password(&req.current_password, &found.password_hash) {
        security_log!("WARN", "password_change_failed", user_id = current.id);
        return Err(AppError::new(ErrorCode::CurrentPasswordIncorrect));
    }

    let hash = hash_password(&req.new_password)?;
    user::update_password(&state.pool, &current.tenant_id, current.id, &hash).await?;

    state
        .audit
        .record(audit(
            &current,
            AuditAction::PasswordChanged,
            "user",
            current.id,
            serde_json::Value::Null,
        ))
        .await;

    Ok(Json(true))
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub message: &'static str,
    /// Only returned outside production; there is no mail delivery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

/// Issue a reset token; the response is the same whether or not the email exists
pub async fn forgot_password(
    State(state): State<ServerState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AppResult<Json<ForgotPasswordResponse>> {
    validate_dto(&req)?;

    let mut reset_token = None;
    if let Some(found) = user::find_by_email(&state.pool, &req.email).await?
        && found.is_active
    {
        let token = state
            .get_jwt_service()
            .generate_reset_token(&found, state.config.reset_token_minutes)
            .map_err(token_error)?;

        state
            .audit
            .record(AuditRecord {
                tenant_id: found.tenant_id.clone(),
                action: AuditAction::PasswordResetRequested,
                resource_type: "user".into(),
                resource_id: found.id.to_string(),
                operator_id: None,
                operator_name: None,
                details: serde_json::Value::Null,
            })
            .await;
        security_log!("INFO", "password_reset_requested", user_id = found.id);
        tracing::info!(user_id = found.id, token = %token, "Password reset token issued");

        if !state.config.is_production() {
            reset_token = Some(token);
        }
    }

    Ok(Json(ForgotPasswordResponse {
        message: "If the email exists, a reset link has been sent",
        reset_token,
    }))
}

pub async fn reset_password(
    State(state): State<ServerState>,
    Json(req): Json<ResetPasswordRequest>,
) -> AppResult<Json<bool>> {
    validate_dto(&req)?;

    let claims = state
        .get_jwt_service()
        .validate_token(&req.token)
        .map_err(|e| match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid reset token"),
        })?;
    if claims.token_type != TOKEN_TYPE_RESET {
        security_log!("WARN", "reset_wrong_token_type", token_type = claims.token_type);
        return Err(AppError::invalid_token("Invalid reset token"));
    }
    let user_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| AppError::invalid_token("Invalid reset token"))?;

    let found = user::find_by_id(&state.pool, &claims.tenant_id, user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    if !found.is_active {
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let hash = hash_password(&req.new_password)?;
    user::update_password(&state.pool, &found.tenant_id, found.id, &hash).await?;

    state
        .audit
        .record(AuditRecord {
            tenant_id: found.tenant_id.clone(),
            action: AuditAction::PasswordReset,
            resource_type: "user".into(),
            resource_id: found.id.to_string(),
            operator_id: Some(found.id.to_string()),
            operator_name: Some(found.name.clone()),
            details: serde_json::Value::Null,
        })
        .await;

    Ok(Json(true))
}

/// Tokens are stateless; logout only leaves an audit trail
pub async fn logout(State(state): State<ServerState>, current: CurrentUser) -> Json<bool> {
    state
        .audit
        .record(audit(
            &current,
            AuditAction::Logout,
            "user",
            current.id,
            serde_json::Value::Null,
        ))
        .await;
    Json(true)
}
