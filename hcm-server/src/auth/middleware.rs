//! Authentication middleware
//!
//! Axum middleware for JWT authentication and permission checks.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::jwt::TOKEN_TYPE_ACCESS;
use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

/// Routes reachable without a token
const PUBLIC_API_ROUTES: &[&str] = &[
    "/api/auth/login",
    "/api/auth/register",
    "/api/auth/forgot-password",
    "/api/auth/reset-password",
];

/// Authentication middleware - requires a logged in user
///
/// Extracts and validates the JWT from `Authorization: Bearer <token>` and
/// inserts a [`CurrentUser`] into the request extensions.
///
/// # Skipped
///
/// - `OPTIONS *` (CORS preflight)
/// - non `/api/` paths (`/health`, unknown routes fall through to 404)
/// - the public auth routes
///
/// # Errors
///
/// | Case | Status |
/// |------|--------|
/// | no Authorization header | 401 NotAuthenticated |
/// | expired token | 401 TokenExpired |
/// | invalid token or non-access token | 401 TokenInvalid |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    if PUBLIC_API_ROUTES.contains(&path) {
        return Ok(next.run(req).await);
    }

    let jwt_service = state.get_jwt_service();
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!("WARN", "auth_missing", uri = format!("{:?}", req.uri()));
            return Err(AppError::not_authenticated());
        }
    };

    match jwt_service.validate_token(token) {
        Ok(claims) if claims.token_type == TOKEN_TYPE_ACCESS => {
            let user = CurrentUser::try_from(claims)
                .map_err(|e| AppError::invalid_token(format!("Malformed JWT claims: {}", e)))?;
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Ok(claims) => {
            security_log!(
                "WARN",
                "auth_wrong_token_type",
                token_type = claims.token_type,
                uri = format!("{:?}", req.uri())
            );
            Err(AppError::invalid_token("Invalid token"))
        }
        Err(e) => {
            security_log!(
                "WARN",
                "auth_failed",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );

            match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

type MiddlewareFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>;

/// Permission check middleware - requires one permission
///
/// ```ignore
/// use axum::middleware;
/// Router::new()
///     .route("/api/payroll/bulk", post(handler::bulk))
///     .layer(middleware::from_fn(require_permission(permissions::PAYROLL_PROCESS)));
/// ```
///
/// Returns 403 when the caller lacks the permission.
pub fn require_permission(
    permission: &'static str,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or(AppError::not_authenticated())?;

            if !user.has_permission(permission) {
                security_log!(
                    "WARN",
                    "permission_denied",
                    user_id = user.id,
                    tenant_id = user.tenant_id.clone(),
                    role = user.role.as_str(),
                    required_permission = permission
                );
                return Err(AppError::forbidden(format!(
                    "Forbidden: missing permission {}",
                    permission
                )));
            }

            Ok(next.run(req).await)
        })
    }
}

/// Permission check middleware - requires any one of the permissions
pub fn require_any_permission(
    permissions: &'static [&'static str],
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or(AppError::not_authenticated())?;

            if !user.has_any_permission(permissions) {
                security_log!(
                    "WARN",
                    "permission_denied",
                    user_id = user.id,
                    tenant_id = user.tenant_id.clone(),
                    role = user.role.as_str(),
                    required_permission = permissions.join("|")
                );
                return Err(AppError::forbidden(
                    "Forbidden: Insufficient permissions".to_string(),
                ));
            }

            Ok(next.run(req).await)
        })
    }
}
