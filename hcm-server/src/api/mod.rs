//! API routes
//!
//! # Structure
//!
//! - [`health`] - liveness and database ping (public)
//! - [`auth`] - login, registration, password management
//! - [`employees`] - employee records and documents
//! - [`attendance`] - check-in/out sessions and regularization
//! - [`leave`] - leave requests and balances
//! - [`payroll`] - payroll generation and lifecycle
//! - [`notifications`] - per-user inbox and sending
//! - [`dashboard`] - role specific summaries
//! - [`audit_log`] - audit trail query and chain verification

pub mod access;

pub mod attendance;
pub mod audit_log;
pub mod auth;
pub mod dashboard;
pub mod employees;
pub mod health;
pub mod leave;
pub mod notifications;
pub mod payroll;

use axum::Router;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::require_auth;
use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};

/// Request ID generator (uuid v4)
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no global middleware)
pub fn build_router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router(state))
        .merge(employees::router())
        .merge(attendance::router())
        .merge(leave::router())
        .merge(payroll::router())
        .merge(notifications::router())
        .merge(dashboard::router())
        .merge(audit_log::router())
}

fn cors_layer(origins: Option<&[String]>) -> CorsLayer {
    match origins {
        Some(list) => {
            let values: Vec<HeaderValue> =
                list.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(values))
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    }
}

/// Build the application with every middleware layer
///
/// Used by the HTTP server and by in-process tests. Layers listed last
/// wrap the ones before them, so a request passes CORS, compression,
/// request-id assignment and propagation, tracing and then auth. Auth
/// rejections therefore still carry CORS and `x-request-id` headers.
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    let request_id = HeaderName::from_static("x-request-id");

    build_router(state)
        // Injects CurrentUser; skips public routes
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, XRequestId))
        .layer(CompressionLayer::new())
        .layer(cors_layer(state.config.cors_origins.as_deref()))
}
