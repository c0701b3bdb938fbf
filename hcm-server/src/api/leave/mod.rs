//! Leave API module
//!
//! | Path | Method | Permission |
//! |------|--------|------------|
//! | /api/leave | POST | leave:apply (or leave:manage_balance on behalf) |
//! | /api/leave | GET | leave:view_* |
//! | /api/leave/balance | GET | leave:view_* |
//! | /api/leave/balance/{employee_id} | PUT | leave:manage_balance |
//! | /api/leave/{id} | GET | leave:view_* |
//! | /api/leave/{id}/approve | POST | leave:approve |
//! | /api/leave/{id}/reject | POST | leave:approve |
//! | /api/leave/{id}/cancel | POST | owner, or leave:manage_balance |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::permissions::{
    LEAVE_APPLY, LEAVE_APPROVE, LEAVE_MANAGE_BALANCE, LEAVE_VIEW_ALL, LEAVE_VIEW_SELF,
    LEAVE_VIEW_TEAM,
};
use crate::auth::{require_any_permission, require_permission};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/leave", routes())
}

fn routes() -> Router<ServerState> {
    let apply_routes = Router::new()
        .route("/", post(handler::apply))
        .route_layer(middleware::from_fn(require_any_permission(&[
            LEAVE_APPLY,
            LEAVE_MANAGE_BALANCE,
        ])));

    let view_routes = Router::new()
        .route("/", get(handler::list))
        .route("/balance", get(handler::get_balance))
        .route("/{id}", get(handler::get_by_id))
        .route_layer(middleware::from_fn(require_any_permission(&[
            LEAVE_VIEW_ALL,
            LEAVE_VIEW_TEAM,
            LEAVE_VIEW_SELF,
        ])));

    let review_routes = Router::new()
        .route("/{id}/approve", post(handler::approve))
        .route("/{id}/reject", post(handler::reject))
        .route_layer(middleware::from_fn(require_permission(LEAVE_APPROVE)));

    let balance_routes = Router::new()
        .route("/balance/{employee_id}", put(handler::set_balance))
        .route_layer(middleware::from_fn(require_permission(LEAVE_MANAGE_BALANCE)));

    // Ownership is checked in the handler
    let owner_routes = Router::new().route("/{id}/cancel", post(handler::cancel));

    apply_routes
        .merge(view_routes)
        .merge(review_routes)
        .merge(balance_routes)
        .merge(owner_routes)
}
