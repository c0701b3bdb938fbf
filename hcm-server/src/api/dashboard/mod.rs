//! Dashboard API module
//!
//! Read-only summaries, one per role.

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::permissions::{
    DASHBOARD_GLOBAL, DASHBOARD_HR, DASHBOARD_PERSONAL, DASHBOARD_TEAM,
};
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/dashboard", routes())
}

fn routes() -> Router<ServerState> {
    let admin = Router::new()
        .route("/admin", get(handler::admin))
        .route_layer(middleware::from_fn(require_permission(DASHBOARD_GLOBAL)));

    let hr = Router::new()
        .route("/hr", get(handler::hr))
        .route_layer(middleware::from_fn(require_permission(DASHBOARD_HR)));

    let manager = Router::new()
        .route("/manager", get(handler::manager))
        .route_layer(middleware::from_fn(require_permission(DASHBOARD_TEAM)));

    let personal = Router::new()
        .route("/me", get(handler::me))
        .route_layer(middleware::from_fn(require_permission(DASHBOARD_PERSONAL)));

    admin.merge(hr).merge(manager).merge(personal)
}
