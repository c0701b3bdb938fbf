//! Audit Log API module (query, chain verification)

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::permissions::SYSTEM_AUDIT;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/audit", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/verify", get(handler::verify_chain))
        .route_layer(middleware::from_fn(require_permission(SYSTEM_AUDIT)))
}
