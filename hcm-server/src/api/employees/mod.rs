//! Employee API module
//!
//! | Path | Method | Permission |
//! |------|--------|------------|
//! | /api/employees | GET | employee:read_all or employee:read_team |
//! | /api/employees/stats | GET | employee:read_all |
//! | /api/employees/{id} | GET | scoped to caller |
//! | /api/employees | POST | employee:create |
//! | /api/employees/{id} | PUT | own personal_info, or employee:update_all |
//! | /api/employees/{id} | DELETE | employee:delete |
//! | /api/employees/{id}/documents | GET | scoped to caller |
//! | /api/employees/{id}/documents | POST | employee:update_all |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::permissions::{
    EMPLOYEE_CREATE, EMPLOYEE_DELETE, EMPLOYEE_READ_ALL, EMPLOYEE_READ_TEAM, EMPLOYEE_UPDATE_ALL,
};
use crate::auth::{require_any_permission, require_permission};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/employees", routes())
}

fn routes() -> Router<ServerState> {
    // Per-record access is checked in the handlers
    let scoped = Router::new()
        .route("/{id}", get(handler::get_by_id).put(handler::update))
        .route("/{id}/documents", get(handler::list_documents));

    let list = Router::new()
        .route("/", get(handler::list))
        .route_layer(middleware::from_fn(require_any_permission(&[
            EMPLOYEE_READ_ALL,
            EMPLOYEE_READ_TEAM,
        ])));

    let stats = Router::new()
        .route("/stats", get(handler::stats))
        .route_layer(middleware::from_fn(require_permission(EMPLOYEE_READ_ALL)));

    let create = Router::new()
        .route("/", post(handler::create))
        .route_layer(middleware::from_fn(require_permission(EMPLOYEE_CREATE)));

    let delete = Router::new()
        .route("/{id}", axum::routing::delete(handler::delete))
        .route_layer(middleware::from_fn(require_permission(EMPLOYEE_DELETE)));

    let documents = Router::new()
        .route("/{id}/documents", post(handler::add_document))
        .route_layer(middleware::from_fn(require_permission(EMPLOYEE_UPDATE_ALL)));

    Router::new()
        .merge(scoped)
        .merge(list)
        .merge(stats)
        .merge(create)
        .merge(delete)
        .merge(documents)
}

