//! Attendance API module
//!
//! | Path | Method | Permission |
//! |------|--------|------------|
//! | /api/attendance/check-in | POST | attendance:mark |
//! | /api/attendance/check-out | POST | attendance:mark |
//! | /api/attendance/start-break | POST | attendance:mark |
//! | /api/attendance/end-break | POST | attendance:mark |
//! | /api/attendance/today | GET | attendance:mark |
//! | /api/attendance/regularization | POST | attendance:mark |
//! | /api/attendance/regularization | GET | attendance:view_* |
//! | /api/attendance/regularization/{id}/approve | POST | attendance:approve |
//! | /api/attendance/regularization/{id}/reject | POST | attendance:approve |
//! | /api/attendance | GET | attendance:view_* |
//! | /api/attendance/stats | GET | attendance:view_* |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::permissions::{
    ATTENDANCE_APPROVE, ATTENDANCE_MARK, ATTENDANCE_VIEW_ALL, ATTENDANCE_VIEW_SELF,
    ATTENDANCE_VIEW_TEAM,
};
use crate::auth::{require_any_permission, require_permission};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/attendance", routes())
}

fn routes() -> Router<ServerState> {
    let session_routes = Router::new()
        .route("/check-in", post(handler::check_in))
        .route("/check-out", post(handler::check_out))
        .route("/start-break", post(handler::start_break))
        .route("/end-break", post(handler::end_break))
        .route("/today", get(handler::today))
        .route("/regularization", post(handler::request_regularization))
        .route_layer(middleware::from_fn(require_permission(ATTENDANCE_MARK)));

    let view_routes = Router::new()
        .route("/", get(handler::list))
        .route("/stats", get(handler::stats))
        .route("/regularization", get(handler::list_regularizations))
        .route_layer(middleware::from_fn(require_any_permission(&[
            ATTENDANCE_VIEW_ALL,
            ATTENDANCE_VIEW_TEAM,
            ATTENDANCE_VIEW_SELF,
        ])));

    let review_routes = Router::new()
        .route(
            "/regularization/{id}/approve",
            post(handler::approve_regularization),
        )
        .route(
            "/regularization/{id}/reject",
            post(handler::reject_regularization),
        )
        .route_layer(middleware::from_fn(require_permission(ATTENDANCE_APPROVE)));

    session_routes.merge(view_routes).merge(review_routes)
}
