//! Payroll API module
//!
//! | Path | Method | Permission |
//! |------|--------|------------|
//! | /api/payroll | POST | payroll:process |
//! | /api/payroll/bulk | POST | payroll:process |
//! | /api/payroll/{id}/process | POST | payroll:process |
//! | /api/payroll/{id}/paid | POST | payroll:process |
//! | /api/payroll/{id}/cancel | POST | payroll:process |
//! | /api/payroll | GET | payroll:view_* |
//! | /api/payroll/stats | GET | payroll:view_all |
//! | /api/payroll/{id} | GET | payroll:view_* |
//! | /api/payroll/{id}/payslip | GET | payroll:view_* |
//! | /api/payroll/countries | GET | token |
//! | /api/payroll/tax-rules/{country} | GET | token |
//! | /api/payroll/tax-rules/{country} | PUT | payroll:process |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::permissions::{
    PAYROLL_PROCESS, PAYROLL_VIEW_ALL, PAYROLL_VIEW_SELF, PAYROLL_VIEW_TEAM,
};
use crate::auth::{require_any_permission, require_permission};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payroll", routes())
}

fn routes() -> Router<ServerState> {
    let process_routes = Router::new()
        .route("/", post(handler::create))
        .route("/bulk", post(handler::bulk_create))
        .route("/{id}/process", post(handler::process))
        .route("/{id}/paid", post(handler::mark_paid))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/tax-rules/{country}", put(handler::update_tax_rule))
        .route_layer(middleware::from_fn(require_permission(PAYROLL_PROCESS)));

    let stats_routes = Router::new()
        .route("/stats", get(handler::stats))
        .route_layer(middleware::from_fn(require_permission(PAYROLL_VIEW_ALL)));

    let view_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/payslip", get(handler::payslip))
        .route_layer(middleware::from_fn(require_any_permission(&[
            PAYROLL_VIEW_ALL,
            PAYROLL_VIEW_TEAM,
            PAYROLL_VIEW_SELF,
        ])));

    let reference_routes = Router::new()
        .route("/countries", get(handler::countries))
        .route("/tax-rules/{country}", get(handler::get_tax_rule));

    process_routes
        .merge(stats_routes)
        .merge(view_routes)
        .merge(reference_routes)
}
