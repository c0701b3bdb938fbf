//! Authentication routes
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /api/auth/login | POST | public, rate limited |
//! | /api/auth/register | POST | public |
//! | /api/auth/forgot-password | POST | public, rate limited |
//! | /api/auth/reset-password | POST | public, rate limited |
//! | /api/auth/me | GET | token |
//! | /api/auth/refresh-token | POST | token |
//! | /api/auth/change-password | POST | token |
//! | /api/auth/logout | POST | token |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::rate_limit::{login_rate_limit, reset_rate_limit};
use crate::core::ServerState;

pub fn router(state: &ServerState) -> Router<ServerState> {
    Router::new().nest("/api/auth", routes(state))
}

fn routes(state: &ServerState) -> Router<ServerState> {
    let login = Router::new()
        .route("/login", post(handler::login))
        .route_layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    let reset = Router::new()
        .route("/forgot-password", post(handler::forgot_password))
        .route("/reset-password", post(handler::reset_password))
        .route_layer(middleware::from_fn_with_state(state.clone(), reset_rate_limit));

    Router::new()
        .route("/register", post(handler::register))
        .route("/me", get(handler::me))
        .route("/refresh-token", post(handler::refresh_token))
        .route("/change-password", post(handler::change_password))
        .route("/logout", post(handler::logout))
        .merge(login)
        .merge(reset)
}
