//! CurrentUser extractor
//!
//! Handlers can take `CurrentUser` directly; it is read from the request
//! extensions populated by `require_auth`.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<CurrentUser>() {
            Some(user) => Ok(user.clone()),
            None => {
                security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
                Err(AppError::not_authenticated())
            }
        }
    }
}
