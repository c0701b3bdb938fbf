//! Notifications API module
//!
//! | Path | Method | Permission |
//! |------|--------|------------|
//! | /api/notifications | GET | token (own rows) |
//! | /api/notifications/unread-count | GET | token |
//! | /api/notifications/read-all | PUT | token |
//! | /api/notifications/{id}/read | PUT | token |
//! | /api/notifications/{id} | DELETE | token |
//! | /api/notifications/send | POST | notification:send |

mod handler;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use serde_json::Value;
use shared::models::NotificationKind;

use crate::auth::permissions::NOTIFICATION_SEND;
use crate::auth::require_permission;
use crate::core::ServerState;
use crate::db::repository::{employee, notification};

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/notifications", routes())
}

fn routes() -> Router<ServerState> {
    let send_routes = Router::new()
        .route("/send", post(handler::send))
        .route_layer(middleware::from_fn(require_permission(NOTIFICATION_SEND)));

    let inbox_routes = Router::new()
        .route("/", get(handler::list))
        .route("/unread-count", get(handler::unread_count))
        .route("/read-all", put(handler::mark_all_read))
        .route("/{id}/read", put(handler::mark_read))
        .route("/{id}", delete(handler::delete));

    send_routes.merge(inbox_routes)
}

/// Notify the user linked to an employee profile
///
/// Best effort: the triggering write has already committed, so failures
/// are logged and swallowed. Employees without an account are skipped.
pub async fn notify_employee(
    state: &ServerState,
    tenant_id: &str,
    employee_id: i64,
    kind: NotificationKind,
    title: &str,
    message: String,
    metadata: Value,
) {
    let user_id = match employee::find_by_id(&state.pool, tenant_id, employee_id).await {
        Ok(Some(found)) => match found.user_id {
            Some(id) => id,
            None => return,
        },
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(employee_id, error = %e, "Notification recipient lookup failed");
            return;
        }
    };

    let data = notification::NewNotification {
        user_id,
        kind,
        title: title.to_string(),
        message,
        action_url: None,
        metadata,
    };
    if let Err(e) = notification::create(&state.pool, tenant_id, &data).await {
        tracing::warn!(employee_id, kind = kind.as_str(), error = %e, "Failed to store notification");
    }
}
