//! Notifications API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::error::ErrorCode;
use shared::models::{
    MarkedRead, Notification, PaginatedResponse, SendNotification, UnreadCount, page_window,
};

use crate::api::access;
use crate::audit::AuditAction;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::notification::{self, NewNotification};
use crate::db::repository::user;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_URL_LEN, validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub read: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// GET /api/notifications - the caller's inbox, newest first
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Notification>>> {
    let (page, limit, offset) = page_window(query.page, query.limit, 20);
    let (items, total) = notification::list(
        &state.pool,
        &current.tenant_id,
        current.id,
        query.read,
        limit as i64,
        offset,
    )
    .await?;
    Ok(Json(PaginatedResponse::new(items, total, page, limit)))
}

/// GET /api/notifications/unread-count
pub async fn unread_count(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<UnreadCount>> {
    let count = notification::unread_count(&state.pool, &current.tenant_id, current.id).await?;
    Ok(Json(UnreadCount { count }))
}

/// PUT /api/notifications/{id}/read
pub async fn mark_read(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Notification>> {
    let updated = notification::mark_read(&state.pool, &current.tenant_id, current.id, id).await?;
    Ok(Json(updated))
}

/// PUT /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<MarkedRead>> {
    let updated = notification::mark_all_read(&state.pool, &current.tenant_id, current.id).await?;
    Ok(Json(MarkedRead { updated }))
}

/// DELETE /api/notifications/{id}
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    notification::delete(&state.pool, &current.tenant_id, current.id, id).await?;
    Ok(Json(serde_json::json!({ "id": id, "deleted": true })))
}

/// POST /api/notifications/send - to any user of the caller's tenant
pub async fn send(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<SendNotification>,
) -> AppResult<Json<Notification>> {
    validate_required_text(&payload.title, "title", MAX_NAME_LEN)?;
    validate_required_text(&payload.message, "message", MAX_NOTE_LEN)?;
    validate_optional_text(&payload.action_url, "action_url", MAX_URL_LEN)?;

    user::find_by_id(&state.pool, &current.tenant_id, payload.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    let data = NewNotification {
        user_id: payload.user_id,
        kind: payload.kind,
        title: payload.title,
        message: payload.message,
        action_url: payload.action_url,
        metadata: payload.metadata,
    };
    let sent = notification::create(&state.pool, &current.tenant_id, &data).await?;

    state
        .audit
        .record(access::audit(
            &current,
            AuditAction::NotificationSent,
            "notification",
            sent.id,
            serde_json::json!({ "user_id": sent.user_id, "kind": sent.kind }),
        ))
        .await;

    Ok(Json(sent))
}
