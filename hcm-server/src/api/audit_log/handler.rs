//! Audit Log API Handlers

use axum::{
    Json,
    extract::{Query, State},
};

use crate::audit::{AuditChainVerification, AuditListResponse, AuditQuery};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /api/audit - newest first, caller's tenant only
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<AuditListResponse>> {
    let (items, total) = state.audit.query(&current.tenant_id, &query).await?;
    Ok(Json(AuditListResponse { items, total }))
}

/// GET /api/audit/verify
pub async fn verify_chain(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<AuditChainVerification>> {
    let verification = state.audit.verify_chain(&current.tenant_id).await?;
    if !verification.chain_intact {
        tracing::error!(
            tenant_id = %current.tenant_id,
            breaks = verification.breaks.len(),
            "Audit chain verification failed"
        );
    }
    Ok(Json(verification))
}
