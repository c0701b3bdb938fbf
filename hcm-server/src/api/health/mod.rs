//! Health check route
//!
//! | Path | Method | Auth |
//! |------|--------|------|
//! | /health | GET | none |
//!
//! ```json
//! { "status": "healthy", "version": "0.1.0", "database": { "status": "ok", "latency_ms": 0 } }
//! ```

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

/// Public route, skipped by `require_auth` (not under `/api/`)
pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Serialize)]
pub struct HealthResponse {
    /// healthy | degraded
    status: &'static str,
    version: &'static str,
    database: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    /// ok | error
    status: &'static str,
    latency_ms: Option<u64>,
    message: Option<String>,
}

pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let started = std::time::Instant::now();
    let database = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.pool)
        .await
    {
        Ok(_) => CheckResult {
            status: "ok",
            latency_ms: Some(started.elapsed().as_millis() as u64),
            message: None,
        },
        Err(e) => {
            tracing::error!(error = %e, "Health check database ping failed");
            CheckResult {
                status: "error",
                latency_ms: None,
                message: Some(format!("Database error: {e}")),
            }
        }
    };

    Json(HealthResponse {
        status: if database.status == "ok" { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}
