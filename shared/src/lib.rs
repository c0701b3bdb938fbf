//! Shared types for the HCM workspace
//!
//! Error codes, API response envelope, and the domain models exchanged
//! between the server and its clients.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use http;
pub use serde::{Deserialize, Serialize};
