//! Utilities - error re-exports, logging, validation, time
//!
//! - [`AppError`] / [`ApiResponse`] - unified error types (from shared::error)
//! - [`logger`] - tracing subscriber setup
//! - [`validation`] - text limits and DTO validation
//! - [`time`] - business timezone conversion

pub mod logger;
pub mod time;
pub mod validation;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
