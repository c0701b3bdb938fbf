//! Data models
//!
//! Shared between hcm-server and its clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are snowflake `i64`, timestamps are Unix millis, dates are `YYYY-MM-DD`.

pub mod attendance;
pub mod common;
pub mod dashboard;
pub mod employee;
pub mod leave;
pub mod notification;
pub mod payroll;
pub mod user;

// Re-exports
pub use attendance::*;
pub use common::*;
pub use dashboard::*;
pub use employee::*;
pub use leave::*;
pub use notification::*;
pub use payroll::*;
pub use user::*;
