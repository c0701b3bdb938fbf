//! HCM Server - multi-tenant human capital management backend
//!
//! # Module layout
//!
//! ```text
//! hcm-server/src/
//! ├── core/          # config, state, server, errors
//! ├── auth/          # JWT, passwords, permissions, middleware
//! ├── db/            # SQLite pool + repositories
//! ├── audit/         # hash-chained audit log
//! ├── attendance/    # check-in/out session rules
//! ├── leave/         # leave days, balances, transitions
//! ├── payroll/       # salary computation, payroll lifecycle
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # logging, validation, time helpers
//! ```

pub mod api;
pub mod attendance;
pub mod audit;
pub mod auth;
pub mod core;
pub mod db;
pub mod leave;
pub mod payroll;
pub mod utils;

// Re-export public types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - supports tracing format specifiers
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Load `.env` and initialise logging from the environment
pub fn setup_environment() {
    let _ = dotenv::dotenv();

    let level = std::env::var("LOG_LEVEL").ok();
    let json = std::env::var("LOG_JSON").ok().and_then(|v| v.parse().ok());
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(level.as_deref(), json, log_dir.as_deref());
}
