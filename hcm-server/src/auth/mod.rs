//! Authentication and authorization
//!
//! - [`JwtService`] - token issue and validation
//! - [`CurrentUser`] - authenticated caller
//! - [`require_auth`] - authentication middleware
//! - [`require_permission`] / [`require_any_permission`] - permission layers
//! - [`password`] - argon2 hashing
//! - [`rate_limit`] - per IP login limiter

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod permissions;
pub mod rate_limit;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_any_permission, require_auth, require_permission};
