//! Audit log - tamper-evident trail of sensitive operations
//!
//! ```text
//! handler (after commit)
//!   └─ AuditStorage::record() → audit_log (SQLite, append-only)
//!
//! SHA-256 chain per tenant: genesis → entry₁ → entry₂ → ... → entryₙ
//! ```

pub mod storage;
pub mod types;

pub use storage::{AuditRecord, AuditStorage, AuditStorageError, GENESIS_HASH};
pub use types::{
    AuditAction, AuditChainBreak, AuditChainVerification, AuditEntry, AuditListResponse,
    AuditQuery,
};
