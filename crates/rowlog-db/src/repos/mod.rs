//! Repository modules over the log tables.
//!
//! Each module adds methods to `AuditService` via `impl AuditService` blocks.

pub mod audit_log;
pub mod navigation;
