//! # rowlog-core
//!
//! Core types for the rowlog audit trail.
//!
//! This crate has no I/O. It provides the pieces shared by the persistence
//! and inspection crates:
//! - Snapshot encoding of column values into JSON-safe form
//! - The `Audited` capability an entity type implements to be logged
//! - The log record shape, its correlation key and derived reads
//! - Two-snapshot diffing over the union of keys
//! - Actor context passed explicitly into the write path
//! - Cross-cutting error types

pub mod diff;
pub mod entity;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod log_table;
pub mod record;
pub mod value;

pub use diff::{DiffRow, SnapshotDiff};
pub use entity::{Audited, Related, Snapshot};
pub use enums::Operation;
pub use identity::{Actor, AuditContext};
pub use log_table::LogTable;
pub use record::{AuditLogRecord, NewLogEntry};
pub use value::{Decimal, FieldValue};
