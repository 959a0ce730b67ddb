//! Cross-cutting error types for rowlog.
//!
//! Persistence errors (`DatabaseError`) and configuration errors
//! (`ConfigError`) live in their own crates and wrap these where needed.

use thiserror::Error;

/// Errors that can be raised by any rowlog crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A name that is interpolated into SQL is not a plain identifier.
    #[error("Invalid identifier '{0}': expected [A-Za-z_][A-Za-z0-9_]*")]
    InvalidIdentifier(String),

    /// Data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single column value could not be represented as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// NaN and infinities have no JSON representation.
    #[error("non-finite float cannot be encoded as JSON")]
    NonFinite,
}

/// Resolving one relationship of an entity failed.
///
/// Recovered locally: the relationship is left out of `extra_data`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("relationship '{name}' could not be resolved: {reason}")]
pub struct RelationError {
    pub name: String,
    pub reason: String,
}

impl RelationError {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Snapshot extraction failed as a whole. Aborts the enclosing write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// `column_values()` did not line up with the declared columns.
    #[error("{entity_type}: expected {expected} column values, got {actual}")]
    ColumnMismatch {
        entity_type: String,
        expected: usize,
        actual: usize,
    },

    /// A column value could not be encoded.
    #[error("{entity_type}.{column}: {source}")]
    Encode {
        entity_type: String,
        column: String,
        #[source]
        source: EncodeError,
    },
}
