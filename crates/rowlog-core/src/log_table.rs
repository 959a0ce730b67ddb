//! Log table names.
//!
//! One log table may serve many entity types. The name is interpolated into
//! SQL, so it is validated as a plain identifier when constructed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Name of the default log table created by the migrations.
pub const DEFAULT_LOG_TABLE: &str = "audit_log";

/// A validated log table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogTable(String);

impl LogTable {
    /// # Errors
    ///
    /// Returns `CoreError::InvalidIdentifier` unless the name matches
    /// `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn new(name: impl Into<String>) -> Result<Self, CoreError> {
        let name = name.into();
        if is_identifier(&name) {
            Ok(Self(name))
        } else {
            Err(CoreError::InvalidIdentifier(name))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LogTable {
    fn default() -> Self {
        Self(DEFAULT_LOG_TABLE.to_string())
    }
}

impl fmt::Display for LogTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LogTable {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LogTable> for String {
    fn from(value: LogTable) -> Self {
        value.0
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
