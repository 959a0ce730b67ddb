//! Audit log settings.

use rowlog_core::log_table::{DEFAULT_LOG_TABLE, is_identifier};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_log_table() -> String {
    DEFAULT_LOG_TABLE.to_string()
}

/// Default number of rows returned by history queries.
const fn default_history_limit() -> u32 {
    100
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditConfig {
    /// Log table used by the inspection tools.
    #[serde(default = "default_log_table")]
    pub log_table: String,

    /// Default result limit for history and deleted-entry queries.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

impl AuditConfig {
    /// Check values that cannot be expressed in the types.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a non-identifier table name or a
    /// zero history limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_identifier(&self.log_table) {
            return Err(ConfigError::InvalidValue {
                field: "audit.log_table".into(),
                reason: format!("'{}' is not a valid table name", self.log_table),
            });
        }
        if self.history_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "audit.history_limit".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_table: default_log_table(),
            history_limit: default_history_limit(),
        }
    }
}
