use rowlog_core::AuditLogRecord;

use crate::cli::GlobalFlags;
use crate::output::output;

/// Handle `rowlog schema`. Needs no database.
pub fn handle(flags: &GlobalFlags) -> anyhow::Result<()> {
    let schema = schemars::schema_for!(AuditLogRecord);
    output(&schema, flags.format)
}
