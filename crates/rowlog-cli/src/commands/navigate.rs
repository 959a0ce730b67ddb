use rowlog_core::AuditLogRecord;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::RecordArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `rowlog prior`.
pub async fn prior(args: &RecordArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let record = ctx.service.get_log(&ctx.table, args.log_id).await?;
    let records = ctx.service.prior_records(&ctx.table, &record).await?;
    output(&limited(records, ctx, flags), flags.format)
}

/// Handle `rowlog later`.
pub async fn later(args: &RecordArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let record = ctx.service.get_log(&ctx.table, args.log_id).await?;
    let records = ctx.service.later_records(&ctx.table, &record).await?;
    output(&limited(records, ctx, flags), flags.format)
}

fn limited(mut records: Vec<AuditLogRecord>, ctx: &AppContext, flags: &GlobalFlags) -> Vec<AuditLogRecord> {
    records.truncate(usize::try_from(ctx.limit(flags)).unwrap_or(usize::MAX));
    records
}
