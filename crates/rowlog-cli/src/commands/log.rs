use rowlog_core::Operation;
use rowlog_db::repos::audit_log::LogFilter;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::LogArgs;
use crate::commands::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct CountResponse<'a> {
    table: &'a str,
    count: u64,
}

/// Handle `rowlog log`.
pub async fn run(args: &LogArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let filter = build_filter(args, Some(ctx.limit(flags)))?;
    let records = ctx.service.query_logs(&ctx.table, &filter).await?;
    output(&records, flags.format)
}

/// Handle `rowlog count`.
pub async fn count(args: &LogArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let filter = build_filter(args, None)?;
    let count = ctx.service.count_logs(&ctx.table, &filter).await?;
    output(
        &CountResponse {
            table: ctx.table.as_str(),
            count,
        },
        flags.format,
    )
}

pub fn build_filter(args: &LogArgs, limit: Option<u32>) -> anyhow::Result<LogFilter> {
    Ok(LogFilter {
        entity_type: args.entity_type.clone(),
        entity_type_id: args.entity_id.clone(),
        operation: args
            .operation
            .as_deref()
            .map(|value| parse_enum::<Operation>(value, "operation"))
            .transpose()?,
        created_by: args.actor.clone(),
        limit,
    })
}
