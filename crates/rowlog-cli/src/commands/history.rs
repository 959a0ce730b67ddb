use crate::cli::GlobalFlags;
use crate::cli::root_commands::HistoryArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `rowlog history`.
pub async fn handle(args: &HistoryArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let records = ctx
        .service
        .history_for(
            &ctx.table,
            &args.entity_type,
            &args.entity_id,
            Some(ctx.limit(flags)),
        )
        .await?;
    if records.is_empty() {
        tracing::warn!(
            entity_type = %args.entity_type,
            entity_id = %args.entity_id,
            "no history for this entity"
        );
    }
    output(&records, flags.format)
}
