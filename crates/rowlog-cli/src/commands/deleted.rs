use crate::cli::GlobalFlags;
use crate::cli::root_commands::DeletedArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `rowlog deleted`.
pub async fn handle(args: &DeletedArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let limit = usize::try_from(ctx.limit(flags)).unwrap_or(usize::MAX);
    let mut records = ctx
        .service
        .deleted_entries(&ctx.table, &args.entity_type)
        .await?;
    records.truncate(limit);
    output(&records, flags.format)
}
