use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct InitResponse<'a> {
    database: &'a str,
    log_table: &'a str,
    ready: bool,
}

/// Handle `rowlog init`.
pub async fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let db = ctx.service.db();
    db.create_log_table(&ctx.table).await?;
    db.verify_log_table(&ctx.table).await?;
    tracing::info!(table = %ctx.table, "log table ready");

    output(
        &InitResponse {
            database: &ctx.config.database.path,
            log_table: ctx.table.as_str(),
            ready: true,
        },
        flags.format,
    )
}
