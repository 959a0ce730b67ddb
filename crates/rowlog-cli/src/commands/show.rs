use anyhow::Context;
use rowlog_core::{AuditLogRecord, DiffRow};
use serde::Serialize;

use crate::cli::root_commands::ShowArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::context::AppContext;
use crate::output::output;

#[derive(Serialize)]
struct ShowResponse<'a> {
    record: &'a AuditLogRecord,
    compared_with: Option<i64>,
    data: Vec<DiffRow<'a>>,
    extra_data: Vec<DiffRow<'a>>,
}

/// Handle `rowlog show`.
pub async fn handle(args: &ShowArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let against = if args.previous {
        let record = ctx.service.get_log(&ctx.table, args.log_id).await?;
        ctx.service
            .prior_records(&ctx.table, &record)
            .await?
            .first()
            .map(|prior| prior.id)
    } else {
        args.against
    };

    let diff = ctx
        .service
        .diff(&ctx.table, args.log_id, against)
        .await
        .with_context(|| format!("cannot show log record {}", args.log_id))?;

    if flags.format == OutputFormat::Table {
        return output(&diff.rows(), flags.format);
    }

    output(
        &ShowResponse {
            record: &diff.primary,
            compared_with: diff.comparison.as_ref().map(|c| c.id),
            data: diff.rows(),
            extra_data: diff.extra_rows(),
        },
        flags.format,
    )
}
