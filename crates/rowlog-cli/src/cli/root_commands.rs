use clap::{Args, Subcommand};

/// Top-level commands of the `rowlog` binary.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Create the log table if it does not exist and verify its shape.
    Init,
    /// Query log records with optional filters.
    Log(LogArgs),
    /// Count log records matching the same filters as `log`.
    Count(LogArgs),
    /// History of one entity, newest first.
    History(HistoryArgs),
    /// Show one log record, optionally diffed against another.
    Show(ShowArgs),
    /// Records of the same entity before the given one.
    Prior(RecordArgs),
    /// Records of the same entity after the given one.
    Later(RecordArgs),
    /// Entities of a type that have been deleted, from the log alone.
    Deleted(DeletedArgs),
    /// Dump the JSON schema of a log record.
    Schema,
}

/// Filters for `rowlog log` and `rowlog count`.
#[derive(Clone, Debug, Default, Args)]
pub struct LogArgs {
    #[arg(long)]
    pub entity_type: Option<String>,
    #[arg(long)]
    pub entity_id: Option<String>,
    /// INSERT, UPDATE or DELETE
    #[arg(long)]
    pub operation: Option<String>,
    /// Actor identifier recorded as `created_by`
    #[arg(long)]
    pub actor: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct HistoryArgs {
    pub entity_type: String,
    pub entity_id: String,
}

#[derive(Clone, Debug, Args)]
pub struct ShowArgs {
    pub log_id: i64,
    /// Log record to compare against
    #[arg(long)]
    pub against: Option<i64>,
    /// Compare against the record immediately before this one
    #[arg(long, conflicts_with = "against")]
    pub previous: bool,
}

#[derive(Clone, Debug, Args)]
pub struct RecordArgs {
    pub log_id: i64,
}

#[derive(Clone, Debug, Args)]
pub struct DeletedArgs {
    pub entity_type: String,
}
