use anyhow::Context;
use rowlog_config::RowlogConfig;
use rowlog_core::LogTable;
use rowlog_db::service::AuditService;

use crate::cli::GlobalFlags;

/// Loaded configuration and an open service, shared by every command.
pub struct AppContext {
    pub config: RowlogConfig,
    pub service: AuditService,
    pub table: LogTable,
}

impl AppContext {
    /// Load configuration, apply command-line overrides and open the database.
    pub async fn init(flags: &GlobalFlags) -> anyhow::Result<Self> {
        let config = load_config(flags)?;
        let service = AuditService::from_config(&config)
            .await
            .with_context(|| format!("cannot open database '{}'", config.database.path))?;
        let table = service.default_table().clone();
        tracing::debug!(path = %config.database.path, table = %table, "audit database ready");

        Ok(Self {
            config,
            service,
            table,
        })
    }

    /// Effective result limit: the flag if given, else the configured default.
    pub fn limit(&self, flags: &GlobalFlags) -> u32 {
        flags.limit.unwrap_or(self.config.audit.history_limit)
    }
}

/// Layered config with `--database` and `--table` applied on top.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<RowlogConfig> {
    let mut config = RowlogConfig::load_with_dotenv().context("failed to load configuration")?;
    if let Some(path) = &flags.database {
        config.database.path.clone_from(path);
    }
    if let Some(table) = &flags.table {
        config.audit.log_table.clone_from(table);
    }
    config.audit.validate()?;
    Ok(config)
}
