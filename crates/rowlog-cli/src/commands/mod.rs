//! Command handlers. Each one reads through `AppContext::service` and prints
//! with `output::output`.

pub mod deleted;
pub mod history;
pub mod init;
pub mod log;
pub mod navigate;
pub mod parse;
pub mod schema;
pub mod show;

use crate::cli::{Commands, GlobalFlags};
use crate::context::AppContext;

/// Route a parsed command to its handler.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Init => init::handle(ctx, flags).await,
        Commands::Log(args) => log::run(&args, ctx, flags).await,
        Commands::Count(args) => log::count(&args, ctx, flags).await,
        Commands::History(args) => history::handle(&args, ctx, flags).await,
        Commands::Show(args) => show::handle(&args, ctx, flags).await,
        Commands::Prior(args) => navigate::prior(&args, ctx, flags).await,
        Commands::Later(args) => navigate::later(&args, ctx, flags).await,
        Commands::Deleted(args) => deleted::handle(&args, ctx, flags).await,
        Commands::Schema => schema::handle(flags),
    }
}
