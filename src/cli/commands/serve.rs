use super::CommandContext;
use crate::cli::ServeArgs;
use crate::config::{self, ServerConfig};
use crate::error::Result;
use crate::server::{self, AppState};
use tracing::info;

/// Execute the serve command. Blocks until Ctrl-C.
///
/// # Errors
///
/// Returns an error if config is invalid, the database cannot be opened, or
/// the address cannot be bound.
pub fn execute(args: &ServeArgs, ctx: &CommandContext) -> Result<()> {
    let mut ctx = ctx.clone();
    ctx.overrides.host.clone_from(&args.host);
    ctx.overrides.port = args.port;

    let (storage, layer) = ctx.open_storage()?;
    let server_config = ServerConfig::from_layer(&layer)?;
    let state = AppState::new(storage).with_defaults(
        config::default_priority_from_layer(&layer)?,
        config::page_size_from_layer(&layer)?,
    );

    ctx.say(format!(
        "Serving tix API on http://{}",
        server_config.bind_addr()
    ));
    info!(addr = %server_config.bind_addr(), "Starting server");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server::serve(state, &server_config))
}
