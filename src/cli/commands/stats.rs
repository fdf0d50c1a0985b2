use super::CommandContext;
use crate::error::Result;
use crate::format::format_stats;

/// Execute the stats command.
///
/// # Errors
///
/// Returns an error if the database cannot be read.
pub fn execute(ctx: &CommandContext) -> Result<()> {
    let (storage, _layer) = ctx.open_storage()?;
    let stats = storage.stats()?;

    if ctx.json {
        super::print_json(&stats)?;
    } else {
        print!("{}", format_stats(&stats, ctx.use_color));
    }
    Ok(())
}
