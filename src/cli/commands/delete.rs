use super::CommandContext;
use crate::error::Result;
use crate::format::DeleteResponse;

/// Execute the delete command.
///
/// # Errors
///
/// Returns `TicketNotFound`, `Conflict` for a ticket in progress, or a
/// database error.
pub fn execute(id: i64, ctx: &CommandContext) -> Result<()> {
    let (mut storage, _layer) = ctx.open_storage()?;
    let deleted = storage.delete_ticket(id)?;

    if ctx.json {
        super::print_json(&DeleteResponse::new(id))?;
    } else {
        ctx.say(format!("Deleted #{}: {}", deleted.id, deleted.title));
    }
    Ok(())
}
