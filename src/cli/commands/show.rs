use super::CommandContext;
use crate::error::Result;
use crate::format::{TicketDetails, format_ticket_details};
use crate::storage::SqliteStorage;

/// Execute the show command.
///
/// # Errors
///
/// Returns `TicketNotFound` or a database error.
pub fn execute(id: i64, ctx: &CommandContext) -> Result<()> {
    let (storage, _layer) = ctx.open_storage()?;
    let details = load_details(&storage, id)?;

    if ctx.json {
        super::print_json(&details)?;
    } else {
        print!("{}", format_ticket_details(&details, ctx.use_color));
    }
    Ok(())
}

/// Ticket plus its legal next statuses and history.
///
/// # Errors
///
/// Returns `TicketNotFound` or a database error.
pub fn load_details(storage: &SqliteStorage, id: i64) -> Result<TicketDetails> {
    let ticket = storage.require_ticket(id)?;
    let events = storage.get_events(id)?;
    Ok(TicketDetails::new(ticket, events))
}
