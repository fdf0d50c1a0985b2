//! Status command implementation.
//!
//! Runs the requested transition through the lifecycle rules. On rejection
//! the error names the rule; in text mode the statuses that are currently
//! reachable are listed as a hint.

use super::CommandContext;
use crate::cli::StatusArgs;
use crate::error::Result;
use crate::format::{TextFormatOptions, format_status_label, format_ticket_line_with};
use crate::lifecycle::{self, TransitionRequest};
use crate::model::Status;
use crate::storage::SqliteStorage;

/// Execute the status command.
///
/// # Errors
///
/// Returns `InvalidStatus`, `TicketNotFound`, a lifecycle validation error,
/// or a database error.
pub fn execute(args: &StatusArgs, ctx: &CommandContext) -> Result<()> {
    let request = TransitionRequest {
        status: args.status.parse()?,
        reason: args.reason.clone(),
    };
    let (mut storage, _layer) = ctx.open_storage()?;

    let ticket = match storage.set_status(args.id, &request) {
        Ok(ticket) => ticket,
        Err(err) => {
            if !ctx.json {
                print_reachable(&storage, args.id);
            }
            return Err(err);
        }
    };

    if ctx.json {
        super::print_json(&ticket)?;
    } else {
        let options = TextFormatOptions {
            use_color: ctx.use_color,
            max_width: None,
        };
        ctx.say(format!(
            "Now {}: {}",
            format_status_label(ticket.status, ctx.use_color),
            format_ticket_line_with(&ticket, options)
        ));
    }
    Ok(())
}

fn print_reachable(storage: &SqliteStorage, id: i64) {
    let Ok(Some(ticket)) = storage.get_ticket(id) else {
        return;
    };
    let allowed = join(&lifecycle::allowed_targets(&ticket));
    let with_reason = lifecycle::targets_requiring_reason(&ticket);
    if with_reason.is_empty() {
        eprintln!("Reachable from {}: {allowed}", ticket.status);
    } else {
        eprintln!(
            "Reachable from {}: {allowed}; with --reason: {}",
            ticket.status,
            join(&with_reason)
        );
    }
}

fn join(statuses: &[Status]) -> String {
    if statuses.is_empty() {
        return "(none)".to_string();
    }
    statuses
        .iter()
        .map(Status::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
