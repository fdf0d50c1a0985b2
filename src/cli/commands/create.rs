use super::CommandContext;
use crate::cli::CreateArgs;
use crate::config;
use crate::error::Result;
use crate::format::{TextFormatOptions, format_ticket_line_with};
use crate::model::{NewTicket, Priority, Ticket};
use crate::storage::SqliteStorage;

/// Execute the create command.
///
/// # Errors
///
/// Returns an error if the priority is unknown, validation fails, the title
/// is taken, or the database cannot be written.
pub fn execute(args: CreateArgs, ctx: &CommandContext) -> Result<()> {
    let (mut storage, layer) = ctx.open_storage()?;
    let default_priority = config::default_priority_from_layer(&layer)?;

    let ticket = create(&mut storage, args, default_priority)?;

    if ctx.json {
        super::print_json(&ticket)?;
    } else {
        let options = TextFormatOptions {
            use_color: ctx.use_color,
            max_width: None,
        };
        ctx.say(format!("Created {}", format_ticket_line_with(&ticket, options)));
    }
    Ok(())
}

fn create(storage: &mut SqliteStorage, args: CreateArgs, default_priority: Priority) -> Result<Ticket> {
    let priority = match args.priority.as_deref() {
        Some(value) => value.parse()?,
        None => default_priority,
    };

    storage.create_ticket(&NewTicket {
        title: args.title,
        description: args.description.unwrap_or_default(),
        priority,
        tags: args.tags,
    })
}
