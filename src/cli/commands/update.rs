use super::CommandContext;
use crate::cli::UpdateArgs;
use crate::error::{Result, TrackerError};
use crate::format::{TextFormatOptions, format_ticket_line_with};
use crate::model::TicketUpdate;

/// Execute the update command.
///
/// # Errors
///
/// Returns a validation error when no field is given or a value is invalid,
/// `TicketNotFound`, `DuplicateTitle`, or a database error.
pub fn execute(args: UpdateArgs, ctx: &CommandContext) -> Result<()> {
    let id = args.id;
    let update = build_update(args)?;
    let (mut storage, _layer) = ctx.open_storage()?;
    let ticket = storage.update_ticket(id, &update)?;

    if ctx.json {
        super::print_json(&ticket)?;
    } else {
        let options = TextFormatOptions {
            use_color: ctx.use_color,
            max_width: None,
        };
        ctx.say(format!("Updated {}", format_ticket_line_with(&ticket, options)));
    }
    Ok(())
}

/// Translate CLI flags into a field update.
///
/// # Errors
///
/// Returns `InvalidPriority`, or a validation error when nothing would change.
pub fn build_update(args: UpdateArgs) -> Result<TicketUpdate> {
    let tags = if args.clear_tags {
        Some(Vec::new())
    } else if args.tags.is_empty() {
        None
    } else {
        Some(args.tags)
    };

    let update = TicketUpdate {
        title: args.title,
        description: args.description,
        priority: args.priority.as_deref().map(str::parse).transpose()?,
        tags,
    };

    if update.is_empty() {
        return Err(TrackerError::validation(
            "update",
            "nothing to update; pass --title, --description, --priority, --tag or --clear-tags",
        ));
    }
    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;

    #[test]
    fn empty_update_is_rejected() {
        let err = build_update(UpdateArgs {
            id: 1,
            ..UpdateArgs::default()
        })
        .unwrap_err();
        assert!(matches!(err, TrackerError::Validation { .. }));
    }

    #[test]
    fn clear_tags_sets_empty_list() {
        let update = build_update(UpdateArgs {
            id: 1,
            clear_tags: true,
            ..UpdateArgs::default()
        })
        .unwrap();
        assert_eq!(update.tags, Some(Vec::new()));
    }

    #[test]
    fn tags_replace_when_given() {
        let update = build_update(UpdateArgs {
            id: 1,
            tags: vec!["a".to_string(), "b".to_string()],
            priority: Some("low".to_string()),
            ..UpdateArgs::default()
        })
        .unwrap();
        assert_eq!(update.tags, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(update.priority, Some(Priority::Low));
        assert_eq!(update.title, None);
    }
}
