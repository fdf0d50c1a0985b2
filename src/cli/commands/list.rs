//! List command implementation.
//!
//! Filters are parsed strictly here: a typo in `--status` or `--sort` is an
//! error rather than silently widening the listing.

use super::CommandContext;
use crate::cli::ListArgs;
use crate::config;
use crate::error::Result;
use crate::format::{TextFormatOptions, format_pagination, format_ticket_line_with, terminal_width};
use crate::query::{OrderBy, OrderDir, TicketQuery};
use tracing::debug;

/// Execute the list command.
///
/// # Errors
///
/// Returns an error for unknown filter values, out-of-range paging, or a
/// database failure.
pub fn execute(args: &ListArgs, ctx: &CommandContext) -> Result<()> {
    let (storage, layer) = ctx.open_storage()?;
    let page_size = config::page_size_from_layer(&layer)?;

    let query = build_query(args, page_size)?;
    debug!(?query, "Listing tickets");
    let page = storage.list_tickets(&query)?;

    if ctx.json {
        return super::print_json(&page);
    }

    if page.tickets.is_empty() {
        ctx.say("No tickets found.");
        return Ok(());
    }

    let options = TextFormatOptions {
        use_color: ctx.use_color,
        max_width: Some(terminal_width()),
    };
    for ticket in &page.tickets {
        ctx.say(format_ticket_line_with(ticket, options));
    }
    if page.pagination.pages > 1 {
        ctx.say(format_pagination(&page.pagination));
    }
    Ok(())
}

/// Translate CLI flags into a query.
///
/// # Errors
///
/// Returns `InvalidStatus`, `InvalidPriority` or `InvalidOrderBy`.
pub fn build_query(args: &ListArgs, page_size: usize) -> Result<TicketQuery> {
    Ok(TicketQuery {
        status: args.status.as_deref().map(str::parse).transpose()?,
        priority: args.priority.as_deref().map(str::parse).transpose()?,
        search: args.search.clone(),
        tag: args.tag.clone(),
        order_by: args
            .sort
            .as_deref()
            .map(str::parse::<OrderBy>)
            .transpose()?
            .unwrap_or_default(),
        order_dir: if args.asc { OrderDir::Asc } else { OrderDir::Desc },
        page: args.page.unwrap_or(1),
        limit: args.limit.unwrap_or(page_size),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;
    use crate::model::{Priority, Status};

    #[test]
    fn defaults_match_query_defaults() {
        let query = build_query(&ListArgs::default(), 10).unwrap();
        assert_eq!(query, TicketQuery::default());
    }

    #[test]
    fn parses_filters_and_ordering() {
        let args = ListArgs {
            status: Some("in_progress".to_string()),
            priority: Some("high".to_string()),
            sort: Some("priority".to_string()),
            asc: true,
            page: Some(2),
            limit: Some(5),
            ..ListArgs::default()
        };
        let query = build_query(&args, 10).unwrap();
        assert_eq!(query.status, Some(Status::InProgress));
        assert_eq!(query.priority, Some(Priority::High));
        assert_eq!(query.order_by, OrderBy::Priority);
        assert_eq!(query.order_dir, OrderDir::Asc);
        assert_eq!((query.page, query.limit), (2, 5));
    }

    #[test]
    fn unknown_sort_key_is_an_error() {
        let args = ListArgs {
            sort: Some("due".to_string()),
            ..ListArgs::default()
        };
        assert!(matches!(
            build_query(&args, 10),
            Err(TrackerError::InvalidOrderBy { .. })
        ));
    }

    #[test]
    fn configured_page_size_applies() {
        let query = build_query(&ListArgs::default(), 50).unwrap();
        assert_eq!(query.limit, 50);
    }
}
