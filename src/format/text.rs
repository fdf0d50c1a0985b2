//! Text formatting functions for `tix`.
//!
//! Provides terminal formatting for human output:
//! - Status icons (○ ◐ ✓)
//! - Priority badges ([high], [medium], [low])
//! - Ticket lines, detail views and stats tables

use crate::format::output::TicketDetails;
use crate::model::{Event, Priority, Status, Ticket, TicketStats};
use crate::query::Pagination;
use crossterm::style::Stylize;
use std::fmt::Write as _;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Status icon characters.
pub mod icons {
    /// Open ticket (hollow circle).
    pub const OPEN: &str = "○";
    /// In progress (half-filled).
    pub const IN_PROGRESS: &str = "◐";
    /// Resolved (checkmark).
    pub const RESOLVED: &str = "✓";
}

/// Formatting options for text output.
#[derive(Debug, Clone, Copy)]
pub struct TextFormatOptions {
    pub use_color: bool,
    pub max_width: Option<usize>,
}

impl TextFormatOptions {
    #[must_use]
    pub const fn plain() -> Self {
        Self {
            use_color: false,
            max_width: None,
        }
    }
}

/// Return the icon character for a status.
#[must_use]
pub const fn format_status_icon(status: Status) -> &'static str {
    match status {
        Status::Open => icons::OPEN,
        Status::InProgress => icons::IN_PROGRESS,
        Status::Resolved => icons::RESOLVED,
    }
}

/// Format status label with optional color.
#[must_use]
pub fn format_status_label(status: Status, use_color: bool) -> String {
    paint_status(status, status.as_str(), use_color)
}

/// Format status icon with optional color.
#[must_use]
pub fn format_status_icon_colored(status: Status, use_color: bool) -> String {
    paint_status(status, format_status_icon(status), use_color)
}

fn paint_status(status: Status, text: &str, use_color: bool) -> String {
    if !use_color {
        return text.to_string();
    }

    match status {
        Status::Open => text.green().to_string(),
        Status::InProgress => text.yellow().to_string(),
        Status::Resolved => text.dark_grey().to_string(),
    }
}

/// Format priority label with optional color.
#[must_use]
pub fn format_priority_label(priority: Priority, use_color: bool) -> String {
    let label = priority.as_str();
    if !use_color {
        return label.to_string();
    }

    match priority {
        Priority::High => label.red().bold().to_string(),
        Priority::Medium => label.yellow().to_string(),
        Priority::Low => label.dark_grey().to_string(),
    }
}

/// Format priority badge with optional color.
#[must_use]
pub fn format_priority_badge(priority: Priority, use_color: bool) -> String {
    format!("[{}]", format_priority_label(priority, use_color))
}

/// Format tags as `#tag` words separated by spaces.
#[must_use]
pub fn format_tags(tags: &[String], use_color: bool) -> String {
    let joined = tags
        .iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<_>>()
        .join(" ");
    if use_color {
        joined.cyan().to_string()
    } else {
        joined
    }
}

/// Determine terminal width from environment (falls back to 80).
#[must_use]
pub fn terminal_width() -> usize {
    if let Ok(columns) = std::env::var("COLUMNS") {
        if let Ok(value) = columns.trim().parse::<usize>() {
            if value > 0 {
                return value;
            }
        }
    }
    crossterm::terminal::size().map_or(80, |(cols, _)| usize::from(cols).max(20))
}

/// Truncate a title to fit within `max_len` visible columns.
///
/// Handles wide characters (emojis, CJK) correctly using `unicode-width`.
#[must_use]
pub fn truncate_title(title: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }

    if UnicodeWidthStr::width(title) <= max_len {
        return title.to_string();
    }

    if max_len <= 3 {
        return take_width(title, max_len);
    }

    let mut s = take_width(title, max_len - 3);
    s.push_str("...");
    s
}

fn take_width(text: &str, max: usize) -> String {
    let mut w = 0;
    let mut s = String::new();
    for c in text.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if w + cw > max {
            break;
        }
        w += cw;
        s.push(c);
    }
    s
}

/// Format a single-line ticket summary with options.
///
/// Format: `{icon} #{id} [{priority}] {title} {#tags}`
#[must_use]
pub fn format_ticket_line_with(ticket: &Ticket, options: TextFormatOptions) -> String {
    let id = format!("#{}", ticket.id);
    let priority_plain = format!("[{}]", ticket.priority.as_str());
    let tags_plain = format_tags(&ticket.tags, false);

    let prefix_len = UnicodeWidthStr::width(format_status_icon(ticket.status))
        + 1
        + id.len()
        + 1
        + priority_plain.len()
        + 1;
    let suffix_len = if tags_plain.is_empty() {
        0
    } else {
        UnicodeWidthStr::width(tags_plain.as_str()) + 1
    };

    let title = options.max_width.map_or_else(
        || ticket.title.clone(),
        |width| truncate_title(&ticket.title, width.saturating_sub(prefix_len + suffix_len)),
    );

    let icon = format_status_icon_colored(ticket.status, options.use_color);
    let priority = format_priority_badge(ticket.priority, options.use_color);

    let mut line = format!("{icon} {id} {priority} {title}");
    if !ticket.tags.is_empty() {
        line.push(' ');
        line.push_str(&format_tags(&ticket.tags, options.use_color));
    }
    line
}

/// Format a single-line ticket summary.
#[must_use]
pub fn format_ticket_line(ticket: &Ticket) -> String {
    format_ticket_line_with(ticket, TextFormatOptions::plain())
}

/// Footer shown under a listing.
#[must_use]
pub fn format_pagination(pagination: &Pagination) -> String {
    let noun = if pagination.total == 1 {
        "ticket"
    } else {
        "tickets"
    };
    format!(
        "Page {} of {} ({} {noun})",
        pagination.page,
        pagination.pages.max(1),
        pagination.total
    )
}

/// Format one audit event.
#[must_use]
pub fn format_event_line(event: &Event) -> String {
    let mut line = format!(
        "{} {}",
        event.created_at.format("%Y-%m-%d %H:%M"),
        event.event_type
    );
    if let Some(comment) = &event.comment {
        let _ = write!(line, " ({comment})");
    }
    match (&event.old_value, &event.new_value) {
        (Some(old), Some(new)) => {
            let _ = write!(line, ": {} -> {}", truncate_title(old, 40), truncate_title(new, 40));
        }
        (None, Some(new)) => {
            let _ = write!(line, ": {}", truncate_title(new, 40));
        }
        _ => {}
    }
    line
}

/// Multi-line detail view used by `tix show`.
#[must_use]
pub fn format_ticket_details(details: &TicketDetails, use_color: bool) -> String {
    let ticket = &details.ticket;
    let mut out = String::new();

    let heading = format!("#{} {}", ticket.id, ticket.title);
    if use_color {
        let _ = writeln!(out, "{}", heading.bold());
    } else {
        let _ = writeln!(out, "{heading}");
    }
    let _ = writeln!(
        out,
        "Status:   {} {}",
        format_status_icon_colored(ticket.status, use_color),
        format_status_label(ticket.status, use_color)
    );
    let _ = writeln!(
        out,
        "Priority: {}",
        format_priority_label(ticket.priority, use_color)
    );
    if !ticket.tags.is_empty() {
        let _ = writeln!(out, "Tags:     {}", format_tags(&ticket.tags, use_color));
    }
    let _ = writeln!(out, "Created:  {}", ticket.created_at.to_rfc3339());
    let _ = writeln!(out, "Updated:  {}", ticket.updated_at.to_rfc3339());
    if let Some(resolved_at) = ticket.resolved_at {
        let _ = writeln!(out, "Resolved: {}", resolved_at.to_rfc3339());
    }

    if !ticket.description.is_empty() {
        let _ = writeln!(out);
        for line in ticket.description.lines() {
            let _ = writeln!(out, "  {line}");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Next: {}", join_statuses(&details.allowed_transitions));
    if !details.requires_reason.is_empty() {
        let _ = writeln!(
            out,
            "With --reason: {}",
            join_statuses(&details.requires_reason)
        );
    }

    if !details.events.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "History:");
        for event in &details.events {
            let _ = writeln!(out, "  {}", format_event_line(event));
        }
    }

    out
}

fn join_statuses(statuses: &[Status]) -> String {
    if statuses.is_empty() {
        return "(none)".to_string();
    }
    statuses
        .iter()
        .map(Status::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Stats table used by `tix stats`.
#[must_use]
pub fn format_stats(stats: &TicketStats, use_color: bool) -> String {
    let mut out = String::new();
    for status in Status::ALL {
        let _ = writeln!(
            out,
            "{} {:<12} {:>5}",
            format_status_icon_colored(status, use_color),
            status.as_str(),
            stats.count(status)
        );
    }
    let _ = writeln!(out, "  {:<12} {:>5}", "total", stats.total);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EventType;
    use chrono::Utc;

    fn make_test_ticket() -> Ticket {
        let now = Utc::now();
        Ticket {
            id: 12,
            title: "Test title".to_string(),
            description: String::new(),
            status: Status::Open,
            priority: Priority::Medium,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            resolved_at: None,
        }
    }

    #[test]
    fn test_status_icons() {
        assert_eq!(format_status_icon(Status::Open), "○");
        assert_eq!(format_status_icon(Status::InProgress), "◐");
        assert_eq!(format_status_icon(Status::Resolved), "✓");
    }

    #[test]
    fn test_format_ticket_line_open() {
        let line = format_ticket_line(&make_test_ticket());
        assert_eq!(line, "○ #12 [medium] Test title");
    }

    #[test]
    fn test_format_ticket_line_with_tags() {
        let mut ticket = make_test_ticket();
        ticket.status = Status::Resolved;
        ticket.priority = Priority::High;
        ticket.tags = vec!["ui".to_string(), "login".to_string()];
        assert_eq!(
            format_ticket_line(&ticket),
            "✓ #12 [high] Test title #ui #login"
        );
    }

    #[test]
    fn test_truncate_title_adds_ellipsis() {
        assert_eq!(truncate_title("This is a long title", 10), "This is...");
        assert_eq!(truncate_title("short", 10), "short");
        assert_eq!(truncate_title("abcdef", 2), "ab");
    }

    #[test]
    fn test_truncate_handles_wide_chars() {
        let truncated = truncate_title("日本語のタイトルです", 9);
        assert!(UnicodeWidthStr::width(truncated.as_str()) <= 9);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_format_ticket_line_with_truncation() {
        let mut ticket = make_test_ticket();
        ticket.title = "A very long ticket title that keeps going".to_string();
        let options = TextFormatOptions {
            use_color: false,
            max_width: Some(30),
        };
        let line = format_ticket_line_with(&ticket, options);
        assert!(line.contains("..."));
        assert!(UnicodeWidthStr::width(line.as_str()) <= 30);
    }

    #[test]
    fn test_pagination_footer() {
        let footer = format_pagination(&Pagination {
            page: 2,
            limit: 10,
            total: 25,
            pages: 3,
        });
        assert_eq!(footer, "Page 2 of 3 (25 tickets)");

        let empty = format_pagination(&Pagination {
            page: 1,
            limit: 10,
            total: 0,
            pages: 0,
        });
        assert_eq!(empty, "Page 1 of 1 (0 tickets)");
    }

    #[test]
    fn test_event_line() {
        let event = Event {
            id: 1,
            ticket_id: 12,
            event_type: EventType::StatusChanged,
            old_value: Some("resolved".to_string()),
            new_value: Some("open".to_string()),
            comment: Some("regressed".to_string()),
            created_at: Utc::now(),
        };
        let line = format_event_line(&event);
        assert!(line.ends_with("status_changed (regressed): resolved -> open"));
    }

    #[test]
    fn test_stats_lists_all_statuses() {
        let stats = TicketStats {
            open: 2,
            in_progress: 0,
            resolved: 1,
            total: 3,
        };
        let text = format_stats(&stats, false);
        assert!(text.contains("in_progress"));
        assert!(text.contains("total"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_plain_output_has_no_ansi() {
        let label = format_priority_label(Priority::High, false);
        assert_eq!(label, "high");
        let colored = format_priority_label(Priority::High, true);
        assert!(colored.contains("high"));
        assert!(colored.contains('\u{1b}'));
    }
}
