//! Output formatting for `tix`.
//!
//! Supports human-readable text output and machine-parseable JSON. JSON
//! output uses the same shapes as the HTTP API.
//!
//! # Output Types
//!
//! - [`TicketDetails`] - Ticket with legal next statuses and events (show)
//! - [`DeleteResponse`] - Delete confirmation

mod output;
mod text;

pub use output::{DeleteResponse, TicketDetails};
pub use text::{
    TextFormatOptions, format_event_line, format_pagination, format_priority_badge,
    format_priority_label, format_stats, format_status_icon, format_status_icon_colored,
    format_status_label, format_tags, format_ticket_details, format_ticket_line,
    format_ticket_line_with, terminal_width, truncate_title,
};
