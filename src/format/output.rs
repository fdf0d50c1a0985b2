use crate::lifecycle;
use crate::model::{Event, Status, Ticket};
use serde::{Deserialize, Serialize};

/// Ticket details for the show view: the ticket, its legal next statuses
/// and its audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetails {
    #[serde(flatten)]
    pub ticket: Ticket,
    /// Statuses reachable without a reason.
    pub allowed_transitions: Vec<Status>,
    /// Statuses reachable only with a reason.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires_reason: Vec<Status>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
}

impl TicketDetails {
    #[must_use]
    pub fn new(ticket: Ticket, events: Vec<Event>) -> Self {
        Self {
            allowed_transitions: lifecycle::allowed_targets(&ticket),
            requires_reason: lifecycle::targets_requiring_reason(&ticket),
            ticket,
            events,
        }
    }
}

/// Confirmation returned after a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    pub id: i64,
}

impl DeleteResponse {
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self {
            message: "Ticket deleted successfully".to_string(),
            id,
        }
    }
}
