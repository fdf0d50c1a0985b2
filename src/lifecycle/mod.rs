//! Ticket lifecycle rules.
//!
//! Every status may move to every other status. Two rules gate the move:
//!
//! - entering `resolved` requires a description of at least
//!   [`MIN_RESOLVE_DESCRIPTION`] characters
//! - leaving `resolved` requires a reason of at least [`MIN_REOPEN_REASON`]
//!   characters
//!
//! A third rule guards deletion: tickets that are `in_progress` cannot be
//! deleted.
//!
//! All functions here are pure. They take a snapshot and return a new one;
//! persisting the result is the caller's job.

use crate::model::{Status, Ticket, TicketUpdate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum trimmed description length for a ticket to be resolved.
pub const MIN_RESOLVE_DESCRIPTION: usize = 10;

/// Minimum trimmed reason length when moving a ticket out of `resolved`.
pub const MIN_REOPEN_REASON: usize = 3;

/// A rejected lifecycle operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The request breaks a lifecycle rule.
    #[error("{field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The operation is not allowed in the ticket's current state.
    #[error("{reason}")]
    Conflict { reason: String },
}

/// A requested status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub status: Status,
    #[serde(default)]
    pub reason: Option<String>,
}

impl TransitionRequest {
    #[must_use]
    pub const fn new(status: Status) -> Self {
        Self {
            status,
            reason: None,
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// The reason with surrounding whitespace removed; empty when absent.
    #[must_use]
    pub fn trimmed_reason(&self) -> &str {
        self.reason.as_deref().map_or("", str::trim)
    }
}

fn trimmed_len(s: &str) -> usize {
    s.trim().chars().count()
}

/// Check whether `request` may be applied to `ticket`.
///
/// # Errors
///
/// Returns [`LifecycleError::Validation`] when the description is too short
/// to resolve, or when leaving `resolved` without a long enough reason.
pub fn check_transition(
    ticket: &Ticket,
    request: &TransitionRequest,
) -> Result<(), LifecycleError> {
    if request.status == Status::Resolved {
        let len = ticket.description_len();
        if len < MIN_RESOLVE_DESCRIPTION {
            return Err(LifecycleError::Validation {
                field: "description",
                reason: format!(
                    "must be at least {MIN_RESOLVE_DESCRIPTION} characters to resolve (has {len})"
                ),
            });
        }
    } else if ticket.status == Status::Resolved
        && trimmed_len(request.trimmed_reason()) < MIN_REOPEN_REASON
    {
        return Err(LifecycleError::Validation {
            field: "reason",
            reason: format!(
                "at least {MIN_REOPEN_REASON} characters required when moving a ticket out of resolved"
            ),
        });
    }
    Ok(())
}

/// Apply a status transition, returning the next snapshot.
///
/// `resolved_at` is stamped with `now` on entering `resolved` (including
/// resolved to resolved) and cleared otherwise. `updated_at` is always `now`.
///
/// # Errors
///
/// Propagates the rule violations of [`check_transition`].
pub fn apply_transition(
    ticket: &Ticket,
    request: &TransitionRequest,
    now: DateTime<Utc>,
) -> Result<Ticket, LifecycleError> {
    check_transition(ticket, request)?;

    let mut next = ticket.clone();
    next.status = request.status;
    next.resolved_at = request.status.is_resolved().then_some(now);
    next.updated_at = now;
    Ok(next)
}

/// Check whether `ticket` may be deleted.
///
/// # Errors
///
/// Returns [`LifecycleError::Conflict`] when the ticket is `in_progress`.
pub fn check_delete(ticket: &Ticket) -> Result<(), LifecycleError> {
    if ticket.status == Status::InProgress {
        return Err(LifecycleError::Conflict {
            reason: "Cannot delete tickets in progress".to_string(),
        });
    }
    Ok(())
}

/// Statuses reachable from `ticket` with a request that carries no reason.
///
/// The current status is not listed.
#[must_use]
pub fn allowed_targets(ticket: &Ticket) -> Vec<Status> {
    Status::ALL
        .into_iter()
        .filter(|status| *status != ticket.status)
        .filter(|status| check_transition(ticket, &TransitionRequest::new(*status)).is_ok())
        .collect()
}

/// Statuses reachable from `ticket` only when a reason is supplied.
#[must_use]
pub fn targets_requiring_reason(ticket: &Ticket) -> Vec<Status> {
    if ticket.status != Status::Resolved {
        return Vec::new();
    }
    Status::ALL
        .into_iter()
        .filter(|status| !status.is_resolved())
        .collect()
}

/// Apply a field update, returning the next snapshot.
///
/// Values are taken as given; validation and trimming happen before this
/// point. Status and `resolved_at` are left alone.
#[must_use]
pub fn apply_update(ticket: &Ticket, update: &TicketUpdate, now: DateTime<Utc>) -> Ticket {
    let mut next = ticket.clone();
    if let Some(title) = &update.title {
        next.title.clone_from(title);
    }
    if let Some(description) = &update.description {
        next.description.clone_from(description);
    }
    if let Some(priority) = update.priority {
        next.priority = priority;
    }
    if let Some(tags) = &update.tags {
        next.tags.clone_from(tags);
    }
    next.updated_at = now;
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn ticket(status: Status, description: &str) -> Ticket {
        Ticket {
            id: 7,
            title: "Printer jams".to_string(),
            description: description.to_string(),
            status,
            priority: Priority::Medium,
            tags: Vec::new(),
            created_at: t0(),
            updated_at: t0(),
            resolved_at: status.is_resolved().then(t0),
        }
    }

    #[test]
    fn resolve_requires_description() {
        let short = ticket(Status::Open, "too short");
        let err = apply_transition(&short, &TransitionRequest::new(Status::Resolved), t0())
            .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Validation {
                field: "description",
                ..
            }
        ));

        let long = ticket(Status::InProgress, "paper tray misaligned");
        let now = t0() + Duration::hours(2);
        let next = apply_transition(&long, &TransitionRequest::new(Status::Resolved), now).unwrap();
        assert_eq!(next.status, Status::Resolved);
        assert_eq!(next.resolved_at, Some(now));
        assert_eq!(next.updated_at, now);
        assert_eq!(next.created_at, long.created_at);
    }

    #[test]
    fn description_length_counts_trimmed_chars() {
        // Nine visible characters padded with whitespace stays too short.
        let padded = ticket(Status::Open, "   123456789      ");
        assert!(check_transition(&padded, &TransitionRequest::new(Status::Resolved)).is_err());

        // Ten multi-byte characters are enough.
        let unicode = ticket(Status::Open, "éééééééééé");
        assert!(check_transition(&unicode, &TransitionRequest::new(Status::Resolved)).is_ok());
    }

    #[test]
    fn leaving_resolved_requires_reason() {
        let resolved = ticket(Status::Resolved, "ok");
        let err = apply_transition(
            &resolved,
            &TransitionRequest::new(Status::Open).with_reason(""),
            t0(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Validation { field: "reason", .. }
        ));

        assert!(
            apply_transition(&resolved, &TransitionRequest::new(Status::InProgress), t0())
                .is_err()
        );
        assert!(
            apply_transition(
                &resolved,
                &TransitionRequest::new(Status::Open).with_reason("  ab  "),
                t0()
            )
            .is_err()
        );

        let now = t0() + Duration::days(1);
        let next = apply_transition(
            &resolved,
            &TransitionRequest::new(Status::Open).with_reason("fixed now"),
            now,
        )
        .unwrap();
        assert_eq!(next.status, Status::Open);
        assert_eq!(next.resolved_at, None);
        assert_eq!(next.updated_at, now);
    }

    #[test]
    fn reason_not_needed_between_open_and_in_progress() {
        let open = ticket(Status::Open, "");
        let next =
            apply_transition(&open, &TransitionRequest::new(Status::InProgress), t0()).unwrap();
        assert_eq!(next.status, Status::InProgress);
        assert!(next.resolved_at.is_none());
    }

    #[test]
    fn same_status_transition_restamps_resolved_at() {
        let resolved = ticket(Status::Resolved, "long enough description");
        let later = t0() + Duration::minutes(5);
        let next =
            apply_transition(&resolved, &TransitionRequest::new(Status::Resolved), later).unwrap();
        assert_eq!(next.resolved_at, Some(later));

        let open = ticket(Status::Open, "");
        let next = apply_transition(&open, &TransitionRequest::new(Status::Open), later).unwrap();
        assert_eq!(next.status, Status::Open);
        assert_eq!(next.updated_at, later);
    }

    #[test]
    fn delete_guard() {
        assert!(check_delete(&ticket(Status::Open, "")).is_ok());
        assert!(check_delete(&ticket(Status::Resolved, "done and dusted")).is_ok());
        assert!(matches!(
            check_delete(&ticket(Status::InProgress, "anything at all")),
            Err(LifecycleError::Conflict { .. })
        ));
    }

    #[test]
    fn allowed_targets_reflect_rules() {
        assert_eq!(
            allowed_targets(&ticket(Status::Open, "short")),
            vec![Status::InProgress]
        );
        assert_eq!(
            allowed_targets(&ticket(Status::Open, "long enough to resolve")),
            vec![Status::InProgress, Status::Resolved]
        );
        let resolved = ticket(Status::Resolved, "long enough to resolve");
        assert!(allowed_targets(&resolved).is_empty());
        assert_eq!(
            targets_requiring_reason(&resolved),
            vec![Status::Open, Status::InProgress]
        );
        assert!(targets_requiring_reason(&ticket(Status::Open, "")).is_empty());
    }

    #[test]
    fn apply_update_bumps_updated_at_only() {
        let resolved = ticket(Status::Resolved, "long enough to resolve");
        let now = t0() + Duration::hours(1);
        let update = TicketUpdate {
            title: Some("Printer jams daily".to_string()),
            priority: Some(Priority::High),
            ..Default::default()
        };
        let next = apply_update(&resolved, &update, now);
        assert_eq!(next.title, "Printer jams daily");
        assert_eq!(next.priority, Priority::High);
        assert_eq!(next.description, resolved.description);
        assert_eq!(next.status, Status::Resolved);
        assert_eq!(next.resolved_at, resolved.resolved_at);
        assert_eq!(next.updated_at, now);
    }
}
