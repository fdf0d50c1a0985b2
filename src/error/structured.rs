//! Structured error output.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context for debugging
//!
//! The same shape backs `--json` error output in the CLI and the `code`
//! field of HTTP error bodies.

#![allow(clippy::option_if_let_else)]

use crate::error::TrackerError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Database Errors (exit code 2) ===
    /// Database file not found
    DatabaseNotFound,
    /// Database operation failed
    DatabaseError,
    /// Workspace not initialized
    NotInitialized,
    /// Already initialized
    AlreadyInitialized,

    // === Ticket Errors (exit code 3) ===
    /// Ticket with specified ID not found
    TicketNotFound,

    // === Validation Errors (exit code 4) ===
    /// Field or lifecycle validation failed
    ValidationFailed,
    /// Invalid status value
    InvalidStatus,
    /// Invalid priority value
    InvalidPriority,
    /// Invalid sort key
    InvalidOrderBy,

    // === Conflict Errors (exit code 5) ===
    /// Operation disallowed in the ticket's current state
    Conflict,
    /// Title already used by another ticket
    DuplicateTitle,

    // === Config Errors (exit code 7) ===
    /// Configuration error
    ConfigError,

    // === I/O Errors (exit code 8) ===
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,

    // === Internal Errors (exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DatabaseNotFound => "DATABASE_NOT_FOUND",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::TicketNotFound => "TICKET_NOT_FOUND",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::InvalidPriority => "INVALID_PRIORITY",
            Self::InvalidOrderBy => "INVALID_ORDER_BY",
            Self::Conflict => "CONFLICT",
            Self::DuplicateTitle => "DUPLICATE_TITLE",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller might succeed after fixing its input.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed
                | Self::InvalidStatus
                | Self::InvalidPriority
                | Self::InvalidOrderBy
                | Self::DuplicateTitle
        )
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Database and workspace errors
    /// - 3: Ticket lookup errors
    /// - 4: Validation errors
    /// - 5: Conflict errors
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::DatabaseNotFound
            | Self::DatabaseError
            | Self::NotInitialized
            | Self::AlreadyInitialized => 2,
            Self::TicketNotFound => 3,
            Self::ValidationFailed
            | Self::InvalidStatus
            | Self::InvalidPriority
            | Self::InvalidOrderBy => 4,
            Self::Conflict | Self::DuplicateTitle => 5,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `TrackerError`.
    #[must_use]
    pub fn from_error(err: &TrackerError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);
        let hint = Self::generate_hint(err);

        Self {
            code,
            message: err.to_string(),
            hint,
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &TrackerError) -> (ErrorCode, Option<Value>) {
        match err {
            TrackerError::DatabaseNotFound { path } => (
                ErrorCode::DatabaseNotFound,
                Some(json!({"path": path.display().to_string()})),
            ),
            TrackerError::Database(_) => (ErrorCode::DatabaseError, None),
            TrackerError::NotInitialized => (ErrorCode::NotInitialized, None),
            TrackerError::AlreadyInitialized { path } => (
                ErrorCode::AlreadyInitialized,
                Some(json!({"path": path.display().to_string()})),
            ),
            TrackerError::TicketNotFound { id } => {
                (ErrorCode::TicketNotFound, Some(json!({"searched_id": id})))
            }
            TrackerError::DuplicateTitle { title } => {
                (ErrorCode::DuplicateTitle, Some(json!({"title": title})))
            }
            TrackerError::Conflict { reason } => {
                (ErrorCode::Conflict, Some(json!({"reason": reason})))
            }
            TrackerError::Validation { field, reason } => (
                ErrorCode::ValidationFailed,
                Some(json!({"field": field, "reason": reason})),
            ),
            TrackerError::ValidationErrors { errors } => (
                ErrorCode::ValidationFailed,
                Some(json!({
                    "errors": errors.iter()
                        .map(|e| json!({"field": e.field, "message": e.message}))
                        .collect::<Vec<_>>()
                })),
            ),
            TrackerError::InvalidStatus { status } => (
                ErrorCode::InvalidStatus,
                Some(json!({
                    "provided": status,
                    "valid_values": ["open", "in_progress", "resolved"],
                })),
            ),
            TrackerError::InvalidPriority { priority } => (
                ErrorCode::InvalidPriority,
                Some(json!({
                    "provided": priority,
                    "valid_values": ["low", "medium", "high"],
                })),
            ),
            TrackerError::InvalidOrderBy { key } => {
                (ErrorCode::InvalidOrderBy, Some(json!({"provided": key})))
            }
            TrackerError::Config(_) => (ErrorCode::ConfigError, None),
            TrackerError::Io(_) => (ErrorCode::IoError, None),
            TrackerError::Json(_) => (ErrorCode::JsonError, None),
            TrackerError::Yaml(_) => (ErrorCode::YamlError, None),
            TrackerError::Other(_) => (ErrorCode::InternalError, None),
        }
    }

    fn generate_hint(err: &TrackerError) -> Option<String> {
        // Intent detection beats the generic suggestion when it finds a match
        match err {
            TrackerError::InvalidStatus { status } => {
                if let Some(detected) = detect_status_intent(status) {
                    return Some(format!("Did you mean '{detected}'?"));
                }
            }
            TrackerError::InvalidPriority { priority } => {
                if let Some(detected) = detect_priority_intent(priority) {
                    return Some(format!("Did you mean '{detected}'?"));
                }
            }
            TrackerError::Validation { field, .. } if field == "reason" => {
                return Some(
                    "Pass --reason with at least 3 characters to reopen a resolved ticket"
                        .to_string(),
                );
            }
            TrackerError::Validation { field, .. } if field == "description" => {
                return Some(
                    "A ticket needs a description of at least 10 characters to be resolved"
                        .to_string(),
                );
            }
            TrackerError::Conflict { .. } => {
                return Some("Move the ticket out of in_progress first".to_string());
            }
            _ => {}
        }

        err.suggestion().map(str::to_string)
    }
}

/// Status synonyms for intent detection.
static STATUS_SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("done", "resolved"),
        ("closed", "resolved"),
        ("close", "resolved"),
        ("fixed", "resolved"),
        ("complete", "resolved"),
        ("completed", "resolved"),
        ("wip", "in_progress"),
        ("working", "in_progress"),
        ("active", "in_progress"),
        ("started", "in_progress"),
        ("in-progress", "in_progress"),
        ("new", "open"),
        ("todo", "open"),
        ("reopen", "open"),
        ("reopened", "open"),
    ]
    .into_iter()
    .collect()
});

/// Priority synonyms for intent detection.
static PRIORITY_SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("critical", "high"),
        ("urgent", "high"),
        ("p0", "high"),
        ("p1", "high"),
        ("normal", "medium"),
        ("default", "medium"),
        ("med", "medium"),
        ("p2", "medium"),
        ("minor", "low"),
        ("trivial", "low"),
        ("p3", "low"),
    ]
    .into_iter()
    .collect()
});

const VALID_STATUSES: [&str; 3] = ["open", "in_progress", "resolved"];
const VALID_PRIORITIES: [&str; 3] = ["low", "medium", "high"];

/// Detect what status the user likely meant.
fn detect_status_intent(input: &str) -> Option<&'static str> {
    let lower = input.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    if let Some(&canonical) = STATUS_SYNONYMS.get(lower.as_str()) {
        return Some(canonical);
    }

    VALID_STATUSES
        .iter()
        .find(|status| status.starts_with(&lower))
        .copied()
}

/// Detect what priority the user likely meant.
fn detect_priority_intent(input: &str) -> Option<&'static str> {
    let lower = input.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    if let Some(&canonical) = PRIORITY_SYNONYMS.get(lower.as_str()) {
        return Some(canonical);
    }

    VALID_PRIORITIES
        .iter()
        .find(|priority| priority.starts_with(&lower))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_strings_and_exit_codes() {
        assert_eq!(ErrorCode::TicketNotFound.as_str(), "TICKET_NOT_FOUND");
        assert_eq!(ErrorCode::TicketNotFound.exit_code(), 3);
        assert_eq!(ErrorCode::ValidationFailed.exit_code(), 4);
        assert_eq!(ErrorCode::Conflict.exit_code(), 5);
        assert_eq!(ErrorCode::InternalError.exit_code(), 1);
    }

    #[test]
    fn test_from_conflict_error() {
        let err = TrackerError::Conflict {
            reason: "cannot delete tickets in progress".to_string(),
        };
        let structured = StructuredError::from_error(&err);
        assert_eq!(structured.code, ErrorCode::Conflict);
        assert!(!structured.retryable);
        assert_eq!(
            structured.hint.as_deref(),
            Some("Move the ticket out of in_progress first")
        );
    }

    #[test]
    fn test_status_intent_hint() {
        let err = TrackerError::InvalidStatus {
            status: "done".to_string(),
        };
        let structured = StructuredError::from_error(&err);
        assert_eq!(structured.hint.as_deref(), Some("Did you mean 'resolved'?"));
        assert!(structured.retryable);
    }

    #[test]
    fn test_priority_prefix_intent() {
        assert_eq!(detect_priority_intent("hi"), Some("high"));
        assert_eq!(detect_priority_intent("urgent"), Some("high"));
        assert_eq!(detect_priority_intent("zzz"), None);
    }

    #[test]
    fn test_reason_hint() {
        let err = TrackerError::validation("reason", "required");
        let structured = StructuredError::from_error(&err);
        assert!(structured.hint.unwrap().contains("--reason"));
    }

    #[test]
    fn test_to_json_shape() {
        let err = TrackerError::TicketNotFound { id: 7 };
        let value = StructuredError::from_error(&err).to_json();
        assert_eq!(value["error"]["code"], "TICKET_NOT_FOUND");
        assert_eq!(value["error"]["context"]["searched_id"], 7);
    }

    #[test]
    fn test_to_human_without_color() {
        let err = TrackerError::NotInitialized;
        let human = StructuredError::from_error(&err).to_human(false);
        assert_eq!(
            human,
            "Error: Tix not initialized: run 'tix init' first\nHint: Run: tix init"
        );
    }
}
