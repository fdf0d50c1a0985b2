//! Error types and handling for `tix`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Accepts `anyhow` errors through [`TrackerError::Other`]
//! - Provides recovery hints for user-facing errors
//! - Provides structured JSON output for the CLI and the HTTP API

mod structured;

pub use structured::{ErrorCode, StructuredError};

use crate::lifecycle::LifecycleError;
use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `tix` operations.
#[derive(Error, Debug)]
pub enum TrackerError {
    // === Storage Errors ===
    /// Database file not found at the specified path.
    #[error("Database not found at '{path}'")]
    DatabaseNotFound { path: PathBuf },

    /// `SQLite` database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // === Ticket Errors ===
    /// Ticket with the specified ID was not found.
    #[error("Ticket not found: {id}")]
    TicketNotFound { id: i64 },

    /// Another ticket already uses this title (case-insensitive).
    #[error("Title must be unique: '{title}' is already taken")]
    DuplicateTitle { title: String },

    /// Operation disallowed given the ticket's current state.
    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Multiple validation errors occurred.
    #[error("Validation errors: {}", format_errors(errors))]
    ValidationErrors { errors: Vec<ValidationError> },

    /// Invalid status value.
    #[error("Invalid status: {status}")]
    InvalidStatus { status: String },

    /// Invalid priority value.
    #[error("Invalid priority: {priority}")]
    InvalidPriority { priority: String },

    /// Invalid sort key.
    #[error("Invalid sort key: {key}")]
    InvalidOrderBy { key: String },

    // === Configuration Errors ===
    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workspace not initialized.
    #[error("Tix not initialized: run 'tix init' first")]
    NotInitialized,

    /// Already initialized.
    #[error("Already initialized at '{path}'")]
    AlreadyInitialized { path: PathBuf },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single field validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// The reason for the validation failure.
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<LifecycleError> for TrackerError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Validation { field, reason } => Self::Validation {
                field: field.to_string(),
                reason,
            },
            LifecycleError::Conflict { reason } => Self::Conflict { reason },
        }
    }
}

impl TrackerError {
    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run: tix init"),
            Self::DatabaseNotFound { .. } => Some("Check path or run: tix init"),
            Self::AlreadyInitialized { .. } => Some("Use --force to reinitialize"),
            Self::TicketNotFound { .. } => Some("Run 'tix list' to see available tickets."),
            Self::DuplicateTitle { .. } => Some("Pick a title no other ticket uses"),
            Self::InvalidStatus { .. } => Some("Valid statuses: open, in_progress, resolved"),
            Self::InvalidPriority { .. } => Some("Valid priorities: low, medium, high"),
            Self::InvalidOrderBy { .. } => {
                Some("Valid sort keys: created_at, updated_at, title, priority, status")
            }
            _ => None,
        }
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create from multiple validation errors.
    #[must_use]
    pub fn from_validation_errors(errors: Vec<ValidationError>) -> Self {
        if errors.len() == 1 {
            let err = &errors[0];
            Self::Validation {
                field: err.field.clone(),
                reason: err.message.clone(),
            }
        } else {
            Self::ValidationErrors { errors }
        }
    }
}

/// Result type using `TrackerError`.
pub type Result<T> = std::result::Result<T, TrackerError>;
