//! Field validation for ticket payloads.
//!
//! These routines check create and update payloads and return a normalised
//! copy (trimmed text, deduplicated tags) without touching storage.
//! Lifecycle rules live in [`crate::lifecycle`].

use crate::error::{Result, TrackerError, ValidationError};
use crate::model::{NewTicket, TicketUpdate};

/// Title length bounds, in characters after trimming.
pub const TITLE_MIN: usize = 3;
pub const TITLE_MAX: usize = 80;

/// Maximum description length, in characters after trimming.
pub const DESCRIPTION_MAX: usize = 2000;

/// Maximum tag length, in characters after trimming.
pub const TAG_MAX: usize = 32;

/// Maximum number of tags on one ticket.
pub const MAX_TAGS: usize = 20;

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Validates ticket titles and descriptions.
pub struct TicketValidator;

impl TicketValidator {
    /// Validate a title, returning it trimmed.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the trimmed title is outside
    /// `TITLE_MIN..=TITLE_MAX` characters or contains control characters.
    pub fn title(title: &str) -> std::result::Result<String, ValidationError> {
        let trimmed = title.trim();
        if trimmed.chars().any(char::is_control) {
            return Err(ValidationError::new(
                "title",
                "cannot contain control characters",
            ));
        }
        let len = char_len(trimmed);
        if !(TITLE_MIN..=TITLE_MAX).contains(&len) {
            return Err(ValidationError::new(
                "title",
                format!("must be between {TITLE_MIN} and {TITLE_MAX} characters"),
            ));
        }
        Ok(trimmed.to_string())
    }

    /// Validate a description, returning it trimmed. Empty is allowed.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the trimmed description exceeds
    /// `DESCRIPTION_MAX` characters.
    pub fn description(description: &str) -> std::result::Result<String, ValidationError> {
        let trimmed = description.trim();
        if char_len(trimmed) > DESCRIPTION_MAX {
            return Err(ValidationError::new(
                "description",
                format!("cannot exceed {DESCRIPTION_MAX} characters"),
            ));
        }
        Ok(trimmed.to_string())
    }
}

/// Validates a single tag value.
pub struct TagValidator;

impl TagValidator {
    /// Validate a tag for length and allowed characters.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the tag is invalid.
    pub fn validate(tag: &str) -> std::result::Result<(), ValidationError> {
        if tag.is_empty() {
            return Err(ValidationError::new("tags", "tag cannot be empty"));
        }

        if char_len(tag) > TAG_MAX {
            return Err(ValidationError::new(
                "tags",
                format!("tag '{tag}' exceeds {TAG_MAX} characters"),
            ));
        }

        if tag.chars().any(char::is_control) {
            return Err(ValidationError::new(
                "tags",
                "tag cannot contain control characters",
            ));
        }

        Ok(())
    }

    /// Trim, validate and deduplicate a tag list, keeping first occurrences.
    ///
    /// # Errors
    ///
    /// Returns every violation found, including a too-long list.
    pub fn normalize(tags: &[String]) -> std::result::Result<Vec<String>, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut out: Vec<String> = Vec::with_capacity(tags.len());

        for tag in tags {
            let trimmed = tag.trim();
            if let Err(err) = Self::validate(trimmed) {
                errors.push(err);
                continue;
            }
            if !out.iter().any(|t| t == trimmed) {
                out.push(trimmed.to_string());
            }
        }

        if out.len() > MAX_TAGS {
            errors.push(ValidationError::new(
                "tags",
                format!("at most {MAX_TAGS} tags allowed"),
            ));
        }

        if errors.is_empty() {
            Ok(out)
        } else {
            Err(errors)
        }
    }
}

impl NewTicket {
    /// Validate this payload and return a normalised copy.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Validation` (one violation) or
    /// `TrackerError::ValidationErrors` (several).
    pub fn validate(&self) -> Result<Self> {
        let mut errors = Vec::new();

        let title = TicketValidator::title(&self.title).unwrap_or_else(|err| {
            errors.push(err);
            String::new()
        });
        let description = TicketValidator::description(&self.description).unwrap_or_else(|err| {
            errors.push(err);
            String::new()
        });
        let tags = TagValidator::normalize(&self.tags).unwrap_or_else(|errs| {
            errors.extend(errs);
            Vec::new()
        });

        if !errors.is_empty() {
            return Err(TrackerError::from_validation_errors(errors));
        }

        Ok(Self {
            title,
            description,
            priority: self.priority,
            tags,
        })
    }
}

impl TicketUpdate {
    /// Validate the fields present in this update and return a normalised copy.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Validation` (one violation) or
    /// `TrackerError::ValidationErrors` (several).
    pub fn validate(&self) -> Result<Self> {
        let mut errors = Vec::new();

        let title = self
            .title
            .as_deref()
            .and_then(|title| match TicketValidator::title(title) {
                Ok(title) => Some(title),
                Err(err) => {
                    errors.push(err);
                    None
                }
            });
        let description =
            self.description
                .as_deref()
                .and_then(|desc| match TicketValidator::description(desc) {
                    Ok(desc) => Some(desc),
                    Err(err) => {
                        errors.push(err);
                        None
                    }
                });
        let tags = self
            .tags
            .as_deref()
            .and_then(|tags| match TagValidator::normalize(tags) {
                Ok(tags) => Some(tags),
                Err(errs) => {
                    errors.extend(errs);
                    None
                }
            });

        if !errors.is_empty() {
            return Err(TrackerError::from_validation_errors(errors));
        }

        Ok(Self {
            title,
            description,
            priority: self.priority,
            tags,
        })
    }
}
