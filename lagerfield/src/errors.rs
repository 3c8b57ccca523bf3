use std::borrow::Cow;

use thiserror::Error;

/// Top-level error type returned by the document layer.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Validation failed for one or more fields.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Underlying Redis command failed.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Target document was not found when performing a mutation.
    #[error("document not found")]
    NotFound { document_id: Option<String> },

    /// Invalid input supplied to a repository operation.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// Unique constraint violation - the value already belongs to another document.
    #[error("unique constraint violation: {field} '{value}' already exists on document '{existing_id}'")]
    UniqueConstraintViolation {
        field: String,
        value: String,
        existing_id: String,
    },

    /// Stored JSON could not be converted to or from the document type.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{message}")]
    Other { message: Cow<'static, str> },
}

/// Collection of validation issues encountered while preparing a write.
#[derive(Debug, Error)]
#[error("{}", render_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        Self {
            issues: issues.into_iter().collect(),
        }
    }

    /// Convenience helper for constructing a single-field validation error.
    pub fn single(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new([ValidationIssue::new(field, code, message)])
    }
}

fn render_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{}: {}", issue.field, issue.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Detailed validation failure for a single field.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_issue() {
        let err = ValidationError::new([
            ValidationIssue::new("name", "validation.required", "field is required"),
            ValidationIssue::new("email", "validation.email", "value must be a valid email address"),
        ]);
        assert_eq!(
            err.to_string(),
            "name: field is required, email: value must be a valid email address"
        );
    }
}
