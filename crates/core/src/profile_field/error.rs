//! Profile field error types.

use parley_shared::types::ProfileFieldId;
use thiserror::Error;

/// Errors raised while managing profile fields and their values.
#[derive(Debug, Error)]
pub enum ProfileFieldError {
    /// A submitted value or definition is malformed.
    #[error("{0}")]
    Validation(String),

    /// The field does not exist in the caller's realm.
    #[error("custom profile field not found: {0}")]
    NotFound(ProfileFieldId),

    /// Another field of the realm already uses the name.
    #[error("A field with that label already exists.")]
    DuplicateName,

    /// Only realm administrators may change field definitions.
    #[error("Must be an organization administrator")]
    AdminRequired,

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl ProfileFieldError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
