//! Error types for the Roster engine.

use crate::UserId;
use thiserror::Error;

/// All possible errors from the Roster engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Validation errors
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },

    // Store errors
    #[error("record not found: {0}")]
    RecordNotFound(UserId),

    #[error("duplicate record id: {0}")]
    DuplicateId(UserId),

    // Persistence errors
    #[error("invalid preferences: {0}")]
    InvalidPreferences(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::RecordNotFound(7);
        assert_eq!(err.to_string(), "record not found: 7");

        let err = Error::DuplicateId(-3);
        assert_eq!(err.to_string(), "duplicate record id: -3");

        let err = Error::Validation {
            field: "email",
            message: "Please enter a valid email address",
        };
        assert_eq!(
            err.to_string(),
            "invalid email: Please enter a valid email address"
        );
    }
}
