//! Unified error type for the platform.
//!
//! Each business area gets its own named variant so callers can tell a company
//! rule violation from a request-workflow one. [`Error::status_code`] maps every
//! variant onto the HTTP status class a transport layer would report.

use sea_orm::DbErr;
use thiserror::Error;

/// Errors produced by the service layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// I/O failure (config files, data directory)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input failed a business validation check
    #[error("Validation error: {message}")]
    Validation {
        /// Which check failed
        message: String,
    },

    /// Referenced entity does not exist or was soft-deleted
    #[error("{entity} with id {id} not found")]
    NotFound {
        /// Entity kind (e.g. "company")
        entity: &'static str,
        /// Identifier that was looked up
        id: i64,
    },

    /// Actor is not allowed to perform the action
    #[error("Forbidden: {reason}")]
    Forbidden {
        /// Human readable denial reason
        reason: String,
    },

    /// User rule violation
    #[error("User error: {message}")]
    User {
        /// Details
        message: String,
    },

    /// Company rule violation
    #[error("Company error: {message}")]
    Company {
        /// Details
        message: String,
    },

    /// Project rule violation
    #[error("Project error: {message}")]
    Project {
        /// Details
        message: String,
    },

    /// Session scheduling rule violation
    #[error("Session error: {message}")]
    Session {
        /// Details
        message: String,
    },

    /// Skill rule violation
    #[error("Skill error: {message}")]
    Skill {
        /// Details
        message: String,
    },

    /// Level rule violation
    #[error("Level error: {message}")]
    Level {
        /// Details
        message: String,
    },

    /// Job rule violation
    #[error("Job error: {message}")]
    Job {
        /// Details
        message: String,
    },

    /// Relation rule violation
    #[error("Relation error: {message}")]
    Relation {
        /// Details
        message: String,
    },

    /// Request workflow violation (e.g. responding twice)
    #[error("Request error: {message}")]
    Request {
        /// Details
        message: String,
    },

    /// Authorization grant violation
    #[error("Authorization error: {message}")]
    Authorization {
        /// Details
        message: String,
    },
}

impl Error {
    /// Shorthand for a [`Error::Forbidden`] with the given reason.
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// HTTP status class for this error.
    ///
    /// Validation failures are 422, missing entities 404, policy denials 403,
    /// rule conflicts 409 and infrastructure failures 500.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 422,
            Self::NotFound { .. } => 404,
            Self::Forbidden { .. } => 403,
            Self::User { .. }
            | Self::Company { .. }
            | Self::Project { .. }
            | Self::Session { .. }
            | Self::Skill { .. }
            | Self::Level { .. }
            | Self::Job { .. }
            | Self::Relation { .. }
            | Self::Request { .. }
            | Self::Authorization { .. } => 409,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) => 500,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::validation("name required").status_code(), 422);
        assert_eq!(
            Error::NotFound {
                entity: "company",
                id: 4
            }
            .status_code(),
            404
        );
        assert_eq!(Error::forbidden("not an official").status_code(), 403);
        assert_eq!(
            Error::Request {
                message: "already answered".to_string()
            }
            .status_code(),
            409
        );
        assert_eq!(
            Error::Database(DbErr::Custom("boom".to_string())).status_code(),
            500
        );
    }

    #[test]
    fn test_display_includes_entity() {
        let err = Error::NotFound {
            entity: "project",
            id: 12,
        };
        assert_eq!(err.to_string(), "project with id 12 not found");
    }
}
