use std::io;
use thiserror::Error;

use crate::actors::messages::ActorError;

/// Application-wide error type, consolidating all possible errors into a single enum.
#[derive(Debug, Error)]
pub enum AppError {
    /// Represents errors originating from the database, typically from `sqlx`.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents database migration failures at startup.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Represents errors from the hosted model collaborator.
    #[error("Actor error: {0}")]
    Actor(#[from] ActorError),

    /// Represents data validation errors (e.g., invalid input format).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Represents configuration-related errors (e.g., malformed environment variables).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Represents a lookup of a report that does not exist or was deleted.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Represents errors from operations that did not complete in time.
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout(format!("Operation timed out: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON error: {}", err))
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(format!("URL parse error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation errors: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Actor(ActorError::LlmError(format!("HTTP error: {}", err)))
    }
}
