//! Error types for Claix
//!
//! Collaborator failures (generation backend, shell interpreter, session
//! storage, terminal I/O) are errors. A command that runs and exits nonzero is
//! not: it is an [`ExecutionResult`](crate::types::ExecutionResult).

use thiserror::Error;

/// Main error type for Claix
#[derive(Error, Debug)]
pub enum ClaixError {
    /// State machine received an event its current phase does not accept
    #[error("Invalid transition from {from} on {event}: {reason}")]
    InvalidTransition {
        from: String,
        event: String,
        reason: String,
    },

    /// Generation backend (transport, auth, run failure, bad payload)
    #[error("Generation backend error: {0}")]
    Generation(String),

    /// Generation run did not finish in time
    #[error("Generation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The shell interpreter itself could not be run
    #[error("Shell execution error: {0}")]
    Execution(String),

    /// Session cache errors
    #[error("Session store error: {0}")]
    SessionStore(String),

    /// Interactive prompt errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Missing API credential
    #[error("OPENAI_API_KEY environment variable is necessary to use Claix.")]
    MissingCredential,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for Claix operations
pub type Result<T> = std::result::Result<T, ClaixError>;

impl From<rustyline::error::ReadlineError> for ClaixError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        ClaixError::Prompt(err.to_string())
    }
}
