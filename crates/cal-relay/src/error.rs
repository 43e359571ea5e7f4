//! Error types for cal-relay

use thiserror::Error;

/// cal-relay error type
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("Inbox closed for participant: {0}")]
    Closed(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RelayError>;
