//! Error types for cal-calendar

use thiserror::Error;

/// cal-calendar error type
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Remote calendar rejected the request; message carries the
    /// provider's response body verbatim
    #[error("Calendar service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Response parsing error: {0}")]
    Parse(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CalendarError>;
