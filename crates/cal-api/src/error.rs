//! Error types for cal-api

use thiserror::Error;

/// cal-api error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Authentication failed")]
    AuthFailed,

    #[error("Nothing pending for session: {0}")]
    NothingPending(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Core error: {0}")]
    Core(#[from] cal_core::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;
