//! cal-api: HTTP API for the Calendar Gateway
//!
//! REST surface for the chat flow: translate a request, follow its
//! progress, confirm or cancel a pending booking. Built with axum.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{AppState, start_server};
