//! Relay participants
//!
//! Two long-lived participants talk over the message relay: the calendar
//! agent decides whether a mutation is safe and performs it, the frontend
//! agent surfaces outcomes to the user and parks pending confirmations.

mod calendar;
mod frontend;

pub use calendar::CalendarAgent;
pub use frontend::{FrontendAgent, Transcript};

/// Participant name of the calendar agent
pub const CALENDAR_PARTICIPANT: &str = "calendar";

/// Participant name of the frontend agent
pub const FRONTEND_PARTICIPANT: &str = "frontend";
