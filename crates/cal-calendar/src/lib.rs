//! cal-calendar: Remote calendar service client for cal-gateway
//!
//! Talks to a Google-Calendar-shaped REST API on behalf of one user at a
//! time: list events in a window, insert, update, and delete. The
//! [`CalendarApi`] trait is the seam the intent state machine programs
//! against, so tests can substitute an in-memory calendar.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cal_calendar::{CalendarApi, EventDraft, EventTime, RemoteCalendar};
//!
//! let calendar = RemoteCalendar::new("https://www.googleapis.com/calendar/v3", "primary")?;
//!
//! // List events overlapping a window
//! let events = calendar
//!     .list_events(token, start, Some(end), 250)
//!     .await?;
//!
//! // Insert an event
//! let created = calendar.insert_event(token, &draft).await?;
//! println!("booked: {}", created.display_link());
//! ```

pub mod client;
pub mod error;
pub mod models;

pub use client::{CalendarApi, RemoteCalendar};
pub use error::{CalendarError, Result};
pub use models::{CalendarEvent, EventDraft, EventTime, EventsPage};
