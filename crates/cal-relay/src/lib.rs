//! cal-relay: In-process message relay for cal-gateway
//!
//! Delivers messages between named participants over per-participant
//! inboxes. Delivery is asynchronous (the sender never waits for the
//! receiver to process), preserves every field of the message untouched,
//! and keeps FIFO order per sender→destination pair.

pub mod error;
pub mod relay;

pub use error::{RelayError, Result};
pub use relay::{Envelope, Inbox, MessageRelay};
