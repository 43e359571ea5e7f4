//! Calendar agent: runs the intent machine over its inbox

use std::sync::Arc;

use tracing::{info, warn};

use cal_relay::{Inbox, MessageRelay};

use super::CALENDAR_PARTICIPANT;
use crate::intent::{Intent, IntentMachine};

/// Relay participant that owns the intent state machine
///
/// Envelopes are handled to completion one at a time, so intents from the
/// same source never interleave; each outcome goes back to whoever sent
/// the request.
pub struct CalendarAgent {
    machine: Arc<IntentMachine>,
    relay: Arc<MessageRelay<Intent>>,
    inbox: Inbox<Intent>,
}

impl CalendarAgent {
    pub fn new(
        machine: Arc<IntentMachine>,
        relay: Arc<MessageRelay<Intent>>,
        inbox: Inbox<Intent>,
    ) -> Self {
        Self {
            machine,
            relay,
            inbox,
        }
    }

    /// Drain the inbox until the relay shuts down
    pub async fn run(mut self) {
        info!("Calendar agent started");

        while let Some(envelope) = self.inbox.recv().await {
            let reply_to = envelope.sender.clone();
            let outcome = self.machine.handle(envelope.message).await;

            if let Err(e) = self.relay.send(CALENDAR_PARTICIPANT, &reply_to, outcome) {
                warn!("Could not deliver outcome to {}: {}", reply_to, e);
            }
        }

        info!("Calendar agent stopped");
    }
}
