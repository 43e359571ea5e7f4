//! Frontend agent: surfaces outcomes and parks pending confirmations

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{error, info};

use cal_relay::Inbox;

use crate::intent::{CheckpointStore, Intent, IntentStatus};

/// Per-session log of outcome intents, in arrival order
#[derive(Default)]
pub struct Transcript {
    entries: DashMap<String, Vec<Intent>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an outcome to its session's log
    pub fn append(&self, intent: Intent) {
        self.entries
            .entry(intent.session.clone())
            .or_default()
            .push(intent);
    }

    /// Snapshot of a session's outcomes
    pub fn for_session(&self, session: &str) -> Vec<Intent> {
        self.entries
            .get(session)
            .map(|entries| entries.value().clone())
            .unwrap_or_default()
    }
}

/// Relay participant on the user's side of the protocol
///
/// Every incoming intent lands in the transcript; a `pending` intent is
/// additionally checkpointed so the confirmation prompt survives a
/// restart of the presentation layer.
pub struct FrontendAgent {
    checkpoint: Arc<CheckpointStore>,
    transcript: Arc<Transcript>,
    inbox: Inbox<Intent>,
}

impl FrontendAgent {
    pub fn new(
        checkpoint: Arc<CheckpointStore>,
        transcript: Arc<Transcript>,
        inbox: Inbox<Intent>,
    ) -> Self {
        Self {
            checkpoint,
            transcript,
            inbox,
        }
    }

    /// Drain the inbox until the relay shuts down
    pub async fn run(mut self) {
        info!("Frontend agent started");

        while let Some(envelope) = self.inbox.recv().await {
            let intent = envelope.message;
            info!(
                "Response for session {}: {}",
                intent.session,
                intent.message.as_deref().unwrap_or("")
            );

            if intent.status == IntentStatus::Pending {
                info!("Awaiting user confirmation for session {}", intent.session);
                if let Err(e) = self.checkpoint.put(&intent) {
                    error!("Could not checkpoint pending intent: {}", e);
                }
            }

            self.transcript.append(intent);
        }

        info!("Frontend agent stopped");
    }
}
