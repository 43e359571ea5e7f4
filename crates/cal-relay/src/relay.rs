//! Participant registry and message delivery

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::{RelayError, Result};

/// A message together with the participant that sent it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<M> {
    /// Name of the sending participant
    pub sender: String,
    /// The message payload, passed through unchanged
    pub message: M,
}

/// Receiving end of a participant's inbox
pub type Inbox<M> = mpsc::UnboundedReceiver<Envelope<M>>;

/// Message relay between named participants
///
/// Each registered participant owns one inbox. `send` enqueues an envelope
/// and returns as soon as the destination accepted it; the acknowledgment
/// says nothing about processing, whose outcome (if any) arrives later as
/// a separate message. A single queue per destination keeps envelopes from
/// the same sender in submission order.
pub struct MessageRelay<M> {
    inboxes: DashMap<String, mpsc::UnboundedSender<Envelope<M>>>,
}

impl<M: Send + 'static> MessageRelay<M> {
    /// Create an empty relay
    pub fn new() -> Self {
        Self {
            inboxes: DashMap::new(),
        }
    }

    /// Register a participant and return its inbox
    ///
    /// Registering a name again replaces the previous inbox; the old
    /// receiver stops getting messages.
    pub fn register(&self, name: &str) -> Inbox<M> {
        let (tx, rx) = mpsc::unbounded_channel();
        info!("Registering relay participant: {}", name);
        self.inboxes.insert(name.to_string(), tx);
        rx
    }

    /// Remove a participant; returns false if it was not registered
    pub fn unregister(&self, name: &str) -> bool {
        self.inboxes.remove(name).is_some()
    }

    /// Deliver a message to a participant's inbox
    ///
    /// Success acknowledges receipt only.
    pub fn send(&self, sender: &str, to: &str, message: M) -> Result<()> {
        let tx = self
            .inboxes
            .get(to)
            .ok_or_else(|| RelayError::UnknownParticipant(to.to_string()))?;

        debug!("Relaying message: {} -> {}", sender, to);

        tx.send(Envelope {
            sender: sender.to_string(),
            message,
        })
        .map_err(|_| RelayError::Closed(to.to_string()))
    }

    /// Whether a participant is currently registered
    pub fn is_registered(&self, name: &str) -> bool {
        self.inboxes.contains_key(name)
    }

    /// Names of all registered participants
    pub fn participants(&self) -> Vec<String> {
        self.inboxes.iter().map(|e| e.key().clone()).collect()
    }
}

impl<M: Send + 'static> Default for MessageRelay<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestMessage {
        body: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    }

    #[tokio::test]
    async fn test_send_and_receive() {
        let relay = MessageRelay::new();
        let mut inbox = relay.register("receiver");

        relay
            .send(
                "sender",
                "receiver",
                TestMessage {
                    body: "hello".to_string(),
                    note: None,
                },
            )
            .unwrap();

        let envelope = inbox.recv().await.unwrap();
        assert_eq!(envelope.sender, "sender");
        assert_eq!(envelope.message.body, "hello");
    }

    #[tokio::test]
    async fn test_fields_preserved() {
        let relay = MessageRelay::new();
        let mut inbox = relay.register("receiver");

        let message = TestMessage {
            body: "payload".to_string(),
            note: None,
        };
        relay.send("sender", "receiver", message.clone()).unwrap();

        let envelope = inbox.recv().await.unwrap();
        assert_eq!(envelope.message, message);
        // Unset optional fields stay absent on the wire, not empty strings
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json["message"].get("note").is_none());
    }

    #[tokio::test]
    async fn test_fifo_per_sender_destination_pair() {
        let relay = MessageRelay::new();
        let mut inbox = relay.register("receiver");

        for i in 0..100 {
            relay
                .send(
                    "sender",
                    "receiver",
                    TestMessage {
                        body: i.to_string(),
                        note: None,
                    },
                )
                .unwrap();
        }

        for i in 0..100 {
            let envelope = inbox.recv().await.unwrap();
            assert_eq!(envelope.message.body, i.to_string());
        }
    }

    #[tokio::test]
    async fn test_unknown_participant() {
        let relay: MessageRelay<TestMessage> = MessageRelay::new();
        let result = relay.send(
            "sender",
            "nobody",
            TestMessage {
                body: "lost".to_string(),
                note: None,
            },
        );

        assert!(matches!(result, Err(RelayError::UnknownParticipant(_))));
    }

    #[tokio::test]
    async fn test_concurrent_senders() {
        let relay = std::sync::Arc::new(MessageRelay::new());
        let mut inbox = relay.register("receiver");

        let mut handles = Vec::new();
        for s in 0..4 {
            let relay = relay.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..25 {
                    relay
                        .send(
                            &format!("sender-{}", s),
                            "receiver",
                            TestMessage {
                                body: format!("{}:{}", s, i),
                                note: None,
                            },
                        )
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // All 100 arrive, and each sender's own messages stay in order
        let mut last_seen = std::collections::HashMap::new();
        for _ in 0..100 {
            let envelope = inbox.recv().await.unwrap();
            let (s, i) = envelope.message.body.split_once(':').unwrap();
            let i: u32 = i.parse().unwrap();
            if let Some(prev) = last_seen.insert(s.to_string(), i) {
                assert!(i > prev, "out of order for {}", s);
            }
        }
    }

    #[tokio::test]
    async fn test_unregister() {
        let relay: MessageRelay<TestMessage> = MessageRelay::new();
        let _inbox = relay.register("receiver");

        assert!(relay.is_registered("receiver"));
        assert!(relay.unregister("receiver"));
        assert!(!relay.is_registered("receiver"));
        assert!(!relay.unregister("receiver"));
    }
}
