//! Intent record and its closed enums

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::credentials::CredentialRef;
use crate::error::{Error, Result};

/// Calendar operation requested by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentOp {
    #[serde(alias = "create_event")]
    Create,
    #[serde(alias = "read_events")]
    Read,
    #[serde(alias = "update_event")]
    Update,
    #[serde(alias = "delete_event")]
    Delete,
}

/// Approval state of an intent
///
/// Transitions move forward only: `unset` → `pending`/`conflict`/
/// `confirmed` → `committed`/`failed`. Nothing re-enters `unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    /// Fresh from the translator, nothing decided yet
    #[default]
    Unset,
    /// Conflict check passed; awaiting user confirmation
    Pending,
    /// Overlapping event found; needs a different slot
    Conflict,
    /// User approved; ready to commit
    Confirmed,
    /// Remote mutation performed
    Committed,
    /// Terminal failure; `message` says what went wrong
    Failed,
}

/// A structured calendar request and its approval state
///
/// Produced by the translator with `status = unset`, evolved by the
/// intent machine, and discarded once committed, failed, or cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// Generated at first proposal; ties every later message (pending
    /// checkpoint, confirmation, outcome) back to this request
    pub correlation_id: String,

    /// Originating user session
    pub session: String,

    /// Requested operation
    pub operation: IntentOp,

    /// Event title (create/update)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Event start (create/update)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<FixedOffset>>,

    /// Event end (create/update)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<FixedOffset>>,

    /// Provider-assigned event identifier (update/delete)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,

    /// Approval state
    #[serde(default)]
    pub status: IntentStatus,

    /// Human-readable outcome, overwritten at each transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Token material for acting on the user's behalf
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_ref: Option<CredentialRef>,
}

impl Intent {
    /// Create a fresh proposal with a new correlation id
    pub fn proposal(session: impl Into<String>, operation: IntentOp) -> Self {
        Self {
            correlation_id: uuid::Uuid::new_v4().to_string(),
            session: session.into(),
            operation,
            title: None,
            start_time: None,
            end_time: None,
            event_id: None,
            status: IntentStatus::Unset,
            message: None,
            credential_ref: None,
        }
    }

    /// Check the fields required by this intent's operation
    pub fn validate(&self) -> Result<()> {
        match self.operation {
            IntentOp::Create => self.require_event_window()?,
            IntentOp::Update => {
                self.require_event_window()?;
                self.require_event_id()?;
            }
            IntentOp::Delete => self.require_event_id()?,
            IntentOp::Read => {}
        }
        Ok(())
    }

    fn require_event_window(&self) -> Result<()> {
        if self.title.as_deref().unwrap_or("").is_empty() {
            return Err(Error::Validation("missing event title".to_string()));
        }
        let (Some(start), Some(end)) = (self.start_time, self.end_time) else {
            return Err(Error::Validation(
                "missing event start or end time".to_string(),
            ));
        };
        if end <= start {
            return Err(Error::Validation(
                "event end time must be after its start time".to_string(),
            ));
        }
        Ok(())
    }

    fn require_event_id(&self) -> Result<()> {
        if self.event_id.as_deref().unwrap_or("").is_empty() {
            return Err(Error::Validation("missing event id".to_string()));
        }
        Ok(())
    }

    /// Record a transition outcome
    pub fn resolve(mut self, status: IntentStatus, message: impl Into<String>) -> Self {
        self.status = status;
        self.message = Some(message.into());
        self
    }

    /// Fold an error into a terminal failed intent
    pub fn fail(self, error: &Error) -> Self {
        self.resolve(IntentStatus::Failed, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_intent() -> Intent {
        let mut intent = Intent::proposal("session-1", IntentOp::Create);
        intent.title = Some("Sync".to_string());
        intent.start_time = Some("2024-06-01T15:00:00-07:00".parse().unwrap());
        intent.end_time = Some("2024-06-01T16:00:00-07:00".parse().unwrap());
        intent
    }

    #[test]
    fn test_proposal_starts_unset_with_fresh_correlation() {
        let a = Intent::proposal("s", IntentOp::Read);
        let b = Intent::proposal("s", IntentOp::Read);
        assert_eq!(a.status, IntentStatus::Unset);
        assert_ne!(a.correlation_id, b.correlation_id);
    }

    #[test]
    fn test_create_requires_title_and_window() {
        let intent = create_intent();
        assert!(intent.validate().is_ok());

        let mut missing_title = create_intent();
        missing_title.title = None;
        assert!(missing_title.validate().is_err());

        let mut missing_end = create_intent();
        missing_end.end_time = None;
        assert!(missing_end.validate().is_err());
    }

    #[test]
    fn test_create_rejects_inverted_window() {
        let mut intent = create_intent();
        intent.end_time = Some("2024-06-01T14:00:00-07:00".parse().unwrap());
        assert!(intent.validate().is_err());
    }

    #[test]
    fn test_update_requires_event_id() {
        let mut intent = create_intent();
        intent.operation = IntentOp::Update;
        assert!(intent.validate().is_err());

        intent.event_id = Some("evt-1".to_string());
        assert!(intent.validate().is_ok());
    }

    #[test]
    fn test_delete_requires_only_event_id() {
        let mut intent = Intent::proposal("s", IntentOp::Delete);
        assert!(intent.validate().is_err());

        intent.event_id = Some("evt-1".to_string());
        assert!(intent.validate().is_ok());
    }

    #[test]
    fn test_read_requires_nothing() {
        let intent = Intent::proposal("s", IntentOp::Read);
        assert!(intent.validate().is_ok());
    }

    #[test]
    fn test_status_serializes_snake_case_and_defaults_to_unset() {
        let intent = create_intent();
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["status"], "unset");
        assert_eq!(json["operation"], "create");
        // Optional fields stay absent, not empty
        assert!(json.get("event_id").is_none());
        assert!(json.get("message").is_none());

        let round: Intent = serde_json::from_value(json).unwrap();
        assert_eq!(round.status, IntentStatus::Unset);
    }

    #[test]
    fn test_operation_accepts_original_aliases() {
        let op: IntentOp = serde_json::from_str("\"create_event\"").unwrap();
        assert_eq!(op, IntentOp::Create);
        let op: IntentOp = serde_json::from_str("\"read_events\"").unwrap();
        assert_eq!(op, IntentOp::Read);
    }
}
