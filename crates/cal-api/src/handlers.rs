//! HTTP API handlers
//!
//! Request handlers for the chat flow, the inbound participant endpoint,
//! and the pending-confirmation lifecycle.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use cal_core::credentials::CredentialRef;
use cal_core::intent::{Intent, IntentOp, IntentStatus};
use cal_core::{CALENDAR_PARTICIPANT, FRONTEND_PARTICIPANT};
use cal_relay::Envelope;

use crate::server::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Chat request payload
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// User message in natural language
    pub message: String,
    /// Session ID for conversation continuity
    pub session: Option<String>,
    /// Token material to act on the user's behalf
    pub credentials: Option<CredentialRef>,
}

/// Chat response payload
///
/// Acknowledges that the request was dispatched; the outcome arrives
/// asynchronously in the session transcript.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Session ID (for subsequent requests)
    pub session: String,
    /// Correlation id of the dispatched intent, if one was produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Immediate feedback for the user
    pub reply: String,
}

/// Confirmation request payload (`{}` when no credentials ride along)
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    /// Token material to attach before committing
    #[serde(default)]
    pub credentials: Option<CredentialRef>,
}

/// Confirmation/cancellation acknowledgment
#[derive(Debug, Serialize)]
pub struct PendingActionResponse {
    pub session: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub status: String,
}

/// Inbound message acknowledgment (receipt only, not processing)
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub delivered: bool,
}

/// Generic API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn internal_error(error: impl std::fmt::Display) -> HandlerError {
    error!("Request failed: {}", error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

fn not_found(error: impl Into<String>) -> HandlerError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

/// Immediate feedback while the calendar agent works
fn acknowledgment_for(operation: IntentOp) -> &'static str {
    match operation {
        IntentOp::Create => "Checking your calendar for conflicts...",
        IntentOp::Read => "Fetching your calendar events...",
        IntentOp::Update => "Updating the event...",
        IntentOp::Delete => "Deleting the event...",
    }
}

// ============================================================================
// Handler functions
// ============================================================================

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Chat endpoint - translate free text and dispatch the intent
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, HandlerError> {
    let session = req
        .session
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    debug!("Chat request for session {}", session);

    match state.translator.translate(&session, &req.message).await {
        Ok(mut intent) => {
            intent.credential_ref = req.credentials;
            let correlation_id = intent.correlation_id.clone();
            let reply = acknowledgment_for(intent.operation);

            state
                .relay
                .send(FRONTEND_PARTICIPANT, CALENDAR_PARTICIPANT, intent)
                .map_err(internal_error)?;

            Ok(Json(ChatResponse {
                session,
                correlation_id: Some(correlation_id),
                reply: reply.to_string(),
            }))
        }
        Err(e) => {
            // Translation failures surface as chat messages like every
            // other outcome; the transport call itself still succeeds
            warn!("Translation failed for session {}: {}", session, e);
            let failed = Intent::proposal(&session, IntentOp::Read).fail(&e);
            let reply = failed.message.clone().unwrap_or_default();

            state
                .relay
                .send(FRONTEND_PARTICIPANT, FRONTEND_PARTICIPANT, failed)
                .map_err(internal_error)?;

            Ok(Json(ChatResponse {
                session,
                correlation_id: None,
                reply,
            }))
        }
    }
}

/// Inbound message endpoint - deliver an intent to a participant's inbox
pub async fn submit(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(envelope): Json<Envelope<Intent>>,
) -> Result<Json<SubmitResponse>, HandlerError> {
    debug!("Inbound message: {} -> {}", envelope.sender, name);

    state
        .relay
        .send(&envelope.sender, &name, envelope.message)
        .map_err(|e| not_found(e.to_string()))?;

    Ok(Json(SubmitResponse { delivered: true }))
}

/// Session transcript - outcome intents in arrival order
pub async fn messages(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Json<Vec<Intent>> {
    Json(state.transcript.for_session(&session))
}

/// Current pending-confirmation slot for a session
pub async fn pending(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<Intent>, HandlerError> {
    match state.checkpoint.get(&session) {
        Ok(Some(intent)) => Ok(Json(intent)),
        Ok(None) => Err(not_found(format!("nothing pending for session {}", session))),
        Err(e) => Err(internal_error(e)),
    }
}

/// Confirm the pending intent: attach credentials and commit
pub async fn confirm(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<PendingActionResponse>, HandlerError> {
    let mut intent = match state.checkpoint.get(&session) {
        Ok(Some(intent)) => intent,
        Ok(None) => {
            return Err(not_found(format!("nothing pending for session {}", session)));
        }
        Err(e) => return Err(internal_error(e)),
    };

    info!("Confirming pending intent for session {}", session);

    intent.status = IntentStatus::Confirmed;
    if let Some(credentials) = req.credentials {
        intent.credential_ref = Some(credentials);
    }
    let correlation_id = intent.correlation_id.clone();

    state
        .relay
        .send(FRONTEND_PARTICIPANT, CALENDAR_PARTICIPANT, intent)
        .map_err(internal_error)?;

    if let Err(e) = state.checkpoint.delete(&session) {
        error!("Could not clear checkpoint for {}: {}", session, e);
    }

    Ok(Json(PendingActionResponse {
        session,
        correlation_id: Some(correlation_id),
        status: "confirmed".to_string(),
    }))
}

/// Cancel the pending intent: drop the checkpoint slot
pub async fn cancel(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<PendingActionResponse>, HandlerError> {
    let removed = state.checkpoint.delete(&session).map_err(internal_error)?;

    if !removed {
        return Err(not_found(format!("nothing pending for session {}", session)));
    }

    info!("Cancelled pending intent for session {}", session);

    Ok(Json(PendingActionResponse {
        session,
        correlation_id: None,
        status: "cancelled".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acknowledgment_covers_every_operation() {
        assert!(acknowledgment_for(IntentOp::Create).contains("conflict"));
        assert!(acknowledgment_for(IntentOp::Read).contains("events"));
        assert!(!acknowledgment_for(IntentOp::Update).is_empty());
        assert!(!acknowledgment_for(IntentOp::Delete).is_empty());
    }
}
