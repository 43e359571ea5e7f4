//! Intent confirmation state machine
//!
//! Owns one calendar-mutation request from proposal through conflict
//! check to commit or abort. A proposed create is checked against
//! existing events and parked as `pending` until the user confirms;
//! only the confirmed re-entry performs the insert. Reads, updates and
//! deletes forward directly. Every failure folds into a terminal
//! `failed` intent; nothing is retried.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info, warn};

use cal_calendar::{CalendarApi, CalendarEvent, EventDraft, EventTime};

use crate::config::CalendarConfig;
use crate::credentials::CredentialProvider;
use crate::error::{Error, Result};
use crate::intent::{Intent, IntentOp, IntentStatus};

/// Events fetched per conflict-check query; first page only
const CONFLICT_PAGE_SIZE: u32 = 50;

/// The intent confirmation state machine
pub struct IntentMachine {
    calendar: Arc<dyn CalendarApi>,
    credentials: Arc<dyn CredentialProvider>,
    config: CalendarConfig,
    /// Correlation ids whose create has already been committed; a second
    /// confirmation of the same proposal must not insert again
    committed: Mutex<HashSet<String>>,
}

impl IntentMachine {
    pub fn new(
        calendar: Arc<dyn CalendarApi>,
        credentials: Arc<dyn CredentialProvider>,
        config: CalendarConfig,
    ) -> Self {
        Self {
            calendar,
            credentials,
            config,
            committed: Mutex::new(HashSet::new()),
        }
    }

    /// Advance an intent one step and return the outcome
    ///
    /// Never fails outward: every error becomes `status = failed` with a
    /// human-readable message, delivered like any other outcome.
    pub async fn handle(&self, intent: Intent) -> Intent {
        debug!(
            "Handling intent: {:?} ({:?}) for session {}",
            intent.operation, intent.status, intent.session
        );

        if let Err(e) = intent.validate() {
            warn!("Intent rejected: {}", e);
            return intent.fail(&e);
        }

        match intent.operation {
            IntentOp::Create => self.handle_create(intent).await,
            IntentOp::Read => self.handle_read(intent).await,
            IntentOp::Update => self.handle_update(intent).await,
            IntentOp::Delete => self.handle_delete(intent).await,
        }
    }

    async fn handle_create(&self, intent: Intent) -> Intent {
        match intent.status {
            IntentStatus::Committed => intent.resolve(
                IntentStatus::Committed,
                "This event is already booked; nothing to confirm.",
            ),
            IntentStatus::Confirmed => self.commit_create(intent).await,
            _ => self.check_conflicts(intent).await,
        }
    }

    /// Conflict check: list events overlapping the proposed window
    async fn check_conflicts(&self, intent: Intent) -> Intent {
        let token = match self.token(&intent).await {
            Ok(token) => token,
            Err(e) => return intent.fail(&e),
        };

        match self.overlapping_event(&token, &intent).await {
            Ok(Some(existing)) => {
                info!("Conflict found for session {}", intent.session);
                let message = format!(
                    "Conflict: \"{}\" is already scheduled in that time slot.",
                    existing.summary
                );
                intent.resolve(IntentStatus::Conflict, message)
            }
            Ok(None) => intent.resolve(
                IntentStatus::Pending,
                "No conflicts found. Please confirm to book this event.",
            ),
            Err(e) => intent.fail(&e),
        }
    }

    /// Commit a confirmed create: at most one insert per correlation id
    async fn commit_create(&self, intent: Intent) -> Intent {
        if self.already_committed(&intent.correlation_id) {
            info!(
                "Duplicate confirmation ignored for {}",
                intent.correlation_id
            );
            return intent.resolve(
                IntentStatus::Committed,
                "This event is already booked; duplicate confirmation ignored.",
            );
        }

        let token = match self.token(&intent).await {
            Ok(token) => token,
            Err(e) => return intent.fail(&e),
        };

        // Confirmation normally re-validates; with reverify_on_confirm off
        // it is an explicit override of the earlier check instead.
        if self.config.reverify_on_confirm {
            match self.overlapping_event(&token, &intent).await {
                Ok(Some(existing)) => {
                    let message = format!(
                        "Conflict: \"{}\" was booked while this event awaited confirmation.",
                        existing.summary
                    );
                    return intent.resolve(IntentStatus::Conflict, message);
                }
                Ok(None) => {}
                Err(e) => return intent.fail(&e),
            }
        }

        let draft = self.draft_from(&intent);
        match self.calendar.insert_event(&token, &draft).await {
            Ok(created) => {
                self.committed
                    .lock()
                    .unwrap()
                    .insert(intent.correlation_id.clone());
                info!("Committed event {} for {}", created.id, intent.session);
                let message = format!("Event created: {}", created.display_link());
                intent.resolve(IntentStatus::Committed, message)
            }
            Err(e) => intent.fail(&Error::Calendar(e)),
        }
    }

    async fn handle_read(&self, intent: Intent) -> Intent {
        let token = match self.token(&intent).await {
            Ok(token) => token,
            Err(e) => return intent.fail(&e),
        };

        let events = match self
            .calendar
            .list_events(&token, Utc::now(), None, self.config.upcoming_limit)
            .await
        {
            Ok(events) => events,
            Err(e) => return intent.fail(&Error::Calendar(e)),
        };

        if events.is_empty() {
            return intent.resolve(IntentStatus::Committed, "No upcoming events.");
        }

        let lines: Vec<String> = events
            .iter()
            .map(|event| match event.start.date_time {
                Some(start) => format!("{} at {}", event.summary, start.to_rfc3339()),
                None => event.summary.clone(),
            })
            .collect();
        intent.resolve(IntentStatus::Committed, lines.join("\n"))
    }

    async fn handle_update(&self, intent: Intent) -> Intent {
        let token = match self.token(&intent).await {
            Ok(token) => token,
            Err(e) => return intent.fail(&e),
        };

        let draft = self.draft_from(&intent);
        let event_id = intent.event_id.clone().unwrap_or_default();
        match self.calendar.update_event(&token, &event_id, &draft).await {
            Ok(updated) => {
                let message = format!("Event updated: {}", updated.display_link());
                intent.resolve(IntentStatus::Committed, message)
            }
            Err(e) => intent.fail(&Error::Calendar(e)),
        }
    }

    async fn handle_delete(&self, intent: Intent) -> Intent {
        let token = match self.token(&intent).await {
            Ok(token) => token,
            Err(e) => return intent.fail(&e),
        };

        let event_id = intent.event_id.clone().unwrap_or_default();
        match self.calendar.delete_event(&token, &event_id).await {
            Ok(()) => intent.resolve(IntentStatus::Committed, "Event deleted."),
            Err(e) => intent.fail(&Error::Calendar(e)),
        }
    }

    /// First event overlapping the intent's window, if any
    async fn overlapping_event(&self, token: &str, intent: &Intent) -> Result<Option<CalendarEvent>> {
        // validate() guarantees the window for create intents
        let time_min = intent.start_time.unwrap().with_timezone(&Utc);
        let time_max = intent.end_time.unwrap().with_timezone(&Utc);

        let events = self
            .calendar
            .list_events(token, time_min, Some(time_max), CONFLICT_PAGE_SIZE)
            .await?;

        Ok(events.into_iter().next())
    }

    fn draft_from(&self, intent: &Intent) -> EventDraft {
        let time_zone = Some(self.config.time_zone.clone());
        EventDraft {
            summary: intent.title.clone().unwrap_or_default(),
            start: EventTime::at(intent.start_time.unwrap(), time_zone.clone()),
            end: EventTime::at(intent.end_time.unwrap(), time_zone),
        }
    }

    async fn token(&self, intent: &Intent) -> Result<String> {
        let credentials = intent.credential_ref.as_ref().ok_or_else(|| {
            Error::Credential("no credentials attached to this request".to_string())
        })?;
        self.credentials.get_valid_token(credentials).await
    }

    fn already_committed(&self, correlation_id: &str) -> bool {
        self.committed.lock().unwrap().contains(correlation_id)
    }
}
