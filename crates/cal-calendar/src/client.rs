//! Remote calendar REST client

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use tracing::{debug, error, info};

use crate::error::{CalendarError, Result};
use crate::models::{CalendarEvent, EventDraft, EventsPage};

/// Calendar operations the gateway needs
///
/// Listing returns events overlapping the window, ordered by start time
/// ascending; callers consume the first page only.
#[async_trait]
pub trait CalendarApi: Send + Sync {
    /// List events overlapping `[time_min, time_max]`
    async fn list_events(
        &self,
        token: &str,
        time_min: DateTime<Utc>,
        time_max: Option<DateTime<Utc>>,
        max_results: u32,
    ) -> Result<Vec<CalendarEvent>>;

    /// Insert a new event; the provider assigns the id and display link
    async fn insert_event(&self, token: &str, draft: &EventDraft) -> Result<CalendarEvent>;

    /// Replace an existing event
    async fn update_event(
        &self,
        token: &str,
        event_id: &str,
        draft: &EventDraft,
    ) -> Result<CalendarEvent>;

    /// Delete an event
    async fn delete_event(&self, token: &str, event_id: &str) -> Result<()>;
}

/// REST client for a Google-Calendar-shaped events API
pub struct RemoteCalendar {
    client: Client,
    base_url: String,
    calendar_id: String,
}

impl RemoteCalendar {
    /// Create a new client against the given API base URL and calendar
    pub fn new(base_url: impl Into<String>, calendar_id: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| CalendarError::Configuration(e.to_string()))?;

        let base_url: String = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();

        info!("Calendar client initialized for: {}", base_url);

        Ok(Self {
            client,
            base_url,
            calendar_id: calendar_id.into(),
        })
    }

    fn events_url(&self) -> String {
        format!("{}/calendars/{}/events", self.base_url, self.calendar_id)
    }

    /// Map a non-2xx response to a service error carrying the body verbatim
    async fn service_error(response: reqwest::Response) -> CalendarError {
        let status = response.status();
        let message = response.text().await.unwrap_or_default();
        error!("Calendar request failed: {} - {}", status, message);
        CalendarError::Service {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl CalendarApi for RemoteCalendar {
    async fn list_events(
        &self,
        token: &str,
        time_min: DateTime<Utc>,
        time_max: Option<DateTime<Utc>>,
        max_results: u32,
    ) -> Result<Vec<CalendarEvent>> {
        let url = self.events_url();

        let mut query = vec![
            (
                "timeMin",
                time_min.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            ("maxResults", max_results.to_string()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];
        if let Some(time_max) = time_max {
            query.push((
                "timeMax",
                time_max.to_rfc3339_opts(SecondsFormat::Secs, true),
            ));
        }

        debug!("Listing events: {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&query)
            .send()
            .await
            .map_err(|e| CalendarError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }

        let page: EventsPage = response
            .json()
            .await
            .map_err(|e| CalendarError::Parse(e.to_string()))?;

        info!("Fetched {} events", page.items.len());
        Ok(page.items)
    }

    async fn insert_event(&self, token: &str, draft: &EventDraft) -> Result<CalendarEvent> {
        let url = self.events_url();

        debug!("Inserting event: {}", draft.summary);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(draft)
            .send()
            .await
            .map_err(|e| CalendarError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }

        let created: CalendarEvent = response
            .json()
            .await
            .map_err(|e| CalendarError::Parse(e.to_string()))?;

        info!("Created event: {}", created.id);
        Ok(created)
    }

    async fn update_event(
        &self,
        token: &str,
        event_id: &str,
        draft: &EventDraft,
    ) -> Result<CalendarEvent> {
        let url = format!("{}/{}", self.events_url(), event_id);

        debug!("Updating event: {}", event_id);

        let response = self
            .client
            .put(&url)
            .bearer_auth(token)
            .json(draft)
            .send()
            .await
            .map_err(|e| CalendarError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }

        let updated: CalendarEvent = response
            .json()
            .await
            .map_err(|e| CalendarError::Parse(e.to_string()))?;

        info!("Updated event: {}", updated.id);
        Ok(updated)
    }

    async fn delete_event(&self, token: &str, event_id: &str) -> Result<()> {
        let url = format!("{}/{}", self.events_url(), event_id);

        debug!("Deleting event: {}", event_id);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CalendarError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::service_error(response).await);
        }

        info!("Deleted event: {}", event_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_url_strips_trailing_slash() {
        let calendar = RemoteCalendar::new("https://api.example.com/v3/", "primary").unwrap();
        assert_eq!(
            calendar.events_url(),
            "https://api.example.com/v3/calendars/primary/events"
        );
    }

    #[test]
    fn test_service_error_display() {
        let err = CalendarError::Service {
            status: 404,
            message: "Not Found".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("404"));
        assert!(text.contains("Not Found"));
    }
}
