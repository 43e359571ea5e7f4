//! Wire models for the remote calendar service

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Timezone-qualified event boundary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    /// RFC 3339 timestamp with offset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<FixedOffset>>,
    /// IANA timezone name, e.g. "America/Los_Angeles"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    /// Create an event boundary at the given instant
    pub fn at(date_time: DateTime<FixedOffset>, time_zone: Option<String>) -> Self {
        Self {
            date_time: Some(date_time),
            time_zone,
        }
    }

    /// The instant in UTC, if set
    pub fn as_utc(&self) -> Option<DateTime<Utc>> {
        self.date_time.map(|dt| dt.with_timezone(&Utc))
    }
}

/// Event as returned by the calendar service
///
/// The `id` is assigned by the provider on creation and never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    /// Provider-assigned identifier
    pub id: String,
    /// Event title
    #[serde(default)]
    pub summary: String,
    /// Display link to the event in the provider's UI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    /// Event start
    #[serde(default)]
    pub start: EventTime,
    /// Event end
    #[serde(default)]
    pub end: EventTime,
}

impl CalendarEvent {
    /// Start instant in UTC, if the provider supplied one
    pub fn start_utc(&self) -> Option<DateTime<Utc>> {
        self.start.as_utc()
    }

    /// End instant in UTC, if the provider supplied one
    pub fn end_utc(&self) -> Option<DateTime<Utc>> {
        self.end.as_utc()
    }

    /// Something clickable to show the user: the display link when the
    /// provider gave one, the bare id otherwise
    pub fn display_link(&self) -> &str {
        self.html_link.as_deref().unwrap_or(&self.id)
    }
}

/// Event payload for insert/update calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    /// Event title
    pub summary: String,
    /// Event start
    pub start: EventTime,
    /// Event end
    pub end: EventTime,
}

/// One page of an event listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventsPage {
    #[serde(default)]
    pub items: Vec<CalendarEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_deserializes_provider_fields() {
        let json = r#"{
            "id": "abc123",
            "summary": "Standup",
            "htmlLink": "https://calendar.example.com/event?eid=abc123",
            "start": {"dateTime": "2024-06-01T15:00:00-07:00", "timeZone": "America/Los_Angeles"},
            "end": {"dateTime": "2024-06-01T15:30:00-07:00"}
        }"#;

        let event: CalendarEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.id, "abc123");
        assert_eq!(event.summary, "Standup");
        assert_eq!(
            event.display_link(),
            "https://calendar.example.com/event?eid=abc123"
        );
        assert!(event.start_utc().unwrap() < event.end_utc().unwrap());
    }

    #[test]
    fn test_display_link_falls_back_to_id() {
        let event: CalendarEvent = serde_json::from_str(r#"{"id": "abc123"}"#).unwrap();
        assert_eq!(event.display_link(), "abc123");
        assert!(event.start_utc().is_none());
    }

    #[test]
    fn test_draft_serializes_camel_case_times() {
        let start: DateTime<FixedOffset> = "2024-06-01T15:00:00-07:00".parse().unwrap();
        let end: DateTime<FixedOffset> = "2024-06-01T16:00:00-07:00".parse().unwrap();
        let draft = EventDraft {
            summary: "Sync".to_string(),
            start: EventTime::at(start, Some("America/Los_Angeles".to_string())),
            end: EventTime::at(end, None),
        };

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["start"]["timeZone"], "America/Los_Angeles");
        assert!(json["start"]["dateTime"].is_string());
        assert!(json["end"].get("timeZone").is_none());
    }

    #[test]
    fn test_events_page_defaults_to_empty() {
        let page: EventsPage = serde_json::from_str("{}").unwrap();
        assert!(page.items.is_empty());
    }
}
