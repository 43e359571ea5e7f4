//! LLM HTTP client for intent translation
//!
//! Supports both the Claude API and OpenAI-compatible APIs (GLM, etc.)

use reqwest::Client;
use tracing::{debug, warn};

use crate::config::{CalendarConfig, Config, LlmProvider};
use crate::error::{Error, Result};
use crate::intent::Intent;

use super::types::*;

/// Translator backed by an LLM chat endpoint
#[derive(Clone)]
pub struct TranslatorClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    provider: LlmProvider,
    calendar: CalendarConfig,
}

impl TranslatorClient {
    /// Create a new translator client
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(Error::Http)?;

        // Determine base URL based on provider
        let base_url = match &config.llm.base_url {
            Some(url) => url.clone(),
            None => match config.llm.provider {
                LlmProvider::Claude => "https://api.anthropic.com/v1".to_string(),
                LlmProvider::OpenAi => "https://api.openai.com/v1".to_string(),
            },
        };

        Ok(Self {
            client,
            api_key: config.llm.api_key.clone(),
            model: config.llm.model.clone(),
            base_url,
            provider: config.llm.provider.clone(),
            calendar: config.calendar.clone(),
        })
    }

    /// Create with custom base URL (for testing or custom endpoints)
    pub fn with_base_url(config: &Config, base_url: String) -> Result<Self> {
        let mut client = Self::new(config)?;
        client.base_url = base_url;
        Ok(client)
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Translate free text into a structured intent proposal
    pub async fn translate(&self, session: &str, text: &str) -> Result<Intent> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: 1024,
            system: Some(self.instruction()),
            messages: vec![ChatMessage::user(text)],
        };

        let reply = match self.provider {
            LlmProvider::Claude => self.send_claude_request(request).await?,
            LlmProvider::OpenAi => self.send_openai_request(request).await?,
        };

        let json = extract_json(&reply)
            .ok_or_else(|| Error::Translation("model reply contained no JSON object".to_string()))?;

        let draft: IntentDraft = serde_json::from_str(json)
            .map_err(|e| Error::Translation(format!("could not parse model reply: {}", e)))?;

        Ok(self.intent_from_draft(session, draft))
    }

    /// The fixed schema instruction sent with every translation request
    fn instruction(&self) -> String {
        format!(
            "You are a calendar assistant that converts natural language into \
             structured calendar intents. Extract the relevant details and respond \
             with a single JSON object with these fields:\n\
             - operation: one of \"create\", \"read\", \"update\", \"delete\"\n\
             - title: event title/summary\n\
             - start_time: ISO 8601 datetime with timezone offset\n\
             - end_time: ISO 8601 datetime with timezone offset\n\
             - event_id: for update/delete operations\n\
             Assume events are {} minutes long unless specified. \
             Use the {} timezone unless otherwise specified. \
             Respond with the JSON object only.",
            self.calendar.default_duration_minutes, self.calendar.time_zone
        )
    }

    fn intent_from_draft(&self, session: &str, draft: IntentDraft) -> Intent {
        let mut intent = Intent::proposal(session, draft.operation);
        intent.title = draft.title;
        intent.start_time = draft.start_time;
        intent.event_id = draft.event_id;
        // Default event length when the model only produced a start
        intent.end_time = draft.end_time.or_else(|| {
            draft.start_time.map(|start| {
                start + chrono::Duration::minutes(self.calendar.default_duration_minutes as i64)
            })
        });
        intent
    }

    /// Send request to the Claude API
    async fn send_claude_request(&self, request: MessagesRequest) -> Result<String> {
        let url = format!("{}/messages", self.base_url);

        debug!("Sending translation request to Claude API: {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::Http)?;

        if !status.is_success() {
            warn!("Claude API error: {} - {}", status, body);
            return Err(Error::Translation(format!("{}: {}", status, body)));
        }

        let parsed: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Translation(format!("failed to parse response: {}", e)))?;

        Ok(parsed.text())
    }

    /// Send request to an OpenAI-compatible API
    async fn send_openai_request(&self, request: MessagesRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!("Sending translation request to OpenAI-compatible API: {}", url);

        let openai_request = ChatCompletionRequest::from_messages_request(&request);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&openai_request)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::Http)?;

        if !status.is_success() {
            warn!("OpenAI API error: {} - {}", status, body);
            return Err(Error::Translation(format!("{}: {}", status, body)));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Translation(format!("failed to parse response: {}", e)))?;

        Ok(parsed.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{IntentOp, IntentStatus};

    fn test_config() -> Config {
        let mut config = Config::default();
        config.llm.api_key = "test-key".to_string();
        config
    }

    #[test]
    fn test_instruction_names_defaults() {
        let translator = TranslatorClient::new(&test_config()).unwrap();
        let instruction = translator.instruction();
        assert!(instruction.contains("60 minutes"));
        assert!(instruction.contains("America/Los_Angeles"));
    }

    #[test]
    fn test_draft_becomes_unset_proposal() {
        let translator = TranslatorClient::new(&test_config()).unwrap();
        let draft: IntentDraft = serde_json::from_str(
            r#"{"operation": "create", "title": "Sync",
                "start_time": "2024-06-01T15:00:00-07:00",
                "end_time": "2024-06-01T16:00:00-07:00"}"#,
        )
        .unwrap();

        let intent = translator.intent_from_draft("session-1", draft);
        assert_eq!(intent.operation, IntentOp::Create);
        assert_eq!(intent.status, IntentStatus::Unset);
        assert_eq!(intent.session, "session-1");
        assert!(!intent.correlation_id.is_empty());
    }

    #[test]
    fn test_missing_end_time_defaults_to_configured_duration() {
        let translator = TranslatorClient::new(&test_config()).unwrap();
        let draft: IntentDraft = serde_json::from_str(
            r#"{"operation": "create", "title": "Sync",
                "start_time": "2024-06-01T15:00:00-07:00"}"#,
        )
        .unwrap();

        let intent = translator.intent_from_draft("session-1", draft);
        let start = intent.start_time.unwrap();
        let end = intent.end_time.unwrap();
        assert_eq!(end - start, chrono::Duration::minutes(60));
    }
}
