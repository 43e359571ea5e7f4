//! Configuration management
//!
//! Settings are resolved in this order of precedence:
//! 1. Environment variables
//! 2. cal-gateway.toml configuration file
//! 3. Defaults
//!
//! Inside the config file, `${VAR_NAME}` expands to the environment
//! variable's value.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Error;

/// LLM Provider type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Anthropic Claude API
    #[default]
    Claude,
    /// OpenAI-compatible API (GLM, etc.)
    OpenAi,
}

impl LlmProvider {
    fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "openai" | "glm" | "zai" | "minimax" => LlmProvider::OpenAi,
            _ => LlmProvider::Claude,
        }
    }
}

/// LLM configuration for the intent translator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key
    pub api_key: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// API provider
    #[serde(default)]
    pub provider: LlmProvider,

    /// Base URL (optional, for custom endpoints)
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            provider: LlmProvider::Claude,
            base_url: None,
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

/// Remote calendar service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// REST API base URL
    #[serde(default = "default_calendar_base_url")]
    pub base_url: String,

    /// Calendar to operate on
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    /// Timezone assumed when the user does not name one
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// OAuth token endpoint used to refresh expired access tokens
    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    /// Event length assumed when the user gives only a start time
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: u32,

    /// Re-check for conflicts when a confirmed create re-enters.
    /// `false` trusts the original conflict check and admits the race
    /// between check and confirm.
    #[serde(default = "default_reverify")]
    pub reverify_on_confirm: bool,

    /// How many upcoming events a read request returns
    #[serde(default = "default_upcoming_limit")]
    pub upcoming_limit: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            base_url: default_calendar_base_url(),
            calendar_id: default_calendar_id(),
            time_zone: default_time_zone(),
            token_uri: default_token_uri(),
            default_duration_minutes: default_duration_minutes(),
            reverify_on_confirm: default_reverify(),
            upcoming_limit: default_upcoming_limit(),
        }
    }
}

fn default_calendar_base_url() -> String {
    "https://www.googleapis.com/calendar/v3".to_string()
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_time_zone() -> String {
    "America/Los_Angeles".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_duration_minutes() -> u32 {
    60
}

fn default_reverify() -> bool {
    true
}

fn default_upcoming_limit() -> u32 {
    5
}

/// Pending-confirmation checkpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Path to SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Minutes after which an unconfirmed checkpoint expires.
    /// Unset means pending intents wait indefinitely.
    pub pending_ttl_minutes: Option<u64>,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            pending_ttl_minutes: None,
        }
    }
}

fn default_db_path() -> String {
    "data/cal-gateway.db".to_string()
}

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API key for HTTP API authentication
    pub key: Option<String>,

    /// Port for HTTP API server
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Allowed CORS origins; empty defaults to localhost only
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            port: default_api_port(),
            allowed_origins: None,
        }
    }
}

fn default_api_port() -> u16 {
    3000
}

/// Main configuration for cal-gateway
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM translator configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Remote calendar configuration
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Checkpoint store configuration
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// HTTP API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Expand `${VAR_NAME}` references to environment variable values
    ///
    /// Unknown variables expand to the empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // consume '{'

                let mut var_name = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '}' {
                        chars.next(); // consume '}'
                        break;
                    }
                    var_name.push(chars.next().unwrap());
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file
    ///
    /// `${VAR_NAME}` references in the file are expanded first; explicit
    /// environment variables still win over file values.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let expanded_content = Self::expand_env_vars(&toml_content);

        let mut cfg: Config = toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        cfg.apply_env_overrides();

        Ok(cfg)
    }

    /// Load configuration from the default locations
    ///
    /// Tries `./cal-gateway.toml` first, then falls back to environment
    /// variables only.
    pub fn load() -> crate::Result<Self> {
        if Path::new("cal-gateway.toml").exists() {
            return Self::from_toml_file("cal-gateway.toml");
        }

        Self::from_env()
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Config::default();
        cfg.apply_env_overrides();

        if cfg.llm.api_key.is_empty() {
            return Err(Error::Config(
                "LLM_API_KEY or CLAUDE_API_KEY not set".to_string(),
            ));
        }

        Ok(cfg)
    }

    /// Overwrite settings from explicit environment variables
    fn apply_env_overrides(&mut self) {
        // LLM settings
        if let Ok(api_key) = std::env::var("LLM_API_KEY") {
            self.llm.api_key = api_key;
        } else if let Ok(api_key) = std::env::var("CLAUDE_API_KEY") {
            self.llm.api_key = api_key;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            if !model.is_empty() {
                self.llm.model = model;
            }
        }
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            if !provider.is_empty() {
                self.llm.provider = LlmProvider::from_name(&provider);
            }
        }
        if let Ok(base_url) = std::env::var("LLM_BASE_URL") {
            if !base_url.is_empty() {
                self.llm.base_url = Some(base_url);
            }
        }

        // Calendar settings
        if let Ok(url) = std::env::var("CALENDAR_BASE_URL") {
            if !url.is_empty() {
                self.calendar.base_url = url;
            }
        }
        if let Ok(id) = std::env::var("CALENDAR_ID") {
            if !id.is_empty() {
                self.calendar.calendar_id = id;
            }
        }
        if let Ok(tz) = std::env::var("CALENDAR_TIME_ZONE") {
            if !tz.is_empty() {
                self.calendar.time_zone = tz;
            }
        }
        if let Ok(uri) = std::env::var("CALENDAR_TOKEN_URI") {
            if !uri.is_empty() {
                self.calendar.token_uri = uri;
            }
        }
        if let Ok(reverify) = std::env::var("CALENDAR_REVERIFY_ON_CONFIRM") {
            self.calendar.reverify_on_confirm = reverify.to_lowercase() != "false";
        }

        // Checkpoint settings
        if let Ok(path) = std::env::var("DB_PATH") {
            self.checkpoint.db_path = path;
        }
        if let Ok(ttl) = std::env::var("PENDING_TTL_MINUTES") {
            if let Ok(minutes) = ttl.parse() {
                self.checkpoint.pending_ttl_minutes = Some(minutes);
            }
        }

        // API settings
        if let Ok(key) = std::env::var("API_KEY") {
            self.api.key = Some(key);
        }
        if let Ok(port) = std::env::var("API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }
        if let Ok(origins) = std::env::var("API_ALLOWED_ORIGINS") {
            self.api.allowed_origins =
                Some(origins.split(',').map(|s| s.trim().to_string()).collect());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_provider_default() {
        assert_eq!(LlmProvider::default(), LlmProvider::Claude);
    }

    #[test]
    fn test_llm_provider_from_name() {
        assert_eq!(LlmProvider::from_name("openai"), LlmProvider::OpenAi);
        assert_eq!(LlmProvider::from_name("glm"), LlmProvider::OpenAi);
        assert_eq!(LlmProvider::from_name("claude"), LlmProvider::Claude);
        assert_eq!(LlmProvider::from_name("anything"), LlmProvider::Claude);
    }

    #[test]
    fn test_llm_config_default() {
        let config = LlmConfig::default();
        assert_eq!(config.model, "claude-sonnet-4-20250514");
        assert_eq!(config.provider, LlmProvider::Claude);
        assert!(config.api_key.is_empty());
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_calendar_config_default() {
        let config = CalendarConfig::default();
        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.time_zone, "America/Los_Angeles");
        assert_eq!(config.default_duration_minutes, 60);
        assert!(config.reverify_on_confirm);
        assert_eq!(config.upcoming_limit, 5);
    }

    #[test]
    fn test_checkpoint_config_default() {
        let config = CheckpointConfig::default();
        assert_eq!(config.db_path, "data/cal-gateway.db");
        assert!(config.pending_ttl_minutes.is_none());
    }

    #[test]
    fn test_api_config_default() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 3000);
        assert!(config.key.is_none());
    }

    #[test]
    fn test_expand_env_vars() {
        unsafe {
            std::env::set_var("CAL_GATEWAY_TEST_VAR", "test_value");
        }

        let result = Config::expand_env_vars("prefix_${CAL_GATEWAY_TEST_VAR}_suffix");
        assert_eq!(result, "prefix_test_value_suffix");

        // Unknown variables expand to nothing
        let result = Config::expand_env_vars("prefix_${NONEXISTENT_VAR}_suffix");
        assert_eq!(result, "prefix__suffix");

        unsafe {
            std::env::remove_var("CAL_GATEWAY_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_env_vars_no_braces() {
        let result = Config::expand_env_vars("no_vars_here");
        assert_eq!(result, "no_vars_here");
    }

    #[test]
    fn test_toml_config_parsing() {
        let toml_content = r#"
[llm]
provider = "openai"
model = "glm-4.7"
api_key = "test_key"
base_url = "https://api.example.com"

[calendar]
base_url = "https://calendar.example.com/v3"
calendar_id = "work"
time_zone = "Europe/Helsinki"
reverify_on_confirm = false

[checkpoint]
db_path = "/path/to/db"
pending_ttl_minutes = 30

[api]
port = 8080
key = "api_key"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();

        assert_eq!(config.llm.provider, LlmProvider::OpenAi);
        assert_eq!(config.llm.model, "glm-4.7");
        assert_eq!(config.llm.api_key, "test_key");

        assert_eq!(config.calendar.base_url, "https://calendar.example.com/v3");
        assert_eq!(config.calendar.calendar_id, "work");
        assert_eq!(config.calendar.time_zone, "Europe/Helsinki");
        assert!(!config.calendar.reverify_on_confirm);
        // Unspecified fields keep their defaults
        assert_eq!(config.calendar.default_duration_minutes, 60);

        assert_eq!(config.checkpoint.db_path, "/path/to/db");
        assert_eq!(config.checkpoint.pending_ttl_minutes, Some(30));

        assert_eq!(config.api.port, 8080);
        assert_eq!(config.api.key, Some("api_key".to_string()));
    }
}
