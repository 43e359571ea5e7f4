//! cal-core: Calendar Gateway Core Library
//!
//! Provides the intent model and confirmation state machine, the pending
//! checkpoint store, the natural-language intent translator, and the
//! credential provider used to act on the user's behalf.

pub mod agent;
pub mod config;
pub mod credentials;
pub mod error;
pub mod intent;
pub mod translator;

pub use agent::{
    CALENDAR_PARTICIPANT, CalendarAgent, FRONTEND_PARTICIPANT, FrontendAgent, Transcript,
};
pub use config::{ApiConfig, CalendarConfig, CheckpointConfig, Config, LlmConfig, LlmProvider};
pub use credentials::{CredentialProvider, CredentialRef, OAuthTokenProvider, StaticTokenProvider};
pub use error::{Error, Result};
pub use intent::{CheckpointStore, Intent, IntentMachine, IntentOp, IntentStatus};
pub use translator::TranslatorClient;
