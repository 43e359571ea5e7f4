//! Natural-language-to-intent translation
//!
//! Sends the user's free text to an LLM with a fixed instruction
//! describing the structured intent schema, then parses the reply into an
//! [`crate::intent::Intent`] with a fresh correlation id.

mod client;
mod types;

pub use client::TranslatorClient;
pub use types::{
    ChatChoice, ChatChoiceMessage, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
    ContentBlock, IntentDraft, MessagesRequest, MessagesResponse, ResponseFormat,
};
