//! Completion API abstraction for ChatLedger
//!
//! This module defines the message and completion types shared with the
//! upstream model API, the `CompletionClient` trait the chat core is
//! written against, and the OpenRouter implementation.

pub mod openrouter;

pub use openrouter::OpenRouterClient;

use crate::config::ProviderConfig;
use crate::error::{ChatLedgerError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single message in the upstream wire format
///
/// Roles are the strings `user`, `assistant`, and `system`; use the
/// constructors rather than building the struct by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (user, assistant, system)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use chatledger::providers::ChatMessage;
    ///
    /// let msg = ChatMessage::user("Hello, assistant!");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    /// Creates a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// Per-request overrides for a completion call
///
/// Unset fields fall back to the client's configured defaults.
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    /// Model override
    pub model: Option<String>,
    /// Sampling temperature override
    pub temperature: Option<f32>,
    /// Completion token budget override
    pub max_tokens: Option<u32>,
}

/// Result of a completion call
#[derive(Debug, Clone)]
pub struct Completion {
    /// Text of the assistant reply
    pub content: String,
    /// Total tokens (prompt + completion) the upstream reported for the call
    pub total_tokens: u64,
    /// Model that actually served the request
    pub model: String,
}

/// Client for a hosted chat-completion API
///
/// The chat core depends on this trait only; the concrete transport lives
/// in the provider implementations.
///
/// # Examples
///
/// ```no_run
/// use chatledger::providers::{ChatMessage, Completion, CompletionClient, CompletionOptions};
/// use chatledger::error::Result;
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct CannedClient;
///
/// #[async_trait]
/// impl CompletionClient for CannedClient {
///     async fn chat_completion(
///         &self,
///         _messages: &[ChatMessage],
///         _options: &CompletionOptions,
///     ) -> Result<Completion> {
///         Ok(Completion {
///             content: "Hi!".to_string(),
///             total_tokens: 3,
///             model: "canned".to_string(),
///         })
///     }
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync + std::fmt::Debug {
    /// Sends the assembled message window upstream and returns the reply
    ///
    /// # Errors
    ///
    /// Returns an `Upstream` error if the call fails, returns a non-2xx
    /// status, or produces an unparseable body.
    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion>;
}

/// Create a completion client based on configuration
///
/// # Errors
///
/// Returns error if the provider type is unknown or initialization fails
pub fn create_client(config: &ProviderConfig) -> Result<Arc<dyn CompletionClient>> {
    match config.provider_type.as_str() {
        "openrouter" => Ok(Arc::new(OpenRouterClient::new(config.openrouter.clone())?)),
        other => {
            Err(ChatLedgerError::Config(format!("Unknown provider type: {}", other)).into())
        }
    }
}
