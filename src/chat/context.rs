//! Conversation context assembly and title synthesis
//!
//! Builds the bounded message window sent upstream (the most recent
//! prior messages, oldest first, optionally prefixed with a system
//! prompt) and generates a short conversation title from the first
//! exchange. Title generation never fails: any collaborator error
//! degrades to the static fallback title.

use crate::providers::{ChatMessage, CompletionClient, CompletionOptions};
use crate::storage::SqliteStorage;
use std::sync::Arc;

/// Default bound on prior messages included in the upstream context
pub const DEFAULT_CONTEXT_MESSAGES: usize = 20;

/// Title used whenever generation fails or produces nothing
pub const FALLBACK_TITLE: &str = "New Conversation";

/// Instruction prompt for title generation
const TITLE_PROMPT: &str = "Generate a short, descriptive title (max 50 characters) for this \
     conversation. Return only the title, no quotes or extra text.";

/// Token budget for a title completion
const TITLE_MAX_TOKENS: u32 = 50;

/// Sampling temperature for title completions
const TITLE_TEMPERATURE: f32 = 0.3;

/// How much of the first message is shown to the title model
const TITLE_SNIPPET_CHARS: usize = 500;

/// The assembled context window for one upstream call
#[derive(Debug, Clone)]
pub struct ContextWindow {
    /// Ordered messages: optional system prompt, bounded history, new user message
    pub messages: Vec<ChatMessage>,
    /// How many prior messages the conversation had before this call
    pub prior_messages: usize,
}

/// Result of a title generation attempt
#[derive(Debug, Clone)]
pub struct TitleOutcome {
    /// The generated title, or [`FALLBACK_TITLE`]
    pub title: String,
    /// Tokens the title call consumed (0 when generation failed)
    pub tokens: u64,
    /// Model that served the title call (empty when generation failed)
    pub model: String,
}

/// Assembles bounded conversation context and synthesizes titles
pub struct ContextBuilder {
    storage: SqliteStorage,
    client: Arc<dyn CompletionClient>,
    max_messages: usize,
}

/// Truncate to at most `max` characters, respecting char boundaries
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

impl ContextBuilder {
    /// Create a builder over the given storage and completion client
    pub fn new(
        storage: SqliteStorage,
        client: Arc<dyn CompletionClient>,
        max_messages: usize,
    ) -> Self {
        Self {
            storage,
            client,
            max_messages,
        }
    }

    /// Assemble the ordered message window for one send
    ///
    /// Loads the most recent `max_messages` stored messages in
    /// chronological order, prefixes the optional system prompt, and
    /// appends the new user message last.
    ///
    /// # Errors
    ///
    /// Returns a `Storage` error when history cannot be loaded.
    pub fn build_context(
        &self,
        conversation_id: &str,
        new_user_message: &str,
        system_prompt: Option<&str>,
    ) -> crate::error::Result<ContextWindow> {
        let history = self.storage.recent_messages(conversation_id, self.max_messages)?;
        let prior_messages = history.len();

        let mut messages = Vec::with_capacity(prior_messages + 2);
        if let Some(prompt) = system_prompt {
            messages.push(ChatMessage::system(prompt));
        }
        for record in &history {
            messages.push(ChatMessage {
                role: record.role.clone(),
                content: record.content.clone(),
            });
        }
        messages.push(ChatMessage::user(new_user_message));

        tracing::debug!(
            "Built context for {}: {} prior messages, {} total",
            conversation_id,
            prior_messages,
            messages.len()
        );

        Ok(ContextWindow {
            messages,
            prior_messages,
        })
    }

    /// Generate a short title from the first message of a conversation
    ///
    /// Sends a fixed instruction with a small token budget. Any failure,
    /// and any blank response, yields [`FALLBACK_TITLE`]; collaborator
    /// errors are logged, never propagated.
    pub async fn title_for(&self, first_message: &str) -> TitleOutcome {
        let snippet = truncate_chars(first_message, TITLE_SNIPPET_CHARS);
        let messages = vec![
            ChatMessage::system(TITLE_PROMPT),
            ChatMessage::user(format!(
                "Generate a title for this conversation:\n\n{}...",
                snippet
            )),
        ];
        let options = CompletionOptions {
            model: None,
            temperature: Some(TITLE_TEMPERATURE),
            max_tokens: Some(TITLE_MAX_TOKENS),
        };

        match self.client.chat_completion(&messages, &options).await {
            Ok(completion) => {
                let title = completion.content.trim().to_string();
                if title.is_empty() {
                    TitleOutcome {
                        title: FALLBACK_TITLE.to_string(),
                        tokens: completion.total_tokens,
                        model: completion.model,
                    }
                } else {
                    TitleOutcome {
                        title,
                        tokens: completion.total_tokens,
                        model: completion.model,
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Title generation failed, using fallback: {}", e);
                TitleOutcome {
                    title: FALLBACK_TITLE.to_string(),
                    tokens: 0,
                    model: String::new(),
                }
            }
        }
    }
}
