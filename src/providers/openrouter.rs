//! OpenRouter completion client
//!
//! Implements `CompletionClient` against an OpenRouter-compatible
//! `/chat/completions` endpoint. The wire contract is the OpenAI-style
//! chat shape: `{model, messages, temperature, max_tokens, stream}` out,
//! `{choices[].message, usage.total_tokens, model}` back. Non-2xx
//! responses surface as a generic upstream failure; their bodies are
//! logged but never parsed.

use crate::config::OpenRouterConfig;
use crate::error::{ChatLedgerError, Result};
use crate::providers::{ChatMessage, Completion, CompletionClient, CompletionOptions};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fallback reply text when the upstream returns no choices
const EMPTY_RESPONSE_FALLBACK: &str = "No response generated";

/// OpenRouter API client
///
/// # Examples
///
/// ```no_run
/// use chatledger::config::OpenRouterConfig;
/// use chatledger::providers::{ChatMessage, CompletionClient, CompletionOptions, OpenRouterClient};
///
/// # async fn example() -> chatledger::error::Result<()> {
/// let config = OpenRouterConfig {
///     api_key: Some("sk-or-...".to_string()),
///     ..Default::default()
/// };
/// let client = OpenRouterClient::new(config)?;
/// let messages = vec![ChatMessage::user("Hello!")];
/// let completion = client
///     .chat_completion(&messages, &CompletionOptions::default())
///     .await?;
/// println!("{} ({} tokens)", completion.content, completion.total_tokens);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OpenRouterClient {
    client: Client,
    config: OpenRouterConfig,
}

/// Request body for /chat/completions
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

/// Response body from /chat/completions
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<UsageBlock>,
    #[serde(default)]
    model: String,
}

/// One completion choice
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: WireMessage,
}

/// Message within a choice
#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: String,
}

/// Token accounting block
#[derive(Debug, Default, Deserialize)]
struct UsageBlock {
    #[serde(default)]
    total_tokens: u64,
}

impl OpenRouterClient {
    /// Create a new OpenRouter client
    ///
    /// # Errors
    ///
    /// Returns a `Config` error when no API key is configured, or an
    /// `Upstream` error if HTTP client initialization fails.
    pub fn new(config: OpenRouterConfig) -> Result<Self> {
        if config.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(ChatLedgerError::Config(
                "OpenRouter API key is required: set provider.openrouter.api_key \
                 or the OPENROUTER_API_KEY environment variable"
                    .to_string(),
            )
            .into());
        }

        // Defensive timeout: the upstream defines no cancellation
        // semantics, so a stuck request must not hang the caller forever.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("chatledger/0.2.0")
            .build()
            .map_err(|e| {
                ChatLedgerError::Upstream(format!("Failed to create HTTP client: {}", e))
            })?;

        tracing::info!(
            "Initialized OpenRouter client: base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self { client, config })
    }

    /// The default model requests are sent to
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion> {
        let model = options.model.as_deref().unwrap_or(&self.config.model);
        let request = ChatCompletionRequest {
            model,
            messages,
            temperature: options.temperature.unwrap_or(self.config.temperature),
            max_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
            stream: false,
        };

        let url = self.endpoint();
        tracing::debug!(
            "Requesting completion: model={}, messages={}",
            model,
            messages.len()
        );

        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.as_deref().unwrap_or(""))
            .json(&request);

        // Optional attribution headers used by OpenRouter dashboards
        if let Some(site_url) = &self.config.site_url {
            builder = builder.header("HTTP-Referer", site_url);
        }
        if let Some(site_name) = &self.config.site_name {
            builder = builder.header("X-Title", site_name);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!("Completion request failed: {}", e);
            ChatLedgerError::Upstream(format!("Completion request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Completion API returned {}: {}", status, body);
            return Err(
                ChatLedgerError::Upstream(format!("Completion API returned {}", status)).into(),
            );
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse completion response: {}", e);
            ChatLedgerError::Upstream(format!("Failed to parse completion response: {}", e))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| EMPTY_RESPONSE_FALLBACK.to_string());

        let total_tokens = parsed.usage.unwrap_or_default().total_tokens;
        let served_model = if parsed.model.is_empty() {
            model.to_string()
        } else {
            parsed.model
        };

        tracing::debug!(
            "Completion received: model={}, total_tokens={}",
            served_model,
            total_tokens
        );

        Ok(Completion {
            content,
            total_tokens,
            model: served_model,
        })
    }
}
