//! Chat send orchestration
//!
//! One chat send is a single sequential unit of work: validate, gate on
//! quota, assemble context, call the completion API, persist the
//! exchange, account the usage, and maintain the conversation title.
//! Only quota and upstream failures reach the caller; usage recording
//! and title generation degrade instead of failing the send.

use crate::chat::context::{ContextBuilder, FALLBACK_TITLE};
use crate::chat::ledger::{QuotaCheck, RecordOutcome, UsageLedger};
use crate::error::{ChatLedgerError, Result};
use crate::plans::PlanTier;
use crate::providers::{CompletionClient, CompletionOptions};
use crate::storage::{ConversationRecord, MessageRecord, RequestKind, SqliteStorage};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// The authenticated caller a send is performed for
#[derive(Debug, Clone)]
pub struct Principal {
    /// Stable identifier usage is attributed to
    pub id: String,
    /// The caller's plan tier
    pub plan: PlanTier,
}

/// Service-level settings
#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Model new conversations are pinned to
    pub model: String,
    /// How many prior messages a context window may carry
    pub max_context_messages: usize,
}

/// Result of a successful send
#[derive(Debug)]
pub struct SendOutcome {
    /// Conversation the exchange was appended to (full id)
    pub conversation_id: String,
    /// The persisted assistant reply
    pub reply: MessageRecord,
    /// The generated title, set only on the first exchange
    pub title: Option<String>,
    /// Whether the usage event reached the ledger
    pub usage: RecordOutcome,
}

/// Aggregate usage view for a principal
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageSummary {
    /// Tokens consumed since local midnight
    pub daily_tokens: u64,
    /// Tokens consumed since the first of the month
    pub monthly_tokens: u64,
    /// Conversations the principal owns
    pub total_conversations: u64,
    /// Messages across those conversations
    pub total_messages: u64,
}

/// Orchestrates chat sends over storage, the ledger, and the completion API
pub struct ChatService {
    storage: SqliteStorage,
    client: Arc<dyn CompletionClient>,
    ledger: UsageLedger,
    context: ContextBuilder,
    settings: ChatSettings,
}

impl ChatService {
    /// Create a service with explicit dependencies
    pub fn new(
        storage: SqliteStorage,
        client: Arc<dyn CompletionClient>,
        settings: ChatSettings,
    ) -> Self {
        let ledger = UsageLedger::new(storage.clone());
        let context = ContextBuilder::new(
            storage.clone(),
            Arc::clone(&client),
            settings.max_context_messages,
        );
        Self {
            storage,
            client,
            ledger,
            context,
            settings,
        }
    }

    /// The usage ledger backing this service
    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    /// Create a new conversation for the principal
    ///
    /// An optional system prompt is stored as a zero-token system message
    /// so it becomes part of every later context window.
    pub fn create_conversation(
        &self,
        principal: &Principal,
        title: Option<&str>,
        system_prompt: Option<&str>,
    ) -> Result<ConversationRecord> {
        let now = Utc::now();
        let record = ConversationRecord {
            id: Uuid::new_v4().to_string(),
            owner_id: principal.id.clone(),
            title: title.unwrap_or(FALLBACK_TITLE).to_string(),
            model: self.settings.model.clone(),
            created_at: now,
            updated_at: now,
        };

        self.storage.insert_conversation(&record)?;

        if let Some(prompt) = system_prompt {
            self.storage.append_message(&MessageRecord {
                id: Uuid::new_v4().to_string(),
                conversation_id: record.id.clone(),
                role: "system".to_string(),
                content: prompt.to_string(),
                tokens_used: 0,
                created_at: now,
            })?;
        }

        tracing::info!(
            "Created conversation {} for {}",
            record.id,
            principal.id
        );

        Ok(record)
    }

    /// Send a user message and persist the assistant reply
    ///
    /// The quota gate and the usage write are deliberately not atomic:
    /// concurrent sends from one principal can all pass the gate before
    /// any of them records usage, overshooting the limit by at most
    /// (in-flight requests x max_tokens_per_request).
    ///
    /// # Errors
    ///
    /// - `EmptyMessage` for blank input
    /// - `ConversationNotFound` when the id does not resolve for this principal
    /// - `QuotaExceeded` when the pre-flight check fails
    /// - `Upstream` when the completion call fails; nothing is persisted
    pub async fn send_message(
        &self,
        principal: &Principal,
        conversation_id: &str,
        text: &str,
        system_prompt: Option<&str>,
    ) -> Result<SendOutcome> {
        if text.trim().is_empty() {
            return Err(ChatLedgerError::EmptyMessage.into());
        }

        let conversation = self
            .storage
            .get_conversation(&principal.id, conversation_id)?
            .ok_or_else(|| {
                ChatLedgerError::ConversationNotFound(conversation_id.to_string())
            })?;

        let check = self.ledger.check_quota(&principal.id, principal.plan).await;
        if !check.allowed {
            tracing::info!(
                "Quota exceeded for {}: daily {}/{}, monthly {}/{}",
                principal.id,
                check.daily_used,
                check.limits.daily_tokens,
                check.monthly_used,
                check.limits.monthly_tokens
            );
            return Err(ChatLedgerError::QuotaExceeded {
                daily_used: check.daily_used,
                daily_limit: check.limits.daily_tokens,
                monthly_used: check.monthly_used,
                monthly_limit: check.limits.monthly_tokens,
            }
            .into());
        }

        let window = self
            .context
            .build_context(&conversation.id, text, system_prompt)?;

        let options = CompletionOptions {
            model: Some(conversation.model.clone()),
            temperature: None,
            max_tokens: Some(principal.plan.limits().max_tokens_per_request),
        };

        let completion = self
            .client
            .chat_completion(&window.messages, &options)
            .await
            .map_err(|e| {
                tracing::error!("Completion call failed for {}: {}", conversation.id, e);
                ChatLedgerError::Upstream("failed to generate response".to_string())
            })?;

        // The exchange persists only after a successful completion.
        let now = Utc::now();
        self.storage.append_message(&MessageRecord {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation.id.clone(),
            role: "user".to_string(),
            content: text.to_string(),
            tokens_used: 0,
            created_at: now,
        })?;

        let reply = MessageRecord {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation.id.clone(),
            role: "assistant".to_string(),
            content: completion.content.clone(),
            tokens_used: completion.total_tokens,
            created_at: now,
        };
        self.storage.append_message(&reply)?;

        // Best-effort: a dropped event never fails the send.
        let usage = self.ledger.record(
            &principal.id,
            completion.total_tokens,
            &completion.model,
            RequestKind::Chat,
        );

        let title = if window.prior_messages == 0 {
            let outcome = self.context.title_for(text).await;
            if outcome.tokens > 0 {
                let _ = self.ledger.record(
                    &principal.id,
                    outcome.tokens,
                    &outcome.model,
                    RequestKind::Title,
                );
            }
            self.storage
                .set_conversation_title(&conversation.id, &outcome.title, Utc::now())?;
            Some(outcome.title)
        } else {
            self.storage
                .touch_conversation(&conversation.id, Utc::now())?;
            None
        };

        Ok(SendOutcome {
            conversation_id: conversation.id,
            reply,
            title,
            usage,
        })
    }

    /// Delete a conversation and its messages
    ///
    /// Returns `false` when the id does not resolve for this principal.
    pub fn delete_conversation(&self, principal: &Principal, id: &str) -> Result<bool> {
        let deleted = self.storage.delete_conversation(&principal.id, id)?;
        if deleted {
            tracing::info!("Deleted conversation {} for {}", id, principal.id);
        }
        Ok(deleted)
    }

    /// List the principal's conversations, most recently updated first
    pub fn list_conversations(
        &self,
        principal: &Principal,
    ) -> Result<Vec<crate::storage::ConversationSummary>> {
        self.storage.list_conversations(&principal.id)
    }

    /// Load a conversation's recent messages for display
    pub fn conversation_messages(
        &self,
        principal: &Principal,
        id: &str,
        limit: usize,
    ) -> Result<(ConversationRecord, Vec<MessageRecord>)> {
        let conversation = self
            .storage
            .get_conversation(&principal.id, id)?
            .ok_or_else(|| ChatLedgerError::ConversationNotFound(id.to_string()))?;
        let messages = self.storage.recent_messages(&conversation.id, limit)?;
        Ok((conversation, messages))
    }

    /// Pre-flight quota view for the principal
    pub async fn quota(&self, principal: &Principal) -> QuotaCheck {
        self.ledger.check_quota(&principal.id, principal.plan).await
    }

    /// Aggregate usage statistics for the principal
    ///
    /// Fail-open like the ledger reads: a failing count degrades to 0
    /// instead of breaking the stats view.
    pub async fn usage_summary(&self, principal: &Principal) -> UsageSummary {
        let now = Utc::now();
        let (daily_tokens, monthly_tokens) = tokio::join!(
            self.ledger.daily_usage(&principal.id, now),
            self.ledger.monthly_usage(&principal.id, now)
        );

        let total_conversations = self
            .storage
            .conversation_count(&principal.id)
            .unwrap_or_else(|e| {
                tracing::warn!("Conversation count failed for {}: {}", principal.id, e);
                0
            });
        let total_messages = self.storage.message_count(&principal.id).unwrap_or_else(|e| {
            tracing::warn!("Message count failed for {}: {}", principal.id, e);
            0
        });

        UsageSummary {
            daily_tokens,
            monthly_tokens,
            total_conversations,
            total_messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ChatMessage, Completion, MockCompletionClient};
    use tempfile::tempdir;

    fn test_settings() -> ChatSettings {
        ChatSettings {
            model: "deepseek/deepseek-r1-0528".to_string(),
            max_context_messages: 20,
        }
    }

    fn principal() -> Principal {
        Principal {
            id: "user-1".to_string(),
            plan: PlanTier::Free,
        }
    }

    fn service_with(client: MockCompletionClient) -> (ChatService, tempfile::TempDir) {
        let dir = tempdir().expect("failed to create tempdir");
        let storage = SqliteStorage::new_with_path(dir.path().join("service.db"))
            .expect("failed to create storage");
        (
            ChatService::new(storage, Arc::new(client), test_settings()),
            dir,
        )
    }

    /// Mock that answers chat calls and title calls differently.
    fn chat_and_title_client(reply_tokens: u64, title_tokens: u64) -> MockCompletionClient {
        let mut client = MockCompletionClient::new();
        client
            .expect_chat_completion()
            .returning(move |messages: &[ChatMessage], _| {
                let is_title = messages
                    .first()
                    .map(|m| m.content.contains("descriptive title"))
                    .unwrap_or(false);
                if is_title {
                    Ok(Completion {
                        content: "Generated Title".to_string(),
                        total_tokens: title_tokens,
                        model: "deepseek/deepseek-r1-0528".to_string(),
                    })
                } else {
                    Ok(Completion {
                        content: "Here is the answer.".to_string(),
                        total_tokens: reply_tokens,
                        model: "deepseek/deepseek-r1-0528".to_string(),
                    })
                }
            });
        client
    }

    #[tokio::test]
    async fn test_send_rejects_empty_message() {
        let mut client = MockCompletionClient::new();
        client.expect_chat_completion().never();
        let (service, _dir) = service_with(client);

        let err = service
            .send_message(&principal(), "whatever", "   ", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Message cannot be empty"));
    }

    #[tokio::test]
    async fn test_send_rejects_unknown_conversation() {
        let mut client = MockCompletionClient::new();
        client.expect_chat_completion().never();
        let (service, _dir) = service_with(client);

        let err = service
            .send_message(&principal(), "deadbeef", "hello", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Conversation not found"));
    }

    #[tokio::test]
    async fn test_send_blocked_by_quota_before_any_upstream_call() {
        let mut client = MockCompletionClient::new();
        client.expect_chat_completion().never();
        let (service, _dir) = service_with(client);
        let principal = principal();

        let conversation = service
            .create_conversation(&principal, None, None)
            .expect("create failed");

        // Exhaust the free daily quota up front.
        service
            .ledger()
            .record(&principal.id, 10_000, "m", RequestKind::Chat);

        let err = service
            .send_message(&principal, &conversation.id, "hello", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Token quota exceeded"));
    }

    #[tokio::test]
    async fn test_first_send_sets_generated_title() {
        let (service, _dir) = service_with(chat_and_title_client(120, 15));
        let principal = principal();

        let conversation = service
            .create_conversation(&principal, None, None)
            .expect("create failed");
        assert_eq!(conversation.title, "New Conversation");

        let outcome = service
            .send_message(&principal, &conversation.id, "Explain lifetimes", None)
            .await
            .expect("send failed");

        assert_eq!(outcome.title.as_deref(), Some("Generated Title"));
        assert_eq!(outcome.reply.role, "assistant");
        assert_eq!(outcome.reply.tokens_used, 120);
        assert!(outcome.usage.is_recorded());

        let (stored, messages) = service
            .conversation_messages(&principal, &conversation.id, 50)
            .expect("load failed");
        assert_eq!(stored.title, "Generated Title");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "assistant");
    }

    #[tokio::test]
    async fn test_second_send_keeps_title_and_bumps_updated_at() {
        let (service, _dir) = service_with(chat_and_title_client(100, 10));
        let principal = principal();

        let conversation = service
            .create_conversation(&principal, None, None)
            .expect("create failed");

        let first = service
            .send_message(&principal, &conversation.id, "first question", None)
            .await
            .expect("first send failed");
        assert!(first.title.is_some());

        let after_first = service
            .conversation_messages(&principal, &conversation.id, 1)
            .expect("load failed")
            .0
            .updated_at;

        let second = service
            .send_message(&principal, &conversation.id, "second question", None)
            .await
            .expect("second send failed");
        assert!(second.title.is_none());

        let (stored, messages) = service
            .conversation_messages(&principal, &conversation.id, 50)
            .expect("load failed");
        assert_eq!(stored.title, "Generated Title");
        assert!(stored.updated_at >= after_first);
        assert_eq!(messages.len(), 4);
    }

    #[tokio::test]
    async fn test_upstream_failure_persists_nothing() {
        let mut client = MockCompletionClient::new();
        client.expect_chat_completion().returning(|_, _| {
            Err(ChatLedgerError::Upstream("HTTP 500".to_string()).into())
        });
        let (service, _dir) = service_with(client);
        let principal = principal();

        let conversation = service
            .create_conversation(&principal, None, None)
            .expect("create failed");

        let err = service
            .send_message(&principal, &conversation.id, "hello", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to generate response"));

        let (_, messages) = service
            .conversation_messages(&principal, &conversation.id, 50)
            .expect("load failed");
        assert!(messages.is_empty());
        assert_eq!(
            service.ledger().daily_usage(&principal.id, Utc::now()).await,
            0
        );
    }

    #[tokio::test]
    async fn test_send_records_chat_and_title_usage() {
        let (service, _dir) = service_with(chat_and_title_client(200, 25));
        let principal = principal();

        let conversation = service
            .create_conversation(&principal, None, None)
            .expect("create failed");
        service
            .send_message(&principal, &conversation.id, "hello there", None)
            .await
            .expect("send failed");

        // Chat reply tokens plus the out-of-band title call.
        assert_eq!(
            service.ledger().daily_usage(&principal.id, Utc::now()).await,
            225
        );
    }

    #[tokio::test]
    async fn test_create_conversation_with_system_prompt() {
        let mut client = MockCompletionClient::new();
        client.expect_chat_completion().never();
        let (service, _dir) = service_with(client);
        let principal = principal();

        let conversation = service
            .create_conversation(&principal, Some("Ideas"), Some("You are terse."))
            .expect("create failed");
        assert_eq!(conversation.title, "Ideas");

        let (_, messages) = service
            .conversation_messages(&principal, &conversation.id, 50)
            .expect("load failed");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].tokens_used, 0);
    }

    #[tokio::test]
    async fn test_delete_conversation() {
        let mut client = MockCompletionClient::new();
        client.expect_chat_completion().never();
        let (service, _dir) = service_with(client);
        let principal = principal();

        let conversation = service
            .create_conversation(&principal, None, None)
            .expect("create failed");

        assert!(service
            .delete_conversation(&principal, &conversation.id)
            .expect("delete failed"));
        assert!(!service
            .delete_conversation(&principal, &conversation.id)
            .expect("second delete failed"));
    }

    #[tokio::test]
    async fn test_usage_summary_counts() {
        let (service, _dir) = service_with(chat_and_title_client(100, 0));
        let principal = principal();

        let conversation = service
            .create_conversation(&principal, None, None)
            .expect("create failed");
        service
            .send_message(&principal, &conversation.id, "hi", None)
            .await
            .expect("send failed");

        let summary = service.usage_summary(&principal).await;
        assert_eq!(summary.daily_tokens, 100);
        assert_eq!(summary.total_conversations, 1);
        assert_eq!(summary.total_messages, 2);
    }
}
