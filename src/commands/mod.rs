/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `chat`    — Create conversations and send messages
- `history` — List, show, and delete stored conversations
- `usage`   — Token usage and quota reporting

These handlers are intentionally small and use the library components:
the chat service, the usage ledger, and storage.
*/

pub mod chat;
pub mod history;
pub mod usage;

use crate::chat::{ChatService, ChatSettings};
use crate::config::Config;
use crate::error::Result;
use crate::providers::create_client;
use crate::storage::SqliteStorage;

/// Build a fully wired chat service from configuration
///
/// Used by the commands that talk to the completion API; history and
/// usage reporting work on storage alone and do not need a provider.
pub fn build_service(config: &Config) -> Result<ChatService> {
    let storage = SqliteStorage::new()?;
    let client = create_client(&config.provider)?;
    let settings = ChatSettings {
        model: config.provider.openrouter.model.clone(),
        max_context_messages: config.chat.max_context_messages,
    };
    Ok(ChatService::new(storage, client, settings))
}
