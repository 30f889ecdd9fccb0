//! ChatLedger - AI chat usage accounting and conversation continuity
//!
//! This library provides the core of a chat service over a hosted
//! completion API: token usage accounting with plan-based quotas, and
//! bounded conversation-context assembly with first-exchange titling.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `chat`: the usage ledger, the context builder, and the send-message service
//! - `providers`: completion API abstraction and the OpenRouter client
//! - `storage`: SQLite persistence for conversations, messages, and usage events
//! - `plans`: the closed plan-tier set and its static quota limits
//! - `prompts`: named system prompt presets
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use chatledger::chat::{ChatService, ChatSettings, Principal};
//! use chatledger::plans::PlanTier;
//! use chatledger::providers::create_client;
//! use chatledger::config::Config;
//! use chatledger::storage::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let storage = SqliteStorage::new()?;
//!     let client = create_client(&config.provider)?;
//!     let service = ChatService::new(
//!         storage,
//!         client,
//!         ChatSettings {
//!             model: config.provider.openrouter.model.clone(),
//!             max_context_messages: config.chat.max_context_messages,
//!         },
//!     );
//!
//!     let principal = Principal { id: "user-1".into(), plan: PlanTier::Free };
//!     let conversation = service.create_conversation(&principal, None, None)?;
//!     let outcome = service
//!         .send_message(&principal, &conversation.id, "Hello!", None)
//!         .await?;
//!     println!("{}", outcome.reply.content);
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod plans;
pub mod prompts;
pub mod providers;
pub mod storage;

// Re-export commonly used types
pub use chat::{ChatService, ChatSettings, Principal, QuotaCheck, UsageLedger};
pub use config::Config;
pub use error::{ChatLedgerError, Result};
pub use plans::{PlanLimits, PlanTier};
