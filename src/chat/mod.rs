//! Chat core: usage accounting, context assembly, and send orchestration
//!
//! - `ledger`: token consumption tracking and plan-quota gating
//! - `context`: bounded message-window assembly and title synthesis
//! - `service`: the sequential send-message unit of work tying them together

pub mod context;
pub mod ledger;
pub mod service;

pub use context::{ContextBuilder, ContextWindow, TitleOutcome, DEFAULT_CONTEXT_MESSAGES, FALLBACK_TITLE};
pub use ledger::{day_start, month_start, QuotaCheck, RecordOutcome, UsageLedger};
pub use service::{ChatService, ChatSettings, Principal, SendOutcome, UsageSummary};
