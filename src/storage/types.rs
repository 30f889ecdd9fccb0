use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored conversation
///
/// The title and `updated_at` are the only mutable fields; everything
/// else is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Unique identifier for the conversation
    pub id: String,
    /// Principal that owns the conversation
    pub owner_id: String,
    /// User-visible title (generated at the first exchange)
    pub title: String,
    /// Model the conversation is pinned to
    pub model: String,
    /// When the conversation was created
    pub created_at: DateTime<Utc>,
    /// When a message was last appended
    pub updated_at: DateTime<Utc>,
}

/// List-view projection of a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Unique identifier for the conversation
    pub id: String,
    /// User-visible title
    pub title: String,
    /// Model the conversation is pinned to
    pub model: String,
    /// Number of messages in the conversation
    pub message_count: usize,
    /// When a message was last appended
    pub updated_at: DateTime<Utc>,
}

/// A stored chat message, append-only once written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Unique identifier for the message
    pub id: String,
    /// Conversation the message belongs to
    pub conversation_id: String,
    /// Role of the sender: user, assistant, or system
    pub role: String,
    /// Message content
    pub content: String,
    /// Tokens the exchange consumed (0 for user and system messages)
    pub tokens_used: u64,
    /// When the message was written
    pub created_at: DateTime<Utc>,
}

/// Kind of upstream request a usage event accounts for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// A normal chat completion
    Chat,
    /// A conversation-title generation call
    Title,
}

impl RequestKind {
    /// Canonical storage form of the kind
    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::Chat => "chat",
            RequestKind::Title => "title",
        }
    }

    /// Parse the storage form; unknown values fall back to `Chat`
    pub fn from_db(s: &str) -> Self {
        match s {
            "title" => RequestKind::Title,
            _ => RequestKind::Chat,
        }
    }
}

/// An immutable record of tokens consumed by one completion call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    /// Unique identifier for the event
    pub id: String,
    /// Principal the consumption is attributed to
    pub principal_id: String,
    /// Model that served the request
    pub model: String,
    /// Total tokens consumed
    pub tokens: u64,
    /// Kind of request that produced the event
    pub request_kind: RequestKind,
    /// When the event was recorded
    pub created_at: DateTime<Utc>,
}
