use crate::error::{ChatLedgerError, Result};
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;

pub mod types;
pub use types::{ConversationRecord, ConversationSummary, MessageRecord, RequestKind, UsageEvent};

/// Storage backend for conversations, messages, and usage events
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    db_path: PathBuf,
}

/// Format a timestamp for storage
///
/// Fixed-width microsecond RFC 3339 so stored values order correctly
/// under SQLite's text comparison.
fn to_db_time(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp, falling back to now on corruption
fn from_db_time(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl SqliteStorage {
    /// Create a new storage instance
    ///
    /// Initializes the database file in the user's data directory. The
    /// `CHATLEDGER_DB` environment variable overrides the location, which
    /// makes it easy to point the binary at a test DB or alternate file.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("CHATLEDGER_DB") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "xbcsmith", "chatledger")
            .ok_or_else(|| ChatLedgerError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        let db_path = data_dir.join("chatledger.db");
        let storage = Self { db_path };

        storage.init()?;

        Ok(storage)
    }

    /// Create a new storage instance that uses the specified database path.
    ///
    /// Primarily useful for tests where the default application data
    /// directory is not desirable (for example, using a temporary directory).
    ///
    /// # Examples
    ///
    /// ```
    /// use chatledger::storage::SqliteStorage;
    ///
    /// let storage = SqliteStorage::new_with_path("/tmp/test_chatledger.db").unwrap();
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        // Ensure parent directory exists so opening the DB file succeeds.
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;
        }

        let storage = Self { db_path };
        storage.init()?;
        Ok(storage)
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| ChatLedgerError::Storage(e.to_string()).into())
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL,
                model TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                tokens_used INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS usage_events (
                id TEXT PRIMARY KEY,
                principal_id TEXT NOT NULL,
                model TEXT NOT NULL,
                tokens INTEGER NOT NULL,
                request_kind TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_messages_conversation
                ON messages (conversation_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_usage_principal_created
                ON usage_events (principal_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_conversations_owner
                ON conversations (owner_id, updated_at);",
        )
        .context("Failed to create tables")
        .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Insert a new conversation row
    pub fn insert_conversation(&self, record: &ConversationRecord) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "INSERT INTO conversations (id, owner_id, title, model, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)",
            params![
                record.id,
                record.owner_id,
                record.title,
                record.model,
                to_db_time(record.created_at),
                to_db_time(record.updated_at),
            ],
        )
        .context("Failed to insert conversation")
        .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Load a conversation owned by `owner_id` (supports full UUID or 8-char prefix)
    pub fn get_conversation(
        &self,
        owner_id: &str,
        id: &str,
    ) -> Result<Option<ConversationRecord>> {
        let conn = self.open()?;

        // Support both full UUID and short-prefix matching
        let (query, search_param) = if id.len() == 36 {
            (
                "SELECT id, owner_id, title, model, created_at, updated_at
                 FROM conversations WHERE id = ? AND owner_id = ?",
                id.to_string(),
            )
        } else {
            (
                "SELECT id, owner_id, title, model, created_at, updated_at
                 FROM conversations WHERE id LIKE ? AND owner_id = ?",
                format!("{}%", id),
            )
        };

        let record = conn
            .query_row(query, params![search_param, owner_id], |row| {
                Ok(ConversationRecord {
                    id: row.get(0)?,
                    owner_id: row.get(1)?,
                    title: row.get(2)?,
                    model: row.get(3)?,
                    created_at: from_db_time(&row.get::<_, String>(4)?),
                    updated_at: from_db_time(&row.get::<_, String>(5)?),
                })
            })
            .optional()
            .context("Failed to query conversation")
            .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        Ok(record)
    }

    /// Set a conversation's title and bump its `updated_at`
    pub fn set_conversation_title(
        &self,
        id: &str,
        title: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "UPDATE conversations SET title = ?, updated_at = ? WHERE id = ?",
            params![title, to_db_time(updated_at), id],
        )
        .context("Failed to update conversation title")
        .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Bump a conversation's `updated_at`
    pub fn touch_conversation(&self, id: &str, updated_at: DateTime<Utc>) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "UPDATE conversations SET updated_at = ? WHERE id = ?",
            params![to_db_time(updated_at), id],
        )
        .context("Failed to touch conversation")
        .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        Ok(())
    }

    /// List a principal's conversations, most recently updated first
    pub fn list_conversations(&self, owner_id: &str) -> Result<Vec<ConversationSummary>> {
        let conn = self.open()?;

        let mut stmt = conn
            .prepare(
                "SELECT c.id, c.title, c.model, c.updated_at,
                        (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id)
                 FROM conversations c
                 WHERE c.owner_id = ?
                 ORDER BY c.updated_at DESC",
            )
            .context("Failed to prepare statement")
            .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        let summaries_iter = stmt
            .query_map(params![owner_id], |row| {
                Ok(ConversationSummary {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    model: row.get(2)?,
                    updated_at: from_db_time(&row.get::<_, String>(3)?),
                    message_count: row.get::<_, i64>(4)? as usize,
                })
            })
            .context("Failed to query conversations")
            .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        let mut summaries = Vec::new();
        for s in summaries_iter.flatten() {
            summaries.push(s);
        }

        Ok(summaries)
    }

    /// Delete a conversation and its messages (supports full UUID or 8-char prefix)
    ///
    /// Idempotent: deleting a missing conversation succeeds with `false`.
    pub fn delete_conversation(&self, owner_id: &str, id: &str) -> Result<bool> {
        let Some(record) = self.get_conversation(owner_id, id)? else {
            return Ok(false);
        };

        let mut conn = self.open()?;

        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        // Messages first, then the conversation row
        tx.execute(
            "DELETE FROM messages WHERE conversation_id = ?",
            params![record.id],
        )
        .context("Failed to delete messages")
        .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        tx.execute("DELETE FROM conversations WHERE id = ?", params![record.id])
            .context("Failed to delete conversation")
            .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        Ok(true)
    }

    /// Append a message to a conversation
    pub fn append_message(&self, record: &MessageRecord) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "INSERT INTO messages (id, conversation_id, role, content, tokens_used, created_at)
            VALUES (?, ?, ?, ?, ?, ?)",
            params![
                record.id,
                record.conversation_id,
                record.role,
                record.content,
                record.tokens_used as i64,
                to_db_time(record.created_at),
            ],
        )
        .context("Failed to insert message")
        .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Load the most recent `limit` messages of a conversation, oldest first
    pub fn recent_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageRecord>> {
        let conn = self.open()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, conversation_id, role, content, tokens_used, created_at
                 FROM messages
                 WHERE conversation_id = ?
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?",
            )
            .context("Failed to prepare statement")
            .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        let messages_iter = stmt
            .query_map(params![conversation_id, limit as i64], |row| {
                Ok(MessageRecord {
                    id: row.get(0)?,
                    conversation_id: row.get(1)?,
                    role: row.get(2)?,
                    content: row.get(3)?,
                    tokens_used: row.get::<_, i64>(4)?.max(0) as u64,
                    created_at: from_db_time(&row.get::<_, String>(5)?),
                })
            })
            .context("Failed to query messages")
            .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        let mut messages = Vec::new();
        for m in messages_iter.flatten() {
            messages.push(m);
        }

        // Fetched newest-first for the LIMIT; callers want chronological order.
        messages.reverse();

        Ok(messages)
    }

    /// Append a usage event
    pub fn insert_usage_event(&self, event: &UsageEvent) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "INSERT INTO usage_events (id, principal_id, model, tokens, request_kind, created_at)
            VALUES (?, ?, ?, ?, ?, ?)",
            params![
                event.id,
                event.principal_id,
                event.model,
                event.tokens as i64,
                event.request_kind.as_str(),
                to_db_time(event.created_at),
            ],
        )
        .context("Failed to insert usage event")
        .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Sum the tokens a principal consumed since `since`
    pub fn usage_since(&self, principal_id: &str, since: DateTime<Utc>) -> Result<u64> {
        let conn = self.open()?;

        let total: i64 = conn
            .query_row(
                "SELECT COALESCE(SUM(tokens), 0) FROM usage_events
                 WHERE principal_id = ? AND created_at >= ?",
                params![principal_id, to_db_time(since)],
                |row| row.get(0),
            )
            .context("Failed to sum usage events")
            .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        Ok(total.max(0) as u64)
    }

    /// Count a principal's conversations
    pub fn conversation_count(&self, owner_id: &str) -> Result<u64> {
        let conn = self.open()?;

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM conversations WHERE owner_id = ?",
                params![owner_id],
                |row| row.get(0),
            )
            .context("Failed to count conversations")
            .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        Ok(count.max(0) as u64)
    }

    /// Count all messages across a principal's conversations
    pub fn message_count(&self, owner_id: &str) -> Result<u64> {
        let conn = self.open()?;

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM messages m
                 INNER JOIN conversations c ON m.conversation_id = c.id
                 WHERE c.owner_id = ?",
                params![owner_id],
                |row| row.get(0),
            )
            .context("Failed to count messages")
            .map_err(|e| ChatLedgerError::Storage(e.to_string()))?;

        Ok(count.max(0) as u64)
    }
}
