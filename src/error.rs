//! Error types for ChatLedger
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for ChatLedger operations
///
/// Covers the full failure taxonomy: missing principals, quota gating,
/// upstream completion failures, storage problems, and configuration
/// errors. Usage-recording and title-generation failures are deliberately
/// absent: both degrade to a default instead of surfacing here.
#[derive(Error, Debug)]
pub enum ChatLedgerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No authenticated principal is available for the operation
    #[error("No principal configured: set user.id in the config file or pass --user")]
    PrincipalMissing,

    /// Pre-flight quota check failed for the principal's plan
    #[error("Token quota exceeded: daily {daily_used}/{daily_limit}, monthly {monthly_used}/{monthly_limit}")]
    QuotaExceeded {
        /// Tokens consumed so far today
        daily_used: u64,
        /// Daily token limit for the plan
        daily_limit: u64,
        /// Tokens consumed so far this month
        monthly_used: u64,
        /// Monthly token limit for the plan
        monthly_limit: u64,
    },

    /// The completion API call failed or returned a non-2xx response
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Referenced conversation does not exist or belongs to another principal
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    /// A chat message with no content was submitted
    #[error("Message cannot be empty")]
    EmptyMessage,

    /// Plan tier name that is not part of the closed tier set
    #[error("Unknown plan tier: {0} (expected free, pro, or premium)")]
    UnknownPlan(String),

    /// Conversation/message/usage persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for ChatLedger operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = ChatLedgerError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_principal_missing_display() {
        let error = ChatLedgerError::PrincipalMissing;
        assert!(error.to_string().contains("--user"));
    }

    #[test]
    fn test_quota_exceeded_display() {
        let error = ChatLedgerError::QuotaExceeded {
            daily_used: 10_500,
            daily_limit: 10_000,
            monthly_used: 42_000,
            monthly_limit: 100_000,
        };
        let s = error.to_string();
        assert!(s.contains("daily 10500/10000"));
        assert!(s.contains("monthly 42000/100000"));
    }

    #[test]
    fn test_upstream_error_display() {
        let error = ChatLedgerError::Upstream("failed to generate response".to_string());
        assert_eq!(
            error.to_string(),
            "Upstream error: failed to generate response"
        );
    }

    #[test]
    fn test_conversation_not_found_display() {
        let error = ChatLedgerError::ConversationNotFound("abc123".to_string());
        assert_eq!(error.to_string(), "Conversation not found: abc123");
    }

    #[test]
    fn test_empty_message_display() {
        let error = ChatLedgerError::EmptyMessage;
        assert_eq!(error.to_string(), "Message cannot be empty");
    }

    #[test]
    fn test_unknown_plan_display() {
        let error = ChatLedgerError::UnknownPlan("gold".to_string());
        assert_eq!(
            error.to_string(),
            "Unknown plan tier: gold (expected free, pro, or premium)"
        );
    }

    #[test]
    fn test_storage_error_display() {
        let error = ChatLedgerError::Storage("database connection failed".to_string());
        assert_eq!(
            error.to_string(),
            "Storage error: database connection failed"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: ChatLedgerError = io_error.into();
        assert!(matches!(error, ChatLedgerError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_str = "{invalid json}";
        let json_error = serde_json::from_str::<serde_json::Value>(json_str).unwrap_err();
        let error: ChatLedgerError = json_error.into();
        assert!(matches!(error, ChatLedgerError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_str = "invalid: : yaml";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: ChatLedgerError = yaml_error.into();
        assert!(matches!(error, ChatLedgerError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChatLedgerError>();
    }
}
