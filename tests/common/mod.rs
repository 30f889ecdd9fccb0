use chatledger::chat::{ChatService, ChatSettings, Principal};
use chatledger::config::OpenRouterConfig;
use chatledger::plans::PlanTier;
use chatledger::providers::OpenRouterClient;
use chatledger::storage::SqliteStorage;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn create_temp_storage() -> (SqliteStorage, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("chatledger.db");
    let storage =
        SqliteStorage::new_with_path(db_path).expect("failed to create sqlite storage with path");
    (storage, tmp)
}

/// Build a chat service whose completion client points at a mock server.
#[allow(dead_code)]
pub fn create_service_against(api_base: &str) -> (ChatService, TempDir) {
    let (storage, tmp) = create_temp_storage();

    let client = OpenRouterClient::new(OpenRouterConfig {
        api_base: api_base.to_string(),
        api_key: Some("test-key".to_string()),
        ..Default::default()
    })
    .expect("failed to create client");

    let service = ChatService::new(
        storage,
        Arc::new(client),
        ChatSettings {
            model: "deepseek/deepseek-r1-0528".to_string(),
            max_context_messages: 20,
        },
    );

    (service, tmp)
}

#[allow(dead_code)]
pub fn free_principal() -> Principal {
    Principal {
        id: "user-1".to_string(),
        plan: PlanTier::Free,
    }
}

/// A well-formed chat completion response body.
#[allow(dead_code)]
pub fn completion_body(content: &str, total_tokens: u64) -> serde_json::Value {
    json!({
        "id": "gen-test",
        "object": "chat.completion",
        "created": 1736000000,
        "model": "deepseek/deepseek-r1-0528",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": total_tokens / 2,
            "completion_tokens": total_tokens - total_tokens / 2,
            "total_tokens": total_tokens
        }
    })
}
