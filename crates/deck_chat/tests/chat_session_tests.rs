//! Integration tests for the chat client.
//!
//! These tests drive the public client API against the in-memory mock
//! backend, covering the full session lifecycle.

use std::sync::Arc;
use std::time::Duration;

use deck_chat::{
    AssistantReply, ChatBackend, ChatClient, ChatConfig, ChatError, ClientState,
    ConnectionStatus, MessageRole, MockBackend, SessionRequest,
};

async fn ready_client(backend: &MockBackend, config: &ChatConfig) -> ChatClient {
    let client = ChatClient::new(Arc::new(backend.clone()));
    client.check_connection().await;
    client.initialize(config).await.unwrap();
    client
}

/// Every chat type yields a session ID or an error, never both.
#[tokio::test]
async fn test_initialize_every_chat_type() {
    let configs = [
        r#"{"type": "direct-llm", "model": "llama3"}"#,
        r#"{"type": "independent-agent", "personality": "analytical", "capabilities": ["sql"]}"#,
        r#"{"type": "palette-agent", "agentRef": "traceability-agent", "chatMode": "supervised"}"#,
    ];

    for json in configs {
        let backend = MockBackend::new();
        let client = ChatClient::new(Arc::new(backend.clone()));
        let config = ChatConfig::from_json(json).unwrap();

        let id = client.initialize(&config).await.unwrap();
        assert!(!id.is_empty());
        assert!(client.last_error().is_none());

        let calls = backend.get_method_calls("create_session");
        let request = calls[0].request.as_ref().unwrap();
        assert_eq!(request.chat_type(), config.chat_type());
    }
}

/// The direct-LLM example from the backend contract.
#[tokio::test]
async fn test_direct_llm_request_body() {
    let backend = MockBackend::new();
    let _client = ready_client(&backend, &ChatConfig::direct_llm("llama3")).await;

    let calls = backend.get_method_calls("create_session");
    let body = serde_json::to_value(calls[0].request.as_ref().unwrap()).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "chat_type": "direct-llm",
            "name": "Direct LLM Chat",
            "model": "llama3",
            "temperature": 0.7,
            "maxTokens": 1000,
            "systemPrompt": ""
        })
    );
}

/// A failed initialization surfaces an error and leaves no session.
#[tokio::test]
async fn test_failed_initialize_then_retry() {
    let backend = MockBackend::new().simulate_failure("connection refused");
    let client = ChatClient::new(Arc::new(backend.clone()));

    let err = client
        .initialize(&ChatConfig::direct_llm("llama3"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("connection refused"));
    assert!(client.session_id().is_none());

    backend.fail_with(None);
    let id = client.retry_initialize().await.unwrap();
    assert_eq!(client.session_id(), Some(id));
}

/// Conversation order matches send order.
#[tokio::test]
async fn test_conversation_order() {
    let backend = MockBackend::new()
        .add_reply(AssistantReply::text("a-1", "first answer"))
        .add_reply(AssistantReply::text("a-2", "second answer"));
    let client = ready_client(&backend, &ChatConfig::direct_llm("llama3")).await;

    client.send("first question").await.unwrap();
    client.send("second question").await.unwrap();

    let contents: Vec<_> = client.messages().into_iter().map(|m| m.content).collect();
    assert_eq!(
        contents,
        vec!["first question", "first answer", "second question", "second answer"]
    );
}

/// Losing the connection disables sending until it comes back.
#[tokio::test]
async fn test_connection_loss_blocks_sending() {
    let backend = MockBackend::new();
    let client = ready_client(&backend, &ChatConfig::direct_llm("llama3")).await;

    backend.go_offline();
    assert_eq!(client.check_connection().await, ConnectionStatus::Disconnected);
    backend.clear_calls();

    assert!(matches!(client.send("hello").await, Err(ChatError::Disconnected)));
    assert!(!backend.was_called("send_message"));
    assert!(client.messages().is_empty());

    backend.go_online();
    client.check_connection().await;
    assert!(client.snapshot().can_send());
    client.send("hello").await.unwrap();
    assert_eq!(client.messages().len(), 2);
}

/// A failed send removes the optimistic message and keeps the client usable.
#[tokio::test]
async fn test_failed_send_rollback() {
    let backend = MockBackend::new();
    let client = ready_client(&backend, &ChatConfig::direct_llm("llama3")).await;

    backend.fail_with(Some("upstream timeout".to_string()));
    let err = client.send("will fail").await.unwrap_err();
    assert!(matches!(err, ChatError::SendFailed(_)));

    let snapshot = client.snapshot();
    assert!(snapshot.messages.is_empty());
    assert_eq!(snapshot.state, ClientState::Error);
    assert!(snapshot.last_error.unwrap().contains("upstream timeout"));
    assert!(snapshot.session_id.is_some());
}

/// The optimistic user message is visible while the request is in flight.
#[tokio::test]
async fn test_optimistic_message_visible_in_flight() {
    let backend = MockBackend::new().with_send_delay(Duration::from_millis(150));
    let client = Arc::new(ready_client(&backend, &ChatConfig::direct_llm("llama3")).await);

    let pending = {
        let client = client.clone();
        tokio::spawn(async move { client.send("in flight").await })
    };
    tokio::time::sleep(Duration::from_millis(40)).await;

    let snapshot = client.snapshot();
    assert_eq!(snapshot.state, ClientState::Sending);
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.messages[0].role, MessageRole::User);
    assert!(!snapshot.can_send());

    pending.await.unwrap().unwrap();
    assert_eq!(client.messages().len(), 2);
}

/// Resuming a session reproduces the conversation held by the backend.
#[tokio::test]
async fn test_resume_matches_backend_history() {
    let backend = MockBackend::new().with_session_id("shared");
    let first = ready_client(&backend, &ChatConfig::palette_agent("qa-agent")).await;
    first.send("remember this").await.unwrap();
    first.close();

    let second = ChatClient::new(Arc::new(backend.clone()));
    let history = second.resume("shared").await.unwrap();
    assert_eq!(history, backend.stored_history("shared"));
    assert_eq!(history.len(), 2);

    let again = second.load_history().await.unwrap();
    assert_eq!(history, again);
}

/// Messages in the list always belong to the current session.
#[tokio::test]
async fn test_messages_belong_to_session() {
    let backend = MockBackend::new();
    let client = ready_client(&backend, &ChatConfig::direct_llm("llama3")).await;
    client.send("one").await.unwrap();

    let old_session = client.session_id().unwrap();
    client.reset().unwrap();
    let new_session = client
        .initialize(&ChatConfig::direct_llm("llama3"))
        .await
        .unwrap();
    assert_ne!(old_session, new_session);
    assert!(client.messages().is_empty());

    client.send("two").await.unwrap();
    assert!(client
        .messages()
        .iter()
        .all(|m| m.session_id == new_session));
}

/// The mock backend implements the same trait the client uses.
#[tokio::test]
async fn test_mock_backend_as_trait_object() {
    let backend: Arc<dyn ChatBackend> = Arc::new(MockBackend::new().with_session_id("dyn"));
    let request = SessionRequest::from_config(&ChatConfig::direct_llm("llama3"));
    assert_eq!(backend.create_session(&request).await.unwrap(), "dyn");
    assert!(backend.health_check().await);
}
