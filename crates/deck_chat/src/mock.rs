//! Mock backend for testing.
//!
//! Provides a configurable in-memory implementation of the ChatBackend trait
//! for use in tests and offline demos without a running orchestration server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::backend::{AssistantReply, ChatBackend};
use crate::error::{ChatError, ChatResult};
use crate::initializer::SessionRequest;
use crate::types::{ChatMessage, SessionId};

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub method: String,
    pub session_id: Option<String>,
    pub content: Option<String>,
    pub request: Option<SessionRequest>,
}

impl CapturedCall {
    fn new(method: &str) -> Self {
        Self {
            method: method.to_string(),
            session_id: None,
            content: None,
            request: None,
        }
    }
}

/// Mock orchestration backend.
///
/// Sessions and their histories live in memory. Replies are taken from a
/// scripted list in order (cycling); with no script the mock echoes the
/// user's text. Every call is captured for later inspection.
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health checks succeed.
    available: Arc<RwLock<bool>>,
    /// Scripted replies for send_message.
    replies: Arc<RwLock<Vec<AssistantReply>>>,
    /// Index of next reply to return.
    reply_index: Arc<AtomicUsize>,
    /// Number of sessions created so far.
    session_counter: Arc<AtomicUsize>,
    /// Session ID to hand out instead of a generated one.
    fixed_session_id: Arc<RwLock<Option<String>>>,
    /// Stored history per session.
    histories: Arc<RwLock<HashMap<SessionId, Vec<ChatMessage>>>>,
    /// Simulated failure returned by every non-health call.
    simulate_failure: Arc<RwLock<Option<String>>>,
    /// Artificial latency for send_message.
    send_delay: Arc<RwLock<Option<Duration>>>,
    /// Artificial latency for history.
    history_delay: Arc<RwLock<Option<Duration>>>,
    /// Captured calls for verification.
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new() -> Self {
        Self {
            available: Arc::new(RwLock::new(true)),
            replies: Arc::new(RwLock::new(Vec::new())),
            reply_index: Arc::new(AtomicUsize::new(0)),
            session_counter: Arc::new(AtomicUsize::new(0)),
            fixed_session_id: Arc::new(RwLock::new(None)),
            histories: Arc::new(RwLock::new(HashMap::new())),
            simulate_failure: Arc::new(RwLock::new(None)),
            send_delay: Arc::new(RwLock::new(None)),
            history_delay: Arc::new(RwLock::new(None)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Set whether health checks succeed.
    pub fn set_available(self, available: bool) -> Self {
        *self.available.write() = available;
        self
    }

    /// Add a reply for the next send_message call.
    pub fn add_reply(self, reply: AssistantReply) -> Self {
        self.replies.write().push(reply);
        self
    }

    /// Hand out this session ID on every create_session call.
    pub fn with_session_id(self, session_id: impl Into<String>) -> Self {
        *self.fixed_session_id.write() = Some(session_id.into());
        self
    }

    /// Seed the history of a session.
    pub fn with_history(self, session_id: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        self.histories.write().insert(session_id.into(), messages);
        self
    }

    /// Set a failure to simulate.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    /// Delay every send_message call.
    pub fn with_send_delay(self, delay: Duration) -> Self {
        *self.send_delay.write() = Some(delay);
        self
    }

    /// Delay every history call.
    pub fn with_history_delay(self, delay: Duration) -> Self {
        *self.history_delay.write() = Some(delay);
        self
    }

    /// Flip reachability on a shared instance.
    pub fn go_offline(&self) {
        *self.available.write() = false;
    }

    pub fn go_online(&self) {
        *self.available.write() = true;
    }

    /// Start or stop failing on a shared instance.
    pub fn fail_with(&self, message: Option<String>) {
        *self.simulate_failure.write() = message;
    }

    /// Current stored history of a session.
    pub fn stored_history(&self, session_id: &str) -> Vec<ChatMessage> {
        self.histories
            .read()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Check if a specific method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.method == method)
    }

    /// Get calls to a specific method.
    pub fn get_method_calls(&self, method: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    fn record_call(&self, call: CapturedCall) {
        self.captured_calls.write().push(call);
    }

    fn check_failure(&self) -> ChatResult<()> {
        if let Some(msg) = self.simulate_failure.read().clone() {
            return Err(ChatError::Http {
                status: 500,
                body: msg,
            });
        }
        Ok(())
    }

    fn next_reply(&self, content: &str) -> AssistantReply {
        let replies = self.replies.read();
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        if replies.is_empty() {
            return AssistantReply::text(id, format!("Echo: {}", content));
        }
        let index = self.reply_index.fetch_add(1, Ordering::SeqCst);
        replies
            .get(index % replies.len())
            .cloned()
            .unwrap_or_else(|| AssistantReply::text(id, String::new()))
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn create_session(&self, request: &SessionRequest) -> ChatResult<SessionId> {
        self.record_call(CapturedCall {
            request: Some(request.clone()),
            ..CapturedCall::new("create_session")
        });
        self.check_failure()?;

        let number = self.session_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let session_id = self
            .fixed_session_id
            .read()
            .clone()
            .unwrap_or_else(|| format!("mock-session-{}", number));
        self.histories.write().entry(session_id.clone()).or_default();
        Ok(session_id)
    }

    async fn history(&self, session_id: &str) -> ChatResult<Vec<ChatMessage>> {
        self.record_call(CapturedCall {
            session_id: Some(session_id.to_string()),
            ..CapturedCall::new("history")
        });

        let delay = *self.history_delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_failure()?;

        self.histories
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| ChatError::Http {
                status: 404,
                body: format!("session {} not found", session_id),
            })
    }

    async fn send_message(&self, session_id: &str, content: &str) -> ChatResult<AssistantReply> {
        self.record_call(CapturedCall {
            session_id: Some(session_id.to_string()),
            content: Some(content.to_string()),
            ..CapturedCall::new("send_message")
        });

        let delay = *self.send_delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_failure()?;

        if !self.histories.read().contains_key(session_id) {
            return Err(ChatError::Http {
                status: 404,
                body: format!("session {} not found", session_id),
            });
        }

        let reply = self.next_reply(content);
        let mut histories = self.histories.write();
        let history = histories.entry(session_id.to_string()).or_default();
        history.push(ChatMessage::user(session_id, content));
        history.push(reply.clone().into_message(session_id));
        Ok(reply)
    }

    async fn health_check(&self) -> bool {
        self.record_call(CapturedCall::new("health_check"));
        *self.available.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatConfig;

    #[tokio::test]
    async fn test_mock_backend_basic() {
        let backend = MockBackend::new().add_reply(AssistantReply::text("m-1", "All sensors nominal"));
        let request = SessionRequest::from_config(&ChatConfig::direct_llm("llama3"));

        let session_id = backend.create_session(&request).await.unwrap();
        assert_eq!(session_id, "mock-session-1");

        let reply = backend.send_message(&session_id, "Status?").await.unwrap();
        assert_eq!(reply.content, "All sensors nominal");
        assert_eq!(backend.stored_history(&session_id).len(), 2);
    }

    #[tokio::test]
    async fn test_mock_backend_captures_calls() {
        let backend = MockBackend::new().with_session_id("fixed");
        let request = SessionRequest::from_config(&ChatConfig::palette_agent("safety-officer"));

        backend.create_session(&request).await.unwrap();
        backend.send_message("fixed", "hello").await.unwrap();

        let calls = backend.get_method_calls("send_message");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].session_id.as_deref(), Some("fixed"));
        assert_eq!(calls[0].content.as_deref(), Some("hello"));

        let created = backend.get_method_calls("create_session");
        assert_eq!(created[0].request.as_ref(), Some(&request));

        let methods: Vec<String> = backend.get_calls().into_iter().map(|c| c.method).collect();
        assert_eq!(methods, vec!["create_session", "send_message"]);

        backend.clear_calls();
        assert!(backend.get_calls().is_empty());
    }

    #[tokio::test]
    async fn test_mock_backend_failure_simulation() {
        let backend = MockBackend::new().simulate_failure("model crashed");
        let request = SessionRequest::from_config(&ChatConfig::direct_llm("llama3"));

        let err = backend.create_session(&request).await.unwrap_err();
        assert!(err.to_string().contains("model crashed"));

        backend.fail_with(None);
        assert!(backend.create_session(&request).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_backend_unknown_session() {
        let backend = MockBackend::new();
        assert!(backend.history("missing").await.is_err());
        assert!(backend.send_message("missing", "hi").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_backend_availability() {
        let backend = MockBackend::new();
        assert!(backend.health_check().await);

        backend.go_offline();
        assert!(!backend.health_check().await);
        assert_eq!(backend.call_count(), 2);
        assert!(backend.was_called("health_check"));

        let offline = MockBackend::new().set_available(false);
        assert!(!offline.health_check().await);
    }
}
