//! Orchestration backend contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChatResult;
use crate::initializer::SessionRequest;
use crate::types::{ChatMessage, MessageMetadata, SessionId};

/// Structured reply to `POST /sessions/{id}/messages`.
///
/// The reply is always the assistant's turn; any `type` field on the wire is
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantReply {
    pub message_id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools_used: Vec<String>,
}

impl AssistantReply {
    /// Plain reply without metadata
    pub fn text(message_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            content: content.into(),
            model: None,
            agent_id: None,
            agent_name: None,
            tokens_used: None,
            generation_time: None,
            routing_confidence: None,
            routing_reasoning: None,
            tools_used: Vec::new(),
        }
    }

    pub fn metadata(&self) -> MessageMetadata {
        MessageMetadata {
            model: self.model.clone(),
            agent_id: self.agent_id.clone(),
            agent_name: self.agent_name.clone(),
            tokens_used: self.tokens_used,
            generation_time: self.generation_time,
            routing_confidence: self.routing_confidence,
            routing_reasoning: self.routing_reasoning.clone(),
            tools_used: self.tools_used.clone(),
        }
    }

    /// Convert into a message belonging to `session_id`
    pub fn into_message(self, session_id: &str) -> ChatMessage {
        let metadata = self.metadata();
        ChatMessage::assistant(self.message_id, session_id, self.content, Some(metadata))
    }
}

/// Orchestration backend trait.
///
/// All calls are plain request/response. Implementations must turn non-2xx
/// responses and transport failures into errors with readable text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Create a session and return its backend-assigned ID.
    async fn create_session(&self, request: &SessionRequest) -> ChatResult<SessionId>;

    /// Fetch the ordered message history of a session.
    async fn history(&self, session_id: &str) -> ChatResult<Vec<ChatMessage>>;

    /// Post a user message and wait for the assistant reply.
    async fn send_message(&self, session_id: &str, content: &str) -> ChatResult<AssistantReply>;

    /// Lightweight reachability check.
    async fn health_check(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;

    #[test]
    fn test_reply_wire_format() {
        let reply: AssistantReply = serde_json::from_str(
            r#"{
                "message_id": "m-42",
                "content": "Two suppliers are late.",
                "type": "assistant",
                "agent_name": "Procurement Analyst",
                "tokens_used": 128,
                "routing_confidence": 0.92,
                "tools_used": ["supplier_lookup"]
            }"#,
        )
        .unwrap();

        assert_eq!(reply.tokens_used, Some(128));

        let message = reply.into_message("s-1");
        assert_eq!(message.id, "m-42");
        assert_eq!(message.session_id, "s-1");
        let metadata = message.metadata.unwrap();
        assert_eq!(metadata.agent_name.as_deref(), Some("Procurement Analyst"));
        assert_eq!(metadata.tools_used, vec!["supplier_lookup".to_string()]);
    }

    #[test]
    fn test_reply_without_type_or_metadata() {
        let reply: AssistantReply =
            serde_json::from_str(r#"{"message_id": "m-1", "content": "ok"}"#).unwrap();
        let message = reply.into_message("s-1");
        assert_eq!(message.role, MessageRole::Assistant);
        assert!(message.metadata.is_none());
    }

    #[test]
    fn test_reply_is_assistant_whatever_the_type() {
        let reply: AssistantReply =
            serde_json::from_str(r#"{"message_id": "m-1", "content": "x", "type": "user"}"#)
                .unwrap();
        assert_eq!(reply.into_message("s-1").role, MessageRole::Assistant);
    }
}
