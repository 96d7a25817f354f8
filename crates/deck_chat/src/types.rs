//! Core types for the chat client.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, ChatResult};

/// Backend-assigned session identifier
pub type SessionId = String;

/// Kind of chat, used as the discriminator on the wire
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ChatType {
    DirectLlm,
    IndependentAgent,
    PaletteAgent,
}

impl ChatType {
    /// Wire name of this chat type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectLlm => "direct-llm",
            Self::IndependentAgent => "independent-agent",
            Self::PaletteAgent => "palette-agent",
        }
    }

    /// Session name used when the config does not provide one
    pub fn default_session_name(&self) -> &'static str {
        match self {
            Self::DirectLlm => "Direct LLM Chat",
            Self::IndependentAgent => "Independent Agent Chat",
            Self::PaletteAgent => "Palette Agent Chat",
        }
    }
}

impl std::fmt::Display for ChatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a palette agent participates in the conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    #[default]
    Standard,
    Collaborative,
    Supervised,
}

/// Settings for a chat with a bare model
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DirectLlmConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// Settings for a standalone agent with its own personality
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndependentAgentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardrails: Option<bool>,
}

/// Settings for a chat with an agent taken from the agent palette
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaletteAgentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Identifier of the palette agent to talk to
    pub agent_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_mode: Option<ChatMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_sharing: Option<bool>,
}

/// Chat configuration, one variant per chat type.
///
/// Built once and then only read. Unknown `type` values are rejected when
/// parsing instead of falling back to some default mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ChatConfig {
    DirectLlm(DirectLlmConfig),
    IndependentAgent(IndependentAgentConfig),
    PaletteAgent(PaletteAgentConfig),
}

impl ChatConfig {
    /// Direct chat with the given model and default settings
    pub fn direct_llm(model: impl Into<String>) -> Self {
        Self::DirectLlm(DirectLlmConfig {
            model: Some(model.into()),
            ..Default::default()
        })
    }

    /// Chat with a palette agent in standard mode
    pub fn palette_agent(agent_ref: impl Into<String>) -> Self {
        Self::PaletteAgent(PaletteAgentConfig {
            name: None,
            agent_ref: agent_ref.into(),
            chat_mode: None,
            context_sharing: None,
        })
    }

    pub fn chat_type(&self) -> ChatType {
        match self {
            Self::DirectLlm(_) => ChatType::DirectLlm,
            Self::IndependentAgent(_) => ChatType::IndependentAgent,
            Self::PaletteAgent(_) => ChatType::PaletteAgent,
        }
    }

    /// Parse and validate a config from JSON text
    pub fn from_json(json: &str) -> ChatResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ChatError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config from a JSON file
    pub fn from_file(path: &Path) -> ChatResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Check value ranges that the type system cannot express
    pub fn validate(&self) -> ChatResult<()> {
        let (temperature, max_tokens) = match self {
            Self::DirectLlm(c) => (c.temperature, c.max_tokens),
            Self::IndependentAgent(c) => (c.temperature, c.max_tokens),
            Self::PaletteAgent(c) => {
                if c.agent_ref.trim().is_empty() {
                    return Err(ChatError::InvalidConfig(
                        "palette agent chat requires an agentRef".to_string(),
                    ));
                }
                (None, None)
            }
        };

        if let Some(t) = temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ChatError::InvalidConfig(format!(
                    "temperature must be between 0.0 and 2.0, got {}",
                    t
                )));
            }
        }
        if max_tokens == Some(0) {
            return Err(ChatError::InvalidConfig(
                "maxTokens must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Message role in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Extra information the backend attaches to assistant messages
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    /// Seconds spent generating the reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools_used: Vec<String>,
}

impl MessageMetadata {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    #[serde(default)]
    pub session_id: SessionId,
    pub role: MessageRole,
    pub content: String,
    /// Creation time; history entries without one stay `None`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl ChatMessage {
    /// Create a new user message with a locally generated ID
    pub fn user(session_id: impl Into<SessionId>, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            role: MessageRole::User,
            content: content.into(),
            timestamp: Some(Utc::now()),
            metadata: None,
        }
    }

    /// Create a new assistant message
    pub fn assistant(
        id: impl Into<String>,
        session_id: impl Into<SessionId>,
        content: impl Into<String>,
        metadata: Option<MessageMetadata>,
    ) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Some(Utc::now()),
            metadata: metadata.filter(|m| !m.is_empty()),
        }
    }
}
