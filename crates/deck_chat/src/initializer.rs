//! Session creation payloads.
//!
//! Each chat type creates its session with a different body. Defaults are
//! filled in here so the backend always receives complete payloads.

use serde::{Deserialize, Serialize};

use crate::types::{ChatConfig, ChatMode, ChatType};

pub const DEFAULT_MODEL: &str = "qwen2.5:latest";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_PERSONALITY: &str = "helpful";

/// Model settings shared by the direct and independent chat types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelPayload {
    pub name: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub system_prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentPayload {
    #[serde(flatten)]
    pub model: ModelPayload,
    pub personality: String,
    pub capabilities: Vec<String>,
    pub guardrails: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PalettePayload {
    pub name: String,
    pub agent_ref: String,
    pub chat_mode: ChatMode,
    pub context_sharing: bool,
}

/// Body of `POST /sessions`, tagged with `chat_type`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "chat_type", rename_all = "kebab-case")]
pub enum SessionRequest {
    DirectLlm(ModelPayload),
    IndependentAgent(AgentPayload),
    PaletteAgent(PalettePayload),
}

impl SessionRequest {
    /// Build the creation payload for a config, applying defaults
    pub fn from_config(config: &ChatConfig) -> Self {
        let chat_type = config.chat_type();
        let name = |name: &Option<String>| {
            name.clone()
                .unwrap_or_else(|| chat_type.default_session_name().to_string())
        };

        match config {
            ChatConfig::DirectLlm(c) => Self::DirectLlm(ModelPayload {
                name: name(&c.name),
                model: c.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                temperature: c.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                max_tokens: c.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
                system_prompt: c.system_prompt.clone().unwrap_or_default(),
            }),
            ChatConfig::IndependentAgent(c) => Self::IndependentAgent(AgentPayload {
                model: ModelPayload {
                    name: name(&c.name),
                    model: c.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                    temperature: c.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                    max_tokens: c.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
                    system_prompt: c.system_prompt.clone().unwrap_or_default(),
                },
                personality: c
                    .personality
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PERSONALITY.to_string()),
                capabilities: c.capabilities.clone(),
                guardrails: c.guardrails.unwrap_or(true),
            }),
            ChatConfig::PaletteAgent(c) => Self::PaletteAgent(PalettePayload {
                name: name(&c.name),
                agent_ref: c.agent_ref.clone(),
                chat_mode: c.chat_mode.unwrap_or_default(),
                context_sharing: c.context_sharing.unwrap_or(false),
            }),
        }
    }

    pub fn chat_type(&self) -> ChatType {
        match self {
            Self::DirectLlm(_) => ChatType::DirectLlm,
            Self::IndependentAgent(_) => ChatType::IndependentAgent,
            Self::PaletteAgent(_) => ChatType::PaletteAgent,
        }
    }

    /// Session display name sent to the backend
    pub fn name(&self) -> &str {
        match self {
            Self::DirectLlm(p) => &p.name,
            Self::IndependentAgent(p) => &p.model.name,
            Self::PaletteAgent(p) => &p.name,
        }
    }
}
