//! Terminal rendering of chat messages and status.

use deck_chat::{ChatMessage, ConnectionStatus, MessageMetadata, MessageRole};

/// Render one message with its header and optional metadata line
pub fn message(message: &ChatMessage) -> String {
    let time = message
        .timestamp
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());
    let speaker = match message.role {
        MessageRole::User => "you".to_string(),
        MessageRole::Assistant => message
            .metadata
            .as_ref()
            .and_then(|m| m.agent_name.clone())
            .unwrap_or_else(|| "assistant".to_string()),
    };

    let mut out = format!("[{}] {}: {}", time, speaker, message.content);
    if let Some(details) = message.metadata.as_ref().and_then(metadata) {
        out.push_str("\n    ");
        out.push_str(&details);
    }
    out
}

/// Compact metadata summary, `None` when there is nothing to show
pub fn metadata(metadata: &MessageMetadata) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(model) = &metadata.model {
        parts.push(format!("model {}", model));
    }
    if let Some(tokens) = metadata.tokens_used {
        parts.push(format!("{} tokens", tokens));
    }
    if let Some(secs) = metadata.generation_time {
        parts.push(format!("{:.1}s", secs));
    }
    if let Some(confidence) = metadata.routing_confidence {
        parts.push(format!("routing {:.0}%", confidence * 100.0));
    }
    if !metadata.tools_used.is_empty() {
        parts.push(format!("tools: {}", metadata.tools_used.join(", ")));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" · "))
    }
}

pub fn status(status: ConnectionStatus) -> String {
    let icon = match status {
        ConnectionStatus::Connected => "🟢",
        ConnectionStatus::Disconnected => "🔴",
        ConnectionStatus::Checking => "🟡",
    };
    format!("{} backend {}", icon, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let msg = ChatMessage::user("s-1", "hello");
        let out = message(&msg);
        assert!(out.ends_with("you: hello"));
        assert!(!out.contains('\n'));
    }

    #[test]
    fn test_message_without_timestamp() {
        let mut msg = ChatMessage::user("s-1", "hello");
        msg.timestamp = None;
        assert_eq!(message(&msg), "[--:--:--] you: hello");
    }

    #[test]
    fn test_assistant_with_metadata() {
        let meta = MessageMetadata {
            agent_name: Some("Procurement Analyst".to_string()),
            model: Some("llama3".to_string()),
            tokens_used: Some(64),
            routing_confidence: Some(0.9),
            tools_used: vec!["erp_lookup".to_string()],
            ..Default::default()
        };
        let msg = ChatMessage::assistant("m-1", "s-1", "Done.", Some(meta));
        let out = message(&msg);

        assert!(out.contains("Procurement Analyst: Done."));
        assert!(out.contains("model llama3 · 64 tokens · routing 90% · tools: erp_lookup"));
    }

    #[test]
    fn test_status_line() {
        assert_eq!(status(ConnectionStatus::Connected), "🟢 backend connected");
    }
}
