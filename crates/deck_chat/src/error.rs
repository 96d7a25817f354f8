//! Error types for the chat client.

use thiserror::Error;

/// Result type alias for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;

/// Errors that can occur while talking to the orchestration backend.
///
/// The `Display` text of every variant is meant to be shown to the user as is.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Failed to initialize chat session: {0}")]
    InitializationFailed(String),

    #[error("Failed to send message: {0}")]
    SendFailed(String),

    #[error("Backend is not reachable. Check the connection and retry")]
    Disconnected,

    #[error("No active chat session")]
    NoSession,

    #[error("A request is already in progress")]
    Busy,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Chat client has been closed")]
    Closed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Backend returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChatError {
    /// Whether the error came from a failed precondition rather than the backend.
    pub fn is_rejected_locally(&self) -> bool {
        matches!(
            self,
            Self::Disconnected | Self::NoSession | Self::Busy | Self::EmptyMessage | Self::Closed
        )
    }
}
