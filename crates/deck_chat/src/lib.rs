//! # deck_chat - Chat Session Client for agentdeck
//!
//! This crate talks to the local orchestration backend on behalf of a chat
//! front end:
//! - Session creation for direct-LLM, independent-agent and palette-agent chats
//! - History loading for existing sessions
//! - Message sending with optimistic updates and rollback on failure
//! - Connection probing with a cancellable polling task
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   ChatConfig    │────▶│   ChatClient    │────▶│   ChatBackend   │
//! └─────────────────┘     └────────┬────────┘     └────────┬────────┘
//!                                  │                       │
//!                                  ▼                       ▼
//!                        ┌──────────────────┐    ┌───────────────────┐
//!                        │ConnectionMonitor │    │ HttpBackend /     │
//!                        │  + ProbeTask     │    │ MockBackend       │
//!                        └──────────────────┘    └───────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use deck_chat::{ChatClient, ChatConfig, ClientSettings, HttpBackend};
//!
//! # async fn run() -> deck_chat::ChatResult<()> {
//! let settings = ClientSettings::default();
//! let backend = Arc::new(HttpBackend::new(&settings)?);
//! let client = ChatClient::new(backend);
//!
//! client.check_connection().await;
//! client.initialize(&ChatConfig::direct_llm("llama3")).await?;
//! let reply = client.send("Hello there").await?;
//! println!("{}", reply.content);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod client;
pub mod error;
pub mod http;
pub mod initializer;
pub mod mock;
pub mod prober;
pub mod settings;
pub mod types;

pub use backend::{AssistantReply, ChatBackend};
pub use client::{ChatClient, ChatSnapshot, ClientState, MessageCallback};
pub use error::{ChatError, ChatResult};
pub use http::HttpBackend;
pub use initializer::{SessionRequest, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
pub use mock::{CapturedCall, MockBackend};
pub use prober::{ConnectionMonitor, ConnectionStatus, ProbeTask};
pub use settings::ClientSettings;
pub use types::*;
