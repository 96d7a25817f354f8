//! Chat client state machine.
//!
//! ```text
//! Uninitialized ──▶ Initializing ──▶ Ready ◀──▶ Sending
//!                        │                        │
//!                        └────────▶ Error ◀───────┘
//! ```
//!
//! `Closed` is terminal and only reached through [`ChatClient::close`].
//!
//! Internal state sits behind a mutex that is never held across an await, so
//! a client can be shared between tasks. At most one request is in flight per
//! client; overlapping calls are rejected with [`ChatError::Busy`].

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::backend::ChatBackend;
use crate::error::{ChatError, ChatResult};
use crate::initializer::SessionRequest;
use crate::prober::{ConnectionMonitor, ConnectionStatus, ProbeTask};
use crate::types::{ChatConfig, ChatMessage, SessionId};

/// Callback invoked with every message committed to the conversation
pub type MessageCallback = Arc<dyn Fn(&ChatMessage) + Send + Sync>;

/// Lifecycle state of a chat client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Uninitialized,
    Initializing,
    Ready,
    Sending,
    Error,
    Closed,
}

impl ClientState {
    fn is_busy(&self) -> bool {
        matches!(self, Self::Initializing | Self::Sending)
    }
}

/// Read-only view of a client for renderers
#[derive(Debug, Clone)]
pub struct ChatSnapshot {
    pub state: ClientState,
    pub session_id: Option<SessionId>,
    pub messages: Vec<ChatMessage>,
    pub last_error: Option<String>,
    pub connection: ConnectionStatus,
}

impl ChatSnapshot {
    /// Whether the input should accept a new message right now
    pub fn can_send(&self) -> bool {
        self.session_id.is_some()
            && matches!(self.state, ClientState::Ready | ClientState::Error)
            && self.connection.is_connected()
    }
}

struct Inner {
    state: ClientState,
    session_id: Option<SessionId>,
    config: Option<ChatConfig>,
    messages: Vec<ChatMessage>,
    last_error: Option<String>,
}

impl Inner {
    /// Reject a new request when closed or already busy
    fn ensure_idle(&self) -> ChatResult<()> {
        if self.state == ClientState::Closed {
            return Err(ChatError::Closed);
        }
        if self.state.is_busy() {
            return Err(ChatError::Busy);
        }
        Ok(())
    }

    fn fail(&mut self, error: &ChatError) {
        self.state = ClientState::Error;
        self.last_error = Some(error.to_string());
    }
}

/// Restores the client if an in-flight request future is dropped.
///
/// Removes the optimistic message (if any), forgets a half-adopted session
/// and moves the state back to `fallback` unless the request already finished.
struct InFlight<'a> {
    inner: &'a Mutex<Inner>,
    optimistic_id: Option<String>,
    fallback: ClientState,
    clear_session: bool,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(inner: &'a Mutex<Inner>, optimistic_id: Option<String>, fallback: ClientState) -> Self {
        Self {
            inner,
            optimistic_id,
            fallback,
            clear_session: false,
            armed: true,
        }
    }

    fn clearing_session(mut self) -> Self {
        self.clear_session = true;
        self
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.inner.lock();
        if let Some(id) = &self.optimistic_id {
            inner.messages.retain(|m| &m.id != id);
        }
        if self.clear_session {
            inner.session_id = None;
            inner.messages.clear();
        }
        if inner.state.is_busy() {
            inner.state = self.fallback;
        }
        debug!("In-flight request cancelled, state restored to {:?}", inner.state);
    }
}

/// Chat session client.
///
/// Owns one session at a time and its ordered message list.
pub struct ChatClient {
    backend: Arc<dyn ChatBackend>,
    monitor: ConnectionMonitor,
    inner: Mutex<Inner>,
    on_message: Option<MessageCallback>,
    probe_task: Mutex<Option<ProbeTask>>,
}

impl ChatClient {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            monitor: ConnectionMonitor::new(backend.clone()),
            backend,
            inner: Mutex::new(Inner {
                state: ClientState::Uninitialized,
                session_id: None,
                config: None,
                messages: Vec::new(),
                last_error: None,
            }),
            on_message: None,
            probe_task: Mutex::new(None),
        }
    }

    /// Register a callback for committed messages
    pub fn with_callback(mut self, callback: impl Fn(&ChatMessage) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Arc::new(callback));
        self
    }

    pub fn monitor(&self) -> &ConnectionMonitor {
        &self.monitor
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.monitor.status()
    }

    /// Probe the backend now (on start or on user retry)
    pub async fn check_connection(&self) -> ConnectionStatus {
        self.monitor.check_now().await
    }

    /// Poll the backend at a fixed interval until the client is closed
    pub fn start_polling(&self, interval: Duration) {
        let task = self.monitor.spawn_polling(interval);
        *self.probe_task.lock() = Some(task);
    }

    pub fn state(&self) -> ClientState {
        self.inner.lock().state
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.inner.lock().session_id.clone()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.inner.lock().messages.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.lock().last_error.clone()
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        let connection = self.connection();
        let inner = self.inner.lock();
        ChatSnapshot {
            state: inner.state,
            session_id: inner.session_id.clone(),
            messages: inner.messages.clone(),
            last_error: inner.last_error.clone(),
            connection,
        }
    }

    /// Create a new backend session for `config`.
    ///
    /// Returns the session ID or an error, never both. On failure the client
    /// has no session and `initialize` (or `retry_initialize`) may be called
    /// again. An invalid config is rejected before any state change.
    pub async fn initialize(&self, config: &ChatConfig) -> ChatResult<SessionId> {
        {
            let mut inner = self.inner.lock();
            inner.ensure_idle()?;
            config.validate()?;
            inner.state = ClientState::Initializing;
            inner.config = Some(config.clone());
            inner.session_id = None;
            inner.messages.clear();
            inner.last_error = None;
        }

        let request = SessionRequest::from_config(config);
        info!("Creating {} session '{}'", request.chat_type(), request.name());

        let mut guard = InFlight::new(&self.inner, None, ClientState::Uninitialized);
        let result = match self.backend.create_session(&request).await {
            Ok(id) if !id.trim().is_empty() => Ok(id),
            Ok(_) => Err(ChatError::InitializationFailed(
                "backend returned an empty session id".to_string(),
            )),
            Err(e) => Err(ChatError::InitializationFailed(e.to_string())),
        };

        let mut inner = self.inner.lock();
        guard.disarm();
        match result {
            Ok(id) => {
                info!("Session {} ready", id);
                inner.session_id = Some(id.clone());
                inner.state = ClientState::Ready;
                Ok(id)
            }
            Err(e) => {
                warn!("{}", e);
                inner.fail(&e);
                Err(e)
            }
        }
    }

    /// Initialize again with the last config passed to `initialize`
    pub async fn retry_initialize(&self) -> ChatResult<SessionId> {
        let config = self
            .inner
            .lock()
            .config
            .clone()
            .ok_or_else(|| ChatError::InvalidConfig("no chat configuration to retry".to_string()))?;
        self.initialize(&config).await
    }

    /// Adopt an existing session and load its history.
    ///
    /// Any previous session is dropped first. If loading fails or the future
    /// is dropped, the client is left without a session.
    pub async fn resume(&self, session_id: &str) -> ChatResult<Vec<ChatMessage>> {
        {
            let mut inner = self.inner.lock();
            inner.ensure_idle()?;
            if session_id.trim().is_empty() {
                return Err(ChatError::NoSession);
            }
            inner.session_id = Some(session_id.to_string());
            inner.messages.clear();
            inner.last_error = None;
            inner.state = ClientState::Uninitialized;
        }

        let mut guard =
            InFlight::new(&self.inner, None, ClientState::Uninitialized).clearing_session();
        let result = self.load_history().await;
        guard.disarm();
        if result.is_err() {
            self.inner.lock().session_id = None;
        }
        result
    }

    /// Replace the local message list with the backend history.
    ///
    /// Loading twice for an unchanged session yields the same list.
    pub async fn load_history(&self) -> ChatResult<Vec<ChatMessage>> {
        let (session_id, previous) = {
            let mut inner = self.inner.lock();
            inner.ensure_idle()?;
            let session_id = inner.session_id.clone().ok_or(ChatError::NoSession)?;
            let previous = inner.state;
            inner.state = ClientState::Initializing;
            (session_id, previous)
        };

        debug!("Loading history for session {}", session_id);
        let fallback = if previous == ClientState::Uninitialized {
            ClientState::Uninitialized
        } else {
            ClientState::Ready
        };
        let mut guard = InFlight::new(&self.inner, None, fallback);
        let result = self.backend.history(&session_id).await;

        let mut inner = self.inner.lock();
        guard.disarm();
        match result {
            Ok(history) => {
                let total = history.len();
                let messages: Vec<ChatMessage> = history
                    .into_iter()
                    .filter(|m| m.session_id == session_id)
                    .collect();
                if messages.len() != total {
                    warn!(
                        "Dropped {} history entries belonging to other sessions",
                        total - messages.len()
                    );
                }
                inner.messages = messages.clone();
                inner.state = ClientState::Ready;
                inner.last_error = None;
                Ok(messages)
            }
            Err(e) => {
                let e = ChatError::InitializationFailed(format!("could not load history: {}", e));
                warn!("{}", e);
                inner.fail(&e);
                Err(e)
            }
        }
    }

    /// Send a user message and wait for the assistant reply.
    ///
    /// The user message is appended before the request goes out and removed
    /// again if the request fails or is cancelled. On success the list grows by
    /// exactly two messages (user, then assistant) and the assistant message is
    /// returned.
    pub async fn send(&self, text: &str) -> ChatResult<ChatMessage> {
        let content = text.trim();
        let connected = self.connection().is_connected();

        let (session_id, user_message) = {
            let mut inner = self.inner.lock();
            inner.ensure_idle()?;
            let session_id = inner.session_id.clone().ok_or(ChatError::NoSession)?;
            if content.is_empty() {
                return Err(ChatError::EmptyMessage);
            }
            if !connected {
                return Err(ChatError::Disconnected);
            }

            let user_message = ChatMessage::user(session_id.clone(), content);
            inner.messages.push(user_message.clone());
            inner.state = ClientState::Sending;
            inner.last_error = None;
            (session_id, user_message)
        };

        debug!("Sending message {} to session {}", user_message.id, session_id);
        let mut guard = InFlight::new(&self.inner, Some(user_message.id.clone()), ClientState::Ready);
        let result = self.backend.send_message(&session_id, content).await;

        let assistant = {
            let mut inner = self.inner.lock();
            guard.disarm();
            match result {
                Ok(reply) => {
                    let assistant = reply.into_message(&session_id);
                    inner.messages.push(assistant.clone());
                    inner.state = ClientState::Ready;
                    assistant
                }
                Err(e) => {
                    inner.messages.retain(|m| m.id != user_message.id);
                    let e = ChatError::SendFailed(e.to_string());
                    warn!("{}", e);
                    inner.fail(&e);
                    return Err(e);
                }
            }
        };

        if let Some(callback) = &self.on_message {
            callback(&user_message);
            callback(&assistant);
        }
        Ok(assistant)
    }

    /// Forget the current session and its messages
    pub fn reset(&self) -> ChatResult<()> {
        let mut inner = self.inner.lock();
        inner.ensure_idle()?;
        if let Some(id) = inner.session_id.take() {
            info!("Session {} reset", id);
        }
        inner.messages.clear();
        inner.last_error = None;
        inner.state = ClientState::Uninitialized;
        Ok(())
    }

    /// Tear down: stop polling and refuse further requests
    pub fn close(&self) {
        if let Some(mut task) = self.probe_task.lock().take() {
            task.stop();
        }
        let mut inner = self.inner.lock();
        if inner.state != ClientState::Closed {
            debug!("Chat client closed");
            inner.state = ClientState::Closed;
        }
    }
}

impl Drop for ChatClient {
    fn drop(&mut self) {
        self.close();
    }
}
