//! HTTP implementation of the backend contract.
//!
//! Endpoints:
//! - `POST /sessions` - create a session
//! - `GET /sessions/{id}/history` - ordered message history
//! - `POST /sessions/{id}/messages` - send a message
//! - `GET /health` - reachability probe

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::{AssistantReply, ChatBackend};
use crate::error::{ChatError, ChatResult};
use crate::initializer::SessionRequest;
use crate::settings::ClientSettings;
use crate::types::{ChatMessage, SessionId};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Backend client speaking JSON over HTTP
#[derive(Clone)]
pub struct HttpBackend {
    base_url: Url,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    content: &'a str,
}

/// History comes back either as a bare list or wrapped in `messages`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HistoryResponse {
    List(Vec<ChatMessage>),
    Envelope { messages: Vec<ChatMessage> },
}

impl HttpBackend {
    pub fn new(settings: &ClientSettings) -> ChatResult<Self> {
        settings.validate()?;
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| ChatError::InvalidConfig(format!("{}: {}", settings.base_url, e)))?;
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn url(&self, segments: &[&str]) -> ChatResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ChatError::InvalidConfig(format!("{} cannot be used as a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Turn a non-2xx response into an error carrying the body text
    async fn check_status(response: Response) -> ChatResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!("Backend returned {}: {}", status, body);
        Err(ChatError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn create_session(&self, request: &SessionRequest) -> ChatResult<SessionId> {
        let url = self.url(&["sessions"])?;
        debug!("POST {} ({})", url, request.chat_type());

        let response = self.client.post(url).json(request).send().await?;
        let created: CreateSessionResponse = Self::check_status(response).await?.json().await?;
        Ok(created.session_id)
    }

    async fn history(&self, session_id: &str) -> ChatResult<Vec<ChatMessage>> {
        let url = self.url(&["sessions", session_id, "history"])?;
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let history: HistoryResponse = Self::check_status(response).await?.json().await?;
        let mut messages = match history {
            HistoryResponse::List(messages) => messages,
            HistoryResponse::Envelope { messages } => messages,
        };
        for message in messages.iter_mut().filter(|m| m.session_id.is_empty()) {
            message.session_id = session_id.to_string();
        }
        Ok(messages)
    }

    async fn send_message(&self, session_id: &str, content: &str) -> ChatResult<AssistantReply> {
        let url = self.url(&["sessions", session_id, "messages"])?;
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(&SendMessageRequest { content })
            .send()
            .await?;
        Ok(Self::check_status(response).await?.json().await?)
    }

    async fn health_check(&self) -> bool {
        let url = match self.url(&["health"]) {
            Ok(url) => url,
            Err(_) => return false,
        };
        match self.client.get(url).timeout(HEALTH_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Health check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(&ClientSettings {
            base_url: base.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_url_building() {
        let backend = backend("http://localhost:8000");
        assert_eq!(
            backend.url(&["sessions", "abc", "history"]).unwrap().as_str(),
            "http://localhost:8000/sessions/abc/history"
        );
    }

    #[test]
    fn test_url_keeps_base_path() {
        let backend = backend("http://localhost:8000/api/");
        assert_eq!(
            backend.url(&["health"]).unwrap().as_str(),
            "http://localhost:8000/api/health"
        );
    }

    #[test]
    fn test_session_id_is_encoded() {
        let backend = backend("http://localhost:8000");
        assert_eq!(
            backend.url(&["sessions", "a/b c", "messages"]).unwrap().as_str(),
            "http://localhost:8000/sessions/a%2Fb%20c/messages"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let result = HttpBackend::new(&ClientSettings {
            base_url: "ftp://localhost".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(ChatError::InvalidConfig(_))));
    }
}
