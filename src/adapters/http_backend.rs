//! Reqwest-based chat backend adapter.
//!
//! Talks to the chat service over HTTP: a JSON POST answered with an event
//! stream, plus two small JSON GETs for the preflight and the mode list.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{classify_reqwest_error, ChatError, ChatResult, NetworkError};
use crate::models::{ChatMode, ChatRequest};
use crate::sse::ByteStream;
use crate::traits::ChatBackend;

/// Path of the configuration status endpoint
pub const CONFIG_STATUS_PATH: &str = "/api/config/status";
/// Path of the mode catalog endpoint
pub const MODES_PATH: &str = "/api/modes";

#[derive(Debug, Deserialize)]
struct ConfigStatus {
    #[serde(default = "default_configured", alias = "is_configured")]
    configured: bool,
}

fn default_configured() -> bool {
    true
}

/// Either a bare list or `{"modes": [...]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ModesBody {
    List(Vec<ChatMode>),
    Wrapped { modes: Vec<ChatMode> },
}

impl ModesBody {
    fn into_modes(self) -> Vec<ChatMode> {
        match self {
            ModesBody::List(modes) | ModesBody::Wrapped { modes } => modes,
        }
    }
}

/// HTTP implementation of [`ChatBackend`].
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: Client,
    config: ClientConfig,
}

impl HttpChatBackend {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Use a preconfigured client (timeouts, proxies, TLS).
    pub fn with_client(client: Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, url: &str) -> ChatResult<Response> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, url))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(NetworkError::HttpStatus { status, message }.into());
        }
        Ok(response)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> ChatResult<T> {
        let url = self.config.endpoint(path);
        let response = self.send(self.client.get(&url), &url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(&e, &url))?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn check_configured(&self) -> ChatResult<bool> {
        let status: ConfigStatus = self.get_json(CONFIG_STATUS_PATH).await?;
        Ok(status.configured)
    }

    async fn open_stream(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> ChatResult<ByteStream> {
        let url = self.config.stream_url();
        debug!(url = %url, session_id = ?request.session_id, "opening chat stream");

        let builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(request);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ChatError::Cancelled),
            response = self.send(builder, &url) => response?,
        };

        let stream = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| ChatError::from(classify_reqwest_error(&e, &url))))
            .take_until(async move { cancel.cancelled().await });

        Ok(Box::pin(stream))
    }

    async fn fetch_modes(&self) -> ChatResult<Vec<ChatMode>> {
        let body: ModesBody = self.get_json(MODES_PATH).await?;
        Ok(body.into_modes())
    }
}
