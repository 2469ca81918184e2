//! Chat backend trait abstraction.
//!
//! The network side of a chat exchange: a configuration preflight, the
//! streaming request itself, and the dynamic mode catalog.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ChatResult;
use crate::models::{ChatMode, ChatRequest};
use crate::sse::ByteStream;

/// Trait for the service that answers chat requests.
///
/// Implementations include the reqwest-based [`crate::adapters::HttpChatBackend`]
/// and the scripted [`crate::adapters::MockBackend`] used in tests.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Whether the backend has what it needs to answer (e.g. a model
    /// provider is configured). `Ok(false)` means "not ready", not failure.
    async fn check_configured(&self) -> ChatResult<bool>;

    /// Send `request` and return the raw response body.
    ///
    /// A non-2xx response is an error. The returned stream should end
    /// promptly once `cancel` fires, though callers do not rely on it.
    async fn open_stream(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> ChatResult<ByteStream>;

    /// Fetch the list of modes the backend currently offers.
    async fn fetch_modes(&self) -> ChatResult<Vec<ChatMode>>;
}
