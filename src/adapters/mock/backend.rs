//! Scripted chat backend for testing.
//!
//! Each `open_stream` call consumes the next queued [`MockStream`]. Bodies
//! can be fixed chunk lists, or live channels the test feeds by hand to
//! control exactly when chunks arrive.

use async_trait::async_trait;
use bytes::Bytes;
use futures::channel::mpsc;
use futures_util::{stream, StreamExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use crate::error::{ChatError, ChatResult, NetworkError};
use crate::models::{ChatMode, ChatRequest};
use crate::sse::ByteStream;
use crate::traits::ChatBackend;

/// Sender half of a live mock body
pub type ChunkSender = mpsc::UnboundedSender<ChatResult<Bytes>>;

/// One scripted response to `open_stream`.
pub enum MockStream {
    /// Deliver the chunks, then end the body
    Chunks(Vec<Bytes>),
    /// Deliver the chunks, then fail mid-read
    ChunksThenError(Vec<Bytes>, ChatError),
    /// Deliver the chunks, then hang until cancelled
    ChunksThenPending(Vec<Bytes>),
    /// Chunks pushed by the test through a [`ChunkSender`]
    Live(mpsc::UnboundedReceiver<ChatResult<Bytes>>),
    /// Fail before any byte is delivered
    Fail(ChatError),
}

impl MockStream {
    /// Body made of SSE text chunks
    pub fn text(chunks: &[&str]) -> Self {
        MockStream::Chunks(to_bytes(chunks))
    }

    /// A live body and the sender that feeds it
    pub fn live() -> (Self, ChunkSender) {
        let (tx, rx) = mpsc::unbounded();
        (MockStream::Live(rx), tx)
    }
}

fn to_bytes(chunks: &[&str]) -> Vec<Bytes> {
    chunks
        .iter()
        .map(|c| Bytes::copy_from_slice(c.as_bytes()))
        .collect()
}

/// Format one SSE event block
pub fn sse_block(event_type: &str, data: &str) -> String {
    format!("event: {}\ndata: {}\n\n", event_type, data)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone, Default)]
pub struct MockBackend {
    streams: Arc<Mutex<VecDeque<MockStream>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
    not_configured: Arc<Mutex<bool>>,
    preflight_error: Arc<Mutex<Option<NetworkError>>>,
    preflight_pending: Arc<Mutex<bool>>,
    modes: Arc<Mutex<Vec<ChatMode>>>,
    mode_fetches: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the response for the next `open_stream` call.
    pub fn push_stream(&self, stream: MockStream) {
        lock(&self.streams).push_back(stream);
    }

    /// Queue a complete body made of SSE text chunks.
    pub fn push_text(&self, chunks: &[&str]) {
        self.push_stream(MockStream::text(chunks));
    }

    /// Make the preflight report the backend as unconfigured.
    pub fn set_configured(&self, configured: bool) {
        *lock(&self.not_configured) = !configured;
    }

    /// Make the preflight itself fail.
    pub fn set_preflight_error(&self, error: NetworkError) {
        *lock(&self.preflight_error) = Some(error);
    }

    /// Make the preflight never answer.
    pub fn set_preflight_pending(&self, pending: bool) {
        *lock(&self.preflight_pending) = pending;
    }

    pub fn set_modes(&self, modes: Vec<ChatMode>) {
        *lock(&self.modes) = modes;
    }

    /// Every request passed to `open_stream`, in order
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }

    pub fn mode_fetches(&self) -> usize {
        self.mode_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn check_configured(&self) -> ChatResult<bool> {
        let pending = *lock(&self.preflight_pending);
        if pending {
            std::future::pending::<()>().await;
        }
        if let Some(error) = lock(&self.preflight_error).clone() {
            return Err(error.into());
        }
        Ok(!*lock(&self.not_configured))
    }

    async fn open_stream(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
    ) -> ChatResult<ByteStream> {
        lock(&self.requests).push(request.clone());

        let scripted = lock(&self.streams).pop_front().ok_or_else(|| NetworkError::Other {
            message: "no scripted response".to_string(),
        })?;

        let body: ByteStream = match scripted {
            MockStream::Chunks(chunks) => Box::pin(stream::iter(chunks.into_iter().map(Ok))),
            MockStream::ChunksThenError(chunks, error) => Box::pin(
                stream::iter(chunks.into_iter().map(Ok)).chain(stream::iter(vec![Err(error)])),
            ),
            MockStream::ChunksThenPending(chunks) => Box::pin(
                stream::iter(chunks.into_iter().map(Ok)).chain(stream::pending()),
            ),
            MockStream::Live(rx) => Box::pin(rx),
            MockStream::Fail(error) => return Err(error),
        };

        Ok(Box::pin(
            body.take_until(async move { cancel.cancelled().await }),
        ))
    }

    async fn fetch_modes(&self) -> ChatResult<Vec<ChatMode>> {
        self.mode_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.modes).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_streams_are_consumed_in_order() {
        let backend = MockBackend::new();
        backend.push_text(&["a"]);
        backend.push_stream(MockStream::Fail(ChatError::Cancelled));

        let request = ChatRequest::new("hi", Vec::new());
        let body = backend
            .open_stream(&request, CancellationToken::new())
            .await
            .unwrap();
        let chunks: Vec<_> = body.collect().await;
        assert_eq!(chunks.len(), 1);

        let second = backend.open_stream(&request, CancellationToken::new()).await;
        assert!(matches!(second, Err(ChatError::Cancelled)));
        assert!(backend.open_stream(&request, CancellationToken::new()).await.is_err());
        assert_eq!(backend.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_pending_body_ends_on_cancel() {
        let backend = MockBackend::new();
        backend.push_stream(MockStream::ChunksThenPending(to_bytes(&["x"])));
        let cancel = CancellationToken::new();
        let mut body = backend
            .open_stream(&ChatRequest::new("hi", Vec::new()), cancel.clone())
            .await
            .unwrap();

        assert!(body.next().await.is_some());
        cancel.cancel();
        assert!(body.next().await.is_none());
    }

    #[tokio::test]
    async fn test_preflight_switches() {
        let backend = MockBackend::new();
        assert!(backend.check_configured().await.unwrap());
        backend.set_configured(false);
        assert!(!backend.check_configured().await.unwrap());
        backend.set_preflight_error(NetworkError::Timeout {
            operation: "status check".to_string(),
        });
        assert!(backend.check_configured().await.is_err());
    }
}
