//! Async driver: byte stream in, callbacks out.

use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::ChatError;
use crate::sse::events::StreamEvent;
use crate::sse::parser::EventStreamDecoder;

/// Response body as delivered by a [`crate::traits::ChatBackend`].
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ChatError>> + Send>>;

/// Receiver of transport callbacks.
///
/// Exactly one of `on_complete` / `on_error` is called, unless the read was
/// cancelled, in which case neither is.
pub trait StreamHandler {
    /// A complete event block was decoded.
    fn on_event(&mut self, event: StreamEvent);
    /// The body ended normally.
    fn on_complete(&mut self);
    /// The body failed for a reason other than cancellation.
    fn on_error(&mut self, error: ChatError);
}

/// Read `stream` to the end, dispatching decoded events to `handler`.
///
/// Cancellation is an expected outcome: once `cancel` fires the reader
/// stops without calling `on_error` or `on_complete`.
pub async fn read_event_stream<S, H>(mut stream: S, cancel: &CancellationToken, handler: &mut H)
where
    S: Stream<Item = Result<Bytes, ChatError>> + Unpin,
    H: StreamHandler + ?Sized,
{
    let mut decoder = EventStreamDecoder::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("stream read cancelled");
                return;
            }
            next = stream.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                for event in decoder.push(&chunk) {
                    if cancel.is_cancelled() {
                        return;
                    }
                    handler.on_event(event);
                }
            }
            Some(Err(e)) => {
                if cancel.is_cancelled() || e.is_cancellation() {
                    tracing::debug!("stream aborted: {}", e);
                    return;
                }
                tracing::error!(error = %e, "stream read failed");
                handler.on_error(e);
                return;
            }
            None => {
                if let Some(event) = decoder.finish() {
                    handler.on_event(event);
                }
                handler.on_complete();
                return;
            }
        }
    }
}
