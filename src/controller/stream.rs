//! Sending a message and reading its response in the background.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::{ChatError, StreamError};
use crate::models::{Attachment, ChatMessage, ChatRequest, SendOptions, StreamingMessage, UserMessage};
use crate::sse::{read_event_stream, StreamEvent, StreamHandler};
use crate::traits::ChatBackend;

use super::{ChatController, ControllerMessage, IgnoreReason, RequestContext, RequestPhase, SendOutcome};

const NOT_CONFIGURED_MESSAGE: &str =
    "The assistant is not configured yet. Add a model provider in the settings and try again.";

/// Keeps the controller in `Preflight` while the configuration check runs.
///
/// Dropping it, including when the send future is dropped mid-check,
/// returns the phase to `Idle`.
struct PreflightPhase<'a>(&'a mut RequestPhase);

impl<'a> PreflightPhase<'a> {
    fn enter(phase: &'a mut RequestPhase) -> Self {
        *phase = RequestPhase::Preflight;
        Self(phase)
    }
}

impl Drop for PreflightPhase<'_> {
    fn drop(&mut self) {
        *self.0 = RequestPhase::Idle;
    }
}

/// Forwards transport callbacks into the controller channel.
struct ChannelHandler {
    request_id: String,
    tx: mpsc::UnboundedSender<ControllerMessage>,
}

impl ChannelHandler {
    fn send(&self, msg: ControllerMessage) {
        // The controller is gone; nothing left to update.
        let _ = self.tx.send(msg);
    }
}

impl StreamHandler for ChannelHandler {
    fn on_event(&mut self, event: StreamEvent) {
        self.send(ControllerMessage::Event {
            request_id: self.request_id.clone(),
            event,
        });
    }

    fn on_complete(&mut self) {
        self.send(ControllerMessage::StreamEnded {
            request_id: self.request_id.clone(),
        });
    }

    fn on_error(&mut self, error: ChatError) {
        self.send(ControllerMessage::TransportFailed {
            request_id: self.request_id.clone(),
            error,
        });
    }
}

/// Body of the background task for one request.
async fn run_stream(
    backend: Arc<dyn ChatBackend>,
    request: ChatRequest,
    cancel: CancellationToken,
    mut handler: ChannelHandler,
) {
    match backend.open_stream(&request, cancel.clone()).await {
        Ok(body) => {
            handler.send(ControllerMessage::Connected {
                request_id: handler.request_id.clone(),
            });
            read_event_stream(body, &cancel, &mut handler).await;
        }
        Err(e) if cancel.is_cancelled() || e.is_cancellation() => {
            debug!(request_id = %handler.request_id, "request aborted before response");
        }
        Err(e) => {
            error!(request_id = %handler.request_id, error = %e, "failed to open chat stream");
            handler.on_error(e);
        }
    }
}

impl ChatController {
    /// Send a user message and start streaming the answer.
    ///
    /// Returns once the request is in flight; drive the controller with
    /// [`ChatController::process_next`] or [`ChatController::run_until_idle`]
    /// to assemble the answer. Failures never escape: they end up in the
    /// history as assistant error messages.
    pub async fn send_message(
        &mut self,
        text: &str,
        attachments: Vec<Attachment>,
        options: SendOptions,
    ) -> SendOutcome {
        if text.trim().is_empty() && attachments.is_empty() {
            debug!("ignoring empty input");
            return SendOutcome::Ignored(IgnoreReason::EmptyInput);
        }
        if self.is_in_progress() {
            debug!(phase = ?self.phase, "ignoring send while a request is in progress");
            return SendOutcome::Ignored(IgnoreReason::Busy);
        }

        let preflight = {
            let _phase = PreflightPhase::enter(&mut self.phase);
            match self.backend.check_configured().await {
                Ok(true) => None,
                Ok(false) => Some(ChatError::Config(NOT_CONFIGURED_MESSAGE.to_string())),
                Err(e) => Some(e),
            }
        };
        if let Some(e) = preflight {
            info!(error = %e, "preflight failed, not sending");
            self.append_message(ChatMessage::User(UserMessage::new(text, attachments)));
            self.append_error(e.user_message());
            return SendOutcome::PreflightFailed;
        }

        self.supersede_active();

        let request_id = Uuid::new_v4().to_string();
        let cancel = CancellationToken::new();
        let request = ChatRequest::new(text, attachments.clone())
            .with_options(options)
            .with_session(self.session_id.clone())
            .with_history(&self.messages, self.config.history_limit);

        self.append_message(ChatMessage::User(UserMessage::new(text, attachments)));
        self.streaming = Some(StreamingMessage::new());
        self.active = Some(RequestContext {
            request_id: request_id.clone(),
            cancel: cancel.clone(),
            is_new_conversation: self.session_id.is_none(),
            session_id: self.session_id.clone(),
            user_text: text.to_string(),
        });
        self.phase = RequestPhase::Sending;
        info!(
            request_id = %request_id,
            session_id = ?self.session_id,
            "sending chat request"
        );

        let handler = ChannelHandler {
            request_id: request_id.clone(),
            tx: self.message_tx.clone(),
        };
        tokio::spawn(run_stream(Arc::clone(&self.backend), request, cancel, handler));

        SendOutcome::Started { request_id }
    }

    /// Abort the active request, if any, and silently drop its answer.
    pub(super) fn supersede_active(&mut self) {
        if let Some(ctx) = self.active.take() {
            debug!(request_id = %ctx.request_id, "superseding active request");
            ctx.cancel.cancel();
        }
        self.streaming = None;
        self.phase = RequestPhase::Idle;
    }

    /// Turn a transport failure into an assistant error message.
    pub(super) fn fail_active(&mut self, error: &ChatError) {
        if let Some(ctx) = self.finish_active() {
            error!(
                request_id = %ctx.request_id,
                category = %error.category(),
                retryable = error.is_retryable(),
                error = %error,
                "request failed"
            );
        }
        self.streaming = None;
        self.append_error(error.user_message());
    }

    /// Clear the active request after a terminal outcome.
    pub(super) fn finish_active(&mut self) -> Option<RequestContext> {
        let ctx = self.active.take();
        if let Some(ctx) = &ctx {
            // Stop reading anything the backend sends after the terminal event
            ctx.cancel.cancel();
        }
        self.phase = RequestPhase::Idle;
        ctx
    }
}

/// Error for an `error` event, carrying the backend text verbatim
pub(super) fn backend_error(message: String) -> ChatError {
    StreamError::BackendError { message }.into()
}
