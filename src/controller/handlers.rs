//! Applying background messages to controller state.

use tracing::{debug, info, warn};

use crate::assembler::{apply_event, finalize, DonePayload, ErrorPayload, ServerEvent};
use crate::error::StreamError;
use crate::models::ChatMessage;
use crate::session;
use crate::sse::StreamEvent;

use super::stream::backend_error;
use super::{ChatController, ControllerMessage, RequestPhase};

impl ChatController {
    /// Single entry point for state changes coming from stream tasks.
    ///
    /// Messages tagged with a request id other than the active one are
    /// dropped without touching any state.
    pub fn apply(&mut self, msg: ControllerMessage) {
        if let Some(request_id) = msg.request_id() {
            if self.active_request_id() != Some(request_id) {
                debug!(request_id = %request_id, "dropping message from inactive request");
                return;
            }
        }

        match msg {
            ControllerMessage::Connected { request_id } => {
                debug!(request_id = %request_id, "response stream connected");
                self.phase = RequestPhase::Streaming;
            }
            ControllerMessage::Event { event, .. } => self.handle_event(event),
            ControllerMessage::StreamEnded { request_id } => self.handle_stream_ended(&request_id),
            ControllerMessage::TransportFailed { request_id, error } => {
                if error.is_cancellation() {
                    debug!(request_id = %request_id, "transport cancelled");
                    self.supersede_active();
                    return;
                }
                self.fail_active(&error);
            }
            ControllerMessage::Notify(notice) => {
                session::dispatch(&notice, self.store.as_ref());
            }
        }
    }

    fn handle_event(&mut self, event: StreamEvent) {
        if !event.is_terminal() {
            self.streaming = apply_event(self.streaming.take(), &event);
            return;
        }

        match ServerEvent::from_stream_event(&event) {
            Ok(ServerEvent::Done(payload)) => self.handle_done(payload),
            Ok(ServerEvent::Error(payload)) => self.handle_error(payload),
            other => debug!(result = ?other, "unexpected terminal decode"),
        }
    }

    fn handle_done(&mut self, payload: DonePayload) {
        let Some(ctx) = self.finish_active() else {
            return;
        };

        if let Some(mut message) = self.streaming.take().map(finalize) {
            message.is_complete = true;
            message.structured_data = payload.structured_data;
            self.append_message(ChatMessage::Assistant(message));
        }

        let session_id = payload.session_id.or_else(|| ctx.session_id.clone());
        if let Some(id) = &session_id {
            self.session_id = Some(id.clone());
        }
        info!(
            request_id = %ctx.request_id,
            session_id = ?session_id,
            "chat response complete"
        );

        let notice = self.reconciler.on_done(
            ctx.is_new_conversation,
            session_id.as_deref(),
            &ctx.user_text,
        );
        if let Some(notice) = notice {
            // Queued behind the append so the store hears about it afterwards
            let _ = self.message_tx.send(ControllerMessage::Notify(notice));
        }
    }

    fn handle_error(&mut self, payload: ErrorPayload) {
        self.fail_active(&backend_error(payload.message_or_default()));
    }

    fn handle_stream_ended(&mut self, request_id: &str) {
        warn!(
            request_id = %request_id,
            error = %StreamError::Incomplete,
            "keeping partial answer"
        );
        self.finish_active();
        if let Some(mut message) = self.streaming.take().map(finalize) {
            message.is_complete = true;
            self.append_message(ChatMessage::Assistant(message));
        }
    }
}
