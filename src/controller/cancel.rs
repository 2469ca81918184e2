//! Stopping, retrying and switching away from a request.

use tracing::{debug, info};

use crate::assembler::finalize;
use crate::models::{ChatMessage, SendOptions};

use super::{ChatController, IgnoreReason, SendOutcome};

impl ChatController {
    /// Stop generation and keep what was received so far.
    ///
    /// The partial answer is finalized and appended with `is_stopped` set.
    /// Anything the aborted stream still delivers is dropped. Returns false
    /// if nothing was in progress.
    pub fn stop_generation(&mut self) -> bool {
        let Some(ctx) = self.finish_active() else {
            return false;
        };
        info!(request_id = %ctx.request_id, "generation stopped by user");

        if let Some(mut message) = self.streaming.take().map(finalize) {
            message.is_stopped = true;
            message.is_complete = true;
            self.append_message(ChatMessage::Assistant(message));
        }
        true
    }

    /// Switch to another conversation, or to a blank one with `None`.
    ///
    /// Any in-flight request is cancelled and its answer discarded. The
    /// history is cleared; load the target's history with
    /// [`ChatController::set_history`] when
    /// [`ChatController::should_reload_history`] allows it.
    pub fn switch_session(&mut self, session_id: Option<String>) {
        self.supersede_active();
        self.messages.clear();
        debug!(session_id = ?session_id, "switched session");
        self.session_id = session_id;
    }

    /// Resend the user message that led to the answer at `index`.
    ///
    /// History is truncated to before that user message and the session id
    /// is dropped, so the retry starts a new server-side conversation. The
    /// original attachments are resent; mode and instruction are not kept
    /// on messages and are therefore not reapplied.
    pub async fn retry_from_index(&mut self, index: usize) -> SendOutcome {
        let end = index.min(self.messages.len());
        let Some(user_index) = self.messages[..end]
            .iter()
            .rposition(|m| m.as_user().is_some())
        else {
            debug!(index, "no user message before retry target");
            return SendOutcome::Ignored(IgnoreReason::NothingToRetry);
        };

        let (text, attachments) = match self.messages[user_index].as_user() {
            Some(user) => (user.content.clone(), user.attachments.clone()),
            None => return SendOutcome::Ignored(IgnoreReason::NothingToRetry),
        };

        self.supersede_active();
        self.messages.truncate(user_index);
        self.session_id = None;
        info!(index, user_index, "retrying message");

        self.send_message(&text, attachments, SendOptions::default())
            .await
    }
}
