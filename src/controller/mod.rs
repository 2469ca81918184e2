//! Request lifecycle controller
//!
//! [`ChatController`] owns one conversation: the permanent history, the
//! in-progress answer, and the single active request. All state changes go
//! through `&mut self`, either from a public method or from
//! [`ChatController::apply`] consuming a [`ControllerMessage`] produced by a
//! background stream task. There is one writer and no locks.
//!
//! ```text
//! idle -> preflight -> sending -> streaming -> idle
//!                                   |- done
//!                                   |- error
//!                                   |- stopped
//!                                   '- stream ended without terminal event
//! ```
//!
//! - `messages` - channel messages and per-request types
//! - `stream` - `send_message` and the spawned stream task
//! - `handlers` - `apply` and terminal event handling
//! - `cancel` - stop, retry and session switch

mod cancel;
mod handlers;
mod messages;
mod stream;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::cache::TtlCache;
use crate::config::ClientConfig;
use crate::error::ChatResult;
use crate::models::{ChatMessage, ChatMode, StreamingMessage};
use crate::session::SessionReconciler;
use crate::traits::{ChatBackend, ConversationStore};

pub use messages::{ControllerMessage, IgnoreReason, RequestContext, RequestPhase, SendOutcome};

pub struct ChatController {
    backend: Arc<dyn ChatBackend>,
    store: Arc<dyn ConversationStore>,
    config: ClientConfig,
    /// Permanent history
    messages: Vec<ChatMessage>,
    /// Answer being assembled for the active request
    streaming: Option<StreamingMessage>,
    active: Option<RequestContext>,
    phase: RequestPhase,
    session_id: Option<String>,
    reconciler: SessionReconciler,
    mode_cache: TtlCache<Vec<ChatMode>>,
    message_tx: mpsc::UnboundedSender<ControllerMessage>,
    message_rx: mpsc::UnboundedReceiver<ControllerMessage>,
}

impl ChatController {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        store: Arc<dyn ConversationStore>,
        config: ClientConfig,
    ) -> Self {
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            store,
            reconciler: SessionReconciler::new(config.title_max_chars),
            mode_cache: TtlCache::new(config.mode_cache_ttl),
            config,
            messages: Vec::new(),
            streaming: None,
            active: None,
            phase: RequestPhase::Idle,
            session_id: None,
            message_tx,
            message_rx,
        }
    }

    /// Continue an existing conversation (builder pattern)
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn streaming(&self) -> Option<&StreamingMessage> {
        self.streaming.as_ref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    pub fn active_request_id(&self) -> Option<&str> {
        self.active.as_ref().map(|ctx| ctx.request_id.as_str())
    }

    pub fn is_in_progress(&self) -> bool {
        self.phase != RequestPhase::Idle
    }

    /// Sender for injecting messages from outside (UI timers, tests)
    pub fn sender(&self) -> mpsc::UnboundedSender<ControllerMessage> {
        self.message_tx.clone()
    }

    /// Replace the history with messages loaded from the server.
    pub fn set_history(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    /// Whether a history reload for `session_id` may overwrite memory.
    ///
    /// Returns false once for a conversation that was just created here,
    /// whose server-side history may still be empty.
    pub fn should_reload_history(&mut self, session_id: &str) -> bool {
        !self.reconciler.take_just_created(session_id)
    }

    /// Wait for the next background message and apply it.
    ///
    /// Returns false only if the channel is closed.
    pub async fn process_next(&mut self) -> bool {
        match self.message_rx.recv().await {
            Some(msg) => {
                self.apply(msg);
                true
            }
            None => false,
        }
    }

    /// Apply messages until the active request finishes, then flush
    /// whatever is already queued (deferred notifications included).
    pub async fn run_until_idle(&mut self) {
        while self.is_in_progress() {
            if !self.process_next().await {
                break;
            }
        }
        self.drain_pending();
    }

    /// Apply every message already queued, without waiting.
    pub fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(msg) = self.message_rx.try_recv() {
            self.apply(msg);
            applied += 1;
        }
        applied
    }

    /// The mode catalog, memoized for `mode_cache_ttl`.
    pub async fn available_modes(&mut self) -> ChatResult<Vec<ChatMode>> {
        let backend = Arc::clone(&self.backend);
        self.mode_cache
            .get_or_try_fetch(|| async move { backend.fetch_modes().await })
            .await
    }

    pub fn invalidate_modes(&mut self) {
        debug!("mode cache invalidated");
        self.mode_cache.invalidate();
    }

    /// Append to history unless a message with the same id is present.
    fn append_message(&mut self, message: ChatMessage) {
        if self.messages.iter().any(|m| m.id() == message.id()) {
            debug!(message_id = %message.id(), "message already in history");
            return;
        }
        self.messages.push(message);
    }

    fn append_error(&mut self, text: impl Into<String>) {
        self.append_message(ChatMessage::Assistant(StreamingMessage::error(text)));
    }
}
