//! Conversation store trait abstraction.

/// External owner of the conversation list.
///
/// Notifications are fire-and-forget; the store decides what to refresh.
pub trait ConversationStore: Send + Sync {
    /// A new conversation exists server-side under `session_id`.
    fn conversation_created(&self, session_id: &str, title: &str);

    /// An existing conversation received a new exchange.
    fn conversation_updated(&self, session_id: &str);
}
