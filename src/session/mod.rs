//! Session reconciliation
//!
//! After a successful exchange, decides whether it opened a new
//! conversation or continued one, and tells the conversation store.
//!
//! The reconciler only produces a [`SessionNotice`]; the controller queues
//! it behind the message append and calls [`dispatch`] later, so the store
//! never observes the conversation before the answer is in history.

use tracing::{debug, info};

use crate::models::truncate_title;
use crate::traits::ConversationStore;

/// Title used when the user's input has no text (attachments only)
pub const UNTITLED_CONVERSATION: &str = "New conversation";

/// What the conversation store should hear about a finished exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    Created { session_id: String, title: String },
    Updated { session_id: String },
}

#[derive(Debug, Clone)]
pub struct SessionReconciler {
    /// Session created in memory whose history must not be reloaded yet
    just_created: Option<String>,
    title_max_chars: usize,
}

impl SessionReconciler {
    pub fn new(title_max_chars: usize) -> Self {
        Self {
            just_created: None,
            title_max_chars,
        }
    }

    /// Reconcile a `done` event.
    ///
    /// `was_new` is whether the request went out without a session id.
    /// Without a server session id there is nothing to reconcile.
    pub fn on_done(
        &mut self,
        was_new: bool,
        session_id: Option<&str>,
        user_text: &str,
    ) -> Option<SessionNotice> {
        let session_id = match session_id.filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => {
                debug!("done without session id, nothing to reconcile");
                return None;
            }
        };

        if was_new {
            let title = self.provisional_title(user_text);
            info!(session_id = %session_id, title = %title, "conversation created");
            self.just_created = Some(session_id.clone());
            Some(SessionNotice::Created { session_id, title })
        } else {
            debug!(session_id = %session_id, "conversation updated");
            Some(SessionNotice::Updated { session_id })
        }
    }

    pub fn provisional_title(&self, user_text: &str) -> String {
        let title = truncate_title(user_text, self.title_max_chars);
        if title.is_empty() {
            UNTITLED_CONVERSATION.to_string()
        } else {
            title
        }
    }

    pub fn is_just_created(&self, session_id: &str) -> bool {
        self.just_created.as_deref() == Some(session_id)
    }

    /// Consume the "just created" marker for `session_id`.
    ///
    /// Returns true exactly once after the session was created in memory.
    pub fn take_just_created(&mut self, session_id: &str) -> bool {
        if self.is_just_created(session_id) {
            self.just_created = None;
            true
        } else {
            false
        }
    }
}

/// Deliver a notice to the store.
pub fn dispatch(notice: &SessionNotice, store: &dyn ConversationStore) {
    match notice {
        SessionNotice::Created { session_id, title } => {
            store.conversation_created(session_id, title)
        }
        SessionNotice::Updated { session_id } => store.conversation_updated(session_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{RecordingStore, StoreCall};

    #[test]
    fn test_new_conversation_is_created_with_title() {
        let mut reconciler = SessionReconciler::new(10);
        let notice = reconciler.on_done(true, Some("abc"), "Summarize this long article please");

        assert_eq!(
            notice,
            Some(SessionNotice::Created {
                session_id: "abc".to_string(),
                title: "Summarize...".to_string(),
            })
        );
        assert!(reconciler.is_just_created("abc"));
    }

    #[test]
    fn test_continuing_conversation_is_updated() {
        let mut reconciler = SessionReconciler::new(30);
        let notice = reconciler.on_done(false, Some("abc"), "follow-up");

        assert_eq!(
            notice,
            Some(SessionNotice::Updated {
                session_id: "abc".to_string()
            })
        );
        assert!(!reconciler.is_just_created("abc"));
    }

    #[test]
    fn test_missing_session_id_yields_nothing() {
        let mut reconciler = SessionReconciler::new(30);
        assert_eq!(reconciler.on_done(true, None, "hi"), None);
        assert_eq!(reconciler.on_done(true, Some(""), "hi"), None);
    }

    #[test]
    fn test_just_created_marker_is_taken_once() {
        let mut reconciler = SessionReconciler::new(30);
        reconciler.on_done(true, Some("abc"), "hi");

        assert!(!reconciler.take_just_created("other"));
        assert!(reconciler.take_just_created("abc"));
        assert!(!reconciler.take_just_created("abc"));
    }

    #[test]
    fn test_empty_input_gets_default_title() {
        let reconciler = SessionReconciler::new(30);
        assert_eq!(reconciler.provisional_title("   "), UNTITLED_CONVERSATION);
    }

    #[test]
    fn test_dispatch_reaches_store() {
        let store = RecordingStore::new();
        dispatch(
            &SessionNotice::Created {
                session_id: "s".to_string(),
                title: "t".to_string(),
            },
            &store,
        );
        dispatch(
            &SessionNotice::Updated {
                session_id: "s".to_string(),
            },
            &store,
        );
        assert_eq!(
            store.calls(),
            vec![
                StoreCall::Created {
                    session_id: "s".to_string(),
                    title: "t".to_string()
                },
                StoreCall::Updated {
                    session_id: "s".to_string()
                },
            ]
        );
    }
}
