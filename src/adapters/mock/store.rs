//! Recording conversation store for testing.

use std::sync::{Arc, Mutex};

use crate::traits::ConversationStore;

/// A notification received by [`RecordingStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Created { session_id: String, title: String },
    Updated { session_id: String },
}

/// Keeps every notification so tests can assert on them.
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    calls: Arc<Mutex<Vec<StoreCall>>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: StoreCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl ConversationStore for RecordingStore {
    fn conversation_created(&self, session_id: &str, title: &str) {
        self.record(StoreCall::Created {
            session_id: session_id.to_string(),
            title: title.to_string(),
        });
    }

    fn conversation_updated(&self, session_id: &str) {
        self.record(StoreCall::Updated {
            session_id: session_id.to_string(),
        });
    }
}
