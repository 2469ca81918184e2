//! Common test utilities for integration tests.
//!
//! Builds controllers wired to a [`MockBackend`] and a [`RecordingStore`],
//! and formats SSE bodies.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use streamchat::adapters::{sse_block, MockBackend, RecordingStore};
use streamchat::config::ClientConfig;
use streamchat::controller::ChatController;

pub struct Harness {
    pub controller: ChatController,
    pub backend: MockBackend,
    pub store: RecordingStore,
}

/// Controller for a new conversation with default config.
pub fn harness() -> Harness {
    harness_with(ClientConfig::default())
}

pub fn harness_with(config: ClientConfig) -> Harness {
    let backend = MockBackend::new();
    let store = RecordingStore::new();
    let controller = ChatController::new(
        Arc::new(backend.clone()),
        Arc::new(store.clone()),
        config,
    );
    Harness {
        controller,
        backend,
        store,
    }
}

/// One SSE event block for `event_type` with a JSON payload.
pub fn block(event_type: &str, data: Value) -> String {
    sse_block(event_type, &data.to_string())
}

/// Apply background messages until `done` holds.
///
/// Panics after two seconds so a broken test fails instead of hanging.
pub async fn wait_until<F>(controller: &mut ChatController, done: F)
where
    F: Fn(&ChatController) -> bool,
{
    let wait = async {
        while !done(controller) {
            if !controller.process_next().await {
                break;
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(2), wait)
        .await
        .expect("condition not reached in time");
}

/// Run the controller until idle, bounded by a timeout.
pub async fn run_to_idle(controller: &mut ChatController) {
    tokio::time::timeout(Duration::from_secs(2), controller.run_until_idle())
        .await
        .expect("controller did not become idle");
}
