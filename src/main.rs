use std::sync::Arc;

use color_eyre::eyre::{bail, Result};
use tracing::info;

use streamchat::adapters::HttpChatBackend;
use streamchat::assembler::organize_segments;
use streamchat::config::ClientConfig;
use streamchat::controller::{ChatController, SendOutcome};
use streamchat::logging::init_tracing;
use streamchat::models::{ChatMessage, SendOptions};
use streamchat::traits::ConversationStore;

/// Conversation store for the command line: there is no list to update.
struct LogStore;

impl ConversationStore for LogStore {
    fn conversation_created(&self, session_id: &str, title: &str) {
        info!(session_id, title, "conversation created");
    }

    fn conversation_updated(&self, session_id: &str) {
        info!(session_id, "conversation updated");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing("streamchat=info");

    let text = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if text.trim().is_empty() {
        bail!("usage: streamchat <message...>");
    }

    let config = ClientConfig::from_env();
    info!(base_url = %config.base_url, "using backend");
    let backend = Arc::new(HttpChatBackend::new(config.clone()));
    let mut controller = ChatController::new(backend, Arc::new(LogStore), config);

    if let SendOutcome::Ignored(reason) = controller
        .send_message(&text, Vec::new(), SendOptions::default())
        .await
    {
        bail!("message not sent: {:?}", reason);
    }

    // Ctrl+C stops generation and keeps the partial answer
    while controller.is_in_progress() {
        let interrupted = tokio::select! {
            _ = tokio::signal::ctrl_c() => true,
            more = controller.process_next() => {
                if !more {
                    break;
                }
                false
            }
        };
        if interrupted {
            controller.stop_generation();
        }
    }
    controller.drain_pending();

    let answer = controller
        .messages()
        .iter()
        .rev()
        .find_map(ChatMessage::as_assistant);
    match answer {
        Some(answer) => {
            println!("{}", serde_json::to_string_pretty(&organize_segments(&answer.segments))?);
            println!("{}", serde_json::to_string_pretty(answer)?);
        }
        None => bail!("no answer received"),
    }

    Ok(())
}
