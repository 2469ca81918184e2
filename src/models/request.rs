use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::message::{Attachment, ChatMessage, MessageRole};

static BARE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://\S+$").expect("Invalid URL regex pattern"));

/// Per-send options chosen in the UI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendOptions {
    /// Analysis mode id; `None` lets the backend detect the intent
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub instruction: Option<String>,
    #[serde(default)]
    pub preferred_language: Option<String>,
    #[serde(default)]
    pub preferred_model: Option<String>,
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn with_preferred_language(mut self, language: impl Into<String>) -> Self {
        self.preferred_language = Some(language.into());
        self
    }

    pub fn with_preferred_model(mut self, model: impl Into<String>) -> Self {
        self.preferred_model = Some(model.into());
        self
    }
}

/// Prior turn sent along with the request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub role: MessageRole,
    pub content: String,
}

/// Request body of the streaming chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// Free text; absent when the input was a bare link
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    /// None means start a new conversation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_model: Option<String>,
}

impl ChatRequest {
    /// Build a request from user input. A lone http(s) link is sent as `url`.
    pub fn new(text: &str, attachments: Vec<Attachment>) -> Self {
        let trimmed = text.trim();
        let (message, url) = if BARE_URL.is_match(trimmed) {
            (None, Some(trimmed.to_string()))
        } else {
            (Some(text.to_string()), None)
        };
        Self {
            message,
            url,
            mode: None,
            instruction: None,
            session_id: None,
            history: Vec::new(),
            attachments,
            preferred_language: None,
            preferred_model: None,
        }
    }

    /// Apply send options (builder pattern)
    pub fn with_options(mut self, options: SendOptions) -> Self {
        self.mode = options.mode;
        self.instruction = options.instruction;
        self.preferred_language = options.preferred_language;
        self.preferred_model = options.preferred_model;
        self
    }

    /// Set the session to continue (builder pattern)
    pub fn with_session(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }

    /// Attach the last `limit` non-empty turns of `messages` (builder pattern)
    pub fn with_history(mut self, messages: &[ChatMessage], limit: usize) -> Self {
        let entries: Vec<HistoryEntry> = messages
            .iter()
            .filter(|m| !m.as_assistant().is_some_and(|a| a.is_error))
            .map(|m| HistoryEntry {
                role: m.role(),
                content: m.plain_text(),
            })
            .filter(|e| !e.content.is_empty())
            .collect();
        let skip = entries.len().saturating_sub(limit);
        self.history = entries.into_iter().skip(skip).collect();
        self
    }
}

/// An analysis mode offered by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}
