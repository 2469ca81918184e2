use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::segment::{Segment, SegmentKind};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A file or link attached to a user message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Server-side location once uploaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Attachment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            url: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// A message typed by the user. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserMessage {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub timestamp: DateTime<Utc>,
}

impl UserMessage {
    pub fn new(content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            attachments,
            timestamp: Utc::now(),
        }
    }
}

/// The assistant answer, both while it streams and once it is history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamingMessage {
    pub id: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub is_complete: bool,
    /// Set by `final_report_start`; decides how text chunks are classified
    #[serde(default)]
    pub final_report_started: bool,
    /// The user stopped generation before the terminal event
    #[serde(default)]
    pub is_stopped: bool,
    /// Synthesized locally to carry an error text
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_data: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl StreamingMessage {
    /// An empty in-progress answer
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            segments: Vec::new(),
            is_complete: false,
            final_report_started: false,
            is_stopped: false,
            is_error: false,
            structured_data: None,
            created_at: Utc::now(),
        }
    }

    /// A complete assistant message whose only segment is `text`
    pub fn error(text: impl Into<String>) -> Self {
        let mut message = Self::new();
        message.segments.push(Segment::plain_text(text));
        message.is_complete = true;
        message.is_error = true;
        message
    }

    pub fn has_tool_calls(&self) -> bool {
        self.segments.iter().any(|s| s.kind() == SegmentKind::ToolCall)
    }

    pub fn has_running_segments(&self) -> bool {
        self.segments.iter().any(Segment::is_running)
    }

    /// Concatenated content of all segments of `kind`
    pub fn text_of(&self, kind: SegmentKind) -> String {
        self.segments
            .iter()
            .filter(|s| s.kind() == kind)
            .filter_map(Segment::content)
            .collect()
    }

    /// The answer as plain text: final answer and text segments, falling
    /// back to narration when nothing else was produced.
    pub fn plain_text(&self) -> String {
        let answer: String = self
            .segments
            .iter()
            .filter(|s| matches!(s.kind(), SegmentKind::Markdown | SegmentKind::Text))
            .filter_map(Segment::content)
            .collect();
        if answer.is_empty() {
            self.text_of(SegmentKind::ProcessText)
        } else {
            answer
        }
    }
}

impl Default for StreamingMessage {
    fn default() -> Self {
        Self::new()
    }
}

/// An entry of the permanent conversation history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    User(UserMessage),
    Assistant(StreamingMessage),
}

impl ChatMessage {
    pub fn id(&self) -> &str {
        match self {
            ChatMessage::User(m) => &m.id,
            ChatMessage::Assistant(m) => &m.id,
        }
    }

    pub fn role(&self) -> MessageRole {
        match self {
            ChatMessage::User(_) => MessageRole::User,
            ChatMessage::Assistant(_) => MessageRole::Assistant,
        }
    }

    pub fn as_user(&self) -> Option<&UserMessage> {
        match self {
            ChatMessage::User(m) => Some(m),
            ChatMessage::Assistant(_) => None,
        }
    }

    pub fn as_assistant(&self) -> Option<&StreamingMessage> {
        match self {
            ChatMessage::Assistant(m) => Some(m),
            ChatMessage::User(_) => None,
        }
    }

    pub fn plain_text(&self) -> String {
        match self {
            ChatMessage::User(m) => m.content.clone(),
            ChatMessage::Assistant(m) => m.plain_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::segment::{SegmentState, TextSegment};

    fn text(kind: SegmentKind, content: &str) -> Segment {
        let seg = TextSegment {
            state: SegmentState::completed(),
            content: content.to_string(),
        };
        match kind {
            SegmentKind::ProcessText => Segment::ProcessText(seg),
            SegmentKind::Markdown => Segment::Markdown(seg),
            _ => Segment::Text(seg),
        }
    }

    #[test]
    fn test_error_message_shape() {
        let message = StreamingMessage::error("Model not configured");
        assert!(message.is_complete);
        assert!(message.is_error);
        assert_eq!(message.plain_text(), "Model not configured");
    }

    #[test]
    fn test_plain_text_prefers_markdown() {
        let mut message = StreamingMessage::new();
        message.segments.push(text(SegmentKind::ProcessText, "Let me look. "));
        message.segments.push(text(SegmentKind::Markdown, "Answer."));
        assert_eq!(message.plain_text(), "Answer.");
    }

    #[test]
    fn test_plain_text_falls_back_to_narration() {
        let mut message = StreamingMessage::new();
        message.segments.push(text(SegmentKind::ProcessText, "Only narration"));
        assert_eq!(message.plain_text(), "Only narration");
    }

    #[test]
    fn test_chat_message_role_tag() {
        let message = ChatMessage::User(UserMessage::new("hello", Vec::new()));
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "hello");
        assert_eq!(message.role(), MessageRole::User);
        assert!(message.as_assistant().is_none());
    }

    #[test]
    fn test_attachment_builder() {
        let a = Attachment::new("report.pdf")
            .with_mime_type("application/pdf")
            .with_url("https://files.example/1");
        assert_eq!(a.mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(a.url.as_deref(), Some("https://files.example/1"));
    }
}
