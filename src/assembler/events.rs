//! Typed server events.
//!
//! Each wire event is decoded once into a [`ServerEvent`]; the reducer then
//! pattern-matches on it. Payload structs are lenient: every field is
//! optional or defaulted except the correlation keys a handler cannot do
//! without.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::StreamError;
use crate::sse::StreamEvent;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IntentEndPayload {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Content chunk. Backends use `content`, `delta` or `text`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawDelta")]
pub struct DeltaPayload {
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawReasoning")]
pub struct ReasoningPayload {
    pub thinking_id: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawToolCall")]
pub struct ToolCallStartPayload {
    pub tool: String,
    pub title: Option<String>,
    pub input: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawToolCall")]
pub struct ToolCallFinishPayload {
    pub tool: String,
    pub result: Option<Value>,
    pub success: Option<bool>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawToolProgress")]
pub struct ToolProgressPayload {
    /// Narrows the target when several tools run at once
    pub tool: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawSubStepStart")]
pub struct SubStepStartPayload {
    pub step_id: String,
    pub parent_tool: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubStepEndPayload {
    pub step_id: String,
    #[serde(default)]
    pub parent_tool: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawTranscript")]
pub struct TranscriptPayload {
    pub text: String,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawDone")]
pub struct DonePayload {
    pub session_id: Option<String>,
    pub structured_data: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawError")]
pub struct ErrorPayload {
    pub message: Option<String>,
}

// Wire shapes. Every key spelling is its own field; the first one present,
// in declaration order, wins.

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawDelta {
    content: Option<String>,
    delta: Option<String>,
    text: Option<String>,
}

impl From<RawDelta> for DeltaPayload {
    fn from(raw: RawDelta) -> Self {
        Self {
            content: raw.content.or(raw.delta).or(raw.text).unwrap_or_default(),
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawReasoning {
    thinking_id: Option<String>,
    id: Option<String>,
    content: Option<String>,
    delta: Option<String>,
    text: Option<String>,
}

impl From<RawReasoning> for ReasoningPayload {
    fn from(raw: RawReasoning) -> Self {
        Self {
            thinking_id: raw.thinking_id.or(raw.id),
            content: raw.content.or(raw.delta).or(raw.text).unwrap_or_default(),
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawToolCall {
    tool: Option<String>,
    tool_name: Option<String>,
    name: Option<String>,
    title: Option<String>,
    input: Option<Value>,
    args: Option<Value>,
    arguments: Option<Value>,
    result: Option<Value>,
    output: Option<Value>,
    success: Option<bool>,
    error: Option<String>,
}

impl RawToolCall {
    fn take_tool(&mut self) -> Result<String, String> {
        self.tool
            .take()
            .or_else(|| self.tool_name.take())
            .or_else(|| self.name.take())
            .ok_or_else(|| "missing field `tool`".to_string())
    }
}

impl TryFrom<RawToolCall> for ToolCallStartPayload {
    type Error = String;

    fn try_from(mut raw: RawToolCall) -> Result<Self, Self::Error> {
        Ok(Self {
            tool: raw.take_tool()?,
            title: raw.title,
            input: raw.input.or(raw.args).or(raw.arguments),
        })
    }
}

impl TryFrom<RawToolCall> for ToolCallFinishPayload {
    type Error = String;

    fn try_from(mut raw: RawToolCall) -> Result<Self, Self::Error> {
        Ok(Self {
            tool: raw.take_tool()?,
            result: raw.result.or(raw.output),
            success: raw.success,
            error: raw.error,
        })
    }
}

#[derive(Deserialize)]
struct RawToolProgress {
    #[serde(default)]
    tool: Option<String>,
    #[serde(default)]
    tool_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl TryFrom<RawToolProgress> for ToolProgressPayload {
    type Error = String;

    fn try_from(raw: RawToolProgress) -> Result<Self, Self::Error> {
        Ok(Self {
            tool: raw.tool.or(raw.tool_name).or(raw.name),
            message: raw
                .message
                .ok_or_else(|| "missing field `message`".to_string())?,
        })
    }
}

#[derive(Deserialize)]
struct RawSubStepStart {
    step_id: String,
    #[serde(default)]
    parent_tool: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl From<RawSubStepStart> for SubStepStartPayload {
    fn from(raw: RawSubStepStart) -> Self {
        Self {
            step_id: raw.step_id,
            parent_tool: raw.parent_tool,
            title: raw.title.or(raw.name),
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawTranscript {
    text: Option<String>,
    content: Option<String>,
    transcript: Option<String>,
    language: Option<String>,
}

impl From<RawTranscript> for TranscriptPayload {
    fn from(raw: RawTranscript) -> Self {
        Self {
            text: raw.text.or(raw.content).or(raw.transcript).unwrap_or_default(),
            language: raw.language,
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawDone {
    session_id: Option<String>,
    #[serde(rename = "sessionId")]
    session_id_camel: Option<String>,
    structured_data: Option<Value>,
    result: Option<Value>,
    data: Option<Value>,
}

impl From<RawDone> for DonePayload {
    fn from(raw: RawDone) -> Self {
        Self {
            session_id: raw.session_id.or(raw.session_id_camel),
            structured_data: raw.structured_data.or(raw.result).or(raw.data),
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawError {
    message: Option<String>,
    error: Option<String>,
}

impl From<RawError> for ErrorPayload {
    fn from(raw: RawError) -> Self {
        Self {
            message: raw.message.or(raw.error),
        }
    }
}

impl ErrorPayload {
    pub fn message_or_default(&self) -> String {
        self.message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "The server reported an error.".to_string())
    }
}

/// Every event the assembler and controller understand
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    IntentStart,
    IntentEnd(IntentEndPayload),
    FinalReportStart,
    TextDelta(DeltaPayload),
    ReasoningStart(ReasoningPayload),
    ReasoningDelta(ReasoningPayload),
    ReasoningFinish(ReasoningPayload),
    ToolCallStart(ToolCallStartPayload),
    ToolCallFinish(ToolCallFinishPayload),
    ToolProgress(ToolProgressPayload),
    SubStepStart(SubStepStartPayload),
    SubStepEnd(SubStepEndPayload),
    ContentInfo(Value),
    Transcript(TranscriptPayload),
    Done(DonePayload),
    Error(ErrorPayload),
    /// Anything else; kept for forward compatibility
    Unknown(String),
}

fn payload<T: DeserializeOwned>(event: &StreamEvent) -> Result<T, StreamError> {
    serde_json::from_value(event.data.clone()).map_err(|e| StreamError::MalformedPayload {
        event_type: event.event_type.clone(),
        message: e.to_string(),
    })
}

impl ServerEvent {
    /// Decode a transport event.
    ///
    /// Returns an error only when a known event type carries a payload
    /// missing its required fields.
    pub fn from_stream_event(event: &StreamEvent) -> Result<Self, StreamError> {
        let decoded = match event.event_type.as_str() {
            "intent_start" => ServerEvent::IntentStart,
            "intent_end" => ServerEvent::IntentEnd(payload(event)?),
            "final_report_start" => ServerEvent::FinalReportStart,
            "text_delta" => ServerEvent::TextDelta(payload(event)?),
            "reasoning_start" => ServerEvent::ReasoningStart(payload(event)?),
            "reasoning_delta" => ServerEvent::ReasoningDelta(payload(event)?),
            "reasoning_finish" => ServerEvent::ReasoningFinish(payload(event)?),
            "tool_call_start" => ServerEvent::ToolCallStart(payload(event)?),
            "tool_call_finish" => ServerEvent::ToolCallFinish(payload(event)?),
            "tool_progress" => ServerEvent::ToolProgress(payload(event)?),
            "sub_step_start" => ServerEvent::SubStepStart(payload(event)?),
            "sub_step_end" => ServerEvent::SubStepEnd(payload(event)?),
            "content_info" => ServerEvent::ContentInfo(event.data.clone()),
            "transcript" => ServerEvent::Transcript(payload(event)?),
            // Terminal events must never be lost to a payload quirk
            "done" => ServerEvent::Done(payload(event).unwrap_or_default()),
            "error" => ServerEvent::Error(payload(event).unwrap_or_default()),
            other => ServerEvent::Unknown(other.to_string()),
        };
        Ok(decoded)
    }
}
