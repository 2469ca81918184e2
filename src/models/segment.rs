use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle of a segment within one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    #[default]
    Running,
    Completed,
}

/// Status and timing shared by every segment type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentState {
    pub status: SegmentStatus,
    /// When the segment was opened (absent for segments that arrive complete)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Milliseconds between open and close
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
}

impl SegmentState {
    /// A running segment opened at `now`
    pub fn running(now: DateTime<Utc>) -> Self {
        Self {
            status: SegmentStatus::Running,
            start_time: Some(now),
            duration_ms: None,
        }
    }

    /// A segment that is complete on arrival
    pub fn completed() -> Self {
        Self {
            status: SegmentStatus::Completed,
            start_time: None,
            duration_ms: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == SegmentStatus::Running
    }

    /// Flip to completed, computing the duration when a start time exists.
    ///
    /// Completed segments are left untouched, so this can be applied any
    /// number of times.
    pub fn complete(&mut self, now: DateTime<Utc>) {
        if self.status == SegmentStatus::Completed {
            return;
        }
        self.status = SegmentStatus::Completed;
        if let Some(start) = self.start_time {
            self.duration_ms = Some((now - start).num_milliseconds().max(0));
        }
    }
}

/// Mode detection result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentSegment {
    #[serde(flatten)]
    pub state: SegmentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Reasoning block, keyed by `thinking_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingSegment {
    #[serde(flatten)]
    pub state: SegmentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_id: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// One tool invocation, keyed by tool name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallSegment {
    #[serde(flatten)]
    pub state: SegmentState,
    pub tool: String,
    /// Human-readable label (e.g. "Fetching page")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    /// Progress messages in arrival order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub progress: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn default_true() -> bool {
    true
}

impl ToolCallSegment {
    pub fn latest_progress(&self) -> Option<&str> {
        self.progress.last().map(String::as_str)
    }
}

/// A step executed inside a tool, keyed by `step_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubStepSegment {
    #[serde(flatten)]
    pub state: SegmentState,
    pub step_id: String,
    /// Name of the owning tool call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

/// Accumulated prose: narration, final answer, or plain text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSegment {
    #[serde(flatten)]
    pub state: SegmentState,
    #[serde(default)]
    pub content: String,
}

/// Metadata about the analyzed content (title, author, platform...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentInfoSegment {
    #[serde(flatten)]
    pub state: SegmentState,
    pub info: Value,
}

/// Transcript of the analyzed media
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    #[serde(flatten)]
    pub state: SegmentState,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Discriminant of [`Segment`] without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Intent,
    Thinking,
    ToolCall,
    SubStep,
    ProcessText,
    Markdown,
    Text,
    ContentInfo,
    Transcript,
}

/// One typed piece of an evolving assistant answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Intent(IntentSegment),
    Thinking(ThinkingSegment),
    ToolCall(ToolCallSegment),
    SubStep(SubStepSegment),
    /// Narration emitted before the final report
    ProcessText(TextSegment),
    /// Final answer
    Markdown(TextSegment),
    Text(TextSegment),
    ContentInfo(ContentInfoSegment),
    Transcript(TranscriptSegment),
}

impl Segment {
    pub fn kind(&self) -> SegmentKind {
        match self {
            Segment::Intent(_) => SegmentKind::Intent,
            Segment::Thinking(_) => SegmentKind::Thinking,
            Segment::ToolCall(_) => SegmentKind::ToolCall,
            Segment::SubStep(_) => SegmentKind::SubStep,
            Segment::ProcessText(_) => SegmentKind::ProcessText,
            Segment::Markdown(_) => SegmentKind::Markdown,
            Segment::Text(_) => SegmentKind::Text,
            Segment::ContentInfo(_) => SegmentKind::ContentInfo,
            Segment::Transcript(_) => SegmentKind::Transcript,
        }
    }

    pub fn state(&self) -> &SegmentState {
        match self {
            Segment::Intent(s) => &s.state,
            Segment::Thinking(s) => &s.state,
            Segment::ToolCall(s) => &s.state,
            Segment::SubStep(s) => &s.state,
            Segment::ProcessText(s) | Segment::Markdown(s) | Segment::Text(s) => &s.state,
            Segment::ContentInfo(s) => &s.state,
            Segment::Transcript(s) => &s.state,
        }
    }

    pub fn state_mut(&mut self) -> &mut SegmentState {
        match self {
            Segment::Intent(s) => &mut s.state,
            Segment::Thinking(s) => &mut s.state,
            Segment::ToolCall(s) => &mut s.state,
            Segment::SubStep(s) => &mut s.state,
            Segment::ProcessText(s) | Segment::Markdown(s) | Segment::Text(s) => &mut s.state,
            Segment::ContentInfo(s) => &mut s.state,
            Segment::Transcript(s) => &mut s.state,
        }
    }

    pub fn status(&self) -> SegmentStatus {
        self.state().status
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    /// Correlation key for keyed segment types
    pub fn correlation_key(&self) -> Option<&str> {
        match self {
            Segment::Thinking(s) => s.thinking_id.as_deref(),
            Segment::ToolCall(s) => Some(&s.tool),
            Segment::SubStep(s) => Some(&s.step_id),
            _ => None,
        }
    }

    /// Accumulated prose for text-like and thinking segments
    pub fn content(&self) -> Option<&str> {
        match self {
            Segment::Thinking(s) => Some(&s.content),
            Segment::ProcessText(s) | Segment::Markdown(s) | Segment::Text(s) => Some(&s.content),
            Segment::Transcript(s) => Some(&s.text),
            _ => None,
        }
    }

    /// A completed plain text segment (used for synthesized messages)
    pub fn plain_text(content: impl Into<String>) -> Self {
        Segment::Text(TextSegment {
            state: SegmentState::completed(),
            content: content.into(),
        })
    }
}
