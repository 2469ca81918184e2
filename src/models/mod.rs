//! Data model: segments, messages, and the request payload.

mod message;
mod request;
mod segment;
mod text_utils;

pub use message::{Attachment, ChatMessage, MessageRole, StreamingMessage, UserMessage};
pub use request::{ChatMode, ChatRequest, HistoryEntry, SendOptions};
pub use segment::{
    ContentInfoSegment, IntentSegment, Segment, SegmentKind, SegmentState, SegmentStatus,
    SubStepSegment, TextSegment, ThinkingSegment, ToolCallSegment, TranscriptSegment,
};
pub use text_utils::truncate_title;
