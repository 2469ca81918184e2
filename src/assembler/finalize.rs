use chrono::{DateTime, Utc};
use std::mem;

use crate::models::{Segment, StreamingMessage, TextSegment};

/// Close every running segment and settle narration.
///
/// Running segments flip to completed with a duration where they have a
/// start time. When the answer used no tools at all, every `process_text`
/// segment becomes `markdown`: the narration was the answer. Applying this
/// to an already finalized message changes nothing.
pub fn finalize_segments(mut message: StreamingMessage, now: DateTime<Utc>) -> StreamingMessage {
    let reclassify = !message.has_tool_calls();

    for segment in message.segments.iter_mut() {
        segment.state_mut().complete(now);

        if reclassify {
            if let Segment::ProcessText(text) = segment {
                let placeholder = TextSegment {
                    state: text.state.clone(),
                    content: String::new(),
                };
                let text = mem::replace(text, placeholder);
                *segment = Segment::Markdown(text);
            }
        }
    }

    message
}

/// [`finalize_segments`] against the wall clock.
pub fn finalize(message: StreamingMessage) -> StreamingMessage {
    finalize_segments(message, Utc::now())
}
