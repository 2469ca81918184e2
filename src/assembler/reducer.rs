//! Per-event handlers.
//!
//! Every handler takes the message by value and returns it; nothing here
//! touches I/O or clocks, `now` is passed in.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::{
    ContentInfoSegment, IntentSegment, Segment, SegmentKind, SegmentState, StreamingMessage,
    SubStepSegment, TextSegment, ThinkingSegment, ToolCallSegment, TranscriptSegment,
};

use super::events::{
    DeltaPayload, IntentEndPayload, ReasoningPayload, ServerEvent, SubStepEndPayload,
    SubStepStartPayload, ToolCallFinishPayload, ToolCallStartPayload, ToolProgressPayload,
    TranscriptPayload,
};

/// Index of the most recent segment matching `pred`, scanning from the end.
pub fn find_last<F>(segments: &[Segment], pred: F) -> Option<usize>
where
    F: Fn(&Segment) -> bool,
{
    segments.iter().rposition(pred)
}

/// Index of the most recent running segment of `kind` whose key is `key`.
///
/// A `None` key matches any running segment of that kind.
pub fn find_running(segments: &[Segment], kind: SegmentKind, key: Option<&str>) -> Option<usize> {
    find_last(segments, |s| {
        s.kind() == kind
            && s.is_running()
            && match key {
                Some(k) => s.correlation_key() == Some(k),
                None => true,
            }
    })
}

/// Apply one decoded event.
pub fn reduce(message: StreamingMessage, event: ServerEvent, now: DateTime<Utc>) -> StreamingMessage {
    match event {
        ServerEvent::IntentStart => intent_start(message, now),
        ServerEvent::IntentEnd(p) => intent_end(message, p, now),
        ServerEvent::FinalReportStart => final_report_start(message),
        ServerEvent::TextDelta(p) => text_delta(message, p, now),
        ServerEvent::ReasoningStart(p) => reasoning_start(message, p, now),
        ServerEvent::ReasoningDelta(p) => reasoning_delta(message, p, now),
        ServerEvent::ReasoningFinish(p) => reasoning_finish(message, p, now),
        ServerEvent::ToolCallStart(p) => tool_call_start(message, p, now),
        ServerEvent::ToolCallFinish(p) => tool_call_finish(message, p, now),
        ServerEvent::ToolProgress(p) => tool_progress(message, p),
        ServerEvent::SubStepStart(p) => sub_step_start(message, p, now),
        ServerEvent::SubStepEnd(p) => sub_step_end(message, p, now),
        ServerEvent::ContentInfo(info) => content_info(message, info),
        ServerEvent::Transcript(p) => transcript(message, p),
        ServerEvent::Done(_) | ServerEvent::Error(_) | ServerEvent::Unknown(_) => message,
    }
}

fn intent_start(mut message: StreamingMessage, now: DateTime<Utc>) -> StreamingMessage {
    if find_running(&message.segments, SegmentKind::Intent, None).is_none() {
        message.segments.push(Segment::Intent(IntentSegment {
            state: SegmentState::running(now),
            mode: None,
            confidence: None,
            reason: None,
        }));
    }
    message
}

fn intent_end(
    mut message: StreamingMessage,
    payload: IntentEndPayload,
    now: DateTime<Utc>,
) -> StreamingMessage {
    match find_running(&message.segments, SegmentKind::Intent, None) {
        Some(idx) => {
            if let Segment::Intent(intent) = &mut message.segments[idx] {
                intent.mode = payload.mode;
                intent.confidence = payload.confidence;
                intent.reason = payload.reason;
                intent.state.complete(now);
            }
        }
        None => message.segments.push(Segment::Intent(IntentSegment {
            state: SegmentState::completed(),
            mode: payload.mode,
            confidence: payload.confidence,
            reason: payload.reason,
        })),
    }
    message
}

fn final_report_start(mut message: StreamingMessage) -> StreamingMessage {
    message.final_report_started = true;
    message
}

fn text_delta(
    mut message: StreamingMessage,
    payload: DeltaPayload,
    now: DateTime<Utc>,
) -> StreamingMessage {
    if payload.content.is_empty() {
        return message;
    }

    // The phase flag, not segment order, decides the classification.
    let kind = if message.final_report_started {
        SegmentKind::Markdown
    } else {
        SegmentKind::ProcessText
    };

    if let Some(last) = message.segments.last_mut() {
        if last.kind() == kind && last.is_running() {
            if let Segment::ProcessText(text) | Segment::Markdown(text) = last {
                text.content.push_str(&payload.content);
                return message;
            }
        }
    }

    let text = TextSegment {
        state: SegmentState::running(now),
        content: payload.content,
    };
    message.segments.push(match kind {
        SegmentKind::Markdown => Segment::Markdown(text),
        _ => Segment::ProcessText(text),
    });
    message
}

fn new_thinking(payload: ReasoningPayload, now: DateTime<Utc>) -> Segment {
    Segment::Thinking(ThinkingSegment {
        state: SegmentState::running(now),
        thinking_id: payload.thinking_id,
        content: payload.content,
    })
}

fn reasoning_start(
    mut message: StreamingMessage,
    payload: ReasoningPayload,
    now: DateTime<Utc>,
) -> StreamingMessage {
    let open = match payload.thinking_id.as_deref() {
        Some(id) => find_running(&message.segments, SegmentKind::Thinking, Some(id)).is_some(),
        None => false,
    };
    if !open {
        message.segments.push(new_thinking(payload, now));
    }
    message
}

fn reasoning_delta(
    mut message: StreamingMessage,
    payload: ReasoningPayload,
    now: DateTime<Utc>,
) -> StreamingMessage {
    let target = match payload.thinking_id.as_deref() {
        Some(id) => find_running(&message.segments, SegmentKind::Thinking, Some(id)),
        // Unkeyed deltas only extend a thinking block that is still last.
        None => message
            .segments
            .last()
            .filter(|s| s.kind() == SegmentKind::Thinking && s.is_running())
            .map(|_| message.segments.len() - 1),
    };

    match target {
        Some(idx) => {
            if let Segment::Thinking(thinking) = &mut message.segments[idx] {
                thinking.content.push_str(&payload.content);
            }
        }
        None => message.segments.push(new_thinking(payload, now)),
    }
    message
}

fn reasoning_finish(
    mut message: StreamingMessage,
    payload: ReasoningPayload,
    now: DateTime<Utc>,
) -> StreamingMessage {
    let key = payload.thinking_id.as_deref();
    if let Some(idx) = find_running(&message.segments, SegmentKind::Thinking, key) {
        message.segments[idx].state_mut().complete(now);
    } else {
        tracing::debug!(thinking_id = ?key, "reasoning_finish without running thinking segment");
    }
    message
}

fn tool_call_start(
    mut message: StreamingMessage,
    payload: ToolCallStartPayload,
    now: DateTime<Utc>,
) -> StreamingMessage {
    let existing = find_running(&message.segments, SegmentKind::ToolCall, Some(payload.tool.as_str()));
    match existing {
        Some(idx) => {
            if let Segment::ToolCall(call) = &mut message.segments[idx] {
                if payload.title.is_some() {
                    call.title = payload.title;
                }
                if payload.input.is_some() {
                    call.input = payload.input;
                }
            }
        }
        None => message.segments.push(Segment::ToolCall(ToolCallSegment {
            state: SegmentState::running(now),
            tool: payload.tool,
            title: payload.title,
            input: payload.input,
            progress: Vec::new(),
            result: None,
            success: true,
            error: None,
        })),
    }
    message
}

fn tool_progress(mut message: StreamingMessage, payload: ToolProgressPayload) -> StreamingMessage {
    let target = find_running(
        &message.segments,
        SegmentKind::ToolCall,
        payload.tool.as_deref(),
    );
    match target {
        Some(idx) => {
            if let Segment::ToolCall(call) = &mut message.segments[idx] {
                call.progress.push(payload.message);
            }
        }
        None => tracing::debug!("tool_progress without running tool call"),
    }
    message
}

fn tool_call_finish(
    mut message: StreamingMessage,
    payload: ToolCallFinishPayload,
    now: DateTime<Utc>,
) -> StreamingMessage {
    match find_running(&message.segments, SegmentKind::ToolCall, Some(payload.tool.as_str())) {
        Some(idx) => {
            if let Segment::ToolCall(call) = &mut message.segments[idx] {
                call.success = payload.success.unwrap_or(payload.error.is_none());
                call.error = payload.error;
                call.result = payload.result;
                call.state.complete(now);
            }
        }
        None => tracing::debug!(tool = %payload.tool, "tool_call_finish without running tool call"),
    }
    message
}

fn sub_step_start(
    mut message: StreamingMessage,
    payload: SubStepStartPayload,
    now: DateTime<Utc>,
) -> StreamingMessage {
    if find_running(&message.segments, SegmentKind::SubStep, Some(payload.step_id.as_str())).is_none() {
        message.segments.push(Segment::SubStep(SubStepSegment {
            state: SegmentState::running(now),
            step_id: payload.step_id,
            parent_tool: payload.parent_tool,
            title: payload.title,
            result: None,
        }));
    }
    message
}

fn sub_step_end(
    mut message: StreamingMessage,
    payload: SubStepEndPayload,
    now: DateTime<Utc>,
) -> StreamingMessage {
    match find_running(&message.segments, SegmentKind::SubStep, Some(payload.step_id.as_str())) {
        Some(idx) => {
            if let Segment::SubStep(step) = &mut message.segments[idx] {
                if step.parent_tool.is_none() {
                    step.parent_tool = payload.parent_tool;
                }
                step.result = payload.result;
                step.state.complete(now);
            }
        }
        // The start was never seen; record the step as already done.
        None => message.segments.push(Segment::SubStep(SubStepSegment {
            state: SegmentState::completed(),
            step_id: payload.step_id,
            parent_tool: payload.parent_tool,
            title: None,
            result: payload.result,
        })),
    }
    message
}

fn content_info(mut message: StreamingMessage, info: Value) -> StreamingMessage {
    match find_last(&message.segments, |s| s.kind() == SegmentKind::ContentInfo) {
        Some(idx) => {
            if let Segment::ContentInfo(existing) = &mut message.segments[idx] {
                existing.info = info;
            }
        }
        None => message.segments.push(Segment::ContentInfo(ContentInfoSegment {
            state: SegmentState::completed(),
            info,
        })),
    }
    message
}

fn transcript(mut message: StreamingMessage, payload: TranscriptPayload) -> StreamingMessage {
    match find_last(&message.segments, |s| s.kind() == SegmentKind::Transcript) {
        Some(idx) => {
            if let Segment::Transcript(existing) = &mut message.segments[idx] {
                existing.text = payload.text;
                existing.language = payload.language;
            }
        }
        None => message.segments.push(Segment::Transcript(TranscriptSegment {
            state: SegmentState::completed(),
            text: payload.text,
            language: payload.language,
        })),
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SegmentStatus;
    use serde_json::json;

    fn delta(content: &str) -> ServerEvent {
        ServerEvent::TextDelta(DeltaPayload {
            content: content.to_string(),
        })
    }

    fn thinking(id: &str, content: &str) -> ReasoningPayload {
        ReasoningPayload {
            thinking_id: Some(id.to_string()),
            content: content.to_string(),
        }
    }

    fn start_tool(tool: &str) -> ServerEvent {
        ServerEvent::ToolCallStart(ToolCallStartPayload {
            tool: tool.to_string(),
            title: None,
            input: None,
        })
    }

    fn run(events: Vec<ServerEvent>) -> StreamingMessage {
        let now = Utc::now();
        events
            .into_iter()
            .fold(StreamingMessage::new(), |m, e| reduce(m, e, now))
    }

    #[test]
    fn test_find_last_scans_backward() {
        let message = run(vec![start_tool("a"), start_tool("b")]);
        let idx = find_last(&message.segments, |s| s.kind() == SegmentKind::ToolCall);
        assert_eq!(idx, Some(1));
        assert_eq!(
            find_running(&message.segments, SegmentKind::ToolCall, Some("a")),
            Some(0)
        );
        assert_eq!(
            find_running(&message.segments, SegmentKind::Thinking, None),
            None
        );
    }

    #[test]
    fn test_text_delta_accumulates_process_text() {
        let message = run(vec![delta("Looking "), delta("it up")]);
        assert_eq!(message.segments.len(), 1);
        assert_eq!(message.segments[0].kind(), SegmentKind::ProcessText);
        assert_eq!(message.segments[0].content(), Some("Looking it up"));
    }

    #[test]
    fn test_text_after_other_segment_opens_new_one() {
        let message = run(vec![delta("a"), start_tool("search"), delta("b")]);
        assert_eq!(message.segments.len(), 3);
        assert_eq!(message.segments[2].content(), Some("b"));
    }

    #[test]
    fn test_final_report_flag_switches_to_markdown() {
        let message = run(vec![
            delta("narration"),
            ServerEvent::FinalReportStart,
            delta("Result: "),
            delta("done."),
        ]);
        assert!(message.final_report_started);
        assert_eq!(message.segments.len(), 2);
        assert_eq!(message.segments[0].kind(), SegmentKind::ProcessText);
        assert_eq!(message.segments[1].kind(), SegmentKind::Markdown);
        assert_eq!(message.segments[1].content(), Some("Result: done."));
    }

    #[test]
    fn test_empty_delta_is_ignored() {
        let message = run(vec![delta("")]);
        assert!(message.segments.is_empty());
    }

    #[test]
    fn test_reasoning_deltas_concatenate_by_id() {
        let message = run(vec![
            ServerEvent::ReasoningStart(thinking("t1", "")),
            ServerEvent::ReasoningDelta(thinking("t1", "First, ")),
            delta("narration"),
            ServerEvent::ReasoningDelta(thinking("t1", "then ")),
            ServerEvent::ReasoningDelta(thinking("t1", "finally.")),
        ]);
        let thinking_segments: Vec<&Segment> = message
            .segments
            .iter()
            .filter(|s| s.kind() == SegmentKind::Thinking)
            .collect();
        assert_eq!(thinking_segments.len(), 1);
        assert_eq!(thinking_segments[0].content(), Some("First, then finally."));
    }

    #[test]
    fn test_reasoning_finish_completes_only_matching_id() {
        let message = run(vec![
            ServerEvent::ReasoningDelta(thinking("t1", "a")),
            ServerEvent::ReasoningDelta(thinking("t2", "b")),
            ServerEvent::ReasoningFinish(thinking("t1", "")),
        ]);
        assert_eq!(message.segments[0].status(), SegmentStatus::Completed);
        assert_eq!(message.segments[1].status(), SegmentStatus::Running);
    }

    #[test]
    fn test_reasoning_after_finish_opens_new_segment() {
        let message = run(vec![
            ServerEvent::ReasoningDelta(thinking("t1", "a")),
            ServerEvent::ReasoningFinish(thinking("t1", "")),
            ServerEvent::ReasoningDelta(thinking("t1", "b")),
        ]);
        assert_eq!(message.segments.len(), 2);
        assert!(message.segments[1].is_running());
    }

    #[test]
    fn test_duplicate_tool_start_keeps_one_running() {
        let message = run(vec![
            start_tool("fetch_content"),
            ServerEvent::ToolCallStart(ToolCallStartPayload {
                tool: "fetch_content".to_string(),
                title: Some("Fetching".to_string()),
                input: None,
            }),
        ]);
        assert_eq!(message.segments.len(), 1);
        match &message.segments[0] {
            Segment::ToolCall(call) => assert_eq!(call.title.as_deref(), Some("Fetching")),
            other => panic!("Expected ToolCall, got {:?}", other),
        }
    }

    #[test]
    fn test_tool_progress_and_finish() {
        let message = run(vec![
            start_tool("parse_link"),
            ServerEvent::ToolProgress(ToolProgressPayload {
                tool: None,
                message: "parsing".to_string(),
            }),
            ServerEvent::ToolCallFinish(ToolCallFinishPayload {
                tool: "parse_link".to_string(),
                result: Some(json!({ "title": "Video" })),
                success: None,
                error: None,
            }),
        ]);
        match &message.segments[0] {
            Segment::ToolCall(call) => {
                assert_eq!(call.latest_progress(), Some("parsing"));
                assert_eq!(call.state.status, SegmentStatus::Completed);
                assert!(call.success);
                assert_eq!(call.result, Some(json!({ "title": "Video" })));
            }
            other => panic!("Expected ToolCall, got {:?}", other),
        }
    }

    #[test]
    fn test_tool_finish_with_error_marks_failure() {
        let message = run(vec![
            start_tool("fetch_content"),
            ServerEvent::ToolCallFinish(ToolCallFinishPayload {
                tool: "fetch_content".to_string(),
                result: None,
                success: None,
                error: Some("404".to_string()),
            }),
        ]);
        match &message.segments[0] {
            Segment::ToolCall(call) => {
                assert!(!call.success);
                assert_eq!(call.error.as_deref(), Some("404"));
            }
            other => panic!("Expected ToolCall, got {:?}", other),
        }
    }

    #[test]
    fn test_progress_targets_named_tool() {
        let message = run(vec![
            start_tool("a"),
            start_tool("b"),
            ServerEvent::ToolProgress(ToolProgressPayload {
                tool: Some("a".to_string()),
                message: "half way".to_string(),
            }),
        ]);
        match (&message.segments[0], &message.segments[1]) {
            (Segment::ToolCall(a), Segment::ToolCall(b)) => {
                assert_eq!(a.progress, vec!["half way".to_string()]);
                assert!(b.progress.is_empty());
            }
            other => panic!("Expected two tool calls, got {:?}", other),
        }
    }

    #[test]
    fn test_sub_step_lifecycle() {
        let message = run(vec![
            ServerEvent::SubStepStart(SubStepStartPayload {
                step_id: "s1".to_string(),
                parent_tool: Some("fetch_content".to_string()),
                title: Some("Download".to_string()),
            }),
            ServerEvent::SubStepStart(SubStepStartPayload {
                step_id: "s1".to_string(),
                parent_tool: Some("fetch_content".to_string()),
                title: None,
            }),
            ServerEvent::SubStepEnd(SubStepEndPayload {
                step_id: "s1".to_string(),
                parent_tool: None,
                result: None,
            }),
        ]);
        assert_eq!(message.segments.len(), 1);
        assert_eq!(message.segments[0].status(), SegmentStatus::Completed);
    }

    #[test]
    fn test_sub_step_end_without_start_is_recorded() {
        let message = run(vec![ServerEvent::SubStepEnd(SubStepEndPayload {
            step_id: "s9".to_string(),
            parent_tool: Some("t".to_string()),
            result: None,
        })]);
        assert_eq!(message.segments.len(), 1);
        assert_eq!(message.segments[0].status(), SegmentStatus::Completed);
    }

    #[test]
    fn test_content_info_and_transcript_upsert() {
        let message = run(vec![
            ServerEvent::ContentInfo(json!({ "title": "First" })),
            ServerEvent::Transcript(TranscriptPayload {
                text: "hello".to_string(),
                language: None,
            }),
            ServerEvent::ContentInfo(json!({ "title": "Second" })),
            ServerEvent::Transcript(TranscriptPayload {
                text: "hello world".to_string(),
                language: Some("en".to_string()),
            }),
        ]);
        assert_eq!(message.segments.len(), 2);
        match (&message.segments[0], &message.segments[1]) {
            (Segment::ContentInfo(info), Segment::Transcript(t)) => {
                assert_eq!(info.info["title"], "Second");
                assert_eq!(t.text, "hello world");
                assert_eq!(t.language.as_deref(), Some("en"));
            }
            other => panic!("Unexpected segments {:?}", other),
        }
    }

    #[test]
    fn test_intent_lifecycle() {
        let message = run(vec![
            ServerEvent::IntentStart,
            ServerEvent::IntentStart,
            ServerEvent::IntentEnd(IntentEndPayload {
                mode: Some("analyze".to_string()),
                confidence: Some(0.9),
                reason: None,
            }),
        ]);
        assert_eq!(message.segments.len(), 1);
        match &message.segments[0] {
            Segment::Intent(intent) => {
                assert_eq!(intent.mode.as_deref(), Some("analyze"));
                assert_eq!(intent.state.status, SegmentStatus::Completed);
            }
            other => panic!("Expected Intent, got {:?}", other),
        }
    }

    #[test]
    fn test_terminal_and_unknown_events_leave_state_unchanged() {
        let before = run(vec![delta("x")]);
        let now = Utc::now();
        let after = reduce(before.clone(), ServerEvent::Unknown("usage".to_string()), now);
        assert_eq!(before, after);
        let after = reduce(before.clone(), ServerEvent::Done(Default::default()), now);
        assert_eq!(before, after);
    }
}
