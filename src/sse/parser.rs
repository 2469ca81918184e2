//! SSE stream parsing logic
//!
//! `parse_sse_line` classifies one line, `parse_event_block` turns one
//! blank-line-delimited block into a [`StreamEvent`], and
//! [`EventStreamDecoder`] buffers raw bytes across reads so that a block
//! split over several network chunks is only parsed once it is complete.

use crate::error::StreamError;
use crate::sse::events::{SseLine, StreamEvent, DEFAULT_EVENT_TYPE, DONE_SENTINEL};

/// Parse a single SSE line into its component type
pub fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim_end_matches('\r');
    if line.is_empty() {
        return SseLine::Empty;
    }

    if let Some(stripped) = line.strip_prefix(':') {
        return SseLine::Comment(stripped.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("event:") {
        return SseLine::Event(rest.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("data:") {
        // Only the single separator space belongs to the framing.
        let rest = rest.strip_prefix(' ').unwrap_or(rest);
        return SseLine::Data(rest.to_string());
    }

    // Unknown line format - treat as comment
    SseLine::Comment(line.to_string())
}

/// Parse one complete event block (without its terminating blank line).
///
/// Returns:
/// - `Ok(Some(event))` - the block produced an event
/// - `Ok(None)` - the block held only comments or nothing at all
/// - `Err(error)` - the payload is not JSON
pub fn parse_event_block(block: &str) -> Result<Option<StreamEvent>, StreamError> {
    let mut event_type: Option<String> = None;
    let mut data_lines: Vec<String> = Vec::new();

    for line in block.split('\n') {
        match parse_sse_line(line) {
            SseLine::Event(t) if !t.is_empty() => event_type = Some(t),
            SseLine::Data(d) => data_lines.push(d),
            _ => {}
        }
    }

    if event_type.is_none() && data_lines.is_empty() {
        return Ok(None);
    }

    let data = data_lines.join("\n");
    if data.trim() == DONE_SENTINEL {
        return Ok(Some(StreamEvent::done_sentinel()));
    }

    let event_type = event_type.unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string());
    if data.trim().is_empty() {
        // Events like `done` may come without a payload
        return Ok(Some(StreamEvent::new(event_type, serde_json::json!({}))));
    }

    match serde_json::from_str(&data) {
        Ok(value) => Ok(Some(StreamEvent::new(event_type, value))),
        Err(e) => Err(StreamError::InvalidJson {
            event_type,
            message: e.to_string(),
        }),
    }
}

/// Locate the first blank line in `buf` at or after `from`.
///
/// Returns the end of the block and the index just past the delimiter.
fn find_block_end(buf: &[u8], from: usize) -> Option<(usize, usize)> {
    let mut i = from;
    while i < buf.len() {
        if buf[i] == b'\n' {
            let mut j = i + 1;
            if j < buf.len() && buf[j] == b'\r' {
                j += 1;
            }
            if j < buf.len() && buf[j] == b'\n' {
                return Some((i, j + 1));
            }
        }
        i += 1;
    }
    None
}

/// Stateful decoder that accumulates raw bytes and emits complete events.
///
/// Bytes are buffered undecoded so a multi-byte UTF-8 character split
/// across two reads is reassembled before it is interpreted.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    buffer: Vec<u8>,
    /// Where the delimiter search resumes; bytes before it hold no blank line
    scanned: usize,
}

impl EventStreamDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk, returning every event it completed.
    ///
    /// Malformed payloads are logged and dropped; they never abort the stream.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut consumed = 0;
        let mut from = self.scanned;
        while let Some((block_end, next_start)) = find_block_end(&self.buffer, from) {
            if let Some(event) = Self::decode(&self.buffer[consumed..block_end]) {
                events.push(event);
            }
            consumed = next_start;
            from = next_start;
        }
        self.buffer.drain(..consumed);

        // A trailing "\n" or "\n\r" may still become a delimiter
        self.scanned = self.buffer.len().saturating_sub(2);
        events
    }

    /// Flush the unterminated tail at end of stream.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        let tail = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        if tail.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        Self::decode(&tail)
    }

    fn decode(block: &[u8]) -> Option<StreamEvent> {
        let text = String::from_utf8_lossy(block);
        match parse_event_block(&text) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed event payload");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Tests for parse_sse_line

    #[test]
    fn test_parse_empty_line() {
        assert_eq!(parse_sse_line(""), SseLine::Empty);
        assert_eq!(parse_sse_line("\r"), SseLine::Empty);
    }

    #[test]
    fn test_parse_comment_line() {
        assert_eq!(
            parse_sse_line(": keep-alive"),
            SseLine::Comment("keep-alive".to_string())
        );
    }

    #[test]
    fn test_parse_event_line() {
        assert_eq!(
            parse_sse_line("event:   tool_call_start  "),
            SseLine::Event("tool_call_start".to_string())
        );
        assert_eq!(
            parse_sse_line("event:done"),
            SseLine::Event("done".to_string())
        );
    }

    #[test]
    fn test_parse_data_line_strips_one_space() {
        assert_eq!(
            parse_sse_line("data: {\"x\":1}"),
            SseLine::Data("{\"x\":1}".to_string())
        );
        assert_eq!(parse_sse_line("data:  two"), SseLine::Data(" two".to_string()));
    }

    #[test]
    fn test_parse_unknown_line() {
        assert_eq!(
            parse_sse_line("retry: 1000"),
            SseLine::Comment("retry: 1000".to_string())
        );
    }

    // Tests for parse_event_block

    #[test]
    fn test_block_with_type_and_data() {
        let event = parse_event_block("event: text_delta\ndata: {\"content\":\"hi\"}")
            .unwrap()
            .unwrap();
        assert_eq!(event.event_type, "text_delta");
        assert_eq!(event.data, json!({"content": "hi"}));
    }

    #[test]
    fn test_block_without_event_line_defaults_to_message() {
        let event = parse_event_block("data: {\"a\":1}").unwrap().unwrap();
        assert_eq!(event.event_type, DEFAULT_EVENT_TYPE);
    }

    #[test]
    fn test_block_multi_line_data_is_newline_joined() {
        let event = parse_event_block("event: transcript\ndata: {\"text\":\ndata: \"two lines\"}")
            .unwrap()
            .unwrap();
        assert_eq!(event.data, json!({"text": "two lines"}));
    }

    #[test]
    fn test_block_done_sentinel() {
        let event = parse_event_block("data: [DONE]").unwrap().unwrap();
        assert_eq!(event, StreamEvent::done_sentinel());
    }

    #[test]
    fn test_block_event_without_data() {
        let event = parse_event_block("event: final_report_start").unwrap().unwrap();
        assert_eq!(event.event_type, "final_report_start");
        assert_eq!(event.data, json!({}));
    }

    #[test]
    fn test_block_comment_only() {
        assert!(parse_event_block(": ping").unwrap().is_none());
    }

    #[test]
    fn test_block_invalid_json() {
        let result = parse_event_block("event: text_delta\ndata: not json");
        assert!(matches!(result, Err(StreamError::InvalidJson { .. })));
    }

    // Tests for EventStreamDecoder

    #[test]
    fn test_decoder_simple_stream() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.push(
            b"event: intent_start\ndata: {}\n\nevent: intent_end\ndata: {\"mode\":\"analyze\"}\n\n",
        );
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "intent_start");
        assert_eq!(events[1].data["mode"], "analyze");
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_decoder_reassembles_split_block() {
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder.push(b"event: text_delta\nda").is_empty());
        assert!(decoder.push(b"ta: {\"content\":\"Hel").is_empty());
        assert!(decoder.push(b"lo\"}\n").is_empty());

        let events = decoder.push(b"\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data["content"], "Hello");
    }

    #[test]
    fn test_decoder_reassembles_split_utf8() {
        let payload = "event: text_delta\ndata: {\"content\":\"caf\u{e9}\"}\n\n".as_bytes();
        let split = payload.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mut decoder = EventStreamDecoder::new();
        assert!(decoder.push(&payload[..split]).is_empty());
        let events = decoder.push(&payload[split..]);
        assert_eq!(events[0].data["content"], "caf\u{e9}");
    }

    #[test]
    fn test_decoder_crlf_delimiters() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.push(b"event: done\r\ndata: {\"session_id\":\"abc\"}\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "done");
        assert_eq!(events[0].data["session_id"], "abc");
    }

    #[test]
    fn test_decoder_drops_malformed_and_continues() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.push(
            b"event: text_delta\ndata: {broken\n\nevent: text_delta\ndata: {\"content\":\"ok\"}\n\n",
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data["content"], "ok");
    }

    #[test]
    fn test_decoder_finish_flushes_tail() {
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder
            .push(b"event: done\ndata: {\"session_id\":\"s1\"}")
            .is_empty());
        let event = decoder.finish().unwrap();
        assert_eq!(event.event_type, "done");
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_decoder_finish_ignores_whitespace_tail() {
        let mut decoder = EventStreamDecoder::new();
        decoder.push(b"event: ping\ndata: {}\n\n\n");
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_decoder_delimiter_split_across_reads() {
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder.push(b"event: intent_start\ndata: {}\n").is_empty());
        assert_eq!(decoder.push(b"\n").len(), 1);

        assert!(decoder.push(b"event: done\r\ndata: {}\r\n\r").is_empty());
        let events = decoder.push(b"\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "done");
    }

    #[test]
    fn test_decoder_resumes_scan_where_it_stopped() {
        let payload = format!(
            "event: text_delta\ndata: {{\"content\":\"{}\"}}\n\n",
            "x".repeat(4096)
        );
        let mut decoder = EventStreamDecoder::new();
        let mut events = Vec::new();
        for chunk in payload.as_bytes().chunks(7) {
            events.extend(decoder.push(chunk));
            if events.is_empty() {
                assert!(decoder.scanned + 2 >= decoder.buffer.len());
            }
        }
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data["content"].as_str().map(str::len), Some(4096));
        assert_eq!(decoder.scanned, 0);
        assert!(decoder.buffer.is_empty());
    }

    #[test]
    fn test_decoder_ignores_keepalive_comments() {
        let mut decoder = EventStreamDecoder::new();
        let events = decoder.push(b": keep-alive\n\nevent: text_delta\ndata: {\"content\":\"x\"}\n\n");
        assert_eq!(events.len(), 1);
    }
}
