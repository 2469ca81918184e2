//! SSE (Server-Sent Events) transport parser
//!
//! Decodes the chunked response body of the chat endpoint into discrete
//! [`StreamEvent`]s. The wire format:
//! - `event: <type>` - event type line (defaults to `message`)
//! - `data: <json>` - data payload line, may repeat (joined with `\n`)
//! - Empty line - signals end of event
//! - Lines starting with `:` - comments (ignored)
//!
//! The literal payload `[DONE]` is turned into a synthetic `done` event.
//!
//! # Module structure
//! - `events` - `StreamEvent` and `SseLine`
//! - `parser` - line classification and the byte-level `EventStreamDecoder`
//! - `reader` - async driver that feeds a byte stream through the decoder

mod events;
mod parser;
mod reader;

pub use events::{SseLine, StreamEvent, DEFAULT_EVENT_TYPE, DONE_SENTINEL};
pub use parser::{parse_event_block, parse_sse_line, EventStreamDecoder};
pub use reader::{read_event_stream, ByteStream, StreamHandler};
