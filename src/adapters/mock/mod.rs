//! Mock implementations for testing.
//!
//! # Available Mocks
//!
//! - [`MockBackend`] - scripted response bodies, recorded requests
//! - [`RecordingStore`] - conversation store that remembers its calls

pub mod backend;
pub mod store;

pub use backend::{sse_block, ChunkSender, MockBackend, MockStream};
pub use store::{RecordingStore, StoreCall};
