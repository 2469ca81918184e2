//! Concrete implementations of the collaborator traits.
//!
//! # Adapters
//!
//! - [`HttpChatBackend`] - chat service over HTTP using reqwest
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockBackend`] - scripted response streams
//! - [`mock::RecordingStore`] - records conversation notifications

pub mod http_backend;
pub mod mock;

pub use http_backend::HttpChatBackend;
pub use mock::{sse_block, ChunkSender, MockBackend, MockStream, RecordingStore, StoreCall};
