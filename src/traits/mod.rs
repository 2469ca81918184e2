//! Trait abstractions for dependency injection and testability.
//!
//! The controller only talks to its collaborators through these traits, so
//! tests can drive it with scripted streams and recording stores.
//!
//! # Traits
//!
//! - [`ChatBackend`] - streaming chat endpoint, preflight, mode catalog
//! - [`ConversationStore`] - conversation list notifications

pub mod backend;
pub mod store;

pub use backend::ChatBackend;
pub use store::ConversationStore;
