//! Streamchat - streaming message assembly for chat clients
//!
//! Turns the event stream of a chat backend into a render-ready answer:
//! an SSE transport parser, a pure segment reducer, a request lifecycle
//! controller with cancellation and supersession, and a session reconciler
//! that keeps an external conversation list in sync.

pub mod adapters;
pub mod assembler;
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod models;
pub mod session;
pub mod sse;
pub mod traits;
