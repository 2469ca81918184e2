//! Error handling for the chat client.
//!
//! | Category | Source | Shown to the user |
//! |----------|--------|-------------------|
//! | Network | connection failure, non-2xx status | yes, as an assistant message |
//! | Server | `error` event from the backend | yes, verbatim |
//! | Client | malformed event payload | no, logged and dropped |
//! | Cancelled | user stop or supersession | no |
//!
//! A stream that ends without a terminal event is recovered locally and is
//! logged, not shown.

mod category;
mod chat_error;
mod network;
mod stream;

pub use category::ErrorCategory;
pub use chat_error::ChatError;
pub use network::{classify_reqwest_error, NetworkError};
pub use stream::StreamError;

/// Type alias for Results using ChatError.
pub type ChatResult<T> = Result<T, ChatError>;
