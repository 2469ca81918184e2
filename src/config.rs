//! Client configuration.
//!
//! Use the builder pattern to customize, or [`ClientConfig::from_env`] to
//! pick up the `STREAMCHAT_*` environment variables.
//!
//! ```ignore
//! use streamchat::config::ClientConfig;
//!
//! let config = ClientConfig::default()
//!     .with_base_url("https://chat.example.com")
//!     .with_title_max_chars(40);
//! ```

use std::time::Duration;

use tracing::warn;

/// Environment variable overriding [`ClientConfig::base_url`]
pub const ENV_BASE_URL: &str = "STREAMCHAT_BASE_URL";
/// Environment variable holding the bearer token
pub const ENV_TOKEN: &str = "STREAMCHAT_TOKEN";
/// Environment variable overriding the mode cache TTL, in seconds
pub const ENV_MODE_CACHE_TTL: &str = "STREAMCHAT_MODE_CACHE_TTL_SECS";

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_STREAM_PATH: &str = "/api/chat/stream";
const DEFAULT_MODE_CACHE_TTL: Duration = Duration::from_secs(300);
const DEFAULT_TITLE_MAX_CHARS: usize = 30;
const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend root (default: http://localhost:8000)
    pub base_url: String,
    /// Path of the streaming chat endpoint
    pub stream_path: String,
    /// Bearer token sent with every request
    pub auth_token: Option<String>,
    /// How long a fetched mode list stays fresh
    pub mode_cache_ttl: Duration,
    /// Provisional conversation titles are cut to this many characters
    pub title_max_chars: usize,
    /// Number of prior messages sent as request history
    pub history_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            stream_path: DEFAULT_STREAM_PATH.to_string(),
            auth_token: None,
            mode_cache_ttl: DEFAULT_MODE_CACHE_TTL,
            title_max_chars: DEFAULT_TITLE_MAX_CHARS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend root. A trailing slash is dropped.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_stream_path(mut self, path: impl Into<String>) -> Self {
        self.stream_path = path.into();
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_mode_cache_ttl(mut self, ttl: Duration) -> Self {
        self.mode_cache_ttl = ttl;
        self
    }

    pub fn with_title_max_chars(mut self, max_chars: usize) -> Self {
        self.title_max_chars = max_chars;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Absolute URL for `path` under the backend root
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn stream_url(&self) -> String {
        self.endpoint(&self.stream_path)
    }

    /// Defaults overridden by whichever `STREAMCHAT_*` variables are set.
    ///
    /// Unparseable numbers are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(url) = non_empty_var(ENV_BASE_URL) {
            config = config.with_base_url(url);
        }
        if let Some(token) = non_empty_var(ENV_TOKEN) {
            config = config.with_auth_token(token);
        }
        if let Some(raw) = non_empty_var(ENV_MODE_CACHE_TTL) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config = config.with_mode_cache_ttl(Duration::from_secs(secs)),
                Err(e) => warn!(
                    value = %raw,
                    error = %e,
                    "invalid {}, keeping default",
                    ENV_MODE_CACHE_TTL
                ),
            }
        }

        config
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
