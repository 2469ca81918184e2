//! Memoized value with explicit expiry

use std::future::Future;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    fetched_at: Instant,
}

/// A single cached value that goes stale `ttl` after it was stored.
#[derive(Debug, Clone)]
pub struct TtlCache<T> {
    entry: Option<Entry<T>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { entry: None, ttl }
    }

    /// The cached value if it is still fresh
    pub fn get(&self) -> Option<T> {
        self.get_at(Instant::now())
    }

    pub fn get_at(&self, now: Instant) -> Option<T> {
        self.entry
            .as_ref()
            .filter(|entry| now.saturating_duration_since(entry.fetched_at) < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub fn set(&mut self, value: T) {
        self.set_at(value, Instant::now());
    }

    pub fn set_at(&mut self, value: T, fetched_at: Instant) {
        self.entry = Some(Entry { value, fetched_at });
    }

    /// Drop the cached value so the next lookup refetches.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Return the fresh value, or run `fetch` and remember its result.
    ///
    /// A failed fetch leaves any stale entry in place and caches nothing.
    pub async fn get_or_try_fetch<F, Fut, E>(&mut self, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get() {
            return Ok(value);
        }
        let value = fetch().await?;
        self.set(value.clone());
        Ok(value)
    }
}
