//! Expiring caches owned by the components that need them.
//!
//! Nothing here is global: the controller holds its own [`TtlCache`] for
//! the mode catalog and exposes an explicit invalidate.

mod ttl;

pub use ttl::TtlCache;
