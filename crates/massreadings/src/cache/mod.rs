//! In-memory read-through cache in front of the upstream readings fetcher.
//!
//! One [`ReadingCache`] is built in `main` and shared through `AppState`.
//! See [`read_through`] for the locking and coalescing scheme.

mod read_through;
mod slot;

pub use read_through::{CacheStats, ReadingCache};
