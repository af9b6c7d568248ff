//! Upstream sources of daily readings.
//!
//! Both fetchers implement [`ReadingFetcher`] and are only ever called by the
//! readings cache.
//!
//! [`ReadingFetcher`]: massreadings_core::cache::ReadingFetcher

mod mock;
mod usccb;

pub use mock::MockFetcher;
pub use usccb::UsccbFetcher;
