use std::sync::Arc;

use massreadings_core::cache::{CachePolicy, ReadingFetcher};
use massreadings_core::mass::MassReading;

use crate::cache::ReadingCache;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Readings cache in front of the configured upstream.
    pub readings: ReadingCache<MassReading>,
}

impl AppState {
    pub fn new(fetcher: Arc<dyn ReadingFetcher<MassReading>>, policy: CachePolicy) -> Self {
        Self {
            readings: ReadingCache::new(fetcher, policy),
        }
    }
}
