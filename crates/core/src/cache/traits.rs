use async_trait::async_trait;

use crate::mass::MassDate;

use super::FetchError;

/// Source of reading records for the read-through cache.
///
/// The cache never inspects `R`; it only stores and clones handles to it.
#[async_trait]
pub trait ReadingFetcher<R>: Send + Sync {
    /// Fetches the record for `date`. May be slow and may fail transiently.
    async fn fetch_reading(&self, date: MassDate) -> Result<R, FetchError>;
}
