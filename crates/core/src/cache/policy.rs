use std::time::Duration;

use chrono::NaiveDate;

use crate::mass::MassDate;

/// Expiry, capacity and timeout policy of the readings cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// TTL for today and future dates, whose readings can still be corrected upstream.
    pub ready_ttl: Duration,
    /// TTL for past dates. `None` keeps them until evicted.
    pub historical_ttl: Option<Duration>,
    /// How long a failed fetch is served from cache before it is retried.
    pub failed_cooldown: Duration,
    /// Upper bound on entries across all shards. Pending fetches count towards
    /// it but are never evicted.
    pub max_entries: usize,
    /// Deadline for a single upstream fetch.
    pub fetch_timeout: Duration,
    /// Number of independently locked shards.
    pub shards: usize,
}

impl CachePolicy {
    /// Returns the TTL of a successful fetch for `date`, given the current date.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use chrono::NaiveDate;
    /// use massreadings_core::cache::CachePolicy;
    /// use massreadings_core::mass::MassDate;
    ///
    /// let policy = CachePolicy::default();
    /// let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    ///
    /// let past = MassDate::parse("2025-02-27").unwrap();
    /// assert_eq!(policy.ready_ttl_for(past, today), None);
    ///
    /// let current = MassDate::parse("2025-03-01").unwrap();
    /// assert_eq!(policy.ready_ttl_for(current, today), Some(policy.ready_ttl));
    /// ```
    pub fn ready_ttl_for(&self, date: MassDate, today: NaiveDate) -> Option<Duration> {
        if date.date() < today {
            self.historical_ttl
        } else {
            Some(self.ready_ttl)
        }
    }

    /// Number of shards actually used. Never zero.
    pub fn shard_count(&self) -> usize {
        self.shards.max(1)
    }

    /// Shard index for `date`. Consecutive dates land in different shards.
    pub fn shard_for(&self, date: MassDate) -> usize {
        date.ordinal().rem_euclid(self.shard_count() as i32) as usize
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ready_ttl: Duration::from_secs(3 * 60 * 60),
            historical_ttl: None,
            failed_cooldown: Duration::from_secs(60),
            max_entries: 1_000,
            fetch_timeout: Duration::from_secs(15),
            shards: 16,
        }
    }
}
