use std::{env, str::FromStr, time::Duration};

use massreadings_core::cache::CachePolicy;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// TTL of today's and future readings in seconds (default: 10,800)
    pub ready_ttl_seconds: u64,
    /// TTL of past readings in seconds, 0 keeps them until evicted (default: 0)
    pub historical_ttl_seconds: u64,
    /// Cooldown of a failed fetch in seconds (default: 60)
    pub failed_cooldown_seconds: u64,
    /// Maximum number of cache entries (default: 1,000)
    pub cache_max_entries: usize,
    /// Number of cache shards (default: 16)
    pub cache_shards: usize,
    /// Upstream fetch deadline in seconds (default: 15)
    pub fetch_timeout_seconds: u64,
    /// Interval of the background sweep in seconds, 0 disables it (default: 300)
    pub sweep_interval_seconds: u64,
    /// USCCB site root (default: "https://bible.usccb.org")
    pub usccb_base_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `READY_TTL_SECONDS` - TTL of today's and future readings (default: 10,800)
    /// - `HISTORICAL_TTL_SECONDS` - TTL of past readings, 0 = never (default: 0)
    /// - `FAILED_COOLDOWN_SECONDS` - Failed fetch cooldown (default: 60)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 1,000)
    /// - `CACHE_SHARDS` - Number of cache shards (default: 16)
    /// - `FETCH_TIMEOUT_SECONDS` - Upstream fetch deadline (default: 15)
    /// - `SWEEP_INTERVAL_SECONDS` - Background sweep interval, 0 = off (default: 300)
    /// - `USCCB_BASE_URL` - USCCB site root (default: "https://bible.usccb.org")
    pub fn from_env() -> Self {
        Self {
            ready_ttl_seconds: env_or("READY_TTL_SECONDS", 10_800),
            historical_ttl_seconds: env_or("HISTORICAL_TTL_SECONDS", 0),
            failed_cooldown_seconds: env_or("FAILED_COOLDOWN_SECONDS", 60),
            cache_max_entries: env_or("CACHE_MAX_ENTRIES", 1_000),
            cache_shards: env_or("CACHE_SHARDS", 16),
            fetch_timeout_seconds: env_or("FETCH_TIMEOUT_SECONDS", 15),
            sweep_interval_seconds: env_or("SWEEP_INTERVAL_SECONDS", 300),
            usccb_base_url: env::var("USCCB_BASE_URL")
                .unwrap_or_else(|_| "https://bible.usccb.org".to_string()),
        }
    }

    /// Cache policy derived from the TTL, capacity and timeout settings.
    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            ready_ttl: Duration::from_secs(self.ready_ttl_seconds),
            historical_ttl: (self.historical_ttl_seconds > 0)
                .then(|| Duration::from_secs(self.historical_ttl_seconds)),
            failed_cooldown: Duration::from_secs(self.failed_cooldown_seconds),
            max_entries: self.cache_max_entries,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_seconds),
            shards: self.cache_shards,
        }
    }

    /// Get the sweep interval, `None` when sweeping is disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_seconds > 0)
            .then(|| Duration::from_secs(self.sweep_interval_seconds))
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            ready_ttl_seconds: 600,
            historical_ttl_seconds: 0,
            failed_cooldown_seconds: 30,
            cache_max_entries: 50,
            cache_shards: 4,
            fetch_timeout_seconds: 5,
            sweep_interval_seconds: 0,
            usccb_base_url: "http://localhost:8080".to_string(),
        }
    }

    #[test]
    fn test_cache_policy_conversion() {
        let policy = test_config().cache_policy();

        assert_eq!(policy.ready_ttl, Duration::from_secs(600));
        assert_eq!(policy.historical_ttl, None);
        assert_eq!(policy.failed_cooldown, Duration::from_secs(30));
        assert_eq!(policy.max_entries, 50);
        assert_eq!(policy.fetch_timeout, Duration::from_secs(5));
        assert_eq!(policy.shards, 4);
    }

    #[test]
    fn test_historical_ttl_and_sweep_interval() {
        let config = Config {
            historical_ttl_seconds: 86_400,
            sweep_interval_seconds: 120,
            ..test_config()
        };

        assert_eq!(
            config.cache_policy().historical_ttl,
            Some(Duration::from_secs(86_400))
        );
        assert_eq!(config.sweep_interval(), Some(Duration::from_secs(120)));
        assert_eq!(test_config().sweep_interval(), None);
    }

    #[test]
    fn test_default_values() {
        // Clear environment variables to test defaults
        env::remove_var("READY_TTL_SECONDS");
        env::remove_var("HISTORICAL_TTL_SECONDS");
        env::remove_var("FAILED_COOLDOWN_SECONDS");
        env::remove_var("CACHE_MAX_ENTRIES");
        env::remove_var("CACHE_SHARDS");
        env::remove_var("FETCH_TIMEOUT_SECONDS");
        env::remove_var("SWEEP_INTERVAL_SECONDS");
        env::remove_var("USCCB_BASE_URL");

        let config = Config::from_env();

        assert_eq!(config.ready_ttl_seconds, 10_800);
        assert_eq!(config.historical_ttl_seconds, 0);
        assert_eq!(config.failed_cooldown_seconds, 60);
        assert_eq!(config.cache_max_entries, 1_000);
        assert_eq!(config.cache_shards, 16);
        assert_eq!(config.fetch_timeout_seconds, 15);
        assert_eq!(config.sweep_interval_seconds, 300);
        assert_eq!(config.usccb_base_url, "https://bible.usccb.org");
        assert_eq!(config.cache_policy(), CachePolicy::default());
    }
}
