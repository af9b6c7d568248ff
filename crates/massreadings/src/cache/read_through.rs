//! Date-keyed read-through cache with request coalescing.
//!
//! The table is split into shards, each an `LruCache` behind its own mutex.
//! A shard lock is only held for table bookkeeping and never across an
//! `.await`, so lookups for dates in different shards never contend and the
//! upstream fetch never runs under a lock. At most one shard is locked at a
//! time.
//!
//! The first lookup that misses installs a `Pending` slot holding the
//! receiver of a `watch` channel and spawns the fetch as its own task. Later
//! lookups for the same date clone that receiver and wait. The fetch task
//! writes the terminal slot into the table before publishing the outcome, so
//! a caller that finds no `Pending` slot always sees the stored result.
//!
//! `max_entries` bounds the whole table. Every touch stamps the entry with a
//! global use tick; when the table is over capacity the entry with the oldest
//! tick across all shards is evicted, `Ready` entries before `Failed` ones.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lru::LruCache;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use massreadings_core::cache::{CachePolicy, LookupError, ReadingFetcher, Result};
use massreadings_core::mass::MassDate;

use super::slot::{Claim, Outcome, OutcomeReceiver, Slot};

/// A slot plus the global tick of its last use.
struct Entry<R> {
    slot: Slot<R>,
    last_used: u64,
}

type Shard<R> = LruCache<MassDate, Entry<R>>;

/// Eviction candidate: shard index, key and use tick.
type Victim = (usize, MassDate, u64);

/// Point-in-time counters of a [`ReadingCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub pending: usize,
    pub hits: u64,
    pub misses: u64,
    pub coalesced: u64,
    pub cooldown_hits: u64,
    pub fetches: u64,
    pub fetch_failures: u64,
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    cooldown_hits: AtomicU64,
    fetches: AtomicU64,
    fetch_failures: AtomicU64,
    evictions: AtomicU64,
}

fn bump(counter: &AtomicU64, by: u64) {
    counter.fetch_add(by, Ordering::Relaxed);
}

/// Read-through cache of mass readings keyed by date.
///
/// Cloning is cheap; all clones share the same table.
pub struct ReadingCache<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for ReadingCache<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<R> {
    shards: Vec<Mutex<Shard<R>>>,
    policy: CachePolicy,
    fetcher: Arc<dyn ReadingFetcher<R>>,
    generations: AtomicU64,
    ticks: AtomicU64,
    /// Entries across all shards, pending ones included.
    entries: AtomicUsize,
    counters: Counters,
}

impl<R> ReadingCache<R>
where
    R: Send + Sync + 'static,
{
    /// Creates an empty cache in front of `fetcher`.
    ///
    /// Capacity is enforced by hand across shards so that pending entries
    /// are never evicted, hence the unbounded `LruCache` per shard.
    pub fn new(fetcher: Arc<dyn ReadingFetcher<R>>, policy: CachePolicy) -> Self {
        let shards = (0..policy.shard_count())
            .map(|_| Mutex::new(LruCache::unbounded()))
            .collect();

        Self {
            inner: Arc::new(Inner {
                shards,
                policy,
                fetcher,
                generations: AtomicU64::new(0),
                ticks: AtomicU64::new(0),
                entries: AtomicUsize::new(0),
                counters: Counters::default(),
            }),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.inner.policy
    }

    /// Looks up the readings for a `YYYY-MM-DD` date string.
    ///
    /// Malformed or out-of-range dates fail with `InvalidDate` without
    /// touching the table or the upstream.
    pub async fn lookup(&self, raw: &str) -> Result<Arc<R>> {
        let date = MassDate::parse(raw)?;
        self.get(date).await
    }

    /// Looks up the readings for `date`, fetching them at most once per miss.
    ///
    /// Dropping the returned future only stops this caller from waiting; an
    /// in-flight fetch keeps running and still populates the cache.
    pub async fn get(&self, date: MassDate) -> Result<Arc<R>> {
        let mut outcome = match self.inner.join_or_claim(date) {
            Claimed::Existing(Claim::Hit(record)) => {
                tracing::trace!(%date, "Cache hit for readings");
                return Ok(record);
            }
            Claimed::Existing(Claim::Cooldown(error)) => {
                tracing::trace!(%date, error = %error, "Cache hit for failed readings");
                return Err(error);
            }
            Claimed::Existing(Claim::Wait(outcome)) => {
                tracing::trace!(%date, "Joining in-flight fetch");
                outcome
            }
            Claimed::Owner(outcome, resolver) => {
                tracing::debug!(%date, "Cache miss for readings");
                tokio::spawn(resolver.fetch());
                outcome
            }
        };

        wait_for_outcome(date, &mut outcome).await
    }

    /// Removes every expired entry and failed entry past its cooldown.
    ///
    /// Returns the number of removed entries.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let removed: usize = (0..self.inner.shards.len())
            .map(|idx| self.inner.purge_stale(&mut self.inner.lock_shard(idx), now))
            .sum();

        if removed > 0 {
            bump(&self.inner.counters.evictions, removed as u64);
            tracing::debug!(removed, "Swept stale readings");
        }
        removed
    }

    /// Runs [`ReadingCache::sweep`] every `period` on a background task.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                cache.sweep();
            }
        })
    }

    pub fn stats(&self) -> CacheStats {
        let (entries, pending) = (0..self.inner.shards.len()).fold((0, 0), |(e, p), idx| {
            let shard = self.inner.lock_shard(idx);
            let pending = shard
                .iter()
                .filter(|(_, entry)| entry.slot.is_pending())
                .count();
            (e + shard.len(), p + pending)
        });

        let c = &self.inner.counters;
        CacheStats {
            entries,
            pending,
            hits: c.hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            coalesced: c.coalesced.load(Ordering::Relaxed),
            cooldown_hits: c.cooldown_hits.load(Ordering::Relaxed),
            fetches: c.fetches.load(Ordering::Relaxed),
            fetch_failures: c.fetch_failures.load(Ordering::Relaxed),
            evictions: c.evictions.load(Ordering::Relaxed),
        }
    }
}

enum Claimed<R> {
    Existing(Claim<R>),
    /// This caller installed the pending slot and must start the fetch.
    Owner(OutcomeReceiver<R>, Resolver<R>),
}

impl<R> Inner<R> {
    fn lock_shard(&self, idx: usize) -> MutexGuard<'_, Shard<R>> {
        // Slots are replaced whole, a poisoned shard is still consistent.
        self.shards[idx]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn tick(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::Relaxed)
    }

    /// Atomic create-or-join for `date`, under the date's shard lock.
    fn join_or_claim(self: &Arc<Self>, date: MassDate) -> Claimed<R> {
        let now = Instant::now();
        let mut shard = self.lock_shard(self.policy.shard_for(date));

        if let Some(entry) = shard.get_mut(&date) {
            if let Some(claim) = entry.slot.observe(now) {
                entry.last_used = self.tick();
                let counter = match &claim {
                    Claim::Hit(_) => &self.counters.hits,
                    Claim::Cooldown(_) => &self.counters.cooldown_hits,
                    Claim::Wait(_) => &self.counters.coalesced,
                };
                bump(counter, 1);
                return Claimed::Existing(claim);
            }
        }

        bump(&self.counters.misses, 1);

        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = watch::channel(None);
        let pending = Entry {
            slot: Slot::Pending {
                generation,
                outcome: rx.clone(),
            },
            last_used: self.tick(),
        };
        if shard.put(date, pending).is_none() {
            self.entries.fetch_add(1, Ordering::Relaxed);
        }
        let purged = self.purge_stale(&mut shard, now);
        drop(shard);

        let evicted = purged + self.evict_over_capacity();
        if evicted > 0 {
            bump(&self.counters.evictions, evicted as u64);
        }

        Claimed::Owner(
            rx,
            Resolver {
                inner: Arc::clone(self),
                date,
                generation,
                tx: Some(tx),
            },
        )
    }

    /// Replaces the pending slot `generation` of `date` with its terminal
    /// slot, or removes it when `slot` is `None`. Recency is left as of the
    /// lookup that installed the pending slot.
    ///
    /// Returns false if the pending slot is gone, which the create-or-join
    /// discipline rules out.
    fn settle(&self, date: MassDate, generation: u64, slot: Option<Slot<R>>) -> bool {
        let mut shard = self.lock_shard(self.policy.shard_for(date));
        let Some(entry) = shard
            .peek_mut(&date)
            .filter(|entry| entry.slot.is_pending_generation(generation))
        else {
            return false;
        };

        match slot {
            Some(slot) => entry.slot = slot,
            None => {
                shard.pop(&date);
                self.entries.fetch_sub(1, Ordering::Relaxed);
            }
        }
        true
    }

    /// Removes stale slots from a shard. Returns how many were removed.
    fn purge_stale(&self, shard: &mut Shard<R>, now: Instant) -> usize {
        let stale: Vec<MassDate> = shard
            .iter()
            .filter(|(_, entry)| entry.slot.is_stale(now))
            .map(|(date, _)| *date)
            .collect();

        for date in &stale {
            shard.pop(date);
        }
        self.entries.fetch_sub(stale.len(), Ordering::Relaxed);
        stale.len()
    }

    /// Evicts least-recently-used entries across all shards until the table
    /// fits `max_entries`. `Ready` entries go first, `Failed` ones only when
    /// no `Ready` entry is left. Pending slots are never evicted.
    fn evict_over_capacity(&self) -> usize {
        let max_entries = self.policy.max_entries.max(1);
        let mut evicted = 0;

        while self.entries.load(Ordering::Relaxed) > max_entries {
            let Some((idx, date, last_used)) = self.lru_victim() else {
                break;
            };

            let mut shard = self.lock_shard(idx);
            // The candidate may have been touched or resolved since the scan.
            let unchanged = shard
                .peek(&date)
                .is_some_and(|entry| entry.last_used == last_used && !entry.slot.is_pending());
            if unchanged {
                tracing::trace!(%date, "Evicting least recently used readings");
                shard.pop(&date);
                self.entries.fetch_sub(1, Ordering::Relaxed);
                evicted += 1;
            }
        }
        evicted
    }

    /// Oldest `Ready` entry in the table, or the oldest `Failed` one if there
    /// is no `Ready` entry. Locks one shard at a time.
    fn lru_victim(&self) -> Option<Victim> {
        let mut ready = None;
        let mut failed = None;

        for idx in 0..self.shards.len() {
            let shard = self.lock_shard(idx);
            let oldest = |wanted: fn(&Slot<R>) -> bool| {
                shard
                    .iter()
                    .rev()
                    .find(|(_, entry)| wanted(&entry.slot))
                    .map(|(date, entry)| (idx, *date, entry.last_used))
            };
            keep_older(&mut ready, oldest(Slot::is_ready));
            keep_older(&mut failed, oldest(Slot::is_failed));
        }

        ready.or(failed)
    }
}

fn keep_older(best: &mut Option<Victim>, candidate: Option<Victim>) {
    if let Some(candidate) = candidate {
        if best.is_none_or(|current| candidate.2 < current.2) {
            *best = Some(candidate);
        }
    }
}

/// Owner of a pending slot. Resolves it exactly once.
///
/// If dropped unresolved (the fetch task panicked or was cancelled with the
/// runtime) the pending slot is removed and waiters get an upstream error, so
/// nobody is left waiting on an entry that can no longer resolve.
struct Resolver<R> {
    inner: Arc<Inner<R>>,
    date: MassDate,
    generation: u64,
    tx: Option<watch::Sender<Option<Outcome<R>>>>,
}

impl<R> Resolver<R> {
    /// Calls the upstream under the fetch deadline and resolves the slot.
    async fn fetch(self) {
        let date = self.date;
        let inner = Arc::clone(&self.inner);
        let deadline = inner.policy.fetch_timeout;
        bump(&inner.counters.fetches, 1);

        let fetch = inner.fetcher.fetch_reading(date);
        let outcome = match tokio::time::timeout(deadline, fetch).await {
            Ok(Ok(record)) => {
                tracing::debug!(%date, "Fetched readings from upstream");
                Ok(Arc::new(record))
            }
            Ok(Err(error)) => {
                tracing::warn!(%date, error = %error, "Upstream fetch failed");
                Err(LookupError::from_fetch(error, date))
            }
            Err(_) => {
                tracing::warn!(%date, timeout = ?deadline, "Upstream fetch timed out");
                Err(LookupError::Timeout {
                    after: deadline,
                    retry_after: None,
                })
            }
        };

        self.resolve(outcome);
    }

    /// Stores the terminal slot, then publishes the outcome.
    ///
    /// The sender is taken only once the slot is settled, so the drop guard
    /// still covers everything before it.
    fn resolve(mut self, outcome: Outcome<R>) {
        let now = Instant::now();
        let policy = &self.inner.policy;

        let (slot, outcome) = match outcome {
            Ok(record) => {
                let today = chrono::Local::now().date_naive();
                // An expiry past the clock's range never comes.
                let expires_at = policy
                    .ready_ttl_for(self.date, today)
                    .and_then(|ttl| now.checked_add(ttl));
                let slot = Slot::Ready {
                    record: Arc::clone(&record),
                    expires_at,
                };
                (Some(slot), Ok(record))
            }
            Err(error) => {
                bump(&self.inner.counters.fetch_failures, 1);
                let error = error.with_retry_after(policy.failed_cooldown);
                // A cooldown past the clock's range cannot be stored; the
                // failure is then returned without being cached.
                let slot = now
                    .checked_add(policy.failed_cooldown)
                    .map(|retry_at| Slot::Failed {
                        error: error.clone(),
                        retry_at,
                    });
                (slot, Err(error))
            }
        };

        if !self.inner.settle(self.date, self.generation, slot) {
            tracing::error!(
                date = %self.date,
                "Pending readings entry vanished before its fetch resolved"
            );
        }
        if let Some(tx) = self.tx.take() {
            tx.send_replace(Some(outcome));
        }
    }
}

impl<R> Drop for Resolver<R> {
    fn drop(&mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        tracing::error!(date = %self.date, "Fetch task ended without resolving its entry");
        bump(&self.inner.counters.fetch_failures, 1);
        self.inner.settle(self.date, self.generation, None);
        tx.send_replace(Some(Err(LookupError::UpstreamUnavailable {
            message: "fetch ended without a result".to_string(),
            retry_after: None,
        })));
    }
}

async fn wait_for_outcome<R>(date: MassDate, outcome: &mut OutcomeReceiver<R>) -> Outcome<R> {
    let resolved = match outcome.wait_for(Option::is_some).await {
        Ok(resolved) => (*resolved).clone(),
        // The resolver always publishes before dropping its sender.
        Err(_) => None,
    };

    resolved.unwrap_or_else(|| {
        tracing::error!(%date, "Readings entry resolved without an outcome");
        Err(LookupError::InternalRace)
    })
}
