//! Entry states of the readings table.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::Instant;

use massreadings_core::cache::LookupError;

/// Outcome of one upstream fetch, shared by every waiter on it.
pub(super) type Outcome<R> = Result<Arc<R>, LookupError>;

/// Receiver half of a pending entry's resolvable handle.
pub(super) type OutcomeReceiver<R> = watch::Receiver<Option<Outcome<R>>>;

/// A single entry of the readings table.
///
/// `Pending` transitions exactly once to `Ready` or `Failed`. The expiry
/// instants are computed from the time the outcome was stored.
pub(super) enum Slot<R> {
    Pending {
        generation: u64,
        outcome: OutcomeReceiver<R>,
    },
    Ready {
        record: Arc<R>,
        expires_at: Option<Instant>,
    },
    Failed {
        error: LookupError,
        retry_at: Instant,
    },
}

/// What a lookup does after consulting the table.
pub(super) enum Claim<R> {
    /// Fresh record, returned without suspending.
    Hit(Arc<R>),
    /// Failed fetch still inside its cooldown.
    Cooldown(LookupError),
    /// Another caller owns the fetch; wait for its outcome.
    Wait(OutcomeReceiver<R>),
}

impl<R> Slot<R> {
    /// Returns how a lookup at `now` should be served, or `None` if the slot is stale.
    pub(super) fn observe(&self, now: Instant) -> Option<Claim<R>> {
        match self {
            Slot::Pending { outcome, .. } => Some(Claim::Wait(outcome.clone())),
            Slot::Ready { record, expires_at } if !is_expired(*expires_at, now) => {
                Some(Claim::Hit(Arc::clone(record)))
            }
            Slot::Failed { error, retry_at } if now < *retry_at => Some(Claim::Cooldown(
                error.clone().with_retry_after(*retry_at - now),
            )),
            _ => None,
        }
    }

    /// Stale slots are removed by purges. Pending slots are never stale.
    pub(super) fn is_stale(&self, now: Instant) -> bool {
        match self {
            Slot::Pending { .. } => false,
            Slot::Ready { expires_at, .. } => is_expired(*expires_at, now),
            Slot::Failed { retry_at, .. } => now >= *retry_at,
        }
    }

    pub(super) fn is_ready(&self) -> bool {
        matches!(self, Slot::Ready { .. })
    }

    pub(super) fn is_failed(&self) -> bool {
        matches!(self, Slot::Failed { .. })
    }

    pub(super) fn is_pending(&self) -> bool {
        matches!(self, Slot::Pending { .. })
    }

    /// True if this is the pending slot installed with `generation`.
    pub(super) fn is_pending_generation(&self, generation: u64) -> bool {
        matches!(self, Slot::Pending { generation: g, .. } if *g == generation)
    }
}

fn is_expired(expires_at: Option<Instant>, now: Instant) -> bool {
    expires_at.is_some_and(|exp| now > exp)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn ready(expires_at: Option<Instant>) -> Slot<String> {
        Slot::Ready {
            record: Arc::new("readings".to_string()),
            expires_at,
        }
    }

    #[test]
    fn test_ready_without_ttl_never_expires() {
        let now = Instant::now();
        let slot = ready(None);

        assert!(!slot.is_stale(now + Duration::from_secs(86_400 * 365)));
        assert!(matches!(slot.observe(now), Some(Claim::Hit(_))));
    }

    #[test]
    fn test_ready_expires_after_ttl() {
        let now = Instant::now();
        let slot = ready(Some(now + Duration::from_secs(10)));

        assert!(matches!(
            slot.observe(now + Duration::from_secs(10)),
            Some(Claim::Hit(_))
        ));
        assert!(slot
            .observe(now + Duration::from_secs(10) + Duration::from_millis(1))
            .is_none());
    }

    #[test]
    fn test_failed_reports_remaining_cooldown() {
        let now = Instant::now();
        let slot: Slot<String> = Slot::Failed {
            error: LookupError::UpstreamUnavailable {
                message: "503".to_string(),
                retry_after: None,
            },
            retry_at: now + Duration::from_secs(60),
        };

        match slot.observe(now + Duration::from_secs(45)) {
            Some(Claim::Cooldown(error)) => {
                assert_eq!(error.retry_after(), Some(Duration::from_secs(15)));
            }
            _ => panic!("expected cooldown"),
        }
        assert!(slot.observe(now + Duration::from_secs(60)).is_none());
        assert!(slot.is_stale(now + Duration::from_secs(60)));
    }

    #[test]
    fn test_pending_is_never_stale() {
        let (_tx, rx) = watch::channel(None);
        let slot: Slot<String> = Slot::Pending {
            generation: 7,
            outcome: rx,
        };

        assert!(!slot.is_stale(Instant::now() + Duration::from_secs(86_400)));
        assert!(slot.is_pending_generation(7));
        assert!(!slot.is_pending_generation(8));
        assert!(matches!(slot.observe(Instant::now()), Some(Claim::Wait(_))));
    }
}
