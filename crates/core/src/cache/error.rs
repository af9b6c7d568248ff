use std::time::Duration;

use thiserror::Error;

use crate::mass::{DateError, MassDate};

/// Errors reported by an upstream reading fetcher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("No readings published for this date")]
    NotFound,
    #[error("{0}")]
    Unavailable(String),
}

/// Errors returned by a readings lookup.
///
/// Every waiter coalesced on the same fetch receives a clone of the same
/// error. `retry_after` is the cooldown left before a new fetch is attempted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error(transparent)]
    InvalidDate(#[from] DateError),
    #[error("Mass readings not found for {date}")]
    NotFound {
        date: MassDate,
        retry_after: Option<Duration>,
    },
    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable {
        message: String,
        retry_after: Option<Duration>,
    },
    #[error("Upstream fetch timed out after {after:?}")]
    Timeout {
        after: Duration,
        retry_after: Option<Duration>,
    },
    #[error("Cache entry resolved without an outcome")]
    InternalRace,
}

impl LookupError {
    /// Converts a fetcher failure for `date` into a lookup error.
    pub fn from_fetch(error: FetchError, date: MassDate) -> Self {
        match error {
            FetchError::NotFound => LookupError::NotFound {
                date,
                retry_after: None,
            },
            FetchError::Unavailable(message) => LookupError::UpstreamUnavailable {
                message,
                retry_after: None,
            },
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LookupError::InvalidDate(_) => "invalid_date",
            LookupError::NotFound { .. } => "not_found",
            LookupError::UpstreamUnavailable { .. } => "upstream_unavailable",
            LookupError::Timeout { .. } => "timeout",
            LookupError::InternalRace => "internal_race",
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LookupError::NotFound { retry_after, .. }
            | LookupError::UpstreamUnavailable { retry_after, .. }
            | LookupError::Timeout { retry_after, .. } => *retry_after,
            LookupError::InvalidDate(_) | LookupError::InternalRace => None,
        }
    }

    /// Returns the error with its retry hint replaced.
    ///
    /// Errors that are never cached (`InvalidDate`, `InternalRace`) are
    /// returned unchanged.
    pub fn with_retry_after(mut self, remaining: Duration) -> Self {
        match &mut self {
            LookupError::NotFound { retry_after, .. }
            | LookupError::UpstreamUnavailable { retry_after, .. }
            | LookupError::Timeout { retry_after, .. } => *retry_after = Some(remaining),
            LookupError::InvalidDate(_) | LookupError::InternalRace => {}
        }
        self
    }
}

/// Result type for readings lookups.
pub type Result<T> = std::result::Result<T, LookupError>;
