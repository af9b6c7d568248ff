//! Pure functions for mapping lookup errors to HTTP status codes.

use super::LookupError;

/// Maps a [`LookupError`] to an HTTP status code.
///
/// - `InvalidDate` -> 400 (Bad Request)
/// - `NotFound` -> 404 (Not Found)
/// - `UpstreamUnavailable` -> 502 (Bad Gateway)
/// - `Timeout` -> 504 (Gateway Timeout)
/// - `InternalRace` -> 500 (Internal Server Error)
///
/// # Examples
///
/// ```
/// use massreadings_core::cache::{lookup_error_to_status_code, LookupError};
///
/// assert_eq!(lookup_error_to_status_code(&LookupError::InternalRace), 500);
/// ```
pub fn lookup_error_to_status_code(error: &LookupError) -> u16 {
    match error {
        LookupError::InvalidDate(_) => 400,
        LookupError::NotFound { .. } => 404,
        LookupError::UpstreamUnavailable { .. } => 502,
        LookupError::Timeout { .. } => 504,
        LookupError::InternalRace => 500,
    }
}
