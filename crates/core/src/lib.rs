//! Functional core for massreadings.
//!
//! Pure types and functions shared by the server: the mass reading domain
//! (dates, liturgical calendar, text parsing) and the cache vocabulary
//! (errors, expiry policy, the upstream fetcher seam).

pub mod cache;
pub mod mass;
