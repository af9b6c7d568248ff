use thiserror::Error;

/// Errors that can occur when parsing or validating a mass date.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("Invalid date format: {0}. Use YYYY-MM-DD")]
    Malformed(String),
    #[error("Date out of supported range: {0}")]
    OutOfRange(String),
}
