//! Error types for `XdbgPrxy` core library.

use thiserror::Error;

/// Result type alias using `XdbgPrxy` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `XdbgPrxy` operations.
///
/// The relay itself never fails: read-side closure ends a session and
/// write failures are reported through the observer. Errors here come from
/// configuration loading, before any session exists.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
