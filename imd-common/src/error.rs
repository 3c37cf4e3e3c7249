//! Common error types for IMD

use thiserror::Error;

/// Common result type for IMD operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across IMD crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No store profile could be reached
    #[error(transparent)]
    StoreUnavailable(#[from] StoreUnavailable),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Outcome of trying every configured store profile without success
///
/// Only the last failure is kept; earlier ones are logged as they happen.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "Store unavailable after {attempted} profile(s); last error from '{last_profile}': {last_error}"
)]
pub struct StoreUnavailable {
    /// Number of profiles tried
    pub attempted: usize,
    /// Name of the last profile tried
    pub last_profile: String,
    /// Message of the last connection error
    pub last_error: String,
}
