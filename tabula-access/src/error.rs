//! Error types for permission resolution.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    /// No actor identity was presented.
    #[error("authentication required")]
    NotAuthenticated,

    /// The base does not exist. Deliberately silent about whether it exists
    /// but is hidden from the caller.
    #[error("base not found")]
    NotFound,

    /// The backing lookup failed.
    #[error("permission lookup failed: {0}")]
    Lookup(String),
}
