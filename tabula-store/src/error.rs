//! Error types for the storage layer.

use rusqlite::ffi;
use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in storage operations.
///
/// Constraint failures are classified so callers can react to them without
/// knowing SQLite's error codes.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index rejected the write. `constraint` names the columns or
    /// index involved.
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// A referenced row does not exist.
    #[error("foreign key constraint violated")]
    ForeignKeyViolation,

    /// A CHECK constraint rejected the row.
    #[error("check constraint violated: {0}")]
    CheckViolation(String),

    /// Any other database error from SQLite.
    #[error("database error: {0}")]
    Database(rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored data could not be interpreted.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A previous holder of the connection panicked.
    #[error("connection lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, message) = &err {
            let detail = message.clone().unwrap_or_default();
            match code.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    let constraint = detail
                        .split_once("failed: ")
                        .map(|(_, c)| c.to_string())
                        .unwrap_or(detail);
                    return Self::UniqueViolation { constraint };
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => return Self::ForeignKeyViolation,
                ffi::SQLITE_CONSTRAINT_CHECK => return Self::CheckViolation(detail),
                _ => {}
            }
        }
        Self::Database(err)
    }
}
