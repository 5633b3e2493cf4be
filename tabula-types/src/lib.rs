//! Core type definitions for Tabula.
//!
//! This crate defines the small, storage-agnostic types shared by every
//! other crate in the workspace:
//! - Row identifiers for each entity in the workspace → base → table hierarchy
//! - Time-ordered audit event identifiers (UUID v7)
//! - The injectable [`Clock`] used for trash timestamps and purge thresholds

mod clock;
mod ids;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ids::{
    AuditEventId, BaseId, CommentId, FieldId, OptionId, RecordId, TableId, UserId, WorkspaceId,
};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid {kind} id: {value:?}")]
    InvalidId { kind: &'static str, value: String },

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
