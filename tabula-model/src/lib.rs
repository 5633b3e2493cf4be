//! Domain model for Tabula.
//!
//! Defines the plain data types every other crate speaks:
//! - [`Workspace`] → [`Base`] → [`TableDef`] → [`Field`] / [`RecordRow`], the
//!   four-level hierarchy that the trash lifecycle keeps consistent
//! - [`CellValue`]: the logical union a record cell can hold
//! - [`EntityKind`]: which entities are soft-deletable and how deletes cascade
//! - [`AuditEvent`]: the append-only change log
//!
//! Nothing here touches storage; the store crate maps these types onto rows.

mod audit;
mod cell;
mod entity;
mod kind;
mod schema;

pub use audit::{AuditAction, AuditEvent, AuditEventView};
pub use cell::{CellValue, RecordCell};
pub use entity::{
    Base, BaseMember, Comment, Field, RecordRow, SelectOption, TableDef, TrashState, User,
    Workspace,
};
pub use kind::{CascadeEdge, EntityKind, NameRule};
pub use schema::{BaseRole, FieldType, PlatformRole, Visibility};

/// A string did not name any variant of a model enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
