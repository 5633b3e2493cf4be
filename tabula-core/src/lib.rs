//! Domain core for Tabula.
//!
//! Bases hold tables; tables hold typed fields and records. Everything
//! below a workspace can be moved to the trash and brought back.
//!
//! # Layers
//!
//! - [`lifecycle`]: the trash state machine, generic over
//!   [`EntityKind`](tabula_model::EntityKind), with rename-on-restore and
//!   dense position renumbering
//! - [`schema`] and [`cells`]: field definitions, type changes and typed
//!   cell writes
//! - [`Platform`]: authorization-gated operations over one [`Store`](tabula_store::Store),
//!   with best-effort audit logging after commit
//!
//! All failures are [`DomainError`]s; [`ErrorKind::status_code`] is the
//! only mapping to transport status codes.

mod access;
pub mod audit;
pub mod cells;
pub mod config;
mod error;
pub mod lifecycle;
mod platform;
pub mod schema;

pub use access::StoreLookup;
pub use audit::{AuditSink, NullAuditLog, StoreAuditLog, TracingAuditLog};
pub use config::PlatformConfig;
pub use error::{DomainError, DomainResult, ErrorKind};
pub use lifecycle::{EntityRef, PurgeReport, Restored};
pub use platform::{Platform, RecordView};
pub use schema::OptionInput;

pub use tabula_access::{Action, Actor};
pub use tabula_model::EntityKind;
pub use tabula_store::trash::{TrashEntry, TrashScope};
