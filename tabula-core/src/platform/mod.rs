//! The authorization-gated entry point to every domain operation.
//!
//! Each operation follows the same shape: open one transaction, resolve the
//! caller's [`PermissionContext`] for the target base, gate the action with
//! [`can`], run the mutation, commit, and only then hand the audit event to
//! the [`AuditSink`]. An audit failure is logged and never fails the call.

mod audit;
mod bases;
mod fields;
mod records;
mod tables;
mod trash;
mod users;
mod workspaces;

pub use records::RecordView;

use crate::audit::{AuditSink, NullAuditLog, StoreAuditLog};
use crate::config::PlatformConfig;
use crate::error::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::sync::Arc;
use tabula_access::{
    Action, Actor, AuthorizationRequest, PermissionContext, can, resolve_global,
    resolve_permission_context,
};
use tabula_model::{AuditEvent, EntityKind};
use tabula_store::Store;
use tabula_store::trash::{self as trash_rows, EntityLocation};
use tabula_types::{BaseId, Clock, SystemClock};
use tracing::{debug, warn};

use crate::access::StoreLookup;

pub struct Platform {
    store: Store,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditSink>,
    config: PlatformConfig,
}

impl Platform {
    /// Wraps an open store. Audit events go to the store unless disabled in
    /// `config`.
    pub fn new(store: Store, config: PlatformConfig) -> Self {
        let audit: Arc<dyn AuditSink> = if config.audit.enabled {
            Arc::new(StoreAuditLog::new(store.clone()))
        } else {
            Arc::new(NullAuditLog)
        };
        Self {
            store,
            clock: Arc::new(SystemClock),
            audit,
            config,
        }
    }

    /// Opens the database named in `config`.
    pub fn open(config: PlatformConfig) -> DomainResult<Self> {
        let store = if config.database.is_in_memory() {
            Store::open_in_memory()?
        } else {
            Store::open_with(&config.database.path, &config.database.store_options())?
        };
        Ok(Self::new(store, config))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn emit(&self, event: AuditEvent) {
        if let Err(e) = self.audit.record(&event) {
            warn!("audit event {} dropped: {}", event.action, e);
        }
    }
}

pub(crate) fn require_actor(actor: Option<&Actor>) -> DomainResult<&Actor> {
    actor.ok_or_else(DomainError::not_authenticated)
}

fn denied(action: Action) -> DomainError {
    DomainError::forbidden(format!("not allowed: {action}"))
}

/// Resolves the caller's context on `base` and gates `action`.
pub(crate) fn authorize(
    conn: &Connection,
    actor: Option<&Actor>,
    base: BaseId,
    action: Action,
) -> DomainResult<PermissionContext> {
    let ctx = resolve_permission_context(&StoreLookup(conn), actor, base)?;
    if !can(&AuthorizationRequest::from(ctx), action) {
        debug!(user = %ctx.actor.user_id, base = %base, %action, "denied");
        return Err(denied(action));
    }
    Ok(ctx)
}

/// Gates a platform-scoped action.
pub(crate) fn authorize_platform(actor: Option<&Actor>, action: Action) -> DomainResult<Actor> {
    let request = resolve_global(actor)?;
    if !can(&request, action) {
        return Err(denied(action));
    }
    Ok(*request.actor())
}

/// Finds where an entity lives; `NotFound` if it does not exist.
pub(crate) fn locate(conn: &Connection, kind: EntityKind, id: i64) -> DomainResult<EntityLocation> {
    trash_rows::locate(conn, kind, id)?.ok_or_else(|| DomainError::not_found(kind.as_str()))
}

/// The base an entity belongs to. Workspaces have none.
pub(crate) fn base_of(conn: &Connection, kind: EntityKind, id: i64) -> DomainResult<BaseId> {
    locate(conn, kind, id)?
        .base_id
        .ok_or_else(|| DomainError::bad_request(format!("{kind} does not belong to a base")))
}

/// Reads treat trashed entities as absent.
pub(crate) fn ensure_visible(conn: &Connection, kind: EntityKind, id: i64) -> DomainResult<()> {
    if trash_rows::is_active_chain(conn, kind, id)? {
        Ok(())
    } else {
        Err(DomainError::not_found(kind.as_str()))
    }
}
