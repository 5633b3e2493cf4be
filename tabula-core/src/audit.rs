//! Audit sinks.
//!
//! The platform hands each [`AuditEvent`] to a sink after the mutation has
//! committed. Sinks may fail; the platform logs and moves on.

use crate::error::DomainResult;
use tabula_model::AuditEvent;
use tabula_store::Store;
use tracing::info;

pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent) -> DomainResult<()>;
}

/// Persists events into the store's `audit_events` table.
pub struct StoreAuditLog {
    store: Store,
}

impl StoreAuditLog {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

impl AuditSink for StoreAuditLog {
    fn record(&self, event: &AuditEvent) -> DomainResult<()> {
        self.store
            .transaction(|tx| tabula_store::audit::insert(tx, event))
            .map_err(Into::into)
    }
}

/// Emits events as `tracing` records under the `audit` target.
pub struct TracingAuditLog;

impl AuditSink for TracingAuditLog {
    fn record(&self, event: &AuditEvent) -> DomainResult<()> {
        info!(
            target: "audit",
            action = %event.action,
            user = ?event.user_id.map(|u| u.get()),
            base = ?event.base_id.map(|b| b.get()),
            "{}",
            event.summary
        );
        Ok(())
    }
}

/// Discards everything.
pub struct NullAuditLog;

impl AuditSink for NullAuditLog {
    fn record(&self, _event: &AuditEvent) -> DomainResult<()> {
        Ok(())
    }
}
