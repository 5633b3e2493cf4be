use super::Platform;
use crate::access::StoreLookup;
use crate::error::{DomainError, DomainResult};
use tabula_access::{Actor, resolve_permission_context};
use tabula_model::AuditEventView;
use tabula_store::audit;
use tabula_types::BaseId;

/// Upper bound on one page of audit events.
pub const MAX_AUDIT_PAGE: usize = 500;

impl Platform {
    /// Audit events of a base, newest first. Base owner or SYSADMIN only.
    pub fn list_audit_events(
        &self,
        actor: Option<&Actor>,
        base: BaseId,
        limit: usize,
        offset: usize,
    ) -> DomainResult<Vec<AuditEventView>> {
        self.store.read(|conn| {
            let ctx = resolve_permission_context(&StoreLookup(conn), actor, base)?;
            if !ctx.is_owner && !ctx.actor.is_sysadmin() {
                return Err(DomainError::forbidden("only the base owner can read the audit log"));
            }
            let events = audit::list_for_base(conn, base, limit.min(MAX_AUDIT_PAGE), offset)?;
            Ok(events.into_iter().map(AuditEventView::from).collect())
        })
    }
}
