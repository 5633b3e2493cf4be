//! Builds [`PermissionContext`]s from stored ownership and membership.

use crate::context::{Actor, AuthorizationRequest, PermissionContext};
use crate::error::AccessError;
use tabula_model::{BaseRole, Visibility};
use tabula_types::{BaseId, UserId};
use tracing::debug;

/// The parts of a base that authorization depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseAccess {
    pub owner_id: UserId,
    pub visibility: Visibility,
}

/// Read access to bases and memberships, implemented by the storage layer.
pub trait BaseLookup {
    type Error: std::fmt::Display;

    /// Returns `None` when the base does not exist.
    fn base_access(&self, base_id: BaseId) -> Result<Option<BaseAccess>, Self::Error>;

    fn membership_role(
        &self,
        base_id: BaseId,
        user_id: UserId,
    ) -> Result<Option<BaseRole>, Self::Error>;
}

/// Resolves the context for a base-scoped decision.
pub fn resolve_permission_context<L: BaseLookup + ?Sized>(
    lookup: &L,
    actor: Option<&Actor>,
    base_id: BaseId,
) -> Result<PermissionContext, AccessError> {
    let actor = actor.ok_or(AccessError::NotAuthenticated)?;
    let access = lookup
        .base_access(base_id)
        .map_err(|e| AccessError::Lookup(e.to_string()))?
        .ok_or(AccessError::NotFound)?;

    let is_owner = access.owner_id == actor.user_id;
    // Owners never carry a membership row; skip the lookup.
    let membership_role = if is_owner {
        None
    } else {
        lookup
            .membership_role(base_id, actor.user_id)
            .map_err(|e| AccessError::Lookup(e.to_string()))?
    };

    debug!(
        user = %actor.user_id,
        base = %base_id,
        is_owner,
        role = ?membership_role,
        "resolved permission context"
    );

    Ok(PermissionContext {
        actor: *actor,
        base_id,
        base_visibility: access.visibility,
        is_owner,
        membership_role,
    })
}

/// Resolves a platform-scoped request. Needs no lookup.
pub fn resolve_global(actor: Option<&Actor>) -> Result<AuthorizationRequest, AccessError> {
    let actor = actor.ok_or(AccessError::NotAuthenticated)?;
    Ok(AuthorizationRequest::PlatformScoped(*actor))
}
