use serde::{Deserialize, Serialize};
use tabula_model::{BaseRole, PlatformRole, Visibility};
use tabula_types::{BaseId, UserId};

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub platform_role: PlatformRole,
    pub can_create_bases: bool,
}

impl Actor {
    pub fn is_sysadmin(&self) -> bool {
        self.platform_role == PlatformRole::Sysadmin
    }
}

/// Everything the engine needs to decide a base-scoped action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionContext {
    pub actor: Actor,
    pub base_id: BaseId,
    pub base_visibility: Visibility,
    pub is_owner: bool,
    /// The actor's membership row for this base, if any.
    pub membership_role: Option<BaseRole>,
}

/// Input to [`can`](crate::can).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationRequest {
    BaseScoped(PermissionContext),
    PlatformScoped(Actor),
}

impl AuthorizationRequest {
    pub fn actor(&self) -> &Actor {
        match self {
            Self::BaseScoped(ctx) => &ctx.actor,
            Self::PlatformScoped(actor) => actor,
        }
    }
}

impl From<PermissionContext> for AuthorizationRequest {
    fn from(ctx: PermissionContext) -> Self {
        Self::BaseScoped(ctx)
    }
}
