//! The authorization decision table.
//!
//! Evaluated strictly in this order:
//! 1. SYSADMIN is allowed everything.
//! 2. `bases:create` follows the actor's `can_create_bases` flag.
//! 3. `platform:users:manage` is denied (only step 1 grants it).
//! 4. Owners get the administrative base actions.
//! 5. `base:view` is open on public bases, otherwise owner or member only.
//! 6. Everything else needs an effective role of sufficient rank.

use crate::action::Action;
use crate::context::{AuthorizationRequest, PermissionContext};
use tabula_model::{BaseRole, Visibility};

/// Derives the role an actor effectively holds on a base.
///
/// SYSADMIN and the owner are capped at `Editor`, the highest base role.
/// Without a membership row, public bases grant `Viewer` and private ones
/// grant nothing.
pub fn resolve_effective_base_role(ctx: &PermissionContext) -> Option<BaseRole> {
    if ctx.actor.is_sysadmin() || ctx.is_owner {
        return Some(BaseRole::Editor);
    }
    if let Some(role) = ctx.membership_role {
        return Some(role);
    }
    match ctx.base_visibility {
        Visibility::Public => Some(BaseRole::Viewer),
        Visibility::Private => None,
    }
}

/// Decides whether `action` is allowed.
pub fn can(request: &AuthorizationRequest, action: Action) -> bool {
    let actor = request.actor();
    if actor.is_sysadmin() {
        return true;
    }

    match action {
        Action::BasesCreate => return actor.can_create_bases,
        Action::PlatformUsersManage => return false,
        _ => {}
    }

    let ctx = match request {
        AuthorizationRequest::BaseScoped(ctx) => ctx,
        // Base actions need a base.
        AuthorizationRequest::PlatformScoped(_) => return false,
    };

    if ctx.is_owner && action.is_owner_administrative() {
        return true;
    }

    if action == Action::BaseView {
        return ctx.base_visibility == Visibility::Public
            || ctx.is_owner
            || ctx.membership_role.is_some();
    }

    let Some(role) = resolve_effective_base_role(ctx) else {
        return false;
    };

    match action {
        Action::RecordsRead => role.is_at_least(BaseRole::Viewer),
        Action::CommentsCreate => role.is_at_least(BaseRole::Commenter),
        Action::RecordsCreate | Action::RecordsUpdate | Action::RecordsDelete => {
            role.is_at_least(BaseRole::Editor)
        }
        Action::SchemaManage
        | Action::MembersManage
        | Action::BaseDelete
        | Action::BaseVisibility => false,
        Action::BasesCreate | Action::PlatformUsersManage | Action::BaseView => false,
    }
}

/// Like [`can`], but takes the wire name. Unrecognized names are denied.
pub fn can_named(request: &AuthorizationRequest, action: &str) -> bool {
    Action::parse(action).is_some_and(|a| can(request, a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Actor;
    use tabula_model::PlatformRole;
    use tabula_types::{BaseId, UserId};

    fn ctx(visibility: Visibility, is_owner: bool, role: Option<BaseRole>) -> PermissionContext {
        PermissionContext {
            actor: Actor {
                user_id: UserId::new(7),
                platform_role: PlatformRole::User,
                can_create_bases: false,
            },
            base_id: BaseId::new(1),
            base_visibility: visibility,
            is_owner,
            membership_role: role,
        }
    }

    #[test]
    fn effective_role_prefers_owner_over_membership() {
        let c = ctx(Visibility::Private, true, Some(BaseRole::Viewer));
        assert_eq!(resolve_effective_base_role(&c), Some(BaseRole::Editor));
    }

    #[test]
    fn effective_role_membership_beats_public_default() {
        let c = ctx(Visibility::Public, false, Some(BaseRole::Commenter));
        assert_eq!(resolve_effective_base_role(&c), Some(BaseRole::Commenter));
    }

    #[test]
    fn effective_role_public_viewer_private_none() {
        assert_eq!(
            resolve_effective_base_role(&ctx(Visibility::Public, false, None)),
            Some(BaseRole::Viewer)
        );
        assert_eq!(resolve_effective_base_role(&ctx(Visibility::Private, false, None)), None);
    }

    #[test]
    fn sysadmin_effective_role_is_editor() {
        let mut c = ctx(Visibility::Private, false, None);
        c.actor.platform_role = PlatformRole::Sysadmin;
        assert_eq!(resolve_effective_base_role(&c), Some(BaseRole::Editor));
    }

    #[test]
    fn editor_member_cannot_manage_schema() {
        let req = AuthorizationRequest::BaseScoped(ctx(
            Visibility::Private,
            false,
            Some(BaseRole::Editor),
        ));
        assert!(can(&req, Action::RecordsDelete));
        assert!(!can(&req, Action::SchemaManage));
        assert!(!can(&req, Action::MembersManage));
        assert!(!can(&req, Action::BaseDelete));
        assert!(!can(&req, Action::BaseVisibility));
    }

    #[test]
    fn can_named_denies_unknown() {
        let req = AuthorizationRequest::BaseScoped(ctx(Visibility::Public, true, None));
        assert!(can_named(&req, "records:read"));
        assert!(!can_named(&req, "records:archive"));
    }
}
