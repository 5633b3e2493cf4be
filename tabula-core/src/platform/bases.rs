use super::workspaces::owned_workspace;
use super::{Platform, authorize, authorize_platform, ensure_visible};
use crate::error::{DomainError, DomainResult};
use crate::lifecycle::ensure_active;
use crate::schema::required_name;
use tabula_access::{Action, Actor};
use tabula_model::{AuditAction, AuditEvent, Base, BaseMember, BaseRole, EntityKind, Visibility};
use tabula_store::{bases, members, trash, users};
use tabula_types::{BaseId, UserId, WorkspaceId};

impl Platform {
    /// Creates a base in one of the actor's workspaces. The actor owns it.
    pub fn create_base(
        &self,
        actor: Option<&Actor>,
        workspace: WorkspaceId,
        name: &str,
        visibility: Visibility,
    ) -> DomainResult<Base> {
        let actor = authorize_platform(actor, Action::BasesCreate)?;
        let name = required_name("base", name)?;
        let now = self.now();
        let base = self.store.transaction(|tx| -> DomainResult<_> {
            owned_workspace(tx, &actor, workspace)?;
            ensure_active(tx, EntityKind::Workspace, workspace.get())?;
            Ok(bases::insert(tx, actor.user_id, workspace, &name, visibility, now)?)
        })?;
        self.emit(
            AuditEvent::new(AuditAction::BaseCreated, format!("base {:?} created", base.name), now)
                .by(actor.user_id)
                .in_base(base.id)
                .with_details(serde_json::json!({ "workspace_id": workspace, "visibility": visibility })),
        );
        Ok(base)
    }

    pub fn get_base(&self, actor: Option<&Actor>, id: BaseId) -> DomainResult<Base> {
        self.store.read(|conn| {
            authorize(conn, actor, id, Action::BaseView)?;
            ensure_visible(conn, EntityKind::Base, id.get())?;
            bases::get(conn, id)?.ok_or_else(|| DomainError::not_found("base"))
        })
    }

    /// Active bases of a workspace the actor owns.
    pub fn list_bases(&self, actor: Option<&Actor>, workspace: WorkspaceId) -> DomainResult<Vec<Base>> {
        let actor = super::require_actor(actor)?;
        self.store.read(|conn| {
            owned_workspace(conn, actor, workspace)?;
            ensure_visible(conn, EntityKind::Workspace, workspace.get())?;
            Ok(bases::list_in_workspace(conn, workspace, false)?)
        })
    }

    /// Renames a base. The trash check is part of the `UPDATE` itself.
    pub fn rename_base(&self, actor: Option<&Actor>, id: BaseId, name: &str) -> DomainResult<Base> {
        let name = required_name("base", name)?;
        let now = self.now();
        let (ctx, before, after) = self.store.transaction(|tx| -> DomainResult<_> {
            let ctx = authorize(tx, actor, id, Action::SchemaManage)?;
            let base = bases::get(tx, id)?.ok_or_else(|| DomainError::not_found("base"))?;
            if !trash::rename_if_active(tx, EntityKind::Base, id.get(), &name, now)? {
                return Err(DomainError::in_trash("base"));
            }
            Ok((ctx, base.name.clone(), Base { name: name.clone(), ..base }))
        })?;
        self.emit(
            AuditEvent::new(AuditAction::BaseRenamed, format!("base {before:?} renamed to {name:?}"), now)
                .by(ctx.actor.user_id)
                .in_base(id)
                .with_details(serde_json::json!({ "from": before, "to": name })),
        );
        Ok(after)
    }

    pub fn set_base_visibility(
        &self,
        actor: Option<&Actor>,
        id: BaseId,
        visibility: Visibility,
    ) -> DomainResult<Base> {
        let now = self.now();
        let (ctx, base) = self.store.transaction(|tx| -> DomainResult<_> {
            let ctx = authorize(tx, actor, id, Action::BaseVisibility)?;
            let base = bases::get(tx, id)?.ok_or_else(|| DomainError::not_found("base"))?;
            if !bases::set_visibility_if_active(tx, id, visibility, now)? {
                return Err(DomainError::in_trash("base"));
            }
            Ok((ctx, Base { visibility, ..base }))
        })?;
        self.emit(
            AuditEvent::new(AuditAction::BaseVisibilityChanged, format!("base visibility set to {visibility}"), now)
                .by(ctx.actor.user_id)
                .in_base(id)
                .with_details(serde_json::json!({ "visibility": visibility })),
        );
        Ok(base)
    }

    // ── members ──────────────────────────────────────────────

    pub fn add_member(
        &self,
        actor: Option<&Actor>,
        base: BaseId,
        user: UserId,
        role: BaseRole,
    ) -> DomainResult<BaseMember> {
        let now = self.now();
        let (ctx, member) = self.store.transaction(|tx| -> DomainResult<_> {
            let ctx = authorize(tx, actor, base, Action::MembersManage)?;
            ensure_active(tx, EntityKind::Base, base.get())?;
            let owner = bases::get(tx, base)?
                .ok_or_else(|| DomainError::not_found("base"))?
                .owner_id;
            if owner == user {
                return Err(DomainError::bad_request("the base owner cannot be added as a member"));
            }
            if users::get(tx, user)?.is_none() {
                return Err(DomainError::not_found("user"));
            }
            let member = members::insert(tx, base, user, role, now).map_err(|e| {
                if e.is_unique_violation() {
                    DomainError::conflict("user is already a member of this base")
                } else {
                    e.into()
                }
            })?;
            Ok((ctx, member))
        })?;
        self.emit(
            AuditEvent::new(AuditAction::MemberAdded, format!("user {user} added as {role}"), now)
                .by(ctx.actor.user_id)
                .in_base(base)
                .with_details(serde_json::json!({ "user_id": user, "role": role })),
        );
        Ok(member)
    }

    pub fn update_member_role(
        &self,
        actor: Option<&Actor>,
        base: BaseId,
        user: UserId,
        role: BaseRole,
    ) -> DomainResult<()> {
        let now = self.now();
        let ctx = self.store.transaction(|tx| -> DomainResult<_> {
            let ctx = authorize(tx, actor, base, Action::MembersManage)?;
            ensure_active(tx, EntityKind::Base, base.get())?;
            if !members::update_role(tx, base, user, role)? {
                return Err(DomainError::not_found("member"));
            }
            Ok(ctx)
        })?;
        self.emit(
            AuditEvent::new(AuditAction::MemberRoleChanged, format!("user {user} is now {role}"), now)
                .by(ctx.actor.user_id)
                .in_base(base)
                .with_details(serde_json::json!({ "user_id": user, "role": role })),
        );
        Ok(())
    }

    pub fn remove_member(&self, actor: Option<&Actor>, base: BaseId, user: UserId) -> DomainResult<()> {
        let now = self.now();
        let ctx = self.store.transaction(|tx| -> DomainResult<_> {
            let ctx = authorize(tx, actor, base, Action::MembersManage)?;
            ensure_active(tx, EntityKind::Base, base.get())?;
            if !members::delete(tx, base, user)? {
                return Err(DomainError::not_found("member"));
            }
            Ok(ctx)
        })?;
        self.emit(
            AuditEvent::new(AuditAction::MemberRemoved, format!("user {user} removed"), now)
                .by(ctx.actor.user_id)
                .in_base(base)
                .with_details(serde_json::json!({ "user_id": user })),
        );
        Ok(())
    }

    pub fn list_members(&self, actor: Option<&Actor>, base: BaseId) -> DomainResult<Vec<BaseMember>> {
        self.store.read(|conn| {
            authorize(conn, actor, base, Action::BaseView)?;
            ensure_visible(conn, EntityKind::Base, base.get())?;
            Ok(members::list(conn, base)?)
        })
    }
}
