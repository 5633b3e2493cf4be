use super::{Platform, require_actor};
use crate::error::{DomainError, DomainResult};
use crate::lifecycle::ensure_active;
use crate::schema::required_name;
use rusqlite::Connection;
use tabula_access::Actor;
use tabula_model::{AuditAction, AuditEvent, EntityKind, Workspace};
use tabula_store::{trash, workspaces};
use tabula_types::WorkspaceId;

/// Loads a workspace the actor may manage: its owner, or a SYSADMIN.
pub(crate) fn owned_workspace(
    conn: &Connection,
    actor: &Actor,
    id: WorkspaceId,
) -> DomainResult<Workspace> {
    let ws = workspaces::get(conn, id)?.ok_or_else(|| DomainError::not_found("workspace"))?;
    if ws.owner_id != actor.user_id && !actor.is_sysadmin() {
        return Err(DomainError::forbidden("not the owner of this workspace"));
    }
    Ok(ws)
}

impl Platform {
    pub fn create_workspace(&self, actor: Option<&Actor>, name: &str) -> DomainResult<Workspace> {
        let actor = require_actor(actor)?;
        let name = required_name("workspace", name)?;
        let now = self.now();
        let ws = self
            .store
            .transaction(|tx| -> DomainResult<_> { Ok(workspaces::insert(tx, actor.user_id, &name, now)?) })?;
        self.emit(
            AuditEvent::new(AuditAction::WorkspaceCreated, format!("workspace {:?} created", ws.name), now)
                .by(actor.user_id)
                .with_details(serde_json::json!({ "workspace_id": ws.id })),
        );
        Ok(ws)
    }

    pub fn rename_workspace(
        &self,
        actor: Option<&Actor>,
        id: WorkspaceId,
        name: &str,
    ) -> DomainResult<Workspace> {
        let actor = require_actor(actor)?;
        let name = required_name("workspace", name)?;
        let now = self.now();
        let (before, after) = self.store.transaction(|tx| -> DomainResult<_> {
            let ws = owned_workspace(tx, actor, id)?;
            if !trash::rename_if_active(tx, EntityKind::Workspace, id.get(), &name, now)? {
                return Err(DomainError::in_trash("workspace"));
            }
            Ok((ws.name.clone(), Workspace { name: name.clone(), ..ws }))
        })?;
        self.emit(
            AuditEvent::new(AuditAction::WorkspaceRenamed, format!("workspace {before:?} renamed to {name:?}"), now)
                .by(actor.user_id)
                .with_details(serde_json::json!({ "workspace_id": id, "from": before, "to": name })),
        );
        Ok(after)
    }

    pub fn get_workspace(&self, actor: Option<&Actor>, id: WorkspaceId) -> DomainResult<Workspace> {
        let actor = require_actor(actor)?;
        self.store.read(|conn| {
            let ws = owned_workspace(conn, actor, id)?;
            ensure_active(conn, EntityKind::Workspace, id.get())
                .map_err(|_| DomainError::not_found("workspace"))?;
            Ok(ws)
        })
    }

    /// The actor's active workspaces.
    pub fn list_workspaces(&self, actor: Option<&Actor>) -> DomainResult<Vec<Workspace>> {
        let actor = require_actor(actor)?;
        Ok(self
            .store
            .read(|conn| workspaces::list_by_owner(conn, actor.user_id, false))?)
    }

    /// The actor's trashed workspaces.
    pub fn list_trashed_workspaces(&self, actor: Option<&Actor>) -> DomainResult<Vec<Workspace>> {
        let actor = require_actor(actor)?;
        Ok(self
            .store
            .read(|conn| workspaces::list_by_owner(conn, actor.user_id, true))?)
    }
}
