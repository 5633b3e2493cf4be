use super::workspaces::owned_workspace;
use super::{Platform, authorize, locate, require_actor};
use crate::error::{DomainError, DomainResult};
use crate::lifecycle::{self, EntityRef, PurgeReport, Restored};
use rusqlite::Connection;
use tabula_access::{Action, Actor, resolve_permission_context};
use tabula_model::{AuditAction, AuditEvent, EntityKind};
use tabula_store::trash::{self as trash_rows, EntityLocation, TrashEntry, TrashScope};
use tabula_store::comments;
use tabula_types::{CommentId, WorkspaceId};

use crate::access::StoreLookup;

fn comment_author_is(conn: &Connection, id: i64, actor: &Actor) -> DomainResult<bool> {
    Ok(comments::get(conn, CommentId::new(id))?.is_some_and(|c| c.author_id == actor.user_id))
}

/// Who may move an entity into the trash.
fn authorize_soft_delete(
    conn: &Connection,
    actor: Option<&Actor>,
    kind: EntityKind,
    id: i64,
    loc: &EntityLocation,
) -> DomainResult<Actor> {
    let base = || loc.base_id.ok_or_else(DomainError::internal);
    let action = match kind {
        EntityKind::Workspace => {
            let actor = require_actor(actor)?;
            owned_workspace(conn, actor, WorkspaceId::new(id))?;
            return Ok(*actor);
        }
        EntityKind::Comment => {
            let ctx = resolve_permission_context(&StoreLookup(conn), actor, base()?)?;
            if ctx.is_owner || ctx.actor.is_sysadmin() || comment_author_is(conn, id, &ctx.actor)? {
                return Ok(ctx.actor);
            }
            return Err(DomainError::forbidden("only the author or the base owner can delete a comment"));
        }
        EntityKind::Base => Action::BaseDelete,
        EntityKind::Table | EntityKind::Field | EntityKind::SelectOption => Action::SchemaManage,
        EntityKind::Record => Action::RecordsDelete,
    };
    Ok(authorize(conn, actor, base()?, action)?.actor)
}

/// Who may restore or permanently delete: the owner (base owner, or
/// workspace owner for workspaces), a comment's author, or a SYSADMIN.
fn authorize_trash_owner(
    conn: &Connection,
    actor: Option<&Actor>,
    kind: EntityKind,
    id: i64,
    loc: &EntityLocation,
) -> DomainResult<Actor> {
    let actor = require_actor(actor)?;
    if actor.is_sysadmin() || loc.owner_id == actor.user_id {
        return Ok(*actor);
    }
    if kind == EntityKind::Comment && comment_author_is(conn, id, actor)? {
        return Ok(*actor);
    }
    Err(DomainError::forbidden(format!("only the owner can do this to a trashed {kind}")))
}

/// Resolves the scope of a bulk trash operation and checks the actor owns it.
fn authorize_scope(
    conn: &Connection,
    actor: Option<&Actor>,
    kind: EntityKind,
    scope: TrashScope,
) -> DomainResult<(Actor, Option<EntityLocation>)> {
    let actor = require_actor(actor)?;
    match scope {
        TrashScope::Owner(owner) => {
            if owner != actor.user_id && !actor.is_sysadmin() {
                return Err(DomainError::forbidden("not your trash"));
            }
            Ok((*actor, None))
        }
        TrashScope::Parent(parent) => {
            let parent_kind = kind.parent().ok_or_else(|| {
                DomainError::bad_request(format!("{kind} trash can only be scoped by owner"))
            })?;
            let loc = locate(conn, parent_kind, parent)?;
            if loc.owner_id != actor.user_id && !actor.is_sysadmin() {
                return Err(DomainError::forbidden("not your trash"));
            }
            Ok((*actor, Some(loc)))
        }
    }
}

fn scoped_event(event: AuditEvent, loc: &EntityLocation) -> AuditEvent {
    let mut event = event;
    if let Some(base) = loc.base_id {
        event = event.in_base(base);
    }
    if let Some(table) = loc.table_id {
        event = event.in_table(table);
    }
    if let Some(field) = loc.field_id {
        event = event.on_field(field);
    }
    if let Some(record) = loc.record_id {
        event = event.on_record(record);
    }
    event
}

impl Platform {
    /// Moves an entity to the trash, cascading per [`EntityKind::cascade_children`].
    pub fn soft_delete(
        &self,
        actor: Option<&Actor>,
        kind: EntityKind,
        id: i64,
    ) -> DomainResult<Vec<EntityRef>> {
        let now = self.now();
        let (who, loc, trashed) = self.store.transaction(|tx| -> DomainResult<_> {
            let loc = locate(tx, kind, id)?;
            let who = authorize_soft_delete(tx, actor, kind, id, &loc)?;
            let trashed = lifecycle::soft_delete(tx, kind, id, now)?;
            Ok((who, loc, trashed))
        })?;
        if !trashed.is_empty() {
            self.emit(scoped_event(
                AuditEvent::new(AuditAction::Trashed, format!("{kind} {id} moved to trash"), now)
                    .by(who.user_id)
                    .with_details(serde_json::json!({ "kind": kind, "id": id, "cascade": trashed })),
                &loc,
            ));
        }
        Ok(trashed)
    }

    /// Restores an entity and its trashed descendants, renaming on conflict.
    pub fn restore(&self, actor: Option<&Actor>, kind: EntityKind, id: i64) -> DomainResult<Restored> {
        let now = self.now();
        let config = &self.config.trash;
        let (who, loc, restored) = self.store.transaction(|tx| -> DomainResult<_> {
            let loc = locate(tx, kind, id)?;
            let who = authorize_trash_owner(tx, actor, kind, id, &loc)?;
            let restored = lifecycle::restore(tx, kind, id, now, config)?;
            Ok((who, loc, restored))
        })?;
        self.emit(scoped_event(
            AuditEvent::new(AuditAction::Restored, format!("{kind} {id} restored"), now)
                .by(who.user_id)
                .with_details(serde_json::json!({
                    "kind": kind,
                    "id": id,
                    "restored": restored.restored,
                    "renamed": restored.renamed,
                })),
            &loc,
        ));
        Ok(restored)
    }

    /// Hard-deletes a trashed entity and, through the store, its descendants.
    pub fn delete_permanently(&self, actor: Option<&Actor>, kind: EntityKind, id: i64) -> DomainResult<()> {
        let now = self.now();
        let (who, loc) = self.store.transaction(|tx| -> DomainResult<_> {
            let loc = locate(tx, kind, id)?;
            let who = authorize_trash_owner(tx, actor, kind, id, &loc)?;
            lifecycle::delete_permanently(tx, kind, id)?;
            Ok((who, loc))
        })?;
        // The entity itself is gone; only reference surviving ancestors.
        let surviving = EntityLocation {
            base_id: loc.base_id.filter(|_| kind != EntityKind::Base),
            table_id: loc.table_id.filter(|_| kind != EntityKind::Table),
            field_id: loc.field_id.filter(|_| kind != EntityKind::Field),
            record_id: loc.record_id.filter(|_| kind != EntityKind::Record),
            ..loc
        };
        self.emit(scoped_event(
            AuditEvent::new(AuditAction::DeletedPermanently, format!("{kind} {id} deleted permanently"), now)
                .by(who.user_id)
                .with_details(serde_json::json!({ "kind": kind, "id": id })),
            &surviving,
        ));
        Ok(())
    }

    /// Trashed rows of one kind within an owner or parent scope, newest first.
    pub fn list_trash(
        &self,
        actor: Option<&Actor>,
        kind: EntityKind,
        scope: TrashScope,
    ) -> DomainResult<Vec<TrashEntry>> {
        self.store.read(|conn| {
            authorize_scope(conn, actor, kind, scope)?;
            Ok(trash_rows::list_trashed(conn, kind, scope)?)
        })
    }

    /// Hard-deletes every trashed row of `kind` in `scope`. Returns the count.
    pub fn empty_trash(&self, actor: Option<&Actor>, kind: EntityKind, scope: TrashScope) -> DomainResult<usize> {
        let now = self.now();
        let (who, loc, removed) = self.store.transaction(|tx| -> DomainResult<_> {
            let (who, loc) = authorize_scope(tx, actor, kind, scope)?;
            let removed = lifecycle::empty_trash(tx, kind, scope)?;
            Ok((who, loc, removed))
        })?;
        let mut event = AuditEvent::new(AuditAction::TrashEmptied, format!("{removed} {kind} rows removed from trash"), now)
            .by(who.user_id)
            .with_details(serde_json::json!({ "kind": kind, "removed": removed }));
        if let Some(loc) = &loc {
            event = scoped_event(event, loc);
        }
        self.emit(event);
        Ok(removed)
    }

    /// Operator purge of one kind; no actor, run by the scheduler.
    pub fn purge_older_than(&self, kind: EntityKind, days: u32) -> DomainResult<usize> {
        let now = self.now();
        self.store
            .transaction(|tx| lifecycle::purge_older_than(tx, kind, days, now))
    }

    /// Operator purge of every kind, descendants first.
    pub fn purge_all_older_than(&self, days: u32) -> DomainResult<PurgeReport> {
        let now = self.now();
        self.store
            .transaction(|tx| lifecycle::purge_all_older_than(tx, days, now))
    }
}
