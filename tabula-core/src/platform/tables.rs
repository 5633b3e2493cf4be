use super::{Platform, authorize, base_of, ensure_visible};
use crate::error::{DomainError, DomainResult};
use crate::lifecycle::ensure_active;
use crate::schema::required_name;
use rusqlite::Connection;
use std::collections::HashSet;
use tabula_access::{Action, Actor};
use tabula_model::{AuditAction, AuditEvent, EntityKind, TableDef};
use tabula_store::{tables, trash};
use tabula_types::{BaseId, TableId};

/// Checks that `ordered` is exactly the current set of active siblings.
pub(crate) fn check_complete_order(
    conn: &Connection,
    kind: EntityKind,
    parent: i64,
    ordered: &[i64],
) -> DomainResult<()> {
    let active: HashSet<i64> = trash::active_siblings(conn, kind, parent)?.into_iter().collect();
    let given: HashSet<i64> = ordered.iter().copied().collect();
    if given.len() != ordered.len() {
        return Err(DomainError::bad_request(format!("duplicate {kind} ids in order")));
    }
    if given != active {
        return Err(DomainError::bad_request(format!(
            "order must list every active {kind} exactly once"
        )));
    }
    Ok(())
}

impl Platform {
    /// Creates a table after the last active one.
    pub fn create_table(&self, actor: Option<&Actor>, base: BaseId, name: &str) -> DomainResult<TableDef> {
        let name = required_name("table", name)?;
        let now = self.now();
        let (ctx, table) = self.store.transaction(|tx| -> DomainResult<_> {
            let ctx = authorize(tx, actor, base, Action::SchemaManage)?;
            ensure_active(tx, EntityKind::Base, base.get())?;
            let position = trash::next_position(tx, EntityKind::Table, base.get())?;
            Ok((ctx, tables::insert(tx, base, &name, position, now)?))
        })?;
        self.emit(
            AuditEvent::new(AuditAction::TableCreated, format!("table {:?} created", table.name), now)
                .by(ctx.actor.user_id)
                .in_base(base)
                .in_table(table.id)
                .with_details(serde_json::json!({ "position": table.position })),
        );
        Ok(table)
    }

    pub fn get_table(&self, actor: Option<&Actor>, id: TableId) -> DomainResult<TableDef> {
        self.store.read(|conn| {
            let base = base_of(conn, EntityKind::Table, id.get())?;
            authorize(conn, actor, base, Action::RecordsRead)?;
            ensure_visible(conn, EntityKind::Table, id.get())?;
            tables::get(conn, id)?.ok_or_else(|| DomainError::not_found("table"))
        })
    }

    pub fn rename_table(&self, actor: Option<&Actor>, id: TableId, name: &str) -> DomainResult<TableDef> {
        let name = required_name("table", name)?;
        let now = self.now();
        let (ctx, before, after) = self.store.transaction(|tx| -> DomainResult<_> {
            let base = base_of(tx, EntityKind::Table, id.get())?;
            let ctx = authorize(tx, actor, base, Action::SchemaManage)?;
            let table = tables::get(tx, id)?.ok_or_else(|| DomainError::not_found("table"))?;
            if !trash::rename_if_active(tx, EntityKind::Table, id.get(), &name, now)? {
                return Err(DomainError::in_trash("table"));
            }
            Ok((ctx, table.name.clone(), TableDef { name: name.clone(), ..table }))
        })?;
        self.emit(
            AuditEvent::new(AuditAction::TableRenamed, format!("table {before:?} renamed to {name:?}"), now)
                .by(ctx.actor.user_id)
                .in_base(after.base_id)
                .in_table(id)
                .with_details(serde_json::json!({ "from": before, "to": name })),
        );
        Ok(after)
    }

    /// Rewrites the positions of every active table of the base in one go.
    pub fn reorder_tables(
        &self,
        actor: Option<&Actor>,
        base: BaseId,
        ordered: &[TableId],
    ) -> DomainResult<Vec<TableDef>> {
        let ids: Vec<i64> = ordered.iter().map(|t| t.get()).collect();
        let now = self.now();
        let (ctx, list) = self.store.transaction(|tx| -> DomainResult<_> {
            let ctx = authorize(tx, actor, base, Action::SchemaManage)?;
            ensure_active(tx, EntityKind::Base, base.get())?;
            check_complete_order(tx, EntityKind::Table, base.get(), &ids)?;
            trash::set_positions(tx, EntityKind::Table, &ids, 1)?;
            Ok((ctx, tables::list_active(tx, base)?))
        })?;
        self.emit(
            AuditEvent::new(AuditAction::TablesReordered, "tables reordered", now)
                .by(ctx.actor.user_id)
                .in_base(base)
                .with_details(serde_json::json!({ "order": ids })),
        );
        Ok(list)
    }

    /// Active tables in position order.
    pub fn list_tables(&self, actor: Option<&Actor>, base: BaseId) -> DomainResult<Vec<TableDef>> {
        self.store.read(|conn| {
            authorize(conn, actor, base, Action::RecordsRead)?;
            ensure_visible(conn, EntityKind::Base, base.get())?;
            Ok(tables::list_active(conn, base)?)
        })
    }
}
