//! Kind-generic soft-delete row operations.
//!
//! Each [`EntityKind`] maps onto one physical table. The lifecycle engine in
//! the domain layer drives these primitives; nothing here decides *whether*
//! a transition is allowed.

use crate::codec::{format_ts, opt_ts_at};
use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tabula_model::{EntityKind, TrashState};
use tabula_types::{BaseId, FieldId, RecordId, TableId, UserId, WorkspaceId};

/// Physical layout of one trashable kind.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub table: &'static str,
    /// Column holding the sibling-unique name, if the kind is named.
    pub name_column: Option<&'static str>,
    /// Column pointing at the parent row.
    pub parent_column: Option<&'static str>,
    /// Filter selecting rows that belong to the owner bound as `?1`.
    owner_filter: &'static str,
}

pub fn spec(kind: EntityKind) -> TableSpec {
    match kind {
        EntityKind::Workspace => TableSpec {
            table: "workspaces",
            name_column: Some("name"),
            parent_column: None,
            owner_filter: "owner_id = ?1",
        },
        EntityKind::Base => TableSpec {
            table: "bases",
            name_column: Some("name"),
            parent_column: Some("workspace_id"),
            owner_filter: "owner_id = ?1",
        },
        EntityKind::Table => TableSpec {
            table: "table_defs",
            name_column: Some("name"),
            parent_column: Some("base_id"),
            owner_filter: "base_id IN (SELECT id FROM bases WHERE owner_id = ?1)",
        },
        EntityKind::Field => TableSpec {
            table: "fields",
            name_column: Some("name"),
            parent_column: Some("table_id"),
            owner_filter: "table_id IN (SELECT t.id FROM table_defs t \
                 JOIN bases b ON b.id = t.base_id WHERE b.owner_id = ?1)",
        },
        EntityKind::SelectOption => TableSpec {
            table: "select_options",
            name_column: Some("label"),
            parent_column: Some("field_id"),
            owner_filter: "field_id IN (SELECT f.id FROM fields f \
                 JOIN table_defs t ON t.id = f.table_id \
                 JOIN bases b ON b.id = t.base_id WHERE b.owner_id = ?1)",
        },
        EntityKind::Record => TableSpec {
            table: "records",
            name_column: None,
            parent_column: Some("table_id"),
            owner_filter: "table_id IN (SELECT t.id FROM table_defs t \
                 JOIN bases b ON b.id = t.base_id WHERE b.owner_id = ?1)",
        },
        EntityKind::Comment => TableSpec {
            table: "comments",
            name_column: None,
            parent_column: Some("record_id"),
            owner_filter: "record_id IN (SELECT r.id FROM records r \
                 JOIN table_defs t ON t.id = r.table_id \
                 JOIN bases b ON b.id = t.base_id WHERE b.owner_id = ?1)",
        },
    }
}

/// Which trashed rows a bulk operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrashScope {
    /// Everything ultimately owned by this user.
    Owner(UserId),
    /// Direct children of one parent row.
    Parent(i64),
}

/// One row in a trash listing.
#[derive(Debug, Clone, PartialEq)]
pub struct TrashEntry {
    pub kind: EntityKind,
    pub id: i64,
    pub name: Option<String>,
    pub trashed_at: DateTime<Utc>,
}

/// Where an entity sits in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityLocation {
    pub workspace_id: WorkspaceId,
    pub base_id: Option<BaseId>,
    pub table_id: Option<TableId>,
    pub field_id: Option<FieldId>,
    pub record_id: Option<RecordId>,
    /// Owner of the base when there is one, otherwise of the workspace.
    pub owner_id: UserId,
}

/// SQL predicate true when a row and every ancestor are active.
///
/// Lets a mutation carry its trash guard in the `WHERE` clause instead of a
/// separate read.
pub fn active_chain_predicate(kind: EntityKind) -> String {
    let s = spec(kind);
    match (kind.parent(), s.parent_column) {
        (Some(parent), Some(column)) => format!(
            "is_trashed = 0 AND {column} IN (SELECT id FROM {} WHERE {})",
            spec(parent).table,
            active_chain_predicate(parent)
        ),
        _ => "is_trashed = 0".to_string(),
    }
}

/// Returns `None` when the row does not exist.
pub fn state(conn: &Connection, kind: EntityKind, id: i64) -> StoreResult<Option<TrashState>> {
    let sql = format!("SELECT trashed_at FROM {} WHERE id = ?1", spec(kind).table);
    let state = conn
        .query_row(&sql, params![id], |row| {
            Ok(match opt_ts_at(row, 0)? {
                Some(at) => TrashState::trashed(at),
                None => TrashState::ACTIVE,
            })
        })
        .optional()?;
    Ok(state)
}

/// True when the row exists and neither it nor any ancestor is trashed.
pub fn is_active_chain(conn: &Connection, kind: EntityKind, id: i64) -> StoreResult<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1 AND {})",
        spec(kind).table,
        active_chain_predicate(kind)
    );
    Ok(conn.query_row(&sql, params![id], |row| row.get(0))?)
}

/// The closest trashed ancestor (not the row itself), if any.
pub fn trashed_ancestor(
    conn: &Connection,
    kind: EntityKind,
    id: i64,
) -> StoreResult<Option<(EntityKind, i64)>> {
    let mut current = (kind, id);
    while let Some(parent_kind) = current.0.parent() {
        let Some(parent_id) = parent_of(conn, current.0, current.1)? else {
            return Ok(None);
        };
        if state(conn, parent_kind, parent_id)?.is_some_and(|s| s.is_trashed()) {
            return Ok(Some((parent_kind, parent_id)));
        }
        current = (parent_kind, parent_id);
    }
    Ok(None)
}

/// The parent row id, or `None` for roots and missing rows.
pub fn parent_of(conn: &Connection, kind: EntityKind, id: i64) -> StoreResult<Option<i64>> {
    let s = spec(kind);
    let Some(column) = s.parent_column else {
        return Ok(None);
    };
    let sql = format!("SELECT {column} FROM {} WHERE id = ?1", s.table);
    Ok(conn.query_row(&sql, params![id], |row| row.get(0)).optional()?)
}

/// Walks up from any entity to its workspace.
pub fn locate(conn: &Connection, kind: EntityKind, id: i64) -> StoreResult<Option<EntityLocation>> {
    if state(conn, kind, id)?.is_none() {
        return Ok(None);
    }

    let mut base_id = None;
    let mut table_id = None;
    let mut field_id = None;
    let mut record_id = None;
    let mut current = (kind, id);
    loop {
        match current.0 {
            EntityKind::Workspace => break,
            EntityKind::Base => base_id = Some(BaseId::new(current.1)),
            EntityKind::Table => table_id = Some(TableId::new(current.1)),
            EntityKind::Field => field_id = Some(FieldId::new(current.1)),
            EntityKind::Record => record_id = Some(RecordId::new(current.1)),
            EntityKind::SelectOption | EntityKind::Comment => {}
        }
        let (Some(parent_kind), Some(parent_id)) =
            (current.0.parent(), parent_of(conn, current.0, current.1)?)
        else {
            return Err(StoreError::InvalidData(format!(
                "{} {} has no parent",
                current.0, current.1
            )));
        };
        current = (parent_kind, parent_id);
    }

    let workspace_id = WorkspaceId::new(current.1);
    let owner: i64 = match base_id {
        Some(base) => conn.query_row(
            "SELECT owner_id FROM bases WHERE id = ?1",
            params![base.get()],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT owner_id FROM workspaces WHERE id = ?1",
            params![workspace_id.get()],
            |row| row.get(0),
        )?,
    };

    Ok(Some(EntityLocation {
        workspace_id,
        base_id,
        table_id,
        field_id,
        record_id,
        owner_id: UserId::new(owner),
    }))
}

pub fn name_of(conn: &Connection, kind: EntityKind, id: i64) -> StoreResult<Option<String>> {
    let s = spec(kind);
    let Some(column) = s.name_column else {
        return Ok(None);
    };
    let sql = format!("SELECT {column} FROM {} WHERE id = ?1", s.table);
    Ok(conn.query_row(&sql, params![id], |row| row.get(0)).optional()?)
}

/// Flags an active row as trashed. Returns false if it was already trashed.
pub fn mark_trashed(
    conn: &Connection,
    kind: EntityKind,
    id: i64,
    at: DateTime<Utc>,
) -> StoreResult<bool> {
    let sql = format!(
        "UPDATE {} SET is_trashed = 1, trashed_at = ?2, updated_at = ?2 \
         WHERE id = ?1 AND is_trashed = 0",
        spec(kind).table
    );
    Ok(conn.execute(&sql, params![id, format_ts(at)])? > 0)
}

/// Clears the trash flag. Fails with [`StoreError::UniqueViolation`] when an
/// active sibling already holds the name.
pub fn mark_restored(
    conn: &Connection,
    kind: EntityKind,
    id: i64,
    at: DateTime<Utc>,
) -> StoreResult<bool> {
    let sql = format!(
        "UPDATE {} SET is_trashed = 0, trashed_at = NULL, updated_at = ?2 \
         WHERE id = ?1 AND is_trashed = 1",
        spec(kind).table
    );
    Ok(conn.execute(&sql, params![id, format_ts(at)])? > 0)
}

/// Clears the trash flag and renames in one statement.
pub fn mark_restored_as(
    conn: &Connection,
    kind: EntityKind,
    id: i64,
    name: &str,
    at: DateTime<Utc>,
) -> StoreResult<bool> {
    let s = spec(kind);
    let column = s.name_column.ok_or_else(|| {
        StoreError::InvalidData(format!("{kind} has no name to restore under"))
    })?;
    let sql = format!(
        "UPDATE {} SET {column} = ?3, is_trashed = 0, trashed_at = NULL, updated_at = ?2 \
         WHERE id = ?1 AND is_trashed = 1",
        s.table
    );
    Ok(conn.execute(&sql, params![id, format_ts(at), name])? > 0)
}

/// Renames a row only if it and all its ancestors are active.
/// Returns false when nothing matched.
pub fn rename_if_active(
    conn: &Connection,
    kind: EntityKind,
    id: i64,
    name: &str,
    at: DateTime<Utc>,
) -> StoreResult<bool> {
    let s = spec(kind);
    let column = s
        .name_column
        .ok_or_else(|| StoreError::InvalidData(format!("{kind} has no name")))?;
    let sql = format!(
        "UPDATE {} SET {column} = ?2, updated_at = ?3 WHERE id = ?1 AND {}",
        s.table,
        active_chain_predicate(kind)
    );
    Ok(conn.execute(&sql, params![id, name, format_ts(at)])? > 0)
}

/// Children of `parent_id` through `foreign_key`, active or trashed.
///
/// Trashed children come back in the order they were trashed (ties by id);
/// active ones by position when positioned, else by id.
pub fn child_ids(
    conn: &Connection,
    child: EntityKind,
    foreign_key: &str,
    parent_id: i64,
    trashed: bool,
) -> StoreResult<Vec<i64>> {
    let order = if trashed {
        "trashed_at ASC, id ASC"
    } else if child.is_positioned() {
        "position ASC, id ASC"
    } else {
        "id ASC"
    };
    let sql = format!(
        "SELECT id FROM {} WHERE {foreign_key} = ?1 AND is_trashed = ?2 ORDER BY {order}",
        spec(child).table
    );
    let mut stmt = conn.prepare(&sql)?;
    let ids = stmt
        .query_map(params![parent_id, trashed], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}

/// Active siblings under a parent, in position order.
pub fn active_siblings(conn: &Connection, kind: EntityKind, parent_id: i64) -> StoreResult<Vec<i64>> {
    let column = spec(kind)
        .parent_column
        .ok_or_else(|| StoreError::InvalidData(format!("{kind} has no siblings")))?;
    child_ids(conn, kind, column, parent_id, false)
}

/// Writes positions `start, start+1, …` to `ids` in order.
pub fn set_positions(
    conn: &Connection,
    kind: EntityKind,
    ids: &[i64],
    start: i64,
) -> StoreResult<()> {
    let sql = format!("UPDATE {} SET position = ?2 WHERE id = ?1", spec(kind).table);
    let mut stmt = conn.prepare(&sql)?;
    for (offset, id) in ids.iter().enumerate() {
        stmt.execute(params![id, start + offset as i64])?;
    }
    Ok(())
}

/// Position for a row appended after the active siblings.
pub fn next_position(conn: &Connection, kind: EntityKind, parent_id: i64) -> StoreResult<i64> {
    let s = spec(kind);
    let column = s
        .parent_column
        .ok_or_else(|| StoreError::InvalidData(format!("{kind} is not positioned")))?;
    let sql = format!(
        "SELECT COALESCE(MAX(position), 0) + 1 FROM {} WHERE {column} = ?1 AND is_trashed = 0",
        s.table
    );
    Ok(conn.query_row(&sql, params![parent_id], |row| row.get(0))?)
}

/// Hard-deletes one row; foreign keys take its descendants with it.
pub fn delete_row(conn: &Connection, kind: EntityKind, id: i64) -> StoreResult<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", spec(kind).table);
    Ok(conn.execute(&sql, params![id])? > 0)
}

fn scope_filter(kind: EntityKind, scope: TrashScope) -> StoreResult<(String, i64)> {
    let s = spec(kind);
    match scope {
        TrashScope::Owner(owner) => Ok((s.owner_filter.to_string(), owner.get())),
        TrashScope::Parent(parent) => {
            let column = s.parent_column.ok_or_else(|| {
                StoreError::InvalidData(format!("{kind} has no parent scope"))
            })?;
            Ok((format!("{column} = ?1"), parent))
        }
    }
}

/// Trashed rows of a kind in scope, newest first.
pub fn list_trashed(
    conn: &Connection,
    kind: EntityKind,
    scope: TrashScope,
) -> StoreResult<Vec<TrashEntry>> {
    let s = spec(kind);
    let (filter, bound) = scope_filter(kind, scope)?;
    let name = s.name_column.unwrap_or("NULL");
    let sql = format!(
        "SELECT id, {name}, trashed_at FROM {} WHERE is_trashed = 1 AND {filter} \
         ORDER BY trashed_at DESC, id DESC",
        s.table
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![bound], |row| {
            Ok(TrashEntry {
                kind,
                id: row.get(0)?,
                name: row.get(1)?,
                trashed_at: crate::codec::ts_at(row, 2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Hard-deletes every trashed row of a kind in scope.
pub fn delete_trashed_in(conn: &Connection, kind: EntityKind, scope: TrashScope) -> StoreResult<usize> {
    let (filter, bound) = scope_filter(kind, scope)?;
    let sql = format!(
        "DELETE FROM {} WHERE is_trashed = 1 AND {filter}",
        spec(kind).table
    );
    Ok(conn.execute(&sql, params![bound])?)
}

/// Hard-deletes every trashed row of a kind trashed at or before `threshold`.
pub fn delete_trashed_before(
    conn: &Connection,
    kind: EntityKind,
    threshold: DateTime<Utc>,
) -> StoreResult<usize> {
    let sql = format!(
        "DELETE FROM {} WHERE is_trashed = 1 AND trashed_at <= ?1",
        spec(kind).table
    );
    Ok(conn.execute(&sql, params![format_ts(threshold)])?)
}
