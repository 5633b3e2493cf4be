//! Base rows.

use crate::codec::{enum_at, format_ts, trash_at, ts_at};
use crate::error::StoreResult;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tabula_model::{Base, TrashState, Visibility};
use tabula_types::{BaseId, UserId, WorkspaceId};

const COLUMNS: &str = "id, owner_id, workspace_id, name, visibility, trashed_at, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Base> {
    Ok(Base {
        id: BaseId::new(row.get(0)?),
        owner_id: UserId::new(row.get(1)?),
        workspace_id: WorkspaceId::new(row.get(2)?),
        name: row.get(3)?,
        visibility: enum_at(row, 4)?,
        trash: trash_at(row, 5)?,
        created_at: ts_at(row, 6)?,
    })
}

pub fn insert(
    conn: &Connection,
    owner: UserId,
    workspace: WorkspaceId,
    name: &str,
    visibility: Visibility,
    at: DateTime<Utc>,
) -> StoreResult<Base> {
    conn.execute(
        "INSERT INTO bases (owner_id, workspace_id, name, visibility, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![
            owner.get(),
            workspace.get(),
            name,
            visibility.as_str(),
            format_ts(at)
        ],
    )?;
    Ok(Base {
        id: BaseId::new(conn.last_insert_rowid()),
        owner_id: owner,
        workspace_id: workspace,
        name: name.to_string(),
        visibility,
        trash: TrashState::ACTIVE,
        created_at: at,
    })
}

pub fn get(conn: &Connection, id: BaseId) -> StoreResult<Option<Base>> {
    let sql = format!("SELECT {COLUMNS} FROM bases WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id.get()], from_row).optional()?)
}

/// Owner and visibility, the two facts authorization needs.
pub fn access(conn: &Connection, id: BaseId) -> StoreResult<Option<(UserId, Visibility)>> {
    let found = conn
        .query_row(
            "SELECT owner_id, visibility FROM bases WHERE id = ?1",
            params![id.get()],
            |row| Ok((UserId::new(row.get(0)?), enum_at::<Visibility>(row, 1)?)),
        )
        .optional()?;
    Ok(found)
}

pub fn list_in_workspace(
    conn: &Connection,
    workspace: WorkspaceId,
    trashed: bool,
) -> StoreResult<Vec<Base>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM bases WHERE workspace_id = ?1 AND is_trashed = ?2 ORDER BY name, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![workspace.get(), trashed], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Changes visibility if the base and its workspace are active.
pub fn set_visibility_if_active(
    conn: &Connection,
    id: BaseId,
    visibility: Visibility,
    at: DateTime<Utc>,
) -> StoreResult<bool> {
    let sql = format!(
        "UPDATE bases SET visibility = ?2, updated_at = ?3 WHERE id = ?1 AND {}",
        crate::trash::active_chain_predicate(tabula_model::EntityKind::Base)
    );
    let n = conn.execute(&sql, params![id.get(), visibility.as_str(), format_ts(at)])?;
    Ok(n > 0)
}
