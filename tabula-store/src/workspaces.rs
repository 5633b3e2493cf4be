//! Workspace rows.

use crate::codec::{format_ts, trash_at, ts_at};
use crate::error::StoreResult;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tabula_model::{TrashState, Workspace};
use tabula_types::{UserId, WorkspaceId};

const COLUMNS: &str = "id, owner_id, name, trashed_at, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Workspace> {
    Ok(Workspace {
        id: WorkspaceId::new(row.get(0)?),
        owner_id: UserId::new(row.get(1)?),
        name: row.get(2)?,
        trash: trash_at(row, 3)?,
        created_at: ts_at(row, 4)?,
    })
}

pub fn insert(
    conn: &Connection,
    owner: UserId,
    name: &str,
    at: DateTime<Utc>,
) -> StoreResult<Workspace> {
    let ts = format_ts(at);
    conn.execute(
        "INSERT INTO workspaces (owner_id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        params![owner.get(), name, ts],
    )?;
    Ok(Workspace {
        id: WorkspaceId::new(conn.last_insert_rowid()),
        owner_id: owner,
        name: name.to_string(),
        trash: TrashState::ACTIVE,
        created_at: at,
    })
}

pub fn get(conn: &Connection, id: WorkspaceId) -> StoreResult<Option<Workspace>> {
    let sql = format!("SELECT {COLUMNS} FROM workspaces WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id.get()], from_row).optional()?)
}

/// Workspaces of an owner, active or trashed, ordered by name.
pub fn list_by_owner(conn: &Connection, owner: UserId, trashed: bool) -> StoreResult<Vec<Workspace>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM workspaces WHERE owner_id = ?1 AND is_trashed = ?2 ORDER BY name, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![owner.get(), trashed], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
