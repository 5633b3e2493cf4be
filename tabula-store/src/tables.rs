//! Table definition rows.

use crate::codec::{format_ts, trash_at, ts_at};
use crate::error::StoreResult;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tabula_model::{TableDef, TrashState};
use tabula_types::{BaseId, TableId};

const COLUMNS: &str = "id, base_id, name, position, trashed_at, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<TableDef> {
    Ok(TableDef {
        id: TableId::new(row.get(0)?),
        base_id: BaseId::new(row.get(1)?),
        name: row.get(2)?,
        position: row.get(3)?,
        trash: trash_at(row, 4)?,
        created_at: ts_at(row, 5)?,
    })
}

pub fn insert(
    conn: &Connection,
    base: BaseId,
    name: &str,
    position: i64,
    at: DateTime<Utc>,
) -> StoreResult<TableDef> {
    conn.execute(
        "INSERT INTO table_defs (base_id, name, position, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![base.get(), name, position, format_ts(at)],
    )?;
    Ok(TableDef {
        id: TableId::new(conn.last_insert_rowid()),
        base_id: base,
        name: name.to_string(),
        position,
        trash: TrashState::ACTIVE,
        created_at: at,
    })
}

pub fn get(conn: &Connection, id: TableId) -> StoreResult<Option<TableDef>> {
    let sql = format!("SELECT {COLUMNS} FROM table_defs WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id.get()], from_row).optional()?)
}

/// Active tables of a base in position order.
pub fn list_active(conn: &Connection, base: BaseId) -> StoreResult<Vec<TableDef>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM table_defs WHERE base_id = ?1 AND is_trashed = 0
         ORDER BY position, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![base.get()], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
